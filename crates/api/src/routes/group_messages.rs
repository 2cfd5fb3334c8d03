//! Group chat board routes. Members only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::group_message::{
    ListGroupMessagesQuery, ListGroupMessagesResponse, PostGroupMessageRequest,
};
use domain::models::GroupMessage;
use persistence::repositories::{GroupMessageRepository, GroupRepository};
use uuid::Uuid;
use validator::Validate;

use super::groups::load_group;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

async fn require_member(state: &AppState, group_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
    let repo = GroupRepository::new(state.pool.clone());
    load_group(&repo, group_id).await?;
    if repo.is_member(group_id, user_id).await? {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only group members can use the group chat".to_string(),
        ))
    }
}

/// POST /api/v1/groups/:group_id/messages
pub async fn post_message(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
    Json(request): Json<PostGroupMessageRequest>,
) -> Result<(StatusCode, Json<GroupMessage>), ApiError> {
    request.validate()?;
    require_member(&state, group_id, user_auth.user_id).await?;

    let message: GroupMessage = GroupMessageRepository::new(state.pool.clone())
        .create(group_id, user_auth.user_id, request.text.trim())
        .await?
        .into();

    tracing::debug!(group_id = %group_id, message_id = %message.id, "Group message posted");
    Ok((StatusCode::CREATED, Json(message)))
}

/// Latest messages, oldest first.
///
/// GET /api/v1/groups/:group_id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ListGroupMessagesQuery>,
) -> Result<Json<ListGroupMessagesResponse>, ApiError> {
    require_member(&state, group_id, user_auth.user_id).await?;

    let limit = state.config.limits.page_size(query.limit);
    let data: Vec<GroupMessage> = GroupMessageRepository::new(state.pool.clone())
        .list(group_id, limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListGroupMessagesResponse {
        count: data.len(),
        data,
    }))
}
