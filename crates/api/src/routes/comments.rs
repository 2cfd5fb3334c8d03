//! Study room comment routes.
//!
//! Room ids are opaque strings chosen by clients; they are not chat rooms.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::comment::{
    is_valid_room_id, CreateCommentRequest, ListCommentsQuery, ListCommentsResponse,
};
use domain::models::RoomComment;
use persistence::repositories::CommentRepository;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

fn check_room_id(room_id: &str) -> Result<(), ApiError> {
    if is_valid_room_id(room_id) {
        Ok(())
    } else {
        Err(ApiError::Validation("Invalid room id".to_string()))
    }
}

/// POST /api/v1/rooms/:room_id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(room_id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<RoomComment>), ApiError> {
    check_room_id(&room_id)?;
    request.validate()?;

    let comment: RoomComment = CommentRepository::new(state.pool.clone())
        .create(&room_id, user_auth.user_id, request.text.trim())
        .await?
        .into();

    tracing::debug!(room_id = %room_id, comment_id = %comment.id, "Comment posted");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Comments of a room, newest first.
///
/// GET /api/v1/rooms/:room_id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Path(room_id): Path<String>,
    Query(query): Query<ListCommentsQuery>,
) -> Result<Json<ListCommentsResponse>, ApiError> {
    check_room_id(&room_id)?;

    let limit = state.config.limits.page_size(query.limit);
    let data: Vec<RoomComment> = CommentRepository::new(state.pool.clone())
        .list(&room_id, limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListCommentsResponse {
        count: data.len(),
        data,
    }))
}
