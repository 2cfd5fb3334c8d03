//! Study group routes: creation, discovery, membership and moderation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::group::{
    CreateGroupRequest, GroupDetail, JoinGroupResponse, ListGroupsQuery, ListGroupsResponse,
    MembershipOutcome, UpdateGroupRequest,
};
use domain::models::Group;
use persistence::repositories::{GroupRepository, JoinOutcome, NewGroup};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::image_store::{decode_upload, delete_best_effort, store_best_effort};

pub(crate) async fn load_group(repo: &GroupRepository, group_id: Uuid) -> Result<Group, ApiError> {
    repo.find_by_id(group_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))
}

fn require_owner(group: &Group, user_id: Uuid, action: &str) -> Result<(), ApiError> {
    if group.is_owner(user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Only the group creator can {}",
            action
        )))
    }
}

/// Create a new group. The creator becomes its first member.
///
/// POST /api/v1/groups
pub async fn create_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    request.validate()?;

    let upload = decode_upload(
        request.image_base64.as_deref(),
        state.config.storage.max_image_bytes,
    )?;
    let image_url = match &upload {
        Some(image) => store_best_effort(state.image_store.as_ref(), image).await,
        None => None,
    };

    let repo = GroupRepository::new(state.pool.clone());
    let group: Group = repo
        .create_group(&NewGroup {
            name: request.name.trim(),
            description: request.description.trim(),
            categories: &request.categories,
            max_members: request
                .max_members
                .unwrap_or(state.config.limits.default_group_max_members),
            is_monthly: request.is_monthly,
            image_url: image_url.as_deref(),
            created_by: user_auth.user_id,
        })
        .await?
        .into();

    info!(
        group_id = %group.id,
        group_name = %group.name,
        user_id = %user_auth.user_id,
        "Group created"
    );

    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /api/v1/groups?filter=all|monthly|popular|mine
pub async fn list_groups(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<ListGroupsQuery>,
) -> Result<Json<ListGroupsResponse>, ApiError> {
    let limit = state.config.limits.page_size(query.limit);
    let groups: Vec<_> = GroupRepository::new(state.pool.clone())
        .list(user_auth.user_id, query.filter, limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListGroupsResponse {
        count: groups.len(),
        data: groups,
    }))
}

/// GET /api/v1/groups/:group_id
pub async fn get_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GroupDetail>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());
    let group = load_group(&repo, group_id).await?;
    let members: Vec<_> = repo
        .members(group_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let is_member = members
        .iter()
        .any(|m: &domain::models::UserSummary| m.id == user_auth.user_id);
    let is_owner = group.is_owner(user_auth.user_id);

    Ok(Json(GroupDetail {
        group,
        members,
        is_member,
        is_owner,
    }))
}

/// Rename a group or replace its image. Creator only.
///
/// PUT /api/v1/groups/:group_id
pub async fn update_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
    Json(request): Json<UpdateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    request.validate()?;

    let repo = GroupRepository::new(state.pool.clone());
    let group = load_group(&repo, group_id).await?;
    require_owner(&group, user_auth.user_id, "edit the group")?;

    let upload = decode_upload(
        request.image_base64.as_deref(),
        state.config.storage.max_image_bytes,
    )?;
    let image_url = match &upload {
        Some(image) => store_best_effort(state.image_store.as_ref(), image).await,
        None => None,
    };

    let updated: Group = repo
        .update(
            group_id,
            request.name.as_deref().map(str::trim),
            image_url.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?
        .into();

    if let (Some(old), Some(new)) = (group.image_url.as_deref(), image_url.as_deref()) {
        if old != new {
            delete_best_effort(state.image_store.as_ref(), old).await;
        }
    }

    info!(group_id = %group_id, user_id = %user_auth.user_id, "Group updated");
    Ok(Json(updated))
}

/// POST /api/v1/groups/:group_id/join
pub async fn join_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<JoinGroupResponse>, ApiError> {
    let outcome = GroupRepository::new(state.pool.clone())
        .join(group_id, user_auth.user_id)
        .await?;

    match outcome {
        JoinOutcome::Joined { current_members } => {
            info!(group_id = %group_id, user_id = %user_auth.user_id, "Joined group");
            Ok(Json(JoinGroupResponse {
                group_id,
                current_members,
            }))
        }
        JoinOutcome::AlreadyMember => Err(ApiError::Conflict(
            "Already a member of this group".to_string(),
        )),
        JoinOutcome::Full => Err(ApiError::Conflict("Group is full".to_string())),
        JoinOutcome::NotFound => Err(ApiError::NotFound("Group not found".to_string())),
    }
}

/// Leave a group. The creator must delete the group instead.
///
/// POST /api/v1/groups/:group_id/leave
pub async fn leave_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<MembershipOutcome>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());
    let group = load_group(&repo, group_id).await?;
    if group.is_owner(user_auth.user_id) {
        return Err(ApiError::Forbidden(
            "The group creator cannot leave; delete the group instead".to_string(),
        ));
    }

    let outcome = repo
        .remove_member(group_id, user_auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not a member of this group".to_string()))?;

    after_removal(&state, &group, user_auth.user_id, outcome).await;
    Ok(Json(outcome))
}

/// Remove another member. Creator only.
///
/// DELETE /api/v1/groups/:group_id/members/:user_id
pub async fn kick_member(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((group_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MembershipOutcome>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());
    let group = load_group(&repo, group_id).await?;
    require_owner(&group, user_auth.user_id, "remove members")?;
    if member_id == user_auth.user_id {
        return Err(ApiError::Validation(
            "You cannot remove yourself from your own group".to_string(),
        ));
    }

    let outcome = repo
        .remove_member(group_id, member_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User is not a member of this group".to_string()))?;

    after_removal(&state, &group, member_id, outcome).await;
    Ok(Json(outcome))
}

async fn after_removal(state: &AppState, group: &Group, user_id: Uuid, outcome: MembershipOutcome) {
    match outcome {
        MembershipOutcome::Removed { remaining_members } => {
            info!(group_id = %group.id, user_id = %user_id, remaining_members, "Member removed");
        }
        MembershipOutcome::GroupDissolved => {
            info!(group_id = %group.id, user_id = %user_id, "Group dissolved after removal");
            if let Some(url) = group.image_url.as_deref() {
                delete_best_effort(state.image_store.as_ref(), url).await;
            }
        }
    }
}

/// Delete a group. Creator only.
///
/// DELETE /api/v1/groups/:group_id
pub async fn delete_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());
    let group = load_group(&repo, group_id).await?;
    require_owner(&group, user_auth.user_id, "delete the group")?;

    if !repo.delete(group_id).await? {
        return Err(ApiError::NotFound("Group not found".to_string()));
    }
    if let Some(url) = group.image_url.as_deref() {
        delete_best_effort(state.image_store.as_ref(), url).await;
    }

    info!(group_id = %group_id, user_id = %user_auth.user_id, "Group deleted");
    Ok(StatusCode::NO_CONTENT)
}
