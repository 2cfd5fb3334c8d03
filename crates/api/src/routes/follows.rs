//! Follow graph routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::follow::{FollowListQuery, FollowListResponse, FollowResponse, FollowStatus};
use persistence::repositories::{FollowRepository, UserRepository};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

async fn ensure_user_exists(state: &AppState, user_id: Uuid) -> Result<(), ApiError> {
    UserRepository::new(state.pool.clone())
        .display_name(user_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Follow a user. Following yourself or someone already followed changes nothing.
///
/// POST /api/v1/users/:user_id/follow
pub async fn follow(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(user_id): Path<Uuid>,
) -> Result<Json<FollowResponse>, ApiError> {
    ensure_user_exists(&state, user_id).await?;
    let repo = FollowRepository::new(state.pool.clone());

    let changed = if user_id == user_auth.user_id {
        false
    } else {
        repo.follow(user_auth.user_id, user_id).await?
    };
    if changed {
        info!(follower = %user_auth.user_id, following = %user_id, "User followed");
    }

    let (is_following, _) = repo.status(user_auth.user_id, user_id).await?;
    Ok(Json(FollowResponse {
        user_id,
        is_following,
        changed,
        followers_count: repo.followers_count(user_id).await?,
    }))
}

/// DELETE /api/v1/users/:user_id/follow
pub async fn unfollow(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(user_id): Path<Uuid>,
) -> Result<Json<FollowResponse>, ApiError> {
    ensure_user_exists(&state, user_id).await?;
    let repo = FollowRepository::new(state.pool.clone());

    let changed = repo.unfollow(user_auth.user_id, user_id).await?;
    if changed {
        info!(follower = %user_auth.user_id, following = %user_id, "User unfollowed");
    }

    Ok(Json(FollowResponse {
        user_id,
        is_following: false,
        changed,
        followers_count: repo.followers_count(user_id).await?,
    }))
}

/// GET /api/v1/users/:user_id/follow-status
pub async fn follow_status(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(user_id): Path<Uuid>,
) -> Result<Json<FollowStatus>, ApiError> {
    let (is_following, is_followed_by) = FollowRepository::new(state.pool.clone())
        .status(user_auth.user_id, user_id)
        .await?;
    Ok(Json(FollowStatus::new(user_id, is_following, is_followed_by)))
}

/// GET /api/v1/users/:user_id/followers
pub async fn list_followers(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Path(user_id): Path<Uuid>,
    Query(query): Query<FollowListQuery>,
) -> Result<Json<FollowListResponse>, ApiError> {
    ensure_user_exists(&state, user_id).await?;
    let limit = state.config.limits.page_size(query.limit);
    let data: Vec<_> = FollowRepository::new(state.pool.clone())
        .followers(user_id, limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(FollowListResponse {
        count: data.len(),
        data,
    }))
}

/// GET /api/v1/users/:user_id/following
pub async fn list_following(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Path(user_id): Path<Uuid>,
    Query(query): Query<FollowListQuery>,
) -> Result<Json<FollowListResponse>, ApiError> {
    ensure_user_exists(&state, user_id).await?;
    let limit = state.config.limits.page_size(query.limit);
    let data: Vec<_> = FollowRepository::new(state.pool.clone())
        .following(user_id, limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(FollowListResponse {
        count: data.len(),
        data,
    }))
}
