//! User profile routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::user::{ListUsersQuery, ListUsersResponse, UpdateProfileRequest};
use domain::models::{User, UserProfile, UserSummary};
use persistence::repositories::UserRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::image_store::{decode_upload, delete_best_effort, store_best_effort};

async fn load_profile(repo: &UserRepository, user_id: Uuid) -> Result<UserProfile, ApiError> {
    let user: User = repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?
        .into();
    Ok(user.into())
}

/// GET /api/v1/users/me
pub async fn get_me(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<UserProfile>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    Ok(Json(load_profile(&repo, user_auth.user_id).await?))
}

/// GET /api/v1/users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    Ok(Json(load_profile(&repo, user_id).await?))
}

/// Update the caller's profile. Point balances are not writable here.
///
/// PUT /api/v1/users/me
pub async fn update_me(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    request.validate()?;

    let upload = decode_upload(
        request.photo_base64.as_deref(),
        state.config.storage.max_image_bytes,
    )?;

    let repo = UserRepository::new(state.pool.clone());
    let current = repo
        .find_by_id(user_auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let uploaded_url = match &upload {
        Some(image) => store_best_effort(state.image_store.as_ref(), image).await,
        None => None,
    };
    let photo = match uploaded_url.as_deref() {
        Some(url) => Some((url, true)),
        None => request.photo_url.as_deref().map(|url| (url, false)),
    };

    let display_name = request.display_name.as_deref().map(str::trim);
    let updated = repo
        .update_profile(user_auth.user_id, display_name, request.bio.as_deref(), photo)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // Only a photo our store issued for this user is ours to delete.
    if current.photo_stored {
        if let (Some(old), Some((new, _))) = (current.photo_url.as_deref(), photo) {
            if old != new {
                delete_best_effort(state.image_store.as_ref(), old).await;
            }
        }
    }

    info!(user_id = %user_auth.user_id, "Profile updated");

    let user: User = updated.into();
    Ok(Json(user.into()))
}

/// Search users by display-name prefix, excluding the caller.
///
/// GET /api/v1/users?search=&limit=
pub async fn list_users(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    let limit = state.config.limits.page_size(query.limit);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let users: Vec<UserSummary> = UserRepository::new(state.pool.clone())
        .search(user_auth.user_id, search, limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListUsersResponse {
        count: users.len(),
        data: users,
    }))
}
