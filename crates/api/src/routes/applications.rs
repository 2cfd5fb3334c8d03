//! Group application routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::application::{CreateApplicationRequest, ListApplicationsResponse};
use domain::models::GroupApplication;
use persistence::repositories::{ApplicationRepository, DecisionOutcome, GroupRepository};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::groups::load_group;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Apply to join a group.
///
/// POST /api/v1/groups/:group_id/applications
pub async fn apply(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<GroupApplication>), ApiError> {
    request.validate()?;

    let groups = GroupRepository::new(state.pool.clone());
    load_group(&groups, group_id).await?;
    if groups.is_member(group_id, user_auth.user_id).await? {
        return Err(ApiError::Conflict(
            "Already a member of this group".to_string(),
        ));
    }

    let application: GroupApplication = ApplicationRepository::new(state.pool.clone())
        .create(
            group_id,
            user_auth.user_id,
            request.name.trim(),
            request.major.trim(),
            request.intro.trim(),
            &request.available_days,
        )
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict("An application is already pending".to_string())
            }
            other => other,
        })?
        .into();

    info!(
        application_id = %application.id,
        group_id = %group_id,
        user_id = %user_auth.user_id,
        "Group application submitted"
    );
    Ok((StatusCode::CREATED, Json(application)))
}

/// Pending applications for a group. Creator only.
///
/// GET /api/v1/groups/:group_id/applications
pub async fn list_applications(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<ListApplicationsResponse>, ApiError> {
    let group = load_group(&GroupRepository::new(state.pool.clone()), group_id).await?;
    if !group.is_owner(user_auth.user_id) {
        return Err(ApiError::Forbidden(
            "Only the group creator can review applications".to_string(),
        ));
    }

    let data: Vec<GroupApplication> = ApplicationRepository::new(state.pool.clone())
        .list_pending(group_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListApplicationsResponse {
        count: data.len(),
        data,
    }))
}

/// The caller's latest application to a group.
///
/// GET /api/v1/groups/:group_id/applications/me
pub async fn my_application(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GroupApplication>, ApiError> {
    ApplicationRepository::new(state.pool.clone())
        .latest_for_user(group_id, user_auth.user_id)
        .await?
        .map(|a| Json(a.into()))
        .ok_or_else(|| ApiError::NotFound("No application found".to_string()))
}

/// POST /api/v1/groups/:group_id/applications/:application_id/approve
pub async fn approve_application(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((group_id, application_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<GroupApplication>, ApiError> {
    let repo = authorize_decision(&state, user_auth.user_id, group_id, application_id).await?;
    let application = decision_result(repo.approve(application_id).await?)?;

    info!(
        application_id = %application_id,
        group_id = %group_id,
        applicant = %application.user_id,
        "Group application approved"
    );
    Ok(Json(application))
}

/// POST /api/v1/groups/:group_id/applications/:application_id/reject
pub async fn reject_application(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((group_id, application_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<GroupApplication>, ApiError> {
    let repo = authorize_decision(&state, user_auth.user_id, group_id, application_id).await?;
    let application = decision_result(repo.reject(application_id).await?)?;

    info!(application_id = %application_id, group_id = %group_id, "Group application rejected");
    Ok(Json(application))
}

/// Checks the caller owns the group and the application belongs to it.
async fn authorize_decision(
    state: &AppState,
    caller: Uuid,
    group_id: Uuid,
    application_id: Uuid,
) -> Result<ApplicationRepository, ApiError> {
    let group = load_group(&GroupRepository::new(state.pool.clone()), group_id).await?;
    if !group.is_owner(caller) {
        return Err(ApiError::Forbidden(
            "Only the group creator can decide applications".to_string(),
        ));
    }

    let repo = ApplicationRepository::new(state.pool.clone());
    match repo.find_by_id(application_id).await? {
        Some(application) if application.group_id == group_id => Ok(repo),
        _ => Err(ApiError::NotFound("Application not found".to_string())),
    }
}

fn decision_result(outcome: DecisionOutcome) -> Result<GroupApplication, ApiError> {
    match outcome {
        DecisionOutcome::Decided(application) => Ok(application.into()),
        DecisionOutcome::NotFound => Err(ApiError::NotFound("Application not found".to_string())),
        DecisionOutcome::NotPending => Err(ApiError::Conflict(
            "Application has already been decided".to_string(),
        )),
        DecisionOutcome::GroupFull => Err(ApiError::Conflict("Group is full".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_result_mapping() {
        assert!(matches!(
            decision_result(DecisionOutcome::NotFound),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            decision_result(DecisionOutcome::NotPending),
            Err(ApiError::Conflict(_))
        ));
        assert!(matches!(
            decision_result(DecisionOutcome::GroupFull),
            Err(ApiError::Conflict(m)) if m == "Group is full"
        ));
    }
}
