//! Study certification routes.
//!
//! Creating a record credits the author (and the group in group mode) in the
//! same transaction as the insert; deleting reverses exactly that credit.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::study_record::{
    CreateStudyRecordRequest, CreateStudyRecordResponse, DeleteStudyRecordResponse,
    StudyFeedItem, StudyFeedQuery, StudyFeedResponse,
};
use domain::models::{StudyMode, StudyRecord};
use domain::services::ledger::{session_totals, PointDelta};
use persistence::repositories::{
    CreateRecordOutcome, DeleteRecordOutcome, FeedFilter, GroupRepository, NewStudyRecord,
    StudyRecordRepository,
};
use shared::pagination::{decode_cursor, encode_cursor};
use tracing::info;
use uuid::Uuid;

use super::groups::load_group;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::{record_study_record_created, record_study_record_deleted};
use crate::services::image_store::{decode_upload, delete_best_effort, store_best_effort};

pub const IMAGE_UPLOAD_WARNING: &str = "Image upload failed; the record was saved without an image";

/// Submit a study session.
///
/// POST /api/v1/study-records
pub async fn create_record(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateStudyRecordRequest>,
) -> Result<(StatusCode, Json<CreateStudyRecordResponse>), ApiError> {
    request.validate_submission()?;

    // Early rejection before any image is stored; the insert re-checks under lock.
    if let Some(group_id) = request.group_id {
        let groups = GroupRepository::new(state.pool.clone());
        load_group(&groups, group_id).await?;
        if !groups.is_member(group_id, user_auth.user_id).await? {
            return Err(ApiError::Forbidden(
                "You can only certify study for groups you belong to".to_string(),
            ));
        }
    }

    let totals = session_totals(request.hours, request.minutes)?;
    let delta = PointDelta::for_session(
        user_auth.user_id,
        request.study_mode,
        request.group_id,
        totals,
    )?;

    let upload = decode_upload(
        request.image_base64.as_deref(),
        state.config.storage.max_image_bytes,
    )?;
    let image_url = match &upload {
        Some(image) => store_best_effort(state.image_store.as_ref(), image).await,
        None => None,
    };
    let image_warning = (upload.is_some() && image_url.is_none())
        .then(|| IMAGE_UPLOAD_WARNING.to_string());

    let new_record = NewStudyRecord {
        user_id: user_auth.user_id,
        study_mode: request.study_mode.into(),
        group_id: request.group_id,
        study_date: request.study_date,
        hours: request.hours,
        minutes: request.minutes,
        total_minutes: totals.total_minutes,
        points_earned: totals.points_earned,
        description: request.description.trim(),
        image_url: image_url.as_deref(),
    };

    let created = StudyRecordRepository::new(state.pool.clone())
        .create_with_credit(&new_record, &delta)
        .await;
    let outcome = match created {
        Ok(CreateRecordOutcome::Created { record, balances }) => Ok((record, balances)),
        Ok(CreateRecordOutcome::GroupNotFound) => {
            Err(ApiError::NotFound("Group not found".to_string()))
        }
        Ok(CreateRecordOutcome::NotGroupMember) => Err(ApiError::Forbidden(
            "You can only certify study for groups you belong to".to_string(),
        )),
        Err(e) => Err(e.into()),
    };
    let (entity, balances) = match outcome {
        Ok(created) => created,
        Err(e) => {
            if let Some(url) = image_url.as_deref() {
                delete_best_effort(state.image_store.as_ref(), url).await;
            }
            return Err(e);
        }
    };

    let record: StudyRecord = entity.into();
    record_study_record_created(record.study_mode.as_str(), record.points_earned);
    info!(
        record_id = %record.id,
        user_id = %record.user_id,
        group_id = ?record.group_id,
        points = record.points_earned,
        user_points = balances.user_points,
        group_points = ?balances.group_points,
        "Study record created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateStudyRecordResponse {
            record,
            image_warning,
        }),
    ))
}

/// Newest-first feed, optionally filtered by author or group.
///
/// GET /api/v1/study-records?user_id=&group_id=&cursor=&limit=
pub async fn list_records(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Query(query): Query<StudyFeedQuery>,
) -> Result<Json<StudyFeedResponse>, ApiError> {
    let limit = state.config.limits.page_size(query.limit);
    let before = query
        .cursor
        .as_deref()
        .map(decode_cursor)
        .transpose()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let mut items: Vec<StudyFeedItem> = StudyRecordRepository::new(state.pool.clone())
        .feed(FeedFilter {
            user_id: query.user_id,
            group_id: query.group_id,
            before,
            limit: limit + 1,
        })
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let next_cursor = if items.len() as i64 > limit {
        items.truncate(limit as usize);
        items
            .last()
            .map(|item| encode_cursor(item.record.created_at, item.record.id))
    } else {
        None
    };

    Ok(Json(StudyFeedResponse {
        count: items.len(),
        data: items,
        next_cursor,
    }))
}

/// GET /api/v1/study-records/:record_id
pub async fn get_record(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Path(record_id): Path<Uuid>,
) -> Result<Json<StudyRecord>, ApiError> {
    StudyRecordRepository::new(state.pool.clone())
        .find_by_id(record_id)
        .await?
        .map(|r| Json(r.into()))
        .ok_or_else(|| ApiError::NotFound("Study record not found".to_string()))
}

/// Delete a record and reverse its points. Author only.
///
/// DELETE /api/v1/study-records/:record_id
pub async fn delete_record(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(record_id): Path<Uuid>,
) -> Result<Json<DeleteStudyRecordResponse>, ApiError> {
    let outcome = StudyRecordRepository::new(state.pool.clone())
        .delete_with_reversal(record_id, user_auth.user_id)
        .await?;

    let (record, balances) = match outcome {
        DeleteRecordOutcome::Deleted { record, balances } => (record, balances),
        DeleteRecordOutcome::NotFound => {
            return Err(ApiError::NotFound("Study record not found".to_string()))
        }
        DeleteRecordOutcome::NotAuthor => {
            return Err(ApiError::Forbidden(
                "Only the author can delete a study record".to_string(),
            ))
        }
    };
    let record: StudyRecord = record.into();

    // The ledger is already settled; the image is cleanup only.
    let image_deleted = match record.image_url.as_deref() {
        Some(url) => delete_best_effort(state.image_store.as_ref(), url).await,
        None => false,
    };

    record_study_record_deleted();
    info!(
        record_id = %record.id,
        user_id = %user_auth.user_id,
        points_reversed = record.points_earned,
        user_points = balances.user_points,
        group_credited = record.study_mode == StudyMode::Group && balances.group_points.is_some(),
        "Study record deleted"
    );

    Ok(Json(DeleteStudyRecordResponse {
        id: record.id,
        points_reversed: record.points_earned,
        image_deleted,
    }))
}
