//! Leaderboard routes.

use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::ranking::{GroupRankingResponse, RankingQuery, UserRankingResponse};
use domain::models::{GroupRanking, UserRanking};
use persistence::repositories::RankingRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// GET /api/v1/rankings/users?limit=
pub async fn user_rankings(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Query(query): Query<RankingQuery>,
) -> Result<Json<UserRankingResponse>, ApiError> {
    let limit = state.config.limits.page_size(query.limit);
    let data: Vec<UserRanking> = RankingRepository::new(state.pool.clone())
        .top_users(limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(UserRankingResponse {
        count: data.len(),
        data,
    }))
}

/// GET /api/v1/rankings/users/me
pub async fn my_ranking(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<UserRanking>, ApiError> {
    RankingRepository::new(state.pool.clone())
        .user_rank(user_auth.user_id)
        .await?
        .map(|r| Json(r.into()))
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// GET /api/v1/rankings/groups?limit=
pub async fn group_rankings(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Query(query): Query<RankingQuery>,
) -> Result<Json<GroupRankingResponse>, ApiError> {
    let limit = state.config.limits.page_size(query.limit);
    let data: Vec<GroupRanking> = RankingRepository::new(state.pool.clone())
        .top_groups(limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(GroupRankingResponse {
        count: data.len(),
        data,
    }))
}
