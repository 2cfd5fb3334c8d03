//! Leaderboards derived from point balances.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserRanking {
    pub rank: i64,
    pub user_id: Uuid,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub total_points: i64,
    pub total_study_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupRanking {
    pub rank: i64,
    pub group_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub current_members: i32,
    pub total_points: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRankingResponse {
    pub data: Vec<UserRanking>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupRankingResponse {
    pub data: Vec<GroupRanking>,
    pub count: usize,
}
