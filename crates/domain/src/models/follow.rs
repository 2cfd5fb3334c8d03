//! Follow graph domain models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserSummary;

/// Relationship between the caller and another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FollowStatus {
    pub user_id: Uuid,
    pub is_following: bool,
    pub is_followed_by: bool,
    pub is_mutual: bool,
}

impl FollowStatus {
    pub fn new(user_id: Uuid, is_following: bool, is_followed_by: bool) -> Self {
        Self {
            user_id,
            is_following,
            is_followed_by,
            is_mutual: is_following && is_followed_by,
        }
    }
}

/// Outcome of a follow or unfollow call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FollowResponse {
    pub user_id: Uuid,
    pub is_following: bool,
    /// False when the call did not change anything (self-follow, repeat).
    pub changed: bool,
    pub followers_count: i32,
}

/// Followers or following list.
#[derive(Debug, Clone, Serialize)]
pub struct FollowListResponse {
    pub data: Vec<UserSummary>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowListQuery {
    pub limit: Option<i64>,
}
