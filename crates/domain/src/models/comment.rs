//! Comments left on study rooms.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    /// Room keys are short slugs chosen by the client.
    static ref ROOM_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();
}

/// Returns true if `room_id` is an acceptable room key.
pub fn is_valid_room_id(room_id: &str) -> bool {
    ROOM_ID_REGEX.is_match(room_id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RoomComment {
    pub id: Uuid,
    pub room_id: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(
        length(min = 1, max = 500, message = "Comment must be 1-500 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListCommentsResponse {
    pub data: Vec<RoomComment>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCommentsQuery {
    pub limit: Option<i64>,
}
