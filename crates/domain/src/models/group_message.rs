//! Group chat messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupMessage {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostGroupMessageRequest {
    #[validate(
        length(min = 1, max = 2000, message = "Message must be 1-2000 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListGroupMessagesResponse {
    pub data: Vec<GroupMessage>,
    pub count: usize,
}

/// Query parameters for the group message list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListGroupMessagesQuery {
    pub limit: Option<i64>,
}
