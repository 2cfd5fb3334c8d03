//! Group message entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A group_messages row joined with the sender's display name.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMessageEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<GroupMessageEntity> for domain::models::GroupMessage {
    fn from(entity: GroupMessageEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            sender_id: entity.sender_id,
            sender_name: entity.sender_name,
            text: entity.text,
            created_at: entity.created_at,
        }
    }
}
