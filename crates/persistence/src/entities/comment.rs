//! Room comment entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the room_comments table.
#[derive(Debug, Clone, FromRow)]
pub struct RoomCommentEntity {
    pub id: Uuid,
    pub room_id: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<RoomCommentEntity> for domain::models::RoomComment {
    fn from(entity: RoomCommentEntity) -> Self {
        Self {
            id: entity.id,
            room_id: entity.room_id,
            user_id: entity.user_id,
            user_name: entity.user_name,
            text: entity.text,
            created_at: entity.created_at,
        }
    }
}
