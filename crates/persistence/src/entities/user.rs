//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub display_name: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    /// Whether `photo_url` was issued by our image store for this user.
    pub photo_stored: bool,
    pub followers_count: i32,
    pub following_count: i32,
    pub total_points: i64,
    pub total_study_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            password_hash: entity.password_hash,
            display_name: entity.display_name,
            bio: entity.bio,
            photo_url: entity.photo_url,
            followers_count: entity.followers_count,
            following_count: entity.following_count,
            total_points: entity.total_points,
            total_study_minutes: entity.total_study_minutes,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Just enough of a user to render a list entry.
#[derive(Debug, Clone, FromRow)]
pub struct UserSummaryEntity {
    pub id: Uuid,
    pub display_name: String,
    pub photo_url: Option<String>,
}

impl From<UserSummaryEntity> for domain::models::UserSummary {
    fn from(entity: UserSummaryEntity) -> Self {
        Self {
            id: entity.id,
            display_name: entity.display_name,
            photo_url: entity.photo_url,
        }
    }
}
