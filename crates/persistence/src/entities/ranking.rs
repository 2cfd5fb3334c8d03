//! Ranking rows.

use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct UserRankingEntity {
    pub rank: i64,
    pub user_id: Uuid,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub total_points: i64,
    pub total_study_minutes: i64,
}

impl From<UserRankingEntity> for domain::models::UserRanking {
    fn from(entity: UserRankingEntity) -> Self {
        Self {
            rank: entity.rank,
            user_id: entity.user_id,
            display_name: entity.display_name,
            photo_url: entity.photo_url,
            total_points: entity.total_points,
            total_study_minutes: entity.total_study_minutes,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GroupRankingEntity {
    pub rank: i64,
    pub group_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub current_members: i32,
    pub total_points: i64,
}

impl From<GroupRankingEntity> for domain::models::GroupRanking {
    fn from(entity: GroupRankingEntity) -> Self {
        Self {
            rank: entity.rank,
            group_id: entity.group_id,
            name: entity.name,
            image_url: entity.image_url,
            current_members: entity.current_members,
            total_points: entity.total_points,
        }
    }
}
