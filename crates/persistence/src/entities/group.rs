//! Group entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::group::GroupSummary;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the groups table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupEntity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub categories: Vec<String>,
    pub max_members: i32,
    pub current_members: i32,
    pub is_monthly: bool,
    pub image_url: Option<String>,
    pub total_points: i64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GroupEntity> for domain::models::Group {
    fn from(entity: GroupEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            categories: entity.categories,
            max_members: entity.max_members,
            current_members: entity.current_members,
            is_monthly: entity.is_monthly,
            image_url: entity.image_url,
            total_points: entity.total_points,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Group row plus whether the requesting user is a member.
#[derive(Debug, Clone, FromRow)]
pub struct GroupWithMembershipEntity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub categories: Vec<String>,
    pub max_members: i32,
    pub current_members: i32,
    pub is_monthly: bool,
    pub image_url: Option<String>,
    pub total_points: i64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_member: bool,
}

impl From<GroupWithMembershipEntity> for GroupSummary {
    fn from(entity: GroupWithMembershipEntity) -> Self {
        Self {
            is_member: entity.is_member,
            group: domain::models::Group {
                id: entity.id,
                name: entity.name,
                description: entity.description,
                categories: entity.categories,
                max_members: entity.max_members,
                current_members: entity.current_members,
                is_monthly: entity.is_monthly,
                image_url: entity.image_url,
                total_points: entity.total_points,
                created_by: entity.created_by,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
            },
        }
    }
}
