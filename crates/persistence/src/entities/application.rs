//! Group application entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::ApplicationStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for application_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
pub enum ApplicationStatusDb {
    Pending,
    Approved,
    Rejected,
}

impl From<ApplicationStatusDb> for ApplicationStatus {
    fn from(db: ApplicationStatusDb) -> Self {
        match db {
            ApplicationStatusDb::Pending => ApplicationStatus::Pending,
            ApplicationStatusDb::Approved => ApplicationStatus::Approved,
            ApplicationStatusDb::Rejected => ApplicationStatus::Rejected,
        }
    }
}

impl From<ApplicationStatus> for ApplicationStatusDb {
    fn from(status: ApplicationStatus) -> Self {
        match status {
            ApplicationStatus::Pending => ApplicationStatusDb::Pending,
            ApplicationStatus::Approved => ApplicationStatusDb::Approved,
            ApplicationStatus::Rejected => ApplicationStatusDb::Rejected,
        }
    }
}

/// Database row mapping for the group_applications table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupApplicationEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub major: String,
    pub intro: String,
    pub available_days: Vec<String>,
    pub status: ApplicationStatusDb,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl From<GroupApplicationEntity> for domain::models::GroupApplication {
    fn from(entity: GroupApplicationEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            user_id: entity.user_id,
            name: entity.name,
            major: entity.major,
            intro: entity.intro,
            available_days: entity.available_days,
            status: entity.status.into(),
            created_at: entity.created_at,
            decided_at: entity.decided_at,
        }
    }
}
