//! Study record entities (database row mappings).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::study_record::StudyFeedItem;
use domain::models::StudyMode;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for study_mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "study_mode", rename_all = "lowercase")]
pub enum StudyModeDb {
    Solo,
    Group,
}

impl From<StudyModeDb> for StudyMode {
    fn from(db: StudyModeDb) -> Self {
        match db {
            StudyModeDb::Solo => StudyMode::Solo,
            StudyModeDb::Group => StudyMode::Group,
        }
    }
}

impl From<StudyMode> for StudyModeDb {
    fn from(mode: StudyMode) -> Self {
        match mode {
            StudyMode::Solo => StudyModeDb::Solo,
            StudyMode::Group => StudyModeDb::Group,
        }
    }
}

/// Database row mapping for the study_records table.
#[derive(Debug, Clone, FromRow)]
pub struct StudyRecordEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub study_mode: StudyModeDb,
    pub group_id: Option<Uuid>,
    pub study_date: NaiveDate,
    pub hours: i32,
    pub minutes: i32,
    pub total_minutes: i32,
    pub points_earned: i32,
    pub description: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StudyRecordEntity> for domain::models::StudyRecord {
    fn from(entity: StudyRecordEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            study_mode: entity.study_mode.into(),
            group_id: entity.group_id,
            study_date: entity.study_date,
            hours: entity.hours,
            minutes: entity.minutes,
            total_minutes: entity.total_minutes,
            points_earned: entity.points_earned,
            description: entity.description,
            image_url: entity.image_url,
            created_at: entity.created_at,
        }
    }
}

/// Feed row: a record joined with its author.
#[derive(Debug, Clone, FromRow)]
pub struct StudyFeedEntity {
    #[sqlx(flatten)]
    pub record: StudyRecordEntity,
    pub author_name: String,
    pub author_photo_url: Option<String>,
}

impl From<StudyFeedEntity> for StudyFeedItem {
    fn from(entity: StudyFeedEntity) -> Self {
        Self {
            record: entity.record.into(),
            author_name: entity.author_name,
            author_photo_url: entity.author_photo_url,
        }
    }
}
