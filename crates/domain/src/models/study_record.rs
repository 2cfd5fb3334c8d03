//! Study certification records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Longest session a single record may claim.
pub const MAX_SESSION_MINUTES: i32 = 24 * 60;

/// Whether a session was studied alone or credited to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyMode {
    Solo,
    Group,
}

impl StudyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyMode::Solo => "solo",
            StudyMode::Group => "group",
        }
    }
}

impl FromStr for StudyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solo" => Ok(StudyMode::Solo),
            "group" => Ok(StudyMode::Group),
            _ => Err(format!("Invalid study mode: {}", s)),
        }
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A logged study session. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StudyRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub study_mode: StudyMode,
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

/// Request body for submitting a study record.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateStudyRecordRequest {
    pub study_mode: StudyMode,

    pub study_date: NaiveDate,

    #[validate(range(min = 0, max = 24, message = "Hours must be between 0 and 24"))]
    pub hours: i32,

    #[validate(range(min = 0, max = 59, message = "Minutes must be between 0 and 59"))]
    pub minutes: i32,

    #[validate(
        length(min = 1, max = 1000, message = "Description must be 1-1000 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub description: String,

    pub group_id: Option<Uuid>,

    /// Base64-encoded proof photo.
    pub image_base64: Option<String>,
}

impl CreateStudyRecordRequest {
    pub fn total_minutes(&self) -> i32 {
        self.hours * 60 + self.minutes
    }

    /// Field validation plus the cross-field rules.
    pub fn validate_submission(&self) -> Result<(), SubmissionError> {
        self.validate().map_err(SubmissionError::Fields)?;
        check_submission(self).map_err(SubmissionError::Rule)
    }
}

/// Rejection of a study record submission.
#[derive(Debug)]
pub enum SubmissionError {
    Fields(validator::ValidationErrors),
    Rule(ValidationError),
}

/// Cross-field rules: at least one minute studied, and a group id exactly
/// when the mode is group.
fn check_submission(req: &CreateStudyRecordRequest) -> Result<(), ValidationError> {
    if req.total_minutes() < 1 {
        let mut err = ValidationError::new("duration_zero");
        err.message = Some("Study time must be at least 1 minute".into());
        return Err(err);
    }
    if req.total_minutes() > MAX_SESSION_MINUTES {
        let mut err = ValidationError::new("duration_too_long");
        err.message = Some("Study time cannot exceed 24 hours".into());
        return Err(err);
    }
    match (req.study_mode, req.group_id) {
        (StudyMode::Group, None) => {
            let mut err = ValidationError::new("group_required");
            err.message = Some("A group must be selected for group study".into());
            Err(err)
        }
        (StudyMode::Solo, Some(_)) => {
            let mut err = ValidationError::new("group_not_allowed");
            err.message = Some("Solo study cannot be credited to a group".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Response after submitting a record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateStudyRecordResponse {
    #[serde(flatten)]
    pub record: StudyRecord,
    /// Set when the photo could not be stored; the record was saved without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_warning: Option<String>,
}

/// Feed query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyFeedQuery {
    pub user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

/// A feed entry with author display info.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StudyFeedItem {
    #[serde(flatten)]
    pub record: StudyRecord,
    pub author_name: String,
    pub author_photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StudyFeedResponse {
    pub data: Vec<StudyFeedItem>,
    pub count: usize,
    pub next_cursor: Option<String>,
}

/// Balances after a record was deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DeleteStudyRecordResponse {
    pub id: Uuid,
    pub points_reversed: i32,
    pub image_deleted: bool,
}
