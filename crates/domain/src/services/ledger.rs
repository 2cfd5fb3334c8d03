//! Point ledger arithmetic for study records.
//!
//! Every change to a user's or group's point balance is expressed as a
//! [`PointDelta`] derived from a study record. Creating a record applies the
//! delta, deleting it applies [`PointDelta::reversed`], so a create followed by
//! a delete leaves all balances exactly where they started.

use thiserror::Error;
use uuid::Uuid;

use crate::models::study_record::{StudyMode, StudyRecord};

/// Points awarded per studied minute.
pub const POINTS_PER_MINUTE: i32 = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid study duration: {0}")]
    InvalidDuration(String),

    #[error("Study record is inconsistent: {0}")]
    InconsistentRecord(String),

    #[error("Balance would become negative ({balance} + {delta})")]
    NegativeBalance { balance: i64, delta: i64 },
}

/// Minutes and points derived from a session length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTotals {
    pub total_minutes: i32,
    pub points_earned: i32,
}

/// Computes `total_minutes = hours * 60 + minutes` and the matching points.
pub fn session_totals(hours: i32, minutes: i32) -> Result<SessionTotals, LedgerError> {
    shared::validation::validate_study_hours(hours)
        .map_err(|_| LedgerError::InvalidDuration(format!("hours out of range: {}", hours)))?;
    shared::validation::validate_study_minutes(minutes)
        .map_err(|_| LedgerError::InvalidDuration(format!("minutes out of range: {}", minutes)))?;

    let total_minutes = hours * 60 + minutes;
    if total_minutes < 1 {
        return Err(LedgerError::InvalidDuration(
            "at least one minute is required".to_string(),
        ));
    }

    Ok(SessionTotals {
        total_minutes,
        points_earned: total_minutes * POINTS_PER_MINUTE,
    })
}

/// Signed adjustment to the user balance and, in group mode, the group balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointDelta {
    pub user_id: Uuid,
    pub group_id: Option<Uuid>,
    pub points: i64,
    pub minutes: i64,
}

impl PointDelta {
    /// Delta for a new session. Group mode must name a group; solo must not.
    pub fn for_session(
        user_id: Uuid,
        mode: StudyMode,
        group_id: Option<Uuid>,
        totals: SessionTotals,
    ) -> Result<Self, LedgerError> {
        let group_id = match (mode, group_id) {
            (StudyMode::Group, Some(id)) => Some(id),
            (StudyMode::Solo, None) => None,
            (StudyMode::Group, None) => {
                return Err(LedgerError::InconsistentRecord(
                    "group study without a group".to_string(),
                ))
            }
            (StudyMode::Solo, Some(_)) => {
                return Err(LedgerError::InconsistentRecord(
                    "solo study credited to a group".to_string(),
                ))
            }
        };

        Ok(Self {
            user_id,
            group_id,
            points: i64::from(totals.points_earned),
            minutes: i64::from(totals.total_minutes),
        })
    }

    /// Delta a stored record contributed when it was created.
    ///
    /// A group-mode record whose group was deleted has `group_id = None`; its
    /// group share is gone with the group and only the user part remains.
    pub fn from_record(record: &StudyRecord) -> Result<Self, LedgerError> {
        if record.total_minutes != record.hours * 60 + record.minutes {
            return Err(LedgerError::InconsistentRecord(format!(
                "total_minutes {} does not match {}h {}m",
                record.total_minutes, record.hours, record.minutes
            )));
        }
        if record.points_earned != record.total_minutes * POINTS_PER_MINUTE {
            return Err(LedgerError::InconsistentRecord(format!(
                "points_earned {} does not match total_minutes {}",
                record.points_earned, record.total_minutes
            )));
        }
        if record.study_mode == StudyMode::Solo && record.group_id.is_some() {
            return Err(LedgerError::InconsistentRecord(
                "solo study credited to a group".to_string(),
            ));
        }

        Ok(Self {
            user_id: record.user_id,
            group_id: record.group_id,
            points: i64::from(record.points_earned),
            minutes: i64::from(record.total_minutes),
        })
    }

    /// The delta that undoes this one.
    pub fn reversed(&self) -> Self {
        Self {
            points: -self.points,
            minutes: -self.minutes,
            ..*self
        }
    }
}

/// Applies `delta` to `balance`, refusing to go below zero.
pub fn apply_to_balance(balance: i64, delta: i64) -> Result<i64, LedgerError> {
    match balance.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        _ => Err(LedgerError::NegativeBalance { balance, delta }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn record(mode: StudyMode, group_id: Option<Uuid>, hours: i32, minutes: i32) -> StudyRecord {
        let totals = session_totals(hours, minutes).unwrap();
        StudyRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            study_mode: mode,
            group_id,
            study_date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            hours,
            minutes,
            total_minutes: totals.total_minutes,
            points_earned: totals.points_earned,
            description: "flashcards".into(),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_totals() {
        let totals = session_totals(2, 15).unwrap();
        assert_eq!(totals.total_minutes, 135);
        assert_eq!(totals.points_earned, 135);
    }

    #[test]
    fn test_session_totals_rejects_zero_and_out_of_range() {
        assert!(matches!(
            session_totals(0, 0),
            Err(LedgerError::InvalidDuration(_))
        ));
        assert!(session_totals(25, 0).is_err());
        assert!(session_totals(1, 60).is_err());
        assert!(session_totals(-1, 30).is_err());
    }

    #[test]
    fn test_group_delta_only_in_group_mode() {
        let user = Uuid::new_v4();
        let group = Uuid::new_v4();
        let totals = session_totals(1, 0).unwrap();

        let solo = PointDelta::for_session(user, StudyMode::Solo, None, totals).unwrap();
        assert_eq!(solo.group_id, None);
        assert_eq!(solo.points, 60);

        let grouped =
            PointDelta::for_session(user, StudyMode::Group, Some(group), totals).unwrap();
        assert_eq!(grouped.group_id, Some(group));
        assert_eq!(grouped.points, 60);
        assert_eq!(grouped.minutes, 60);

        assert!(PointDelta::for_session(user, StudyMode::Group, None, totals).is_err());
        assert!(PointDelta::for_session(user, StudyMode::Solo, Some(group), totals).is_err());
    }

    #[test]
    fn test_reverse_is_exact_inverse() {
        let rec = record(StudyMode::Group, Some(Uuid::new_v4()), 3, 45);
        let delta = PointDelta::from_record(&rec).unwrap();
        let back = delta.reversed();

        assert_eq!(back.points, -delta.points);
        assert_eq!(back.minutes, -delta.minutes);
        assert_eq!(back.group_id, delta.group_id);
        assert_eq!(back.user_id, delta.user_id);
        assert_eq!(back.reversed(), delta);

        let start = 500;
        let after_create = apply_to_balance(start, delta.points).unwrap();
        assert_eq!(apply_to_balance(after_create, back.points).unwrap(), start);
    }

    #[test]
    fn test_from_record_detects_tampering() {
        let mut rec = record(StudyMode::Solo, None, 1, 10);
        rec.total_minutes = 100;
        assert!(matches!(
            PointDelta::from_record(&rec),
            Err(LedgerError::InconsistentRecord(_))
        ));

        let mut rec = record(StudyMode::Solo, None, 1, 10);
        rec.points_earned = 1;
        assert!(PointDelta::from_record(&rec).is_err());

        let rec = record(StudyMode::Solo, Some(Uuid::new_v4()), 1, 10);
        assert!(PointDelta::from_record(&rec).is_err());
    }

    #[test]
    fn test_from_record_with_deleted_group() {
        let rec = record(StudyMode::Group, None, 0, 30);
        let delta = PointDelta::from_record(&rec).unwrap();
        assert_eq!(delta.group_id, None);
        assert_eq!(delta.points, 30);
    }

    #[test]
    fn test_apply_to_balance_never_negative() {
        assert_eq!(apply_to_balance(10, -10).unwrap(), 0);
        assert_eq!(
            apply_to_balance(10, -11),
            Err(LedgerError::NegativeBalance {
                balance: 10,
                delta: -11
            })
        );
        assert!(apply_to_balance(i64::MAX, 1).is_err());
    }
}
