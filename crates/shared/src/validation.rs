//! Common validation utilities used by request DTOs.

use validator::ValidationError;

/// Maximum hours a single study session may report.
pub const MAX_STUDY_HOURS: i32 = 24;

/// Maximum minutes component of a study session.
pub const MAX_STUDY_MINUTES: i32 = 59;

/// Maximum number of categories a group may carry.
pub const MAX_GROUP_CATEGORIES: usize = 10;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a string is not empty after trimming whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("blank", "Must not be blank"))
    } else {
        Ok(())
    }
}

/// Validates the hours component of a study session (0 to 24).
pub fn validate_study_hours(hours: i32) -> Result<(), ValidationError> {
    if (0..=MAX_STUDY_HOURS).contains(&hours) {
        Ok(())
    } else {
        Err(error("hours_range", "Hours must be between 0 and 24"))
    }
}

/// Validates the minutes component of a study session (0 to 59).
pub fn validate_study_minutes(minutes: i32) -> Result<(), ValidationError> {
    if (0..=MAX_STUDY_MINUTES).contains(&minutes) {
        Ok(())
    } else {
        Err(error("minutes_range", "Minutes must be between 0 and 59"))
    }
}

/// Validates a list of category tags: bounded count, each non-blank.
pub fn validate_categories(categories: &[String]) -> Result<(), ValidationError> {
    if categories.len() > MAX_GROUP_CATEGORIES {
        return Err(error("categories_count", "At most 10 categories are allowed"));
    }
    if categories.iter().any(|c| c.trim().is_empty()) {
        return Err(error("categories_blank", "Categories must not be blank"));
    }
    Ok(())
}

/// Validates a list of weekday names as used on group applications.
pub fn validate_weekdays(days: &[String]) -> Result<(), ValidationError> {
    const DAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];
    if days
        .iter()
        .all(|d| DAYS.contains(&d.to_ascii_lowercase().as_str()))
    {
        Ok(())
    } else {
        Err(error("weekday", "Available days must be weekday abbreviations"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("read chapter 3").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   \n\t").is_err());
    }

    #[test]
    fn test_validate_study_hours() {
        assert!(validate_study_hours(0).is_ok());
        assert!(validate_study_hours(24).is_ok());
        assert!(validate_study_hours(25).is_err());
        assert!(validate_study_hours(-1).is_err());
    }

    #[test]
    fn test_validate_study_minutes() {
        assert!(validate_study_minutes(0).is_ok());
        assert!(validate_study_minutes(55).is_ok());
        assert!(validate_study_minutes(59).is_ok());
        assert!(validate_study_minutes(60).is_err());
        assert!(validate_study_minutes(-5).is_err());
    }

    #[test]
    fn test_validate_categories() {
        assert!(validate_categories(&[]).is_ok());
        assert!(validate_categories(&["math".into(), "toeic".into()]).is_ok());
        assert!(validate_categories(&[" ".into()]).is_err());
        let many: Vec<String> = (0..11).map(|i| format!("c{}", i)).collect();
        assert!(validate_categories(&many).is_err());
    }

    #[test]
    fn test_validate_weekdays() {
        assert!(validate_weekdays(&["Mon".into(), "sat".into()]).is_ok());
        assert!(validate_weekdays(&[]).is_ok());
        assert!(validate_weekdays(&["someday".into()]).is_err());
    }

    #[test]
    fn test_error_message_set() {
        let err = validate_study_hours(30).unwrap_err();
        assert_eq!(err.code, "hours_range");
        assert!(err.message.is_some());
    }
}
