//! User profile domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A registered user with profile and point balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub display_name: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub followers_count: i32,
    pub following_count: i32,
    pub total_points: i64,
    pub total_study_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public profile returned by the users endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub followers_count: i32,
    pub following_count: i32,
    pub total_points: i64,
    pub total_study_minutes: i64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            bio: user.bio,
            photo_url: user.photo_url,
            followers_count: user.followers_count,
            following_count: user.following_count,
            total_points: user.total_points,
            total_study_minutes: user.total_study_minutes,
            created_at: user.created_at,
        }
    }
}

/// Compact user reference used in lists (members, followers, participants).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct UserSummary {
    pub id: Uuid,
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// Request to update the caller's profile. Absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, max = 50, message = "Display name must be 1-50 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub display_name: Option<String>,

    #[validate(length(max = 300, message = "Bio must be at most 300 characters"))]
    pub bio: Option<String>,

    #[validate(url(message = "Photo URL must be a valid URL"))]
    pub photo_url: Option<String>,

    /// New profile photo, uploaded through the image store. Takes precedence
    /// over `photo_url`.
    pub photo_base64: Option<String>,
}

/// Query parameters for user search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    pub limit: Option<i64>,
}

/// Response for user search.
#[derive(Debug, Clone, Serialize)]
pub struct ListUsersResponse {
    pub data: Vec<UserSummary>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "kim@example.com".to_string(),
            password_hash: Some("$argon2id$secret".to_string()),
            display_name: "Kim".to_string(),
            bio: None,
            photo_url: None,
            followers_count: 3,
            following_count: 1,
            total_points: 120,
            total_study_minutes: 120,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
        assert!(json.contains("total_points"));
    }

    #[test]
    fn test_profile_from_user() {
        let user = sample_user();
        let id = user.id;
        let profile: UserProfile = user.into();
        assert_eq!(profile.id, id);
        assert_eq!(profile.followers_count, 3);
        assert_eq!(profile.total_study_minutes, 120);
    }

    #[test]
    fn test_update_profile_validation() {
        let ok = UpdateProfileRequest {
            display_name: Some("Lee".into()),
            bio: Some("studying for finals".into()),
            photo_url: Some("https://cdn.example.com/a.png".into()),
            photo_base64: None,
        };
        assert!(ok.validate().is_ok());

        let blank = UpdateProfileRequest {
            display_name: Some("   ".into()),
            bio: None,
            photo_url: None,
            photo_base64: None,
        };
        assert!(blank.validate().is_err());

        let bad_url = UpdateProfileRequest {
            display_name: None,
            bio: None,
            photo_url: Some("not a url".into()),
            photo_base64: None,
        };
        assert!(bad_url.validate().is_err());

        let empty = UpdateProfileRequest {
            display_name: None,
            bio: None,
            photo_url: None,
            photo_base64: None,
        };
        assert!(empty.validate().is_ok());
    }
}
