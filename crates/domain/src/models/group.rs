//! Study group domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;

/// Default member cap for new groups.
pub const DEFAULT_MAX_MEMBERS: i32 = 50;

/// A study group with its denormalized counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Group {
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

impl Group {
    /// Only the creator may rename, change the image, kick or delete.
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }

    pub fn is_full(&self) -> bool {
        self.current_members >= self.max_members
    }
}

/// Listing filter for groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupFilter {
    #[default]
    All,
    Monthly,
    Popular,
    Mine,
}

impl GroupFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupFilter::All => "all",
            GroupFilter::Monthly => "monthly",
            GroupFilter::Popular => "popular",
            GroupFilter::Mine => "mine",
        }
    }
}

impl FromStr for GroupFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(GroupFilter::All),
            "monthly" => Ok(GroupFilter::Monthly),
            "popular" => Ok(GroupFilter::Popular),
            "mine" => Ok(GroupFilter::Mine),
            _ => Err(format!("Invalid group filter: {}", s)),
        }
    }
}

impl fmt::Display for GroupFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to create a new group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateGroupRequest {
    #[validate(
        length(min = 1, max = 50, message = "Name must be 1-50 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,

    #[validate(
        length(min = 1, max = 500, message = "Description must be 1-500 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub description: String,

    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_categories"))]
    pub categories: Vec<String>,

    #[validate(range(min = 2, max = 200, message = "Max members must be between 2 and 200"))]
    pub max_members: Option<i32>,

    #[serde(default)]
    pub is_monthly: bool,

    /// Base64-encoded cover image.
    pub image_base64: Option<String>,
}

/// Request to update a group. Only the name and image can change.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateGroupRequest {
    #[validate(
        length(min = 1, max = 50, message = "Name must be 1-50 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: Option<String>,

    pub image_base64: Option<String>,
}

/// Query parameters for listing groups.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListGroupsQuery {
    #[serde(default)]
    pub filter: GroupFilter,
    pub limit: Option<i64>,
}

/// Group as listed, with the caller's membership flag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: Group,
    pub is_member: bool,
}

/// Response for group listings.
#[derive(Debug, Clone, Serialize)]
pub struct ListGroupsResponse {
    pub data: Vec<GroupSummary>,
    pub count: usize,
}

/// Group detail including members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub members: Vec<UserSummary>,
    pub is_member: bool,
    pub is_owner: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct JoinGroupResponse {
    pub group_id: Uuid,
    pub current_members: i32,
}

/// What happened to a group after a member left or was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipOutcome {
    /// The member was removed and the group lives on.
    Removed { remaining_members: i32 },
    /// Too few members would remain, so the group was deleted.
    GroupDissolved,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_group(created_by: Uuid) -> Group {
        Group {
            id: Uuid::new_v4(),
            name: "TOEIC 900".into(),
            description: "Morning study".into(),
            categories: vec!["language".into()],
            max_members: 2,
            current_members: 1,
            is_monthly: false,
            image_url: None,
            total_points: 0,
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_ownership_and_capacity() {
        let owner = Uuid::new_v4();
        let mut group = sample_group(owner);
        assert!(group.is_owner(owner));
        assert!(!group.is_owner(Uuid::new_v4()));
        assert!(!group.is_full());
        group.current_members = 2;
        assert!(group.is_full());
    }

    #[test]
    fn test_group_filter_from_str() {
        assert_eq!("monthly".parse::<GroupFilter>().unwrap(), GroupFilter::Monthly);
        assert_eq!("POPULAR".parse::<GroupFilter>().unwrap(), GroupFilter::Popular);
        assert_eq!("mine".parse::<GroupFilter>().unwrap(), GroupFilter::Mine);
        assert!("biggest".parse::<GroupFilter>().is_err());
        assert_eq!(GroupFilter::default(), GroupFilter::All);
        assert_eq!(GroupFilter::Monthly.to_string(), "monthly");
    }

    #[test]
    fn test_create_group_validation() {
        let request = CreateGroupRequest {
            name: "Algorithms".into(),
            description: "Solve two problems a day".into(),
            categories: vec!["cs".into()],
            max_members: None,
            is_monthly: true,
            image_base64: None,
        };
        assert!(request.validate().is_ok());

        let blank_name = CreateGroupRequest {
            name: "  ".into(),
            ..request.clone()
        };
        assert!(blank_name.validate().is_err());

        let empty_description = CreateGroupRequest {
            description: String::new(),
            ..request.clone()
        };
        assert!(empty_description.validate().is_err());

        let tiny = CreateGroupRequest {
            max_members: Some(1),
            ..request
        };
        assert!(tiny.validate().is_err());
    }

    #[test]
    fn test_create_group_defaults_from_json() {
        let request: CreateGroupRequest =
            serde_json::from_str(r#"{"name": "a", "description": "b"}"#).unwrap();
        assert!(request.categories.is_empty());
        assert!(!request.is_monthly);
        assert!(request.max_members.is_none());
    }

    #[test]
    fn test_summary_flattens_group() {
        let summary = GroupSummary {
            group: sample_group(Uuid::new_v4()),
            is_member: true,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["name"], "TOEIC 900");
        assert_eq!(json["is_member"], true);
    }

    #[test]
    fn test_membership_outcome_serialization() {
        let json = serde_json::to_value(MembershipOutcome::GroupDissolved).unwrap();
        assert_eq!(json, "group_dissolved");
        let json = serde_json::to_value(MembershipOutcome::Removed {
            remaining_members: 3,
        })
        .unwrap();
        assert_eq!(json["removed"]["remaining_members"], 3);
    }
}
