//! Chat room domain models and unread bookkeeping rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;

/// `last_message` of a room nobody has written in yet.
pub const START_CONVERSATION_PLACEHOLDER: &str = "start conversation";

/// Notification title used when the room has no name.
pub const DEFAULT_NOTIFICATION_TITLE: &str = "New message";

/// A chat room as seen by one participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatRoom {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub last_message_sender_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// The viewer's unread counter.
    pub unread_count: i32,
    /// Whether the viewer muted this room.
    pub muted: bool,
}

impl ChatRoom {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }
}

/// Room detail including the participant list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatRoomDetail {
    #[serde(flatten)]
    pub room: ChatRoom,
    pub participants: Vec<UserSummary>,
}

/// Message kinds. System messages have no sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    System,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::System => "system",
        }
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageKind::Text),
            "system" => Ok(MessageKind::System),
            _ => Err(format!("Invalid message kind: {}", s)),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatMessage {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: MessageKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// System message texts posted on membership changes.
pub mod system_text {
    pub fn invited(name: &str) -> String {
        format!("{} was invited", name)
    }

    pub fn renamed(name: &str) -> String {
        format!("Room renamed to \"{}\"", name)
    }

    pub fn left(name: &str) -> String {
        format!("{} left the room", name)
    }

    pub fn kicked(name: &str) -> String {
        format!("{} was removed from the room", name)
    }
}

/// Request to open (or reuse) a direct chat with another user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartChatRequest {
    pub other_user_id: Uuid,
    #[validate(length(max = 50, message = "Room name must be at most 50 characters"))]
    pub name: Option<String>,
}

/// Result of starting a chat.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StartChatResponse {
    pub room: ChatRoom,
    /// False when an existing room was reused.
    pub created: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(
        length(min = 1, max = 2000, message = "Message must be 1-2000 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteParticipantRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RenameRoomRequest {
    #[validate(
        length(min = 1, max = 50, message = "Room name must be 1-50 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MuteResponse {
    pub muted: bool,
}

/// Rooms of the caller with the total of their unread counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListChatRoomsResponse {
    pub data: Vec<ChatRoom>,
    pub count: usize,
    pub total_unread: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListChatMessagesResponse {
    pub data: Vec<ChatMessage>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListChatMessagesQuery {
    pub limit: Option<i64>,
}

/// What a participant leaving or being kicked did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomOutcome {
    Removed { remaining_participants: i32 },
    RoomDeleted,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    /// RFC 3339. `Z`, `+hh:mm` and `-hh:mm` offsets are all accepted.
    #[serde(default, deserialize_with = "deserialize_since")]
    pub since: Option<DateTime<Utc>>,
}

/// Parses an RFC 3339 timestamp from a query string.
///
/// An unescaped `+` offset reaches us as a space after form decoding, so a
/// trailing ` hh:mm` is read back as `+hh:mm`.
pub fn parse_since(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|err| match raw.rsplit_once(' ') {
            Some((stamp, offset)) => {
                DateTime::parse_from_rfc3339(&format!("{}+{}", stamp, offset))
            }
            None => Err(err),
        })
        .map(|dt| dt.with_timezone(&Utc))
}

fn deserialize_since<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_since(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// A room whose latest message should alert the viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatNotification {
    pub room_id: Uuid,
    pub title: String,
    pub body: String,
    pub unread_count: i32,
    pub last_message_at: DateTime<Utc>,
}

impl ChatNotification {
    /// Builds the alert for `room` if the viewer should be notified.
    ///
    /// The room must have advanced past `since`, the last message must come
    /// from someone else, the room must not be muted, and the viewer must
    /// still have unread messages.
    pub fn for_room(room: &ChatRoom, viewer: Uuid, since: Option<DateTime<Utc>>) -> Option<Self> {
        if let Some(since) = since {
            if room.last_message_at <= since {
                return None;
            }
        }
        if room.last_message_sender_id == Some(viewer) {
            return None;
        }
        if room.muted || room.unread_count <= 0 {
            return None;
        }

        let title = if room.name.trim().is_empty() {
            DEFAULT_NOTIFICATION_TITLE.to_string()
        } else {
            room.name.clone()
        };

        Some(Self {
            room_id: room.id,
            title,
            body: room.last_message.clone(),
            unread_count: room.unread_count,
            last_message_at: room.last_message_at,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListNotificationsResponse {
    pub data: Vec<ChatNotification>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_parse_since_offsets() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap();
        assert_eq!(parse_since("2024-05-01T01:00:00Z").unwrap(), expected);
        assert_eq!(parse_since("2024-05-01T10:00:00+09:00").unwrap(), expected);
        assert_eq!(parse_since("2024-05-01T10:00:00 09:00").unwrap(), expected);
        assert_eq!(parse_since("2024-04-30T20:00:00-05:00").unwrap(), expected);
        assert!(parse_since("yesterday").is_err());
    }

    #[test]
    fn test_notification_query_since() {
        let query: NotificationQuery =
            serde_json::from_value(serde_json::json!({ "since": "2024-05-01T10:00:00 09:00" }))
                .unwrap();
        assert_eq!(
            query.since,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap())
        );

        let empty: NotificationQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.since.is_none());
    }

    fn room(sender: Option<Uuid>, unread: i32, muted: bool) -> ChatRoom {
        ChatRoom {
            id: Uuid::new_v4(),
            name: "Study buddies".into(),
            created_by: Uuid::new_v4(),
            last_message: "see you at 9".into(),
            last_message_at: Utc::now(),
            last_message_sender_id: sender,
            created_at: Utc::now(),
            unread_count: unread,
            muted,
        }
    }

    #[test]
    fn test_notification_for_unread_message_from_other() {
        let viewer = Uuid::new_v4();
        let r = room(Some(Uuid::new_v4()), 2, false);
        let n = ChatNotification::for_room(&r, viewer, None).unwrap();
        assert_eq!(n.title, "Study buddies");
        assert_eq!(n.body, "see you at 9");
        assert_eq!(n.unread_count, 2);
    }

    #[test]
    fn test_no_notification_for_own_message() {
        let viewer = Uuid::new_v4();
        let r = room(Some(viewer), 2, false);
        assert!(ChatNotification::for_room(&r, viewer, None).is_none());
    }

    #[test]
    fn test_no_notification_when_muted_or_read() {
        let viewer = Uuid::new_v4();
        assert!(ChatNotification::for_room(&room(Some(Uuid::new_v4()), 2, true), viewer, None).is_none());
        assert!(ChatNotification::for_room(&room(Some(Uuid::new_v4()), 0, false), viewer, None).is_none());
    }

    #[test]
    fn test_no_notification_when_not_newer_than_since() {
        let viewer = Uuid::new_v4();
        let r = room(Some(Uuid::new_v4()), 1, false);
        let later = r.last_message_at + Duration::seconds(1);
        let earlier = r.last_message_at - Duration::seconds(1);
        assert!(ChatNotification::for_room(&r, viewer, Some(later)).is_none());
        assert!(ChatNotification::for_room(&r, viewer, Some(r.last_message_at)).is_none());
        assert!(ChatNotification::for_room(&r, viewer, Some(earlier)).is_some());
    }

    #[test]
    fn test_notification_default_title() {
        let mut r = room(None, 1, false);
        r.name = " ".into();
        let n = ChatNotification::for_room(&r, Uuid::new_v4(), None).unwrap();
        assert_eq!(n.title, DEFAULT_NOTIFICATION_TITLE);
    }

    #[test]
    fn test_system_texts() {
        assert_eq!(system_text::invited("Jin"), "Jin was invited");
        assert!(system_text::renamed("Night owls").contains("Night owls"));
        assert!(system_text::left("Jin").starts_with("Jin"));
        assert!(system_text::kicked("Jin").starts_with("Jin"));
    }

    #[test]
    fn test_message_kind_parse() {
        assert_eq!("system".parse::<MessageKind>().unwrap(), MessageKind::System);
        assert_eq!(MessageKind::Text.to_string(), "text");
        assert!("image".parse::<MessageKind>().is_err());
    }

    #[test]
    fn test_send_message_validation() {
        assert!(SendMessageRequest { text: "hi".into() }.validate().is_ok());
        assert!(SendMessageRequest { text: "  ".into() }.validate().is_err());
        assert!(RenameRoomRequest { name: "".into() }.validate().is_err());
    }
}
