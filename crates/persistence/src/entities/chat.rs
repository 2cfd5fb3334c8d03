//! Chat entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::MessageKind;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for message_kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "message_kind", rename_all = "lowercase")]
pub enum MessageKindDb {
    Text,
    System,
}

impl From<MessageKindDb> for MessageKind {
    fn from(db: MessageKindDb) -> Self {
        match db {
            MessageKindDb::Text => MessageKind::Text,
            MessageKindDb::System => MessageKind::System,
        }
    }
}

impl From<MessageKind> for MessageKindDb {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Text => MessageKindDb::Text,
            MessageKind::System => MessageKindDb::System,
        }
    }
}

/// A chat_rooms row joined with one participant's unread counter and mute flag.
#[derive(Debug, Clone, FromRow)]
pub struct ChatRoomEntity {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub last_message_sender_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub unread_count: i32,
    pub muted: bool,
}

impl From<ChatRoomEntity> for domain::models::ChatRoom {
    fn from(entity: ChatRoomEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            created_by: entity.created_by,
            last_message: entity.last_message,
            last_message_at: entity.last_message_at,
            last_message_sender_id: entity.last_message_sender_id,
            created_at: entity.created_at,
            unread_count: entity.unread_count,
            muted: entity.muted,
        }
    }
}

/// Database row mapping for the chat_messages table.
#[derive(Debug, Clone, FromRow)]
pub struct ChatMessageEntity {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: MessageKindDb,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessageEntity> for domain::models::ChatMessage {
    fn from(entity: ChatMessageEntity) -> Self {
        Self {
            id: entity.id,
            room_id: entity.room_id,
            sender_id: entity.sender_id,
            kind: entity.kind.into(),
            text: entity.text,
            created_at: entity.created_at,
        }
    }
}
