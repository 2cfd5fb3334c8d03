//! Chat room repository.
//!
//! Rooms are always read through one participant, so every room row carries
//! that participant's `unread_count` and `muted` flag.

use domain::models::chat::{RoomOutcome, START_CONVERSATION_PLACEHOLDER};
use domain::services::membership::{on_member_removed, RemovalAction};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::{ChatMessageEntity, ChatRoomEntity, MessageKindDb, UserSummaryEntity};
use crate::metrics::QueryTimer;

const ROOM_FOR_VIEWER: &str = r#"
    SELECT r.id, r.name, r.created_by, r.last_message, r.last_message_at,
           r.last_message_sender_id, r.created_at, p.unread_count, p.muted
    FROM chat_rooms r
    JOIN chat_participants p ON p.room_id = r.id AND p.user_id = $1
"#;

const MESSAGE_COLUMNS: &str = "id, room_id, sender_id, kind, text, created_at";

/// Whether the caller can see a room.
#[derive(Debug)]
pub enum RoomAccess {
    Participant(ChatRoomEntity),
    NotParticipant,
    NotFound,
}

#[derive(Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A room with exactly the two given participants, as seen by `viewer`.
    pub async fn find_direct_room(
        &self,
        viewer: Uuid,
        other: Uuid,
    ) -> Result<Option<ChatRoomEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_direct_chat_room");
        let result = sqlx::query_as::<_, ChatRoomEntity>(&format!(
            r#"
            {ROOM_FOR_VIEWER}
            WHERE EXISTS (
                    SELECT 1 FROM chat_participants o WHERE o.room_id = r.id AND o.user_id = $2
                )
              AND (SELECT COUNT(*) FROM chat_participants c WHERE c.room_id = r.id) = 2
            ORDER BY r.last_message_at DESC
            LIMIT 1
            "#
        ))
        .bind(viewer)
        .bind(other)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create a room for `creator` and `other`, both with zero unread.
    pub async fn create_room(
        &self,
        creator: Uuid,
        other: Uuid,
        name: &str,
    ) -> Result<ChatRoomEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_chat_room");
        let mut tx = self.pool.begin().await?;

        let room_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO chat_rooms (name, created_by, last_message)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(creator)
        .bind(START_CONVERSATION_PLACEHOLDER)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO chat_participants (room_id, user_id) VALUES ($1, $2), ($1, $3)",
        )
        .bind(room_id)
        .bind(creator)
        .bind(other)
        .execute(&mut *tx)
        .await?;

        let room = room_for_viewer(&mut tx, room_id, creator).await?;
        tx.commit().await?;
        timer.record();
        room.ok_or(sqlx::Error::RowNotFound)
    }

    /// Rooms of `viewer`, most recent activity first.
    pub async fn list_rooms(&self, viewer: Uuid) -> Result<Vec<ChatRoomEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_chat_rooms");
        let result = sqlx::query_as::<_, ChatRoomEntity>(&format!(
            r#"
            {ROOM_FOR_VIEWER}
            ORDER BY r.last_message_at DESC
            "#
        ))
        .bind(viewer)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Resolve a room for `viewer`, distinguishing missing rooms from rooms
    /// the viewer is not in.
    pub async fn access(&self, room_id: Uuid, viewer: Uuid) -> Result<RoomAccess, sqlx::Error> {
        let timer = QueryTimer::new("find_chat_room");
        let mut conn = self.pool.acquire().await?;
        let room = sqlx::query_as::<_, ChatRoomEntity>(&format!("{ROOM_FOR_VIEWER} WHERE r.id = $2"))
            .bind(viewer)
            .bind(room_id)
            .fetch_optional(&mut *conn)
            .await?;

        let access = match room {
            Some(room) => RoomAccess::Participant(room),
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM chat_rooms WHERE id = $1)")
                        .bind(room_id)
                        .fetch_one(&mut *conn)
                        .await?;
                if exists {
                    RoomAccess::NotParticipant
                } else {
                    RoomAccess::NotFound
                }
            }
        };
        timer.record();
        Ok(access)
    }

    pub async fn participants(&self, room_id: Uuid) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_chat_participants");
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT u.id, u.display_name, u.photo_url
            FROM chat_participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.room_id = $1
            ORDER BY p.joined_at ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Zero the viewer's unread counter. Other participants are untouched.
    pub async fn mark_read(&self, room_id: Uuid, viewer: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("mark_chat_room_read");
        let result = sqlx::query(
            "UPDATE chat_participants SET unread_count = 0 WHERE room_id = $1 AND user_id = $2",
        )
        .bind(room_id)
        .bind(viewer)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Insert a text message, update the room summary and bump every other
    /// participant's unread counter, in one transaction.
    ///
    /// Returns `None` if `sender` is not a participant.
    pub async fn send_message(
        &self,
        room_id: Uuid,
        sender: Uuid,
        text: &str,
    ) -> Result<Option<ChatMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("send_chat_message");
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM chat_rooms WHERE id = $1 FOR UPDATE")
                .bind(room_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() || !participant_in_tx(&mut tx, room_id, sender).await? {
            return Ok(None);
        }

        let message =
            insert_message(&mut tx, room_id, Some(sender), MessageKindDb::Text, text).await?;

        sqlx::query(
            r#"
            UPDATE chat_participants SET unread_count = unread_count + 1
            WHERE room_id = $1 AND user_id <> $2
            "#,
        )
        .bind(room_id)
        .bind(sender)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(message))
    }

    /// The latest `limit` messages, oldest first.
    pub async fn list_messages(
        &self,
        room_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ChatMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_chat_messages");
        let result = sqlx::query_as::<_, ChatMessageEntity>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM (
                SELECT {MESSAGE_COLUMNS} FROM chat_messages
                WHERE room_id = $1
                ORDER BY created_at DESC
                LIMIT $2
            ) latest
            ORDER BY created_at ASC
            "#
        ))
        .bind(room_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Add a participant with zero unread and post `notice`.
    ///
    /// Returns false if the user was already in the room.
    pub async fn add_participant(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        notice: &str,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("add_chat_participant");
        let mut tx = self.pool.begin().await?;

        let added = sqlx::query(
            r#"
            INSERT INTO chat_participants (room_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (room_id, user_id) DO NOTHING
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if added {
            insert_message(&mut tx, room_id, None, MessageKindDb::System, notice).await?;
            tx.commit().await?;
        }
        timer.record();
        Ok(added)
    }

    /// Rename the room and post `notice`.
    pub async fn rename(&self, room_id: Uuid, name: &str, notice: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("rename_chat_room");
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE chat_rooms SET name = $2 WHERE id = $1")
            .bind(room_id)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        insert_message(&mut tx, room_id, None, MessageKindDb::System, notice).await?;

        tx.commit().await?;
        timer.record();
        Ok(())
    }

    /// Flip the viewer's mute flag, returning the new value.
    pub async fn toggle_mute(&self, room_id: Uuid, viewer: Uuid) -> Result<Option<bool>, sqlx::Error> {
        let timer = QueryTimer::new("toggle_chat_mute");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE chat_participants SET muted = NOT muted
            WHERE room_id = $1 AND user_id = $2
            RETURNING muted
            "#,
        )
        .bind(room_id)
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Remove a participant. If fewer than the minimum would remain the room
    /// is deleted, otherwise `notice` is posted.
    ///
    /// Returns `None` if `user_id` was not in the room.
    pub async fn remove_participant(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        notice: &str,
    ) -> Result<Option<RoomOutcome>, sqlx::Error> {
        let timer = QueryTimer::new("remove_chat_participant");
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM chat_rooms WHERE id = $1 FOR UPDATE")
                .bind(room_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let before: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chat_participants WHERE room_id = $1")
                .bind(room_id)
                .fetch_one(&mut *tx)
                .await?;

        let removed = sqlx::query("DELETE FROM chat_participants WHERE room_id = $1 AND user_id = $2")
            .bind(room_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            return Ok(None);
        }

        let outcome = match on_member_removed(before) {
            RemovalAction::Dissolve => {
                sqlx::query("DELETE FROM chat_rooms WHERE id = $1")
                    .bind(room_id)
                    .execute(&mut *tx)
                    .await?;
                RoomOutcome::RoomDeleted
            }
            RemovalAction::RemoveMember { remaining } => {
                insert_message(&mut tx, room_id, None, MessageKindDb::System, notice).await?;
                RoomOutcome::Removed {
                    remaining_participants: remaining as i32,
                }
            }
        };

        tx.commit().await?;
        timer.record();
        Ok(Some(outcome))
    }
}

async fn room_for_viewer(
    tx: &mut Transaction<'_, Postgres>,
    room_id: Uuid,
    viewer: Uuid,
) -> Result<Option<ChatRoomEntity>, sqlx::Error> {
    sqlx::query_as::<_, ChatRoomEntity>(&format!("{ROOM_FOR_VIEWER} WHERE r.id = $2"))
        .bind(viewer)
        .bind(room_id)
        .fetch_optional(&mut **tx)
        .await
}

async fn participant_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    room_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM chat_participants WHERE room_id = $1 AND user_id = $2)",
    )
    .bind(room_id)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await
}

/// Insert a message and make it the room's latest.
async fn insert_message(
    tx: &mut Transaction<'_, Postgres>,
    room_id: Uuid,
    sender: Option<Uuid>,
    kind: MessageKindDb,
    text: &str,
) -> Result<ChatMessageEntity, sqlx::Error> {
    let message = sqlx::query_as::<_, ChatMessageEntity>(&format!(
        r#"
        INSERT INTO chat_messages (room_id, sender_id, kind, text)
        VALUES ($1, $2, $3, $4)
        RETURNING {MESSAGE_COLUMNS}
        "#
    ))
    .bind(room_id)
    .bind(sender)
    .bind(kind)
    .bind(text)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE chat_rooms
        SET last_message = $2, last_message_at = $3, last_message_sender_id = $4
        WHERE id = $1
        "#,
    )
    .bind(room_id)
    .bind(&message.text)
    .bind(message.created_at)
    .bind(sender)
    .execute(&mut **tx)
    .await?;

    Ok(message)
}
