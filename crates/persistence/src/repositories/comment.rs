//! Room comment repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::RoomCommentEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a comment, copying the author's current display name.
    pub async fn create(
        &self,
        room_id: &str,
        user_id: Uuid,
        text: &str,
    ) -> Result<RoomCommentEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_room_comment");
        let result = sqlx::query_as::<_, RoomCommentEntity>(
            r#"
            INSERT INTO room_comments (room_id, user_id, user_name, text)
            SELECT $1, u.id, u.display_name, $3
            FROM users u
            WHERE u.id = $2
            RETURNING id, room_id, user_id, user_name, text, created_at
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Comments of a room, newest first.
    pub async fn list(&self, room_id: &str, limit: i64) -> Result<Vec<RoomCommentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_room_comments");
        let result = sqlx::query_as::<_, RoomCommentEntity>(
            r#"
            SELECT id, room_id, user_id, user_name, text, created_at
            FROM room_comments
            WHERE room_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(room_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
