//! Group message board repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::GroupMessageEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct GroupMessageRepository {
    pool: PgPool,
}

impl GroupMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        group_id: Uuid,
        sender_id: Uuid,
        text: &str,
    ) -> Result<GroupMessageEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_group_message");
        let result = sqlx::query_as::<_, GroupMessageEntity>(
            r#"
            WITH inserted AS (
                INSERT INTO group_messages (group_id, sender_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, group_id, sender_id, text, created_at
            )
            SELECT i.id, i.group_id, i.sender_id, u.display_name AS sender_name, i.text, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.sender_id
            "#,
        )
        .bind(group_id)
        .bind(sender_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The latest `limit` messages, returned oldest first.
    pub async fn list(
        &self,
        group_id: Uuid,
        limit: i64,
    ) -> Result<Vec<GroupMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_group_messages");
        let result = sqlx::query_as::<_, GroupMessageEntity>(
            r#"
            SELECT * FROM (
                SELECT m.id, m.group_id, m.sender_id, u.display_name AS sender_name, m.text, m.created_at
                FROM group_messages m
                JOIN users u ON u.id = m.sender_id
                WHERE m.group_id = $1
                ORDER BY m.created_at DESC
                LIMIT $2
            ) latest
            ORDER BY created_at ASC
            "#,
        )
        .bind(group_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
