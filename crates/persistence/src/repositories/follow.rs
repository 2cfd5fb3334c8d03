//! Follow graph repository.
//!
//! Edge and both counters always change in one transaction. Both user rows
//! are locked in id order first, so a follow and a concurrent follow-back
//! queue behind each other.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserSummaryEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct FollowRepository {
    pool: PgPool,
}

impl FollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adds the edge `follower -> following`. Returns false if it already existed.
    pub async fn follow(&self, follower: Uuid, following: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("follow_user");
        let mut tx = self.pool.begin().await?;
        lock_pair(&mut tx, follower, following).await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, following_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(follower)
        .bind(following)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            adjust_counters(&mut tx, follower, following, 1).await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(inserted)
    }

    /// Removes the edge. Returns false if there was none.
    pub async fn unfollow(&self, follower: Uuid, following: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("unfollow_user");
        let mut tx = self.pool.begin().await?;
        lock_pair(&mut tx, follower, following).await?;

        let deleted = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
            .bind(follower)
            .bind(following)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            == 1;

        if deleted {
            adjust_counters(&mut tx, follower, following, -1).await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(deleted)
    }

    /// Returns (a follows b, b follows a).
    pub async fn status(&self, a: Uuid, b: Uuid) -> Result<(bool, bool), sqlx::Error> {
        let timer = QueryTimer::new("follow_status");
        let result = sqlx::query_as::<_, (bool, bool)>(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2),
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $2 AND following_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn followers(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_followers");
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT u.id, u.display_name, u.photo_url
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.following_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn following(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_following");
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT u.id, u.display_name, u.photo_url
            FROM follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn followers_count(&self, user_id: Uuid) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>("SELECT followers_count FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }
}

async fn lock_pair(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    a: Uuid,
    b: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT id FROM users WHERE id = ANY($1) ORDER BY id FOR NO KEY UPDATE")
        .bind(vec![a, b])
        .fetch_all(&mut **tx)
        .await?;
    Ok(())
}

async fn adjust_counters(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    follower: Uuid,
    following: Uuid,
    step: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET following_count = following_count + $2 WHERE id = $1")
        .bind(follower)
        .bind(step)
        .execute(&mut **tx)
        .await?;
    sqlx::query("UPDATE users SET followers_count = followers_count + $2 WHERE id = $1")
        .bind(following)
        .bind(step)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
