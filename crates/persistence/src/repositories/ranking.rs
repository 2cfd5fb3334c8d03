//! Leaderboard queries over the point balances.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{GroupRankingEntity, UserRankingEntity};
use crate::metrics::QueryTimer;

const RANKED_USERS: &str = r#"
    SELECT ROW_NUMBER() OVER (
               ORDER BY total_points DESC, total_study_minutes DESC, created_at ASC, id ASC
           ) AS rank,
           id AS user_id, display_name, photo_url, total_points, total_study_minutes
    FROM users
"#;

#[derive(Clone)]
pub struct RankingRepository {
    pool: PgPool,
}

impl RankingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Top users by points, ties broken by study minutes.
    pub async fn top_users(&self, limit: i64) -> Result<Vec<UserRankingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("ranking_top_users");
        let result = sqlx::query_as::<_, UserRankingEntity>(&format!(
            "{RANKED_USERS} ORDER BY rank ASC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The given user's position on the user leaderboard.
    pub async fn user_rank(&self, user_id: Uuid) -> Result<Option<UserRankingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("ranking_user_rank");
        let result = sqlx::query_as::<_, UserRankingEntity>(&format!(
            "SELECT * FROM ({RANKED_USERS}) ranked WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn top_groups(&self, limit: i64) -> Result<Vec<GroupRankingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("ranking_top_groups");
        let result = sqlx::query_as::<_, GroupRankingEntity>(
            r#"
            SELECT ROW_NUMBER() OVER (ORDER BY total_points DESC, created_at ASC, id ASC) AS rank,
                   id AS group_id, name, image_url, current_members, total_points
            FROM groups
            ORDER BY rank ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
