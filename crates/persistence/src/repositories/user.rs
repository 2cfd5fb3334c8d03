//! User repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{UserEntity, UserSummaryEntity};
use crate::metrics::QueryTimer;

const USER_COLUMNS: &str = "id, email, password_hash, display_name, bio, photo_url, photo_stored, \
     followers_count, following_count, total_points, total_study_minutes, created_at, updated_at";

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create a new user with zero balances.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            INSERT INTO users (email, password_hash, display_name)
            VALUES (LOWER($1), $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update profile fields. `None` leaves a field unchanged.
    ///
    /// `photo` carries the new URL and whether our image store issued it.
    pub async fn update_profile(
        &self,
        id: Uuid,
        display_name: Option<&str>,
        bio: Option<&str>,
        photo: Option<(&str, bool)>,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user_profile");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                bio = COALESCE($3, bio),
                photo_url = COALESCE($4, photo_url),
                photo_stored = COALESCE($5, photo_stored),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(display_name)
        .bind(bio)
        .bind(photo.map(|(url, _)| url))
        .bind(photo.map(|(_, stored)| stored))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Users whose display name starts with `prefix`, excluding `exclude`.
    pub async fn search(
        &self,
        exclude: Uuid,
        prefix: Option<&str>,
        limit: i64,
    ) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("search_users");
        let pattern = prefix.map(|p| format!("{}%", escape_like(&p.to_lowercase())));
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT id, display_name, photo_url
            FROM users
            WHERE id <> $1
              AND ($2::text IS NULL OR LOWER(display_name) LIKE $2 ESCAPE '\')
            ORDER BY display_name ASC, id ASC
            LIMIT $3
            "#,
        )
        .bind(exclude)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Display name of a user, used for denormalized names.
    pub async fn display_name(&self, id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_display_name");
        let result = sqlx::query_scalar::<_, String>("SELECT display_name FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }
}

fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
