//! Group application repository.

use sqlx::PgPool;
use uuid::Uuid;

use super::group::{add_member, JoinOutcome};
use crate::entities::{ApplicationStatusDb, GroupApplicationEntity};
use crate::metrics::QueryTimer;

const APPLICATION_COLUMNS: &str =
    "id, group_id, user_id, name, major, intro, available_days, status, created_at, decided_at";

/// Result of deciding an application.
#[derive(Debug)]
pub enum DecisionOutcome {
    Decided(GroupApplicationEntity),
    NotFound,
    NotPending,
    GroupFull,
}

#[derive(Clone)]
pub struct ApplicationRepository {
    pool: PgPool,
}

impl ApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending application. A second pending application for the
    /// same group and user violates a unique index.
    pub async fn create(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        name: &str,
        major: &str,
        intro: &str,
        available_days: &[String],
    ) -> Result<GroupApplicationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_group_application");
        let result = sqlx::query_as::<_, GroupApplicationEntity>(&format!(
            r#"
            INSERT INTO group_applications (group_id, user_id, name, major, intro, available_days)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(group_id)
        .bind(user_id)
        .bind(name)
        .bind(major)
        .bind(intro)
        .bind(available_days)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GroupApplicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_group_application");
        let result = sqlx::query_as::<_, GroupApplicationEntity>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM group_applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Pending applications of a group, oldest first.
    pub async fn list_pending(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<GroupApplicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_pending_applications");
        let result = sqlx::query_as::<_, GroupApplicationEntity>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM group_applications
            WHERE group_id = $1 AND status = 'pending'
            ORDER BY created_at ASC
            "#
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The user's most recent application to a group.
    pub async fn latest_for_user(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupApplicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("latest_group_application");
        let result = sqlx::query_as::<_, GroupApplicationEntity>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM group_applications
            WHERE group_id = $1 AND user_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Approve: add the applicant as a member and mark the application, atomically.
    pub async fn approve(&self, id: Uuid) -> Result<DecisionOutcome, sqlx::Error> {
        let timer = QueryTimer::new("approve_group_application");
        let mut tx = self.pool.begin().await?;

        let application = sqlx::query_as::<_, GroupApplicationEntity>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM group_applications WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(application) = application else {
            return Ok(DecisionOutcome::NotFound);
        };
        if application.status != ApplicationStatusDb::Pending {
            return Ok(DecisionOutcome::NotPending);
        }

        match add_member(&mut tx, application.group_id, application.user_id).await? {
            JoinOutcome::Joined { .. } | JoinOutcome::AlreadyMember => {}
            JoinOutcome::Full => return Ok(DecisionOutcome::GroupFull),
            JoinOutcome::NotFound => return Ok(DecisionOutcome::NotFound),
        }

        let decided = mark(&mut tx, id, ApplicationStatusDb::Approved).await?;
        tx.commit().await?;
        timer.record();
        Ok(DecisionOutcome::Decided(decided))
    }

    pub async fn reject(&self, id: Uuid) -> Result<DecisionOutcome, sqlx::Error> {
        let timer = QueryTimer::new("reject_group_application");
        let mut tx = self.pool.begin().await?;

        let status: Option<ApplicationStatusDb> = sqlx::query_scalar(
            "SELECT status FROM group_applications WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        match status {
            None => return Ok(DecisionOutcome::NotFound),
            Some(ApplicationStatusDb::Pending) => {}
            Some(_) => return Ok(DecisionOutcome::NotPending),
        }

        let decided = mark(&mut tx, id, ApplicationStatusDb::Rejected).await?;
        tx.commit().await?;
        timer.record();
        Ok(DecisionOutcome::Decided(decided))
    }
}

async fn mark(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    status: ApplicationStatusDb,
) -> Result<GroupApplicationEntity, sqlx::Error> {
    sqlx::query_as::<_, GroupApplicationEntity>(&format!(
        r#"
        UPDATE group_applications SET status = $2, decided_at = NOW()
        WHERE id = $1
        RETURNING {APPLICATION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .fetch_one(&mut **tx)
    .await
}
