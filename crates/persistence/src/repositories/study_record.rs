//! Study record repository.
//!
//! Inserts and deletes run in one transaction with the matching ledger write.

use chrono::{DateTime, NaiveDate, Utc};
use domain::services::ledger::PointDelta;
use sqlx::PgPool;
use uuid::Uuid;

use super::ledger::{self, AppliedBalances, LedgerStoreError};
use crate::entities::{StudyFeedEntity, StudyModeDb, StudyRecordEntity};
use crate::metrics::QueryTimer;

const RECORD_COLUMNS: &str = "id, user_id, study_mode, group_id, study_date, hours, minutes, \
     total_minutes, points_earned, description, image_url, created_at";

/// Values of a new record, already validated.
#[derive(Debug, Clone)]
pub struct NewStudyRecord<'a> {
    pub user_id: Uuid,
    pub study_mode: StudyModeDb,
    pub group_id: Option<Uuid>,
    pub study_date: NaiveDate,
    pub hours: i32,
    pub minutes: i32,
    pub total_minutes: i32,
    pub points_earned: i32,
    pub description: &'a str,
    pub image_url: Option<&'a str>,
}

/// Feed filters. Either filter may be combined with the keyset cursor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedFilter {
    pub user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub before: Option<(DateTime<Utc>, Uuid)>,
    pub limit: i64,
}

/// Outcome of a submission.
#[derive(Debug)]
pub enum CreateRecordOutcome {
    Created {
        record: StudyRecordEntity,
        balances: AppliedBalances,
    },
    GroupNotFound,
    NotGroupMember,
}

/// Outcome of an author delete.
#[derive(Debug)]
pub enum DeleteRecordOutcome {
    Deleted {
        record: StudyRecordEntity,
        balances: AppliedBalances,
    },
    NotFound,
    NotAuthor,
}

/// Repository for study record database operations.
#[derive(Clone)]
pub struct StudyRecordRepository {
    pool: PgPool,
}

impl StudyRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the record and credits `delta` in the same transaction.
    pub async fn create_with_credit(
        &self,
        record: &NewStudyRecord<'_>,
        delta: &PointDelta,
    ) -> Result<CreateRecordOutcome, LedgerStoreError> {
        let timer = QueryTimer::new("create_study_record");
        let mut tx = self.pool.begin().await?;

        // User row before group row, the order the ledger locks in.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(record.user_id)
            .fetch_optional(&mut *tx)
            .await?;

        // Membership is checked under the group lock that leave and kick also take.
        if let Some(group_id) = record.group_id {
            let is_member: Option<bool> = sqlx::query_scalar(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM group_memberships m
                    WHERE m.group_id = g.id AND m.user_id = $2
                )
                FROM groups g
                WHERE g.id = $1
                FOR UPDATE OF g
                "#,
            )
            .bind(group_id)
            .bind(record.user_id)
            .fetch_optional(&mut *tx)
            .await?;

            match is_member {
                None => return Ok(CreateRecordOutcome::GroupNotFound),
                Some(false) => return Ok(CreateRecordOutcome::NotGroupMember),
                Some(true) => {}
            }
        }

        let entity = sqlx::query_as::<_, StudyRecordEntity>(&format!(
            r#"
            INSERT INTO study_records
                (user_id, study_mode, group_id, study_date, hours, minutes,
                 total_minutes, points_earned, description, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(record.user_id)
        .bind(record.study_mode)
        .bind(record.group_id)
        .bind(record.study_date)
        .bind(record.hours)
        .bind(record.minutes)
        .bind(record.total_minutes)
        .bind(record.points_earned)
        .bind(record.description)
        .bind(record.image_url)
        .fetch_one(&mut *tx)
        .await?;

        let balances = ledger::apply_delta(&mut *tx, delta).await?;

        tx.commit().await?;
        timer.record();
        Ok(CreateRecordOutcome::Created {
            record: entity,
            balances,
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<StudyRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_study_record_by_id");
        let result = sqlx::query_as::<_, StudyRecordEntity>(&format!(
            "SELECT {RECORD_COLUMNS} FROM study_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Newest-first feed with author names.
    pub async fn feed(&self, filter: FeedFilter) -> Result<Vec<StudyFeedEntity>, sqlx::Error> {
        let timer = QueryTimer::new("study_record_feed");
        let (before_at, before_id) = match filter.before {
            Some((at, id)) => (Some(at), Some(id)),
            None => (None, None),
        };
        let result = sqlx::query_as::<_, StudyFeedEntity>(
            r#"
            SELECT r.id, r.user_id, r.study_mode, r.group_id, r.study_date, r.hours, r.minutes,
                   r.total_minutes, r.points_earned, r.description, r.image_url, r.created_at,
                   u.display_name AS author_name, u.photo_url AS author_photo_url
            FROM study_records r
            JOIN users u ON u.id = r.user_id
            WHERE ($1::uuid IS NULL OR r.user_id = $1)
              AND ($2::uuid IS NULL OR r.group_id = $2)
              AND ($3::timestamptz IS NULL OR (r.created_at, r.id) < ($3, $4))
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $5
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.group_id)
        .bind(before_at)
        .bind(before_id)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes the record if `author_id` wrote it, reversing its credit.
    ///
    /// The row is re-read under `FOR UPDATE`, so two concurrent deletes
    /// reverse the points once.
    pub async fn delete_with_reversal(
        &self,
        id: Uuid,
        author_id: Uuid,
    ) -> Result<DeleteRecordOutcome, LedgerStoreError> {
        let timer = QueryTimer::new("delete_study_record");
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, StudyRecordEntity>(&format!(
            "SELECT {RECORD_COLUMNS} FROM study_records WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            return Ok(DeleteRecordOutcome::NotFound);
        };
        if record.user_id != author_id {
            return Ok(DeleteRecordOutcome::NotAuthor);
        }

        let domain_record: domain::models::StudyRecord = record.clone().into();
        let delta = PointDelta::from_record(&domain_record)?;
        let balances = ledger::reverse_delta(&mut *tx, &delta).await?;

        sqlx::query("DELETE FROM study_records WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(DeleteRecordOutcome::Deleted { record, balances })
    }
}
