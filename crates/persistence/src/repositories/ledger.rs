//! Point ledger writes.
//!
//! This is the only module that touches `users.total_points`,
//! `users.total_study_minutes` and `groups.total_points`. Every function runs
//! on the caller's transaction so the balance change commits or rolls back
//! together with the study record insert or delete.

use domain::services::ledger::{apply_to_balance, LedgerError, PointDelta};
use sqlx::PgConnection;
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::QueryTimer;

#[derive(Debug, Error)]
pub enum LedgerStoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Balances after a delta was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedBalances {
    pub user_points: i64,
    pub user_minutes: i64,
    /// `None` when the delta had no group part or the group no longer exists.
    pub group_points: Option<i64>,
}

/// Applies `delta` to the user and, if present, the group balance.
///
/// Rows are locked with `FOR UPDATE` and the new balances computed with
/// [`apply_to_balance`], so a reversal that would drive a balance negative
/// fails instead of writing.
pub async fn apply_delta(
    conn: &mut PgConnection,
    delta: &PointDelta,
) -> Result<AppliedBalances, LedgerStoreError> {
    let timer = QueryTimer::new("apply_point_delta");

    let (points, minutes): (i64, i64) = sqlx::query_as(
        "SELECT total_points, total_study_minutes FROM users WHERE id = $1 FOR UPDATE",
    )
    .bind(delta.user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(sqlx::Error::RowNotFound)?;

    let user_points = apply_to_balance(points, delta.points)?;
    let user_minutes = apply_to_balance(minutes, delta.minutes)?;

    sqlx::query(
        r#"
        UPDATE users
        SET total_points = $2, total_study_minutes = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(delta.user_id)
    .bind(user_points)
    .bind(user_minutes)
    .execute(&mut *conn)
    .await?;

    let group_points = match delta.group_id {
        Some(group_id) => apply_group_points(conn, group_id, delta.points).await?,
        None => None,
    };

    timer.record();
    tracing::debug!(
        user_id = %delta.user_id,
        group_id = ?delta.group_id,
        points = delta.points,
        minutes = delta.minutes,
        "Applied point delta"
    );

    Ok(AppliedBalances {
        user_points,
        user_minutes,
        group_points,
    })
}

/// Reverses a delta previously applied with [`apply_delta`].
pub async fn reverse_delta(
    conn: &mut PgConnection,
    delta: &PointDelta,
) -> Result<AppliedBalances, LedgerStoreError> {
    apply_delta(conn, &delta.reversed()).await
}

async fn apply_group_points(
    conn: &mut PgConnection,
    group_id: Uuid,
    points: i64,
) -> Result<Option<i64>, LedgerStoreError> {
    let current: Option<(i64,)> =
        sqlx::query_as("SELECT total_points FROM groups WHERE id = $1 FOR UPDATE")
            .bind(group_id)
            .fetch_optional(&mut *conn)
            .await?;

    // A deleted group took its balance with it.
    let Some((balance,)) = current else {
        return Ok(None);
    };

    let next = apply_to_balance(balance, points)?;
    sqlx::query("UPDATE groups SET total_points = $2, updated_at = NOW() WHERE id = $1")
        .bind(group_id)
        .bind(next)
        .execute(&mut *conn)
        .await?;

    Ok(Some(next))
}
