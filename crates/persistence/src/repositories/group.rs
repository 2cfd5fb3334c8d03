//! Group repository for database operations.

use domain::models::group::{GroupFilter, MembershipOutcome};
use domain::services::membership::{on_member_removed, RemovalAction};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{GroupEntity, GroupWithMembershipEntity, UserSummaryEntity};
use crate::metrics::QueryTimer;

const GROUP_COLUMNS: &str = "id, name, description, categories, max_members, current_members, \
     is_monthly, image_url, total_points, created_by, created_at, updated_at";

/// Result of a join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { current_members: i32 },
    AlreadyMember,
    Full,
    NotFound,
}

/// Values for a new group.
#[derive(Debug, Clone)]
pub struct NewGroup<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub categories: &'a [String],
    pub max_members: i32,
    pub is_monthly: bool,
    pub image_url: Option<&'a str>,
    pub created_by: Uuid,
}

/// Repository for group-related database operations.
#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Creates a new GroupRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a group with the creator as its first member.
    pub async fn create_group(&self, group: &NewGroup<'_>) -> Result<GroupEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_group");
        let mut tx = self.pool.begin().await?;

        let entity = sqlx::query_as::<_, GroupEntity>(&format!(
            r#"
            INSERT INTO groups
                (name, description, categories, max_members, current_members, is_monthly, image_url, created_by)
            VALUES ($1, $2, $3, $4, 1, $5, $6, $7)
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(group.name)
        .bind(group.description)
        .bind(group.categories)
        .bind(group.max_members)
        .bind(group.is_monthly)
        .bind(group.image_url)
        .bind(group.created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO group_memberships (group_id, user_id) VALUES ($1, $2)")
            .bind(entity.id)
            .bind(group.created_by)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    /// Find a group by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_group_by_id");
        let result = sqlx::query_as::<_, GroupEntity>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List groups for the given filter, flagging the viewer's memberships.
    ///
    /// `Popular` orders by member count; the others list newest first.
    pub async fn list(
        &self,
        viewer: Uuid,
        filter: GroupFilter,
        limit: i64,
    ) -> Result<Vec<GroupWithMembershipEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_groups");
        let (condition, order) = match filter {
            GroupFilter::All => ("TRUE", "g.created_at DESC"),
            GroupFilter::Monthly => ("g.is_monthly", "g.created_at DESC"),
            GroupFilter::Popular => (
                "g.current_members >= 1",
                "g.current_members DESC, g.created_at DESC",
            ),
            GroupFilter::Mine => ("gm.user_id IS NOT NULL", "g.created_at DESC"),
        };
        let result = sqlx::query_as::<_, GroupWithMembershipEntity>(&format!(
            r#"
            SELECT g.id, g.name, g.description, g.categories, g.max_members, g.current_members,
                   g.is_monthly, g.image_url, g.total_points, g.created_by, g.created_at, g.updated_at,
                   (gm.user_id IS NOT NULL) AS is_member
            FROM groups g
            LEFT JOIN group_memberships gm ON gm.group_id = g.id AND gm.user_id = $1
            WHERE {condition}
            ORDER BY {order}
            LIMIT $2
            "#
        ))
        .bind(viewer)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Members of a group in join order.
    pub async fn members(&self, group_id: Uuid) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_group_members");
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT u.id, u.display_name, u.photo_url
            FROM group_memberships gm
            JOIN users u ON u.id = gm.user_id
            WHERE gm.group_id = $1
            ORDER BY gm.joined_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("is_group_member");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM group_memberships WHERE group_id = $1 AND user_id = $2)",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update name and/or image. `None` leaves a field unchanged.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Option<GroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_group");
        let result = sqlx::query_as::<_, GroupEntity>(&format!(
            r#"
            UPDATE groups
            SET name = COALESCE($2, name),
                image_url = COALESCE($3, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(image_url)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Add `user_id` as a member if there is room.
    pub async fn join(&self, group_id: Uuid, user_id: Uuid) -> Result<JoinOutcome, sqlx::Error> {
        let timer = QueryTimer::new("join_group");
        let mut tx = self.pool.begin().await?;

        let outcome = add_member(&mut tx, group_id, user_id).await?;
        if matches!(outcome, JoinOutcome::Joined { .. }) {
            tx.commit().await?;
        }
        timer.record();
        Ok(outcome)
    }

    /// Remove a member, deleting the group if too few would remain.
    ///
    /// Returns `None` if the group does not exist or `user_id` is not a member.
    pub async fn remove_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MembershipOutcome>, sqlx::Error> {
        let timer = QueryTimer::new("remove_group_member");
        let mut tx = self.pool.begin().await?;

        let members: Option<i32> =
            sqlx::query_scalar("SELECT current_members FROM groups WHERE id = $1 FOR UPDATE")
                .bind(group_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(members) = members else {
            return Ok(None);
        };

        let removed = sqlx::query("DELETE FROM group_memberships WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            return Ok(None);
        }

        let outcome = match on_member_removed(i64::from(members)) {
            RemovalAction::Dissolve => {
                sqlx::query("DELETE FROM groups WHERE id = $1")
                    .bind(group_id)
                    .execute(&mut *tx)
                    .await?;
                MembershipOutcome::GroupDissolved
            }
            RemovalAction::RemoveMember { remaining } => {
                let remaining = remaining as i32;
                sqlx::query(
                    "UPDATE groups SET current_members = $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(group_id)
                .bind(remaining)
                .execute(&mut *tx)
                .await?;
                MembershipOutcome::Removed {
                    remaining_members: remaining,
                }
            }
        };

        tx.commit().await?;
        timer.record();
        Ok(Some(outcome))
    }

    /// Delete a group. Messages, memberships and applications cascade; study
    /// records keep their row with `group_id` cleared.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_group");
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}

/// Inserts a membership under a `FOR UPDATE` lock on the group row.
///
/// Shared with application approval so both paths respect `max_members`.
pub(crate) async fn add_member(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<JoinOutcome, sqlx::Error> {
    let counts: Option<(i32, i32)> = sqlx::query_as(
        "SELECT current_members, max_members FROM groups WHERE id = $1 FOR UPDATE",
    )
    .bind(group_id)
    .fetch_optional(&mut **tx)
    .await?;
    let Some((current, max)) = counts else {
        return Ok(JoinOutcome::NotFound);
    };

    let already: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM group_memberships WHERE group_id = $1 AND user_id = $2)",
    )
    .bind(group_id)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;
    if already {
        return Ok(JoinOutcome::AlreadyMember);
    }
    if current >= max {
        return Ok(JoinOutcome::Full);
    }

    sqlx::query("INSERT INTO group_memberships (group_id, user_id) VALUES ($1, $2)")
        .bind(group_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    let current_members: i32 = sqlx::query_scalar(
        r#"
        UPDATE groups SET current_members = current_members + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING current_members
        "#,
    )
    .bind(group_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(JoinOutcome::Joined { current_members })
}
