// src/db/activity_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::activity::{Activity, OwnerRef},
};

#[derive(Clone, Default)]
pub struct ActivityRepository;

impl ActivityRepository {
    pub async fn insert<'e, E>(&self, executor: E, activity: &Activity) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO activities (
                id, owner_kind, owner_id, activity_type, description, date,
                performed_by_id, outcome, notes, follow_up_date, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(activity.id)
        .bind(activity.owner_kind)
        .bind(activity.owner_id)
        .bind(activity.activity_type)
        .bind(activity.description.as_str())
        .bind(activity.date)
        .bind(activity.performed_by_id)
        .bind(activity.outcome.as_deref())
        .bind(activity.notes.as_deref())
        .bind(activity.follow_up_date)
        .bind(activity.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn list_for_owner<'e, E>(&self, executor: E, owner: OwnerRef) -> Result<Vec<Activity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT
                id, owner_kind, owner_id, activity_type, description, date,
                performed_by_id, outcome, notes, follow_up_date, created_at
            FROM activities
            WHERE owner_kind = $1 AND owner_id = $2
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(owner.kind)
        .bind(owner.id)
        .fetch_all(executor)
        .await?;

        Ok(activities)
    }

    pub async fn delete_for_owner<'e, E>(&self, executor: E, owner: OwnerRef) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM activities WHERE owner_kind = $1 AND owner_id = $2")
            .bind(owner.kind)
            .bind(owner.id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
