// src/db/deal_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::deal::Deal};

const DEAL_COLUMNS: &str = r#"
    id, title, description, stage, value, probability,
    expected_close_date, actual_close_date,
    owner_id, client_id, win_reason, loss_reason, tags,
    created_at, updated_at
"#;

fn select_by_id(for_update: bool) -> String {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    format!("SELECT {DEAL_COLUMNS} FROM deals WHERE id = $1{lock}")
}

#[derive(Clone, Default)]
pub struct DealRepository;

impl DealRepository {
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Deal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = select_by_id(false);
        let deal = sqlx::query_as::<_, Deal>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(deal)
    }

    /// Lê e trava a linha até o fim da transação. Só para quem vai escrevê-la.
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Deal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = select_by_id(true);
        let deal = sqlx::query_as::<_, Deal>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(deal)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Deal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {DEAL_COLUMNS} FROM deals ORDER BY created_at DESC, id");
        let deals = sqlx::query_as::<_, Deal>(&sql).fetch_all(executor).await?;

        Ok(deals)
    }

    pub async fn insert<'e, E>(&self, executor: E, deal: &Deal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO deals (
                id, title, description, stage, value, probability,
                expected_close_date, actual_close_date,
                owner_id, client_id, win_reason, loss_reason, tags,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(deal.id)
        .bind(deal.title.as_str())
        .bind(deal.description.as_deref())
        .bind(deal.stage)
        .bind(deal.value)
        .bind(deal.probability)
        .bind(deal.expected_close_date)
        .bind(deal.actual_close_date)
        .bind(deal.owner_id)
        .bind(deal.client_id)
        .bind(deal.win_reason.as_deref())
        .bind(deal.loss_reason.as_deref())
        .bind(&deal.tags[..])
        .bind(deal.created_at)
        .bind(deal.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn update<'e, E>(&self, executor: E, deal: &Deal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // actual_close_date só é gravada enquanto estiver nula
        let result = sqlx::query(
            r#"
            UPDATE deals SET
                title = $2, description = $3, stage = $4, value = $5, probability = $6,
                expected_close_date = $7,
                actual_close_date = COALESCE(actual_close_date, $8),
                owner_id = $9, client_id = $10, win_reason = $11, loss_reason = $12,
                tags = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(deal.id)
        .bind(deal.title.as_str())
        .bind(deal.description.as_deref())
        .bind(deal.stage)
        .bind(deal.value)
        .bind(deal.probability)
        .bind(deal.expected_close_date)
        .bind(deal.actual_close_date)
        .bind(deal.owner_id)
        .bind(deal.client_id)
        .bind(deal.win_reason.as_deref())
        .bind(deal.loss_reason.as_deref())
        .bind(&deal.tags[..])
        .bind(deal.updated_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("deal", deal.id));
        }
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM deals WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
