// src/db/lead_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::lead::Lead};

const LEAD_COLUMNS: &str = r#"
    id, name, company, email, phone, source, status, priority, estimated_value,
    assigned_to_id, deal_id, deal_opportunity_id,
    last_contact, next_contact_date, conversion_date,
    tags, notes, created_at, updated_at
"#;

fn select_by_id(for_update: bool) -> String {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1{lock}")
}

#[derive(Clone, Default)]
pub struct LeadRepository;

impl LeadRepository {
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = select_by_id(false);
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(lead)
    }

    /// Lê e trava a linha até o fim da transação. Só para quem vai escrevê-la.
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = select_by_id(true);
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(lead)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads ORDER BY created_at DESC, id");
        let leads = sqlx::query_as::<_, Lead>(&sql).fetch_all(executor).await?;

        Ok(leads)
    }

    pub async fn insert<'e, E>(&self, executor: E, lead: &Lead) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO leads (
                id, name, company, email, phone, source, status, priority, estimated_value,
                assigned_to_id, deal_id, deal_opportunity_id,
                last_contact, next_contact_date, conversion_date,
                tags, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(lead.id)
        .bind(lead.name.as_str())
        .bind(lead.company.as_deref())
        .bind(lead.email.as_deref())
        .bind(lead.phone.as_deref())
        .bind(lead.source)
        .bind(lead.status)
        .bind(lead.priority)
        .bind(lead.estimated_value)
        .bind(lead.assigned_to_id)
        .bind(lead.deal_id)
        .bind(lead.deal_opportunity_id)
        .bind(lead.last_contact)
        .bind(lead.next_contact_date)
        .bind(lead.conversion_date)
        .bind(&lead.tags[..])
        .bind(lead.notes.as_deref())
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn update<'e, E>(&self, executor: E, lead: &Lead) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE leads SET
                name = $2, company = $3, email = $4, phone = $5,
                source = $6, status = $7, priority = $8, estimated_value = $9,
                assigned_to_id = $10, deal_id = $11, deal_opportunity_id = $12,
                last_contact = $13, next_contact_date = $14, conversion_date = $15,
                tags = $16, notes = $17, updated_at = $18
            WHERE id = $1
            "#,
        )
        .bind(lead.id)
        .bind(lead.name.as_str())
        .bind(lead.company.as_deref())
        .bind(lead.email.as_deref())
        .bind(lead.phone.as_deref())
        .bind(lead.source)
        .bind(lead.status)
        .bind(lead.priority)
        .bind(lead.estimated_value)
        .bind(lead.assigned_to_id)
        .bind(lead.deal_id)
        .bind(lead.deal_opportunity_id)
        .bind(lead.last_contact)
        .bind(lead.next_contact_date)
        .bind(lead.conversion_date)
        .bind(&lead.tags[..])
        .bind(lead.notes.as_deref())
        .bind(lead.updated_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("lead", lead.id));
        }
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_deal<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        deal_id: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE leads SET deal_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(lead_id)
            .bind(deal_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn unlink_deal<'e, E>(&self, executor: E, deal_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE leads SET deal_id = NULL, updated_at = NOW() WHERE deal_id = $1")
            .bind(deal_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn ids_for_deal<'e, E>(&self, executor: E, deal_id: Uuid) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM leads WHERE deal_id = $1 ORDER BY created_at, id",
        )
        .bind(deal_id)
        .fetch_all(executor)
        .await?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_mutation_path_locks_the_row() {
        assert!(!select_by_id(false).contains("FOR UPDATE"));
        assert!(select_by_id(true).trim_end().ends_with("WHERE id = $1 FOR UPDATE"));
    }
}
