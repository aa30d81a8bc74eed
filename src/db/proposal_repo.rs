// src/db/proposal_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::proposal::Proposal};

const PROPOSAL_COLUMNS: &str = r#"
    id, proposal_number, title, status, version, deal_id, client_id, content,
    total_value, sent_date, valid_until, document_id, created_by_id,
    created_at, updated_at
"#;

fn select_by_id(for_update: bool) -> String {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    format!("SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = $1{lock}")
}

#[derive(Clone, Default)]
pub struct ProposalRepository;

impl ProposalRepository {
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Proposal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = select_by_id(false);
        let proposal = sqlx::query_as::<_, Proposal>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(proposal)
    }

    /// Lê e trava a linha até o fim da transação. Só para quem vai escrevê-la.
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Proposal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = select_by_id(true);
        let proposal = sqlx::query_as::<_, Proposal>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(proposal)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Proposal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PROPOSAL_COLUMNS} FROM proposals ORDER BY proposal_number DESC");
        let proposals = sqlx::query_as::<_, Proposal>(&sql).fetch_all(executor).await?;

        Ok(proposals)
    }

    pub async fn insert<'e, E>(&self, executor: E, proposal: &Proposal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO proposals (
                id, proposal_number, title, status, version, deal_id, client_id, content,
                total_value, sent_date, valid_until, document_id, created_by_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(proposal.id)
        .bind(proposal.proposal_number.as_str())
        .bind(proposal.title.as_str())
        .bind(proposal.status)
        .bind(proposal.version)
        .bind(proposal.deal_id)
        .bind(proposal.client_id)
        .bind(proposal.content.as_deref())
        .bind(proposal.total_value)
        .bind(proposal.sent_date)
        .bind(proposal.valid_until)
        .bind(proposal.document_id)
        .bind(proposal.created_by_id)
        .bind(proposal.created_at)
        .bind(proposal.updated_at)
        .execute(executor)
        .await
        .map_err(|e| {
            // Número repetido = corrida na sequência; o orquestrador tenta de novo
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!(
                        "Número de proposta '{}' já utilizado.",
                        proposal.proposal_number
                    ));
                }
            }
            e.into()
        })?;

        Ok(())
    }

    pub async fn update<'e, E>(&self, executor: E, proposal: &Proposal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE proposals SET
                title = $2, status = $3, version = $4, deal_id = $5, client_id = $6,
                content = $7, total_value = $8, sent_date = $9, valid_until = $10,
                document_id = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(proposal.id)
        .bind(proposal.title.as_str())
        .bind(proposal.status)
        .bind(proposal.version)
        .bind(proposal.deal_id)
        .bind(proposal.client_id)
        .bind(proposal.content.as_deref())
        .bind(proposal.total_value)
        .bind(proposal.sent_date)
        .bind(proposal.valid_until)
        .bind(proposal.document_id)
        .bind(proposal.updated_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("proposal", proposal.id));
        }
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM proposals WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
