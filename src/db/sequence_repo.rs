// src/db/sequence_repo.rs

use sqlx::{Executor, Postgres};

use crate::common::error::AppError;

#[derive(Clone, Default)]
pub struct SequenceRepository;

impl SequenceRepository {
    /// Contador atômico por período. O UPSERT trava a linha do período até o
    /// fim da transação, então dois chamadores nunca recebem o mesmo valor.
    pub async fn increment<'e, E>(&self, executor: E, period_key: &str) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO proposal_sequences (period_key, last_value)
            VALUES ($1, 1)
            ON CONFLICT (period_key)
            DO UPDATE SET last_value = proposal_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(period_key)
        .fetch_one(executor)
        .await?;

        Ok(value)
    }
}
