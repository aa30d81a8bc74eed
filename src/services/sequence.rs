// src/services/sequence.rs

use std::fmt;

use chrono::{DateTime, Datelike, Utc};

use crate::{common::error::AppError, db::UnitOfWork};

/// Ano + mês que delimitam a numeração das propostas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    year: i32,
    month: u32,
}

impl PeriodKey {
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    /// Chave do contador: ano completo, para não colidir entre séculos.
    pub fn storage_key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

// Formato exibido no número: YY-MM
impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.year.rem_euclid(100), self.month)
    }
}

// O número tem exatamente quatro dígitos de sequência
pub const MAX_SEQUENCE: i32 = 9999;

pub fn format_proposal_number(period: PeriodKey, sequence: i32) -> Result<String, AppError> {
    if !(1..=MAX_SEQUENCE).contains(&sequence) {
        return Err(AppError::InternalServerError(anyhow::anyhow!(
            "Sequência de propostas esgotada para {}: {}",
            period.storage_key(),
            sequence
        )));
    }
    Ok(format!("PROP-{period}-{sequence:04}"))
}

#[derive(Clone, Default)]
pub struct SequenceAllocator;

impl SequenceAllocator {
    /// Próximo número `PROP-YY-MM-NNNN` do período. Roda dentro da transação de
    /// quem chama: se ela for desfeita, o número não é consumido.
    pub async fn next_proposal_number(
        &self,
        uow: &mut dyn UnitOfWork,
        period: PeriodKey,
    ) -> Result<String, AppError> {
        let sequence = uow.increment_sequence(&period.storage_key()).await?;
        let number = format_proposal_number(period, sequence)?;

        tracing::debug!("🔢 Número de proposta alocado: {}", number);
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, MemoryDatabase};
    use crate::common::error::ErrorKind;
    use chrono::TimeZone;

    fn period(year: i32, month: u32) -> PeriodKey {
        PeriodKey::from_datetime(Utc.with_ymd_and_hms(year, month, 9, 12, 0, 0).unwrap())
    }

    #[test]
    fn formats_period_and_sequence() {
        let march = period(2026, 3);
        assert_eq!(march.to_string(), "26-03");
        assert_eq!(march.storage_key(), "2026-03");
        assert_eq!(format_proposal_number(march, 7).unwrap(), "PROP-26-03-0007");
        assert_eq!(format_proposal_number(march, MAX_SEQUENCE).unwrap(), "PROP-26-03-9999");
    }

    #[test]
    fn sequence_past_four_digits_is_an_error() {
        let err = format_proposal_number(period(2026, 3), MAX_SEQUENCE + 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn exhausted_period_rolls_back_without_a_number() {
        let db = MemoryDatabase::new();
        let march = period(2026, 3);

        {
            let mut uow = db.begin().await.unwrap();
            for _ in 0..MAX_SEQUENCE {
                uow.increment_sequence(&march.storage_key()).await.unwrap();
            }
            uow.commit().await.unwrap();
        }

        let mut uow = db.begin().await.unwrap();
        let err = SequenceAllocator.next_proposal_number(uow.as_mut(), march).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn concurrent_allocations_are_distinct_and_gapless() {
        let db = MemoryDatabase::new();
        let october = period(2026, 10);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move {
                    let mut uow = db.begin().await?;
                    let number = SequenceAllocator
                        .next_proposal_number(uow.as_mut(), october)
                        .await?;
                    uow.commit().await?;
                    Ok::<_, AppError>(number)
                })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap().unwrap());
        }
        numbers.sort();

        let expected: Vec<String> = (1..=16)
            .map(|n| format_proposal_number(october, n).unwrap())
            .collect();
        assert_eq!(numbers, expected);
    }

    #[tokio::test]
    async fn rolled_back_allocation_is_not_consumed() {
        let db = MemoryDatabase::new();
        let october = period(2026, 10);

        {
            let mut uow = db.begin().await.unwrap();
            SequenceAllocator.next_proposal_number(uow.as_mut(), october).await.unwrap();
            // descartada sem commit
        }

        let mut uow = db.begin().await.unwrap();
        let number = SequenceAllocator.next_proposal_number(uow.as_mut(), october).await.unwrap();
        assert_eq!(number, "PROP-26-10-0001");
    }

    #[tokio::test]
    async fn periods_count_independently() {
        let db = MemoryDatabase::new();
        let mut uow = db.begin().await.unwrap();

        let october = period(2026, 10);
        let november = period(2026, 11);
        SequenceAllocator.next_proposal_number(uow.as_mut(), october).await.unwrap();
        let first_november = SequenceAllocator.next_proposal_number(uow.as_mut(), november).await.unwrap();

        assert_eq!(first_november, "PROP-26-11-0001");
    }
}
