// src/db/pg.rs

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        unit_of_work::{Database, UnitOfWork},
        ActivityRepository, DealRepository, LeadRepository, ProposalRepository, SequenceRepository,
    },
    models::{
        activity::{Activity, OwnerRef},
        deal::Deal,
        lead::Lead,
        proposal::Proposal,
    },
};

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Serializable: a reconciliação de leads precisa enxergar o estado lido
        // dentro da própria transação; disputas viram 40001 -> Conflict -> retry
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgUnitOfWork {
            tx: Some(tx),
            leads: LeadRepository,
            deals: DealRepository,
            proposals: ProposalRepository,
            activities: ActivityRepository,
            sequences: SequenceRepository,
        }))
    }
}

/// Transação Postgres. Se for descartada sem commit, o sqlx faz rollback.
pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
    leads: LeadRepository,
    deals: DealRepository,
    proposals: ProposalRepository,
    activities: ActivityRepository,
    sequences: SequenceRepository,
}

fn conn<'a>(tx: &'a mut Option<Transaction<'static, Postgres>>) -> Result<&'a mut PgConnection, AppError> {
    tx.as_deref_mut()
        .ok_or_else(|| AppError::InternalServerError(anyhow::anyhow!("Transação já finalizada")))
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_lead(&mut self, id: Uuid) -> Result<Option<Lead>, AppError> {
        self.leads.find_by_id(conn(&mut self.tx)?, id).await
    }

    async fn lock_lead(&mut self, id: Uuid) -> Result<Option<Lead>, AppError> {
        self.leads.find_for_update(conn(&mut self.tx)?, id).await
    }

    async fn list_leads(&mut self) -> Result<Vec<Lead>, AppError> {
        self.leads.list(conn(&mut self.tx)?).await
    }

    async fn insert_lead(&mut self, lead: &Lead) -> Result<(), AppError> {
        self.leads.insert(conn(&mut self.tx)?, lead).await
    }

    async fn update_lead(&mut self, lead: &Lead) -> Result<(), AppError> {
        self.leads.update(conn(&mut self.tx)?, lead).await
    }

    async fn delete_lead(&mut self, id: Uuid) -> Result<bool, AppError> {
        self.leads.delete(conn(&mut self.tx)?, id).await
    }

    async fn set_lead_deal(&mut self, lead_id: Uuid, deal_id: Option<Uuid>) -> Result<bool, AppError> {
        self.leads.set_deal(conn(&mut self.tx)?, lead_id, deal_id).await
    }

    async fn unlink_deal_leads(&mut self, deal_id: Uuid) -> Result<u64, AppError> {
        self.leads.unlink_deal(conn(&mut self.tx)?, deal_id).await
    }

    async fn lead_ids_for_deal(&mut self, deal_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        self.leads.ids_for_deal(conn(&mut self.tx)?, deal_id).await
    }

    async fn find_deal(&mut self, id: Uuid) -> Result<Option<Deal>, AppError> {
        self.deals.find_by_id(conn(&mut self.tx)?, id).await
    }

    async fn lock_deal(&mut self, id: Uuid) -> Result<Option<Deal>, AppError> {
        self.deals.find_for_update(conn(&mut self.tx)?, id).await
    }

    async fn list_deals(&mut self) -> Result<Vec<Deal>, AppError> {
        self.deals.list(conn(&mut self.tx)?).await
    }

    async fn insert_deal(&mut self, deal: &Deal) -> Result<(), AppError> {
        self.deals.insert(conn(&mut self.tx)?, deal).await
    }

    async fn update_deal(&mut self, deal: &Deal) -> Result<(), AppError> {
        self.deals.update(conn(&mut self.tx)?, deal).await
    }

    async fn delete_deal(&mut self, id: Uuid) -> Result<bool, AppError> {
        self.deals.delete(conn(&mut self.tx)?, id).await
    }

    async fn find_proposal(&mut self, id: Uuid) -> Result<Option<Proposal>, AppError> {
        self.proposals.find_by_id(conn(&mut self.tx)?, id).await
    }

    async fn lock_proposal(&mut self, id: Uuid) -> Result<Option<Proposal>, AppError> {
        self.proposals.find_for_update(conn(&mut self.tx)?, id).await
    }

    async fn list_proposals(&mut self) -> Result<Vec<Proposal>, AppError> {
        self.proposals.list(conn(&mut self.tx)?).await
    }

    async fn insert_proposal(&mut self, proposal: &Proposal) -> Result<(), AppError> {
        self.proposals.insert(conn(&mut self.tx)?, proposal).await
    }

    async fn update_proposal(&mut self, proposal: &Proposal) -> Result<(), AppError> {
        self.proposals.update(conn(&mut self.tx)?, proposal).await
    }

    async fn delete_proposal(&mut self, id: Uuid) -> Result<bool, AppError> {
        self.proposals.delete(conn(&mut self.tx)?, id).await
    }

    async fn insert_activity(&mut self, activity: &Activity) -> Result<(), AppError> {
        self.activities.insert(conn(&mut self.tx)?, activity).await
    }

    async fn list_activities(&mut self, owner: OwnerRef) -> Result<Vec<Activity>, AppError> {
        self.activities.list_for_owner(conn(&mut self.tx)?, owner).await
    }

    async fn delete_activities(&mut self, owner: OwnerRef) -> Result<u64, AppError> {
        self.activities.delete_for_owner(conn(&mut self.tx)?, owner).await
    }

    async fn increment_sequence(&mut self, period_key: &str) -> Result<i32, AppError> {
        self.sequences.increment(conn(&mut self.tx)?, period_key).await
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        match self.tx.take() {
            Some(tx) => {
                tx.commit().await?;
                Ok(())
            }
            None => Err(AppError::InternalServerError(anyhow::anyhow!("Transação já finalizada"))),
        }
    }
}
