// src/services/pipeline.rs

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
    common::error::{AppError, ErrorKind},
    db::{Database, UnitOfWork},
    models::{
        activity::{Activity, NewActivity, OwnerRef},
        deal::{Deal, DealChanges, NewDeal},
        lead::{Lead, LeadChanges, NewLead},
        proposal::{NewProposal, Proposal, ProposalChanges},
    },
    services::{
        activity_ledger::ActivityLedger, deal_service::DealService, lead_service::LeadService,
        proposal_service::ProposalService, sequence::SequenceAllocator,
    },
};

pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'a>>;

/// Limites de cada unidade de trabalho.
#[derive(Debug, Clone, Copy)]
pub struct TxSettings {
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl Default for TxSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 3,
        }
    }
}

/// Porta de entrada do funil de vendas. Cada operação pública é exatamente uma
/// transação: ou todas as escritas (entidade, atividades, vínculos, números)
/// são confirmadas juntas, ou nenhuma é.
#[derive(Clone)]
pub struct PipelineService {
    db: Arc<dyn Database>,
    ledger: ActivityLedger,
    leads: LeadService,
    deals: DealService,
    proposals: ProposalService,
    settings: TxSettings,
}

impl PipelineService {
    pub fn new(db: Arc<dyn Database>, settings: TxSettings) -> Self {
        let ledger = ActivityLedger;
        let leads = LeadService::new(ledger.clone());
        let deals = DealService::new(ledger.clone(), leads.clone());
        let proposals = ProposalService::new(SequenceAllocator);

        Self {
            db,
            ledger,
            leads,
            deals,
            proposals,
            settings,
        }
    }

    // =========================================================================
    //  UNIDADE DE TRABALHO
    // =========================================================================

    /// Roda `work` numa transação nova, com limite de tempo. Conflitos são
    /// repetidos com um snapshot novo até `max_attempts`.
    async fn transact<T, F>(&self, operation: &'static str, mut work: F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'a> FnMut(&'a mut dyn UnitOfWork) -> TxFuture<'a, T> + Send,
    {
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(self.settings.timeout, self.attempt(&mut work)).await {
                Ok(result) => result,
                // A transação foi descartada junto com o future: rollback
                Err(_) => Err(AppError::TransactionTimeout),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < self.settings.max_attempts => {
                    tracing::warn!("⚠️ Conflito em {} (tentativa {}): {}. Repetindo...", operation, attempt, e);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn attempt<T, F>(&self, work: &mut F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'a> FnMut(&'a mut dyn UnitOfWork) -> TxFuture<'a, T> + Send,
    {
        let mut uow = self.db.begin().await?;
        let value = work(uow.as_mut()).await?;
        uow.commit().await?;
        Ok(value)
    }

    // =========================================================================
    //  LEADS
    // =========================================================================

    pub async fn create_lead(&self, input: NewLead, actor: Uuid) -> Result<Lead, AppError> {
        ensure_actor(actor)?;
        let leads = self.leads.clone();
        self.transact("create_lead", move |uow| {
            let (leads, input) = (leads.clone(), input.clone());
            Box::pin(async move { leads.create(uow, input, actor).await })
        })
        .await
    }

    pub async fn update_lead(&self, id: Uuid, changes: LeadChanges, actor: Uuid) -> Result<Lead, AppError> {
        ensure_actor(actor)?;
        let leads = self.leads.clone();
        self.transact("update_lead", move |uow| {
            let (leads, changes) = (leads.clone(), changes.clone());
            Box::pin(async move { leads.update(uow, id, changes, actor).await })
        })
        .await
    }

    pub async fn delete_lead(&self, id: Uuid, actor: Uuid) -> Result<(), AppError> {
        ensure_actor(actor)?;
        let leads = self.leads.clone();
        self.transact("delete_lead", move |uow| {
            let leads = leads.clone();
            Box::pin(async move { leads.delete(uow, id).await })
        })
        .await
    }

    pub async fn get_lead(&self, id: Uuid) -> Result<Lead, AppError> {
        let leads = self.leads.clone();
        self.transact("get_lead", move |uow| {
            let leads = leads.clone();
            Box::pin(async move { leads.get(uow, id).await })
        })
        .await
    }

    pub async fn list_leads(&self) -> Result<Vec<Lead>, AppError> {
        let leads = self.leads.clone();
        self.transact("list_leads", move |uow| {
            let leads = leads.clone();
            Box::pin(async move { leads.list(uow).await })
        })
        .await
    }

    pub async fn log_lead_activity(
        &self,
        lead_id: Uuid,
        input: NewActivity,
        actor: Uuid,
    ) -> Result<Activity, AppError> {
        ensure_actor(actor)?;
        let leads = self.leads.clone();
        self.transact("log_lead_activity", move |uow| {
            let (leads, input) = (leads.clone(), input.clone());
            Box::pin(async move { leads.record_activity(uow, lead_id, input, actor).await })
        })
        .await
    }

    // =========================================================================
    //  DEALS
    // =========================================================================

    pub async fn create_deal(&self, input: NewDeal, actor: Uuid) -> Result<Deal, AppError> {
        ensure_actor(actor)?;
        let deals = self.deals.clone();
        self.transact("create_deal", move |uow| {
            let (deals, input) = (deals.clone(), input.clone());
            Box::pin(async move { deals.create(uow, input, actor).await })
        })
        .await
    }

    pub async fn update_deal(&self, id: Uuid, changes: DealChanges, actor: Uuid) -> Result<Deal, AppError> {
        ensure_actor(actor)?;
        let deals = self.deals.clone();
        self.transact("update_deal", move |uow| {
            let (deals, changes) = (deals.clone(), changes.clone());
            Box::pin(async move { deals.update(uow, id, changes, actor).await })
        })
        .await
    }

    pub async fn delete_deal(&self, id: Uuid, actor: Uuid) -> Result<(), AppError> {
        ensure_actor(actor)?;
        let deals = self.deals.clone();
        self.transact("delete_deal", move |uow| {
            let deals = deals.clone();
            Box::pin(async move { deals.delete(uow, id).await })
        })
        .await
    }

    pub async fn get_deal(&self, id: Uuid) -> Result<Deal, AppError> {
        let deals = self.deals.clone();
        self.transact("get_deal", move |uow| {
            let deals = deals.clone();
            Box::pin(async move { deals.get(uow, id).await })
        })
        .await
    }

    pub async fn list_deals(&self) -> Result<Vec<Deal>, AppError> {
        let deals = self.deals.clone();
        self.transact("list_deals", move |uow| {
            let deals = deals.clone();
            Box::pin(async move { deals.list(uow).await })
        })
        .await
    }

    pub async fn log_deal_activity(
        &self,
        deal_id: Uuid,
        input: NewActivity,
        actor: Uuid,
    ) -> Result<Activity, AppError> {
        ensure_actor(actor)?;
        let deals = self.deals.clone();
        self.transact("log_deal_activity", move |uow| {
            let (deals, input) = (deals.clone(), input.clone());
            Box::pin(async move { deals.record_activity(uow, deal_id, input, actor).await })
        })
        .await
    }

    // =========================================================================
    //  PROPOSALS
    // =========================================================================

    /// Conflitos na numeração são repetidos; se persistirem, viram erro interno.
    pub async fn create_proposal(&self, input: NewProposal, actor: Uuid) -> Result<Proposal, AppError> {
        ensure_actor(actor)?;
        let proposals = self.proposals.clone();
        self.transact("create_proposal", move |uow| {
            let (proposals, input) = (proposals.clone(), input.clone());
            Box::pin(async move { proposals.create(uow, input, actor).await })
        })
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::Conflict => AppError::InternalServerError(anyhow::anyhow!(
                "Numeração de propostas indisponível após novas tentativas: {}",
                e
            )),
            _ => e,
        })
    }

    pub async fn update_proposal(
        &self,
        id: Uuid,
        changes: ProposalChanges,
        actor: Uuid,
    ) -> Result<Proposal, AppError> {
        ensure_actor(actor)?;
        let proposals = self.proposals.clone();
        self.transact("update_proposal", move |uow| {
            let (proposals, changes) = (proposals.clone(), changes.clone());
            Box::pin(async move { proposals.update(uow, id, changes, actor).await })
        })
        .await
    }

    pub async fn delete_proposal(&self, id: Uuid, actor: Uuid) -> Result<(), AppError> {
        ensure_actor(actor)?;
        let proposals = self.proposals.clone();
        self.transact("delete_proposal", move |uow| {
            let proposals = proposals.clone();
            Box::pin(async move { proposals.delete(uow, id).await })
        })
        .await
    }

    pub async fn get_proposal(&self, id: Uuid) -> Result<Proposal, AppError> {
        let proposals = self.proposals.clone();
        self.transact("get_proposal", move |uow| {
            let proposals = proposals.clone();
            Box::pin(async move { proposals.get(uow, id).await })
        })
        .await
    }

    pub async fn list_proposals(&self) -> Result<Vec<Proposal>, AppError> {
        let proposals = self.proposals.clone();
        self.transact("list_proposals", move |uow| {
            let proposals = proposals.clone();
            Box::pin(async move { proposals.list(uow).await })
        })
        .await
    }

    // =========================================================================
    //  HISTÓRICO
    // =========================================================================

    pub async fn list_activities(&self, owner: OwnerRef) -> Result<Vec<Activity>, AppError> {
        let ledger = self.ledger.clone();
        self.transact("list_activities", move |uow| {
            let ledger = ledger.clone();
            Box::pin(async move { ledger.list(uow, owner).await })
        })
        .await
    }
}

// Toda escrita precisa de um autor identificado
fn ensure_actor(actor: Uuid) -> Result<(), AppError> {
    if actor.is_nil() {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
