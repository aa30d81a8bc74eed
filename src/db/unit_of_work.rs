// src/db/unit_of_work.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        activity::{Activity, OwnerRef},
        deal::Deal,
        lead::Lead,
        proposal::Proposal,
    },
};

/// Uma transação aberta. Tudo o que for escrito aqui só fica visível após
/// `commit`; se a unidade for descartada antes disso, nada é aplicado.
#[async_trait]
pub trait UnitOfWork: Send {
    // --- LEADS ---
    async fn find_lead(&mut self, id: Uuid) -> Result<Option<Lead>, AppError>;
    /// Como `find_lead`, mas trava a linha para escrita até o commit.
    async fn lock_lead(&mut self, id: Uuid) -> Result<Option<Lead>, AppError>;
    async fn list_leads(&mut self) -> Result<Vec<Lead>, AppError>;
    async fn insert_lead(&mut self, lead: &Lead) -> Result<(), AppError>;
    async fn update_lead(&mut self, lead: &Lead) -> Result<(), AppError>;
    async fn delete_lead(&mut self, id: Uuid) -> Result<bool, AppError>;

    /// Grava `leads.deal_id`. Retorna `false` se o lead não existe.
    async fn set_lead_deal(&mut self, lead_id: Uuid, deal_id: Option<Uuid>) -> Result<bool, AppError>;

    /// Desvincula todos os leads de um negócio. Retorna quantos foram afetados.
    async fn unlink_deal_leads(&mut self, deal_id: Uuid) -> Result<u64, AppError>;

    /// O conjunto derivado `Deal.leads`.
    async fn lead_ids_for_deal(&mut self, deal_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    // --- DEALS ---
    async fn find_deal(&mut self, id: Uuid) -> Result<Option<Deal>, AppError>;
    async fn lock_deal(&mut self, id: Uuid) -> Result<Option<Deal>, AppError>;
    async fn list_deals(&mut self) -> Result<Vec<Deal>, AppError>;
    async fn insert_deal(&mut self, deal: &Deal) -> Result<(), AppError>;
    async fn update_deal(&mut self, deal: &Deal) -> Result<(), AppError>;
    async fn delete_deal(&mut self, id: Uuid) -> Result<bool, AppError>;

    // --- PROPOSALS ---
    async fn find_proposal(&mut self, id: Uuid) -> Result<Option<Proposal>, AppError>;
    async fn lock_proposal(&mut self, id: Uuid) -> Result<Option<Proposal>, AppError>;
    async fn list_proposals(&mut self) -> Result<Vec<Proposal>, AppError>;
    async fn insert_proposal(&mut self, proposal: &Proposal) -> Result<(), AppError>;
    async fn update_proposal(&mut self, proposal: &Proposal) -> Result<(), AppError>;
    async fn delete_proposal(&mut self, id: Uuid) -> Result<bool, AppError>;

    // --- ACTIVITIES (append-only) ---
    async fn insert_activity(&mut self, activity: &Activity) -> Result<(), AppError>;
    async fn list_activities(&mut self, owner: OwnerRef) -> Result<Vec<Activity>, AppError>;

    /// Só usado na exclusão em cascata do dono.
    async fn delete_activities(&mut self, owner: OwnerRef) -> Result<u64, AppError>;

    // --- SEQUENCES ---

    /// Incrementa atomicamente o contador do período e devolve o novo valor.
    async fn increment_sequence(&mut self, period_key: &str) -> Result<i32, AppError>;

    async fn commit(&mut self) -> Result<(), AppError>;
}

/// Fábrica de unidades de trabalho (Postgres em produção, memória nos testes).
#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError>;
}
