// src/db/memory.rs

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::unit_of_work::{Database, UnitOfWork},
    models::{
        activity::{Activity, OwnerRef},
        deal::Deal,
        lead::Lead,
        proposal::Proposal,
    },
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    leads: HashMap<Uuid, Lead>,
    deals: HashMap<Uuid, Deal>,
    proposals: HashMap<Uuid, Proposal>,
    activities: Vec<Activity>,
    sequences: HashMap<String, i32>,
}

/// Armazenamento em memória com a mesma semântica transacional do Postgres.
///
/// Cada unidade de trabalho segura o lock do estado inteiro e trabalha numa
/// cópia; o `commit` publica a cópia. Execução totalmente serializada.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
    #[cfg(test)]
    commit_failures: Arc<std::sync::atomic::AtomicUsize>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Faz os próximos `n` commits falharem com `Conflict`.
    #[cfg(test)]
    pub(crate) fn fail_next_commits(&self, n: usize) {
        self.commit_failures.store(n, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();

        Ok(Box::new(MemoryUnitOfWork {
            guard: Some(guard),
            working,
            #[cfg(test)]
            commit_failures: self.commit_failures.clone(),
        }))
    }
}

pub struct MemoryUnitOfWork {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    working: MemoryState,
    #[cfg(test)]
    commit_failures: Arc<std::sync::atomic::AtomicUsize>,
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_lead(&mut self, id: Uuid) -> Result<Option<Lead>, AppError> {
        Ok(self.working.leads.get(&id).cloned())
    }

    // O lock do estado inteiro já serializa as unidades de trabalho
    async fn lock_lead(&mut self, id: Uuid) -> Result<Option<Lead>, AppError> {
        self.find_lead(id).await
    }

    async fn list_leads(&mut self) -> Result<Vec<Lead>, AppError> {
        let mut leads: Vec<Lead> = self.working.leads.values().cloned().collect();
        newest_first(&mut leads, |l| (l.created_at, l.id));
        Ok(leads)
    }

    async fn insert_lead(&mut self, lead: &Lead) -> Result<(), AppError> {
        self.working.leads.insert(lead.id, lead.clone());
        Ok(())
    }

    async fn update_lead(&mut self, lead: &Lead) -> Result<(), AppError> {
        match self.working.leads.get_mut(&lead.id) {
            Some(stored) => {
                *stored = lead.clone();
                Ok(())
            }
            None => Err(AppError::not_found("lead", lead.id)),
        }
    }

    async fn delete_lead(&mut self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.working.leads.remove(&id).is_some())
    }

    async fn set_lead_deal(&mut self, lead_id: Uuid, deal_id: Option<Uuid>) -> Result<bool, AppError> {
        if let Some(deal_id) = deal_id {
            // Mesma garantia da FK leads.deal_id -> deals.id
            if !self.working.deals.contains_key(&deal_id) {
                return Err(AppError::not_found("deal", deal_id));
            }
        }
        match self.working.leads.get_mut(&lead_id) {
            Some(lead) => {
                lead.deal_id = deal_id;
                lead.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn unlink_deal_leads(&mut self, deal_id: Uuid) -> Result<u64, AppError> {
        let now = Utc::now();
        let mut affected = 0;
        for lead in self.working.leads.values_mut() {
            if lead.deal_id == Some(deal_id) {
                lead.deal_id = None;
                lead.updated_at = now;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn lead_ids_for_deal(&mut self, deal_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let mut leads: Vec<&Lead> = self
            .working
            .leads
            .values()
            .filter(|l| l.deal_id == Some(deal_id))
            .collect();
        leads.sort_by_key(|l| (l.created_at, l.id));
        Ok(leads.into_iter().map(|l| l.id).collect())
    }

    async fn find_deal(&mut self, id: Uuid) -> Result<Option<Deal>, AppError> {
        Ok(self.working.deals.get(&id).cloned())
    }

    async fn lock_deal(&mut self, id: Uuid) -> Result<Option<Deal>, AppError> {
        self.find_deal(id).await
    }

    async fn list_deals(&mut self) -> Result<Vec<Deal>, AppError> {
        let mut deals: Vec<Deal> = self.working.deals.values().cloned().collect();
        newest_first(&mut deals, |d| (d.created_at, d.id));
        Ok(deals)
    }

    async fn insert_deal(&mut self, deal: &Deal) -> Result<(), AppError> {
        let mut stored = deal.clone();
        stored.leads.clear();
        self.working.deals.insert(deal.id, stored);
        Ok(())
    }

    async fn update_deal(&mut self, deal: &Deal) -> Result<(), AppError> {
        match self.working.deals.get_mut(&deal.id) {
            Some(stored) => {
                let closed_at = stored.actual_close_date.or(deal.actual_close_date);
                *stored = deal.clone();
                stored.actual_close_date = closed_at;
                stored.leads.clear();
                Ok(())
            }
            None => Err(AppError::not_found("deal", deal.id)),
        }
    }

    async fn delete_deal(&mut self, id: Uuid) -> Result<bool, AppError> {
        if self.working.leads.values().any(|l| l.deal_id == Some(id)) {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "Negócio {id} ainda referenciado por leads"
            )));
        }
        // proposals.deal_id: ON DELETE SET NULL
        for proposal in self.working.proposals.values_mut() {
            if proposal.deal_id == Some(id) {
                proposal.deal_id = None;
            }
        }
        Ok(self.working.deals.remove(&id).is_some())
    }

    async fn find_proposal(&mut self, id: Uuid) -> Result<Option<Proposal>, AppError> {
        Ok(self.working.proposals.get(&id).cloned())
    }

    async fn lock_proposal(&mut self, id: Uuid) -> Result<Option<Proposal>, AppError> {
        self.find_proposal(id).await
    }

    async fn list_proposals(&mut self) -> Result<Vec<Proposal>, AppError> {
        let mut proposals: Vec<Proposal> = self.working.proposals.values().cloned().collect();
        proposals.sort_by(|a, b| b.proposal_number.cmp(&a.proposal_number));
        Ok(proposals)
    }

    async fn insert_proposal(&mut self, proposal: &Proposal) -> Result<(), AppError> {
        let taken = self
            .working
            .proposals
            .values()
            .any(|p| p.proposal_number == proposal.proposal_number);
        if taken {
            return Err(AppError::Conflict(format!(
                "Número de proposta '{}' já utilizado.",
                proposal.proposal_number
            )));
        }
        self.working.proposals.insert(proposal.id, proposal.clone());
        Ok(())
    }

    async fn update_proposal(&mut self, proposal: &Proposal) -> Result<(), AppError> {
        match self.working.proposals.get_mut(&proposal.id) {
            Some(stored) => {
                *stored = proposal.clone();
                Ok(())
            }
            None => Err(AppError::not_found("proposal", proposal.id)),
        }
    }

    async fn delete_proposal(&mut self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.working.proposals.remove(&id).is_some())
    }

    async fn insert_activity(&mut self, activity: &Activity) -> Result<(), AppError> {
        self.working.activities.push(activity.clone());
        Ok(())
    }

    async fn list_activities(&mut self, owner: OwnerRef) -> Result<Vec<Activity>, AppError> {
        let mut activities: Vec<Activity> = self
            .working
            .activities
            .iter()
            .filter(|a| a.owner_kind == owner.kind && a.owner_id == owner.id)
            .cloned()
            .collect();
        // Mais recentes primeiro; empate mantém a ordem inversa de inserção
        activities.reverse();
        activities.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(activities)
    }

    async fn delete_activities(&mut self, owner: OwnerRef) -> Result<u64, AppError> {
        let before = self.working.activities.len();
        self.working
            .activities
            .retain(|a| !(a.owner_kind == owner.kind && a.owner_id == owner.id));
        Ok((before - self.working.activities.len()) as u64)
    }

    async fn increment_sequence(&mut self, period_key: &str) -> Result<i32, AppError> {
        let counter = self.working.sequences.entry(period_key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        #[cfg(test)]
        {
            use std::sync::atomic::Ordering;
            let pending = self.commit_failures.load(Ordering::SeqCst);
            if pending > 0 {
                self.commit_failures.store(pending - 1, Ordering::SeqCst);
                self.guard.take();
                return Err(AppError::Conflict("Falha de serialização simulada".to_string()));
            }
        }

        match self.guard.take() {
            Some(mut guard) => {
                *guard = std::mem::take(&mut self.working);
                Ok(())
            }
            None => Err(AppError::InternalServerError(anyhow::anyhow!("Transação já finalizada"))),
        }
    }
}
