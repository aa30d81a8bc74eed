// src/services/deal_service.rs

use std::collections::BTreeSet;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{error::AppError, serde_utils::patch},
    db::UnitOfWork,
    models::{
        activity::{Activity, ActivityType, NewActivity, OwnerRef},
        deal::{Deal, DealChanges, DealStage, NewDeal},
    },
    services::{
        activity_ledger::{ActivityEntry, ActivityLedger},
        lead_service::{manual_entry, LeadService},
        rules,
    },
};

#[derive(Clone, Default)]
pub struct DealService {
    ledger: ActivityLedger,
    leads: LeadService,
}

impl DealService {
    pub fn new(ledger: ActivityLedger, leads: LeadService) -> Self {
        Self { ledger, leads }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn get(&self, uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Deal, AppError> {
        let mut deal = uow
            .find_deal(id)
            .await?
            .ok_or_else(|| AppError::not_found("deal", id))?;
        deal.leads = uow.lead_ids_for_deal(id).await?;
        Ok(deal)
    }

    pub async fn list(&self, uow: &mut dyn UnitOfWork) -> Result<Vec<Deal>, AppError> {
        let mut deals = uow.list_deals().await?;
        for deal in deals.iter_mut() {
            deal.leads = uow.lead_ids_for_deal(deal.id).await?;
        }
        Ok(deals)
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn create(
        &self,
        uow: &mut dyn UnitOfWork,
        input: NewDeal,
        actor: Uuid,
    ) -> Result<Deal, AppError> {
        let title = rules::required_text(input.title, "title")?;
        let stage = rules::required(input.stage, "stage")?;
        let value = rules::required(input.value, "value")?;
        let expected_close_date = rules::required(input.expected_close_date, "expectedCloseDate")?;
        rules::non_negative(Some(value), "value")?;
        rules::probability(input.probability)?;
        require_close_reason(stage, input.win_reason.as_deref(), input.loss_reason.as_deref())?;

        let now = Utc::now();
        let mut deal = Deal {
            id: Uuid::new_v4(),
            title,
            description: input.description,
            stage,
            value,
            probability: input.probability.unwrap_or(0),
            expected_close_date,
            actual_close_date: None,
            owner_id: input.owner_id,
            client_id: input.client_id,
            win_reason: input.win_reason,
            loss_reason: input.loss_reason,
            tags: input.tags,
            leads: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        // Nascer fechado conta como a primeira entrada em etapa fechada
        if stage.is_closed() {
            deal.actual_close_date = Some(now);
        }

        uow.insert_deal(&deal).await?;

        let lead_ids: BTreeSet<Uuid> = input.lead_ids.into_iter().collect();
        for lead_id in lead_ids {
            self.leads.link_deal(uow, lead_id, Some(deal.id)).await?;
        }

        self.ledger
            .append(uow, OwnerRef::deal(deal.id), ActivityEntry::new(ActivityType::Note, "Deal created"), actor)
            .await?;

        deal.leads = uow.lead_ids_for_deal(deal.id).await?;

        tracing::info!("✅ Negócio {} criado com {} leads", deal.id, deal.leads.len());
        Ok(deal)
    }

    /// Atualiza campos, aplica a regra de fechamento e reconcilia o conjunto de
    /// leads. Tudo roda na transação de quem chama.
    pub async fn update(
        &self,
        uow: &mut dyn UnitOfWork,
        id: Uuid,
        changes: DealChanges,
        actor: Uuid,
    ) -> Result<Deal, AppError> {
        let mut deal = uow
            .lock_deal(id)
            .await?
            .ok_or_else(|| AppError::not_found("deal", id))?;

        let previous_stage = deal.stage;
        let next_stage = changes.stage.unwrap_or(previous_stage);
        rules::transition(
            "deal",
            previous_stage.can_transition_to(next_stage),
            previous_stage.as_str(),
            next_stage.as_str(),
        )?;
        rules::non_negative(changes.value, "value")?;
        rules::probability(changes.probability)?;

        // O motivo precisa vir na própria requisição que fecha o negócio
        let closing = next_stage.is_closed() && !previous_stage.is_closed();
        if closing {
            require_close_reason(next_stage, changes.win_reason.as_deref(), changes.loss_reason.as_deref())?;
        }

        if let Some(title) = changes.title {
            deal.title = rules::required_text(Some(title), "title")?;
        }
        if let Some(description) = changes.description {
            deal.description = Some(description);
        }
        if let Some(value) = changes.value {
            deal.value = value;
        }
        if let Some(probability) = changes.probability {
            deal.probability = probability;
        }
        if let Some(date) = changes.expected_close_date {
            deal.expected_close_date = date;
        }
        if let Some(reason) = changes.win_reason {
            deal.win_reason = Some(reason);
        }
        if let Some(reason) = changes.loss_reason {
            deal.loss_reason = Some(reason);
        }
        if let Some(tags) = changes.tags {
            deal.tags = tags;
        }
        deal.owner_id = patch(deal.owner_id, changes.owner_id);
        deal.client_id = patch(deal.client_id, changes.client_id);

        let now = Utc::now();
        deal.stage = next_stage;
        if closing {
            // Imutável depois de gravada
            if deal.actual_close_date.is_none() {
                deal.actual_close_date = Some(now);
            }
        }
        deal.updated_at = now;

        uow.update_deal(&deal).await?;

        if let Some(lead_ids) = changes.lead_ids {
            self.reconcile_leads(uow, id, lead_ids).await?;
        }

        if next_stage != previous_stage {
            let description = format!(
                "Stage changed from {} to {}",
                previous_stage.as_str(),
                next_stage.as_str()
            );
            self.ledger
                .append(uow, OwnerRef::deal(id), ActivityEntry::new(ActivityType::Stage, description), actor)
                .await?;
        }

        deal.leads = uow.lead_ids_for_deal(id).await?;

        tracing::info!("✅ Negócio {} atualizado ({})", id, deal.stage.as_str());
        Ok(deal)
    }

    /// Diferença simétrica entre o conjunto atual (lido nesta transação) e o
    /// desejado: quem saiu é desvinculado, quem entrou aponta para o negócio.
    async fn reconcile_leads(
        &self,
        uow: &mut dyn UnitOfWork,
        deal_id: Uuid,
        lead_ids: Vec<Uuid>,
    ) -> Result<(), AppError> {
        let current: BTreeSet<Uuid> = uow.lead_ids_for_deal(deal_id).await?.into_iter().collect();
        let desired: BTreeSet<Uuid> = lead_ids.into_iter().collect();

        let removed: Vec<Uuid> = current.difference(&desired).copied().collect();
        let added: Vec<Uuid> = desired.difference(&current).copied().collect();

        for lead_id in &removed {
            self.leads.link_deal(uow, *lead_id, None).await?;
        }
        for lead_id in &added {
            self.leads.link_deal(uow, *lead_id, Some(deal_id)).await?;
        }

        tracing::debug!(
            "🔗 Negócio {}: {} leads desvinculados, {} vinculados",
            deal_id,
            removed.len(),
            added.len()
        );
        Ok(())
    }

    /// Desvincula os leads, apaga o histórico e por fim o negócio.
    pub async fn delete(&self, uow: &mut dyn UnitOfWork, id: Uuid) -> Result<(), AppError> {
        if uow.lock_deal(id).await?.is_none() {
            return Err(AppError::not_found("deal", id));
        }

        let unlinked = uow.unlink_deal_leads(id).await?;
        uow.delete_activities(OwnerRef::deal(id)).await?;
        uow.delete_deal(id).await?;

        tracing::info!("🗑️ Negócio {} removido ({} leads desvinculados)", id, unlinked);
        Ok(())
    }

    pub async fn record_activity(
        &self,
        uow: &mut dyn UnitOfWork,
        deal_id: Uuid,
        input: NewActivity,
        actor: Uuid,
    ) -> Result<Activity, AppError> {
        let entry = manual_entry(input)?;
        self.ledger.append(uow, OwnerRef::deal(deal_id), entry, actor).await
    }
}

fn require_close_reason(
    stage: DealStage,
    win_reason: Option<&str>,
    loss_reason: Option<&str>,
) -> Result<(), AppError> {
    let (reason, field) = match stage {
        DealStage::ClosedWon => (win_reason, "winReason"),
        DealStage::ClosedLost => (loss_reason, "lossReason"),
        _ => return Ok(()),
    };

    match reason {
        Some(text) if !text.trim().is_empty() => Ok(()),
        _ => Err(AppError::missing(field)),
    }
}
