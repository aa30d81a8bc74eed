// src/services/proposal_service.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{error::AppError, serde_utils::patch},
    db::UnitOfWork,
    models::proposal::{NewProposal, Proposal, ProposalChanges, ProposalStatus},
    services::{
        rules,
        sequence::{PeriodKey, SequenceAllocator},
    },
};

#[derive(Clone, Default)]
pub struct ProposalService {
    sequences: SequenceAllocator,
}

impl ProposalService {
    pub fn new(sequences: SequenceAllocator) -> Self {
        Self { sequences }
    }

    pub async fn get(&self, uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Proposal, AppError> {
        uow.find_proposal(id)
            .await?
            .ok_or_else(|| AppError::not_found("proposal", id))
    }

    pub async fn list(&self, uow: &mut dyn UnitOfWork) -> Result<Vec<Proposal>, AppError> {
        uow.list_proposals().await
    }

    pub async fn create(
        &self,
        uow: &mut dyn UnitOfWork,
        input: NewProposal,
        actor: Uuid,
    ) -> Result<Proposal, AppError> {
        let title = rules::required_text(input.title, "title")?;
        let status = rules::required(input.status, "status")?;
        // Propostas nascem em rascunho ou já enviadas; o resto vem por transição
        if !matches!(status, ProposalStatus::Draft | ProposalStatus::Sent) {
            return Err(AppError::invalid("status", "invalid_initial_status"));
        }
        let total_value = rules::required(input.total_value, "totalValue")?;
        rules::non_negative(Some(total_value), "totalValue")?;

        if let Some(deal_id) = input.deal_id {
            rules::ensure_deal_exists(uow, deal_id).await?;
        }

        let now = Utc::now();
        let proposal_number = self
            .sequences
            .next_proposal_number(uow, PeriodKey::from_datetime(now))
            .await?;

        let sent_date = match (input.sent_date, status) {
            (None, ProposalStatus::Sent) => Some(now),
            (date, _) => date,
        };

        let proposal = Proposal {
            id: Uuid::new_v4(),
            proposal_number,
            title,
            status,
            version: 1,
            deal_id: input.deal_id,
            client_id: input.client_id,
            content: input.content,
            total_value,
            sent_date,
            valid_until: input.valid_until,
            document_id: input.document_id,
            created_by_id: actor,
            created_at: now,
            updated_at: now,
        };
        uow.insert_proposal(&proposal).await?;

        tracing::info!("✅ Proposta {} criada ({})", proposal.proposal_number, proposal.id);
        Ok(proposal)
    }

    pub async fn update(
        &self,
        uow: &mut dyn UnitOfWork,
        id: Uuid,
        changes: ProposalChanges,
        actor: Uuid,
    ) -> Result<Proposal, AppError> {
        let mut proposal = uow
            .lock_proposal(id)
            .await?
            .ok_or_else(|| AppError::not_found("proposal", id))?;

        let previous_status = proposal.status;
        if let Some(next) = changes.status {
            rules::transition(
                "proposal",
                previous_status.can_transition_to(next),
                previous_status.as_str(),
                next.as_str(),
            )?;
        }
        rules::non_negative(changes.total_value, "totalValue")?;
        if let Some(Some(deal_id)) = changes.deal_id {
            rules::ensure_deal_exists(uow, deal_id).await?;
        }

        if changes.create_new_version {
            proposal.version += 1;
        }
        if let Some(title) = changes.title {
            proposal.title = rules::required_text(Some(title), "title")?;
        }
        if let Some(status) = changes.status {
            proposal.status = status;
        }
        if let Some(total) = changes.total_value {
            proposal.total_value = total;
        }
        if let Some(content) = changes.content {
            proposal.content = Some(content);
        }
        proposal.deal_id = patch(proposal.deal_id, changes.deal_id);
        proposal.client_id = patch(proposal.client_id, changes.client_id);
        proposal.sent_date = patch(proposal.sent_date, changes.sent_date);
        proposal.valid_until = patch(proposal.valid_until, changes.valid_until);
        proposal.document_id = patch(proposal.document_id, changes.document_id);

        let now = Utc::now();
        if proposal.status == ProposalStatus::Sent
            && previous_status != ProposalStatus::Sent
            && proposal.sent_date.is_none()
        {
            proposal.sent_date = Some(now);
        }
        proposal.updated_at = now;

        uow.update_proposal(&proposal).await?;

        tracing::info!(
            "✅ Proposta {} atualizada por {} (versão {})",
            proposal.proposal_number,
            actor,
            proposal.version
        );
        Ok(proposal)
    }

    pub async fn delete(&self, uow: &mut dyn UnitOfWork, id: Uuid) -> Result<(), AppError> {
        if !uow.delete_proposal(id).await? {
            return Err(AppError::not_found("proposal", id));
        }

        tracing::info!("🗑️ Proposta {} removida", id);
        Ok(())
    }
}
