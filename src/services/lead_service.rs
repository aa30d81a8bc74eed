// src/services/lead_service.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{error::AppError, serde_utils::patch},
    db::UnitOfWork,
    models::{
        activity::{Activity, ActivityType, NewActivity, OwnerRef},
        lead::{Lead, LeadChanges, LeadStatus, NewLead},
    },
    services::{
        activity_ledger::{ActivityEntry, ActivityLedger},
        rules,
    },
};

#[derive(Clone, Default)]
pub struct LeadService {
    ledger: ActivityLedger,
}

impl LeadService {
    pub fn new(ledger: ActivityLedger) -> Self {
        Self { ledger }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn get(&self, uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Lead, AppError> {
        uow.find_lead(id)
            .await?
            .ok_or_else(|| AppError::not_found("lead", id))
    }

    pub async fn list(&self, uow: &mut dyn UnitOfWork) -> Result<Vec<Lead>, AppError> {
        uow.list_leads().await
    }

    async fn lock(&self, uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Lead, AppError> {
        uow.lock_lead(id)
            .await?
            .ok_or_else(|| AppError::not_found("lead", id))
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn create(
        &self,
        uow: &mut dyn UnitOfWork,
        input: NewLead,
        actor: Uuid,
    ) -> Result<Lead, AppError> {
        let name = rules::required_text(input.name, "name")?;
        let source = rules::required(input.source, "source")?;
        let status = rules::required(input.status, "status")?;
        rules::non_negative(input.estimated_value, "estimatedValue")?;

        if let Some(deal_id) = input.deal_id {
            rules::ensure_deal_exists(uow, deal_id).await?;
        }

        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            name,
            company: input.company,
            email: input.email,
            phone: input.phone,
            source,
            status,
            priority: input.priority,
            estimated_value: input.estimated_value,
            assigned_to_id: input.assigned_to_id,
            deal_id: input.deal_id,
            deal_opportunity_id: input.deal_opportunity_id,
            last_contact: input.last_contact,
            next_contact_date: input.next_contact_date,
            conversion_date: (status == LeadStatus::Converted).then_some(now),
            tags: input.tags,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };
        uow.insert_lead(&lead).await?;

        if lead.assigned_to_id.is_some() {
            self.ledger
                .append(
                    uow,
                    OwnerRef::lead(lead.id),
                    ActivityEntry::new(ActivityType::Note, "Lead created and assigned"),
                    actor,
                )
                .await?;
        }

        tracing::info!("✅ Lead {} criado ({})", lead.id, lead.name);
        Ok(lead)
    }

    /// Atualiza o lead e registra, na mesma transação, as atividades de
    /// atribuição e de mudança de status que a alteração implicar.
    pub async fn update(
        &self,
        uow: &mut dyn UnitOfWork,
        id: Uuid,
        changes: LeadChanges,
        actor: Uuid,
    ) -> Result<Lead, AppError> {
        let mut lead = self.lock(uow, id).await?;

        // Calculado antes da escrita, contra o valor armazenado
        let new_assignment = changes.assigned_to_id.filter(|a| *a != lead.assigned_to_id);
        let previous_status = lead.status;
        let status_change = changes.status.filter(|s| *s != previous_status);

        if let Some(next) = status_change {
            rules::transition("lead", previous_status.can_transition_to(next), previous_status.as_str(), next.as_str())?;
        }
        rules::non_negative(changes.estimated_value, "estimatedValue")?;
        if let Some(Some(deal_id)) = changes.deal_id {
            rules::ensure_deal_exists(uow, deal_id).await?;
        }

        if let Some(name) = changes.name {
            lead.name = rules::required_text(Some(name), "name")?;
        }
        if let Some(company) = changes.company {
            lead.company = Some(company);
        }
        if let Some(email) = changes.email {
            lead.email = Some(email);
        }
        if let Some(phone) = changes.phone {
            lead.phone = Some(phone);
        }
        if let Some(source) = changes.source {
            lead.source = source;
        }
        if let Some(priority) = changes.priority {
            lead.priority = Some(priority);
        }
        if let Some(value) = changes.estimated_value {
            lead.estimated_value = Some(value);
        }
        if let Some(tags) = changes.tags {
            lead.tags = tags;
        }
        if let Some(notes) = changes.notes {
            lead.notes = Some(notes);
        }

        // Omitido = mantém; null explícito = limpa
        lead.assigned_to_id = patch(lead.assigned_to_id, changes.assigned_to_id);
        lead.deal_id = patch(lead.deal_id, changes.deal_id);
        lead.deal_opportunity_id = patch(lead.deal_opportunity_id, changes.deal_opportunity_id);
        lead.last_contact = patch(lead.last_contact, changes.last_contact);
        lead.next_contact_date = patch(lead.next_contact_date, changes.next_contact_date);
        lead.conversion_date = patch(lead.conversion_date, changes.conversion_date);

        let now = Utc::now();
        if let Some(next) = status_change {
            lead.status = next;
            if next == LeadStatus::Converted && lead.conversion_date.is_none() {
                lead.conversion_date = Some(now);
            }
        }
        lead.updated_at = now;

        uow.update_lead(&lead).await?;

        if let Some(assignee) = new_assignment {
            let description = match assignee {
                Some(user_id) => format!("Lead assigned to {user_id}"),
                None => "Lead unassigned".to_string(),
            };
            self.ledger
                .append(uow, OwnerRef::lead(id), ActivityEntry::new(ActivityType::Assignment, description), actor)
                .await?;
        }

        if let Some(next) = status_change {
            let description = format!(
                "Status changed from {} to {}",
                previous_status.as_str(),
                next.as_str()
            );
            self.ledger
                .append(uow, OwnerRef::lead(id), ActivityEntry::new(ActivityType::Status, description), actor)
                .await?;
        }

        tracing::info!("✅ Lead {} atualizado", id);
        Ok(lead)
    }

    /// Remove o lead e todo o seu histórico.
    pub async fn delete(&self, uow: &mut dyn UnitOfWork, id: Uuid) -> Result<(), AppError> {
        self.lock(uow, id).await?;

        let removed = uow.delete_activities(OwnerRef::lead(id)).await?;
        uow.delete_lead(id).await?;

        tracing::info!("🗑️ Lead {} removido ({} atividades)", id, removed);
        Ok(())
    }

    /// Único caminho de escrita de `leads.deal_id` a partir de um negócio.
    pub async fn link_deal(
        &self,
        uow: &mut dyn UnitOfWork,
        lead_id: Uuid,
        deal_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if !uow.set_lead_deal(lead_id, deal_id).await? {
            return Err(AppError::not_found("lead", lead_id));
        }

        tracing::debug!("🔗 Lead {} -> negócio {:?}", lead_id, deal_id);
        Ok(())
    }

    /// Registra um contato manual. Ligação, e-mail e reunião atualizam
    /// `lastContact` e, havendo follow-up, `nextContactDate`.
    pub async fn record_activity(
        &self,
        uow: &mut dyn UnitOfWork,
        lead_id: Uuid,
        input: NewActivity,
        actor: Uuid,
    ) -> Result<Activity, AppError> {
        let entry = manual_entry(input)?;
        let mut lead = self.lock(uow, lead_id).await?;

        let activity = self
            .ledger
            .append(uow, OwnerRef::lead(lead_id), entry, actor)
            .await?;

        if activity.activity_type.is_contact() {
            lead.last_contact = Some(activity.date);
            if let Some(follow_up) = activity.follow_up_date {
                lead.next_contact_date = Some(follow_up);
            }
            lead.updated_at = Utc::now();
            uow.update_lead(&lead).await?;
        }

        Ok(activity)
    }
}

/// Valida uma atividade manual. Os tipos de sistema não podem ser criados à mão.
pub(crate) fn manual_entry(input: NewActivity) -> Result<ActivityEntry, AppError> {
    let activity_type = rules::required(input.activity_type, "activityType")?;
    if activity_type.is_system() {
        return Err(AppError::invalid("activityType", "reserved_type"));
    }
    let description = rules::required_text(input.description, "description")?;

    let mut entry = ActivityEntry::new(activity_type, description);
    if let Some(date) = input.date {
        entry.date = date;
    }
    entry.outcome = input.outcome;
    entry.notes = input.notes;
    entry.follow_up_date = input.follow_up_date;
    Ok(entry)
}
