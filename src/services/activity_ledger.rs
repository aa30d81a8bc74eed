// src/services/activity_ledger.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UnitOfWork,
    models::activity::{Activity, ActivityType, OwnerKind, OwnerRef},
};

/// O que vai ser anotado no histórico.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub activity_type: ActivityType,
    pub description: String,
    pub date: DateTime<Utc>,
    pub outcome: Option<String>,
    pub notes: Option<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
}

impl ActivityEntry {
    pub fn new(activity_type: ActivityType, description: impl Into<String>) -> Self {
        Self {
            activity_type,
            description: description.into(),
            date: Utc::now(),
            outcome: None,
            notes: None,
            follow_up_date: None,
        }
    }
}

/// Histórico append-only de leads e negócios. Não propaga nada para o dono:
/// atualizar campos como `lastContact` é responsabilidade de quem chama.
#[derive(Clone, Default)]
pub struct ActivityLedger;

impl ActivityLedger {
    pub async fn append(
        &self,
        uow: &mut dyn UnitOfWork,
        owner: OwnerRef,
        entry: ActivityEntry,
        actor: Uuid,
    ) -> Result<Activity, AppError> {
        ensure_owner_exists(uow, owner).await?;

        let activity = Activity {
            id: Uuid::new_v4(),
            owner_kind: owner.kind,
            owner_id: owner.id,
            activity_type: entry.activity_type,
            description: entry.description,
            date: entry.date,
            performed_by_id: actor,
            outcome: entry.outcome,
            notes: entry.notes,
            follow_up_date: entry.follow_up_date,
            created_at: Utc::now(),
        };
        uow.insert_activity(&activity).await?;

        tracing::debug!(
            "📝 Atividade {:?} registrada em {} {}",
            activity.activity_type,
            owner.kind.as_str(),
            owner.id
        );
        Ok(activity)
    }

    pub async fn list(&self, uow: &mut dyn UnitOfWork, owner: OwnerRef) -> Result<Vec<Activity>, AppError> {
        ensure_owner_exists(uow, owner).await?;
        uow.list_activities(owner).await
    }
}

async fn ensure_owner_exists(uow: &mut dyn UnitOfWork, owner: OwnerRef) -> Result<(), AppError> {
    let exists = match owner.kind {
        OwnerKind::Lead => uow.find_lead(owner.id).await?.is_some(),
        OwnerKind::Deal => uow.find_deal(owner.id).await?.is_some(),
    };
    if !exists {
        return Err(AppError::not_found(owner.kind.as_str(), owner.id));
    }
    Ok(())
}
