// src/models/deal.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::serde_utils::nullable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "deal_stage", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DealStage {
    Prospecting,
    Qualification,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl DealStage {
    pub fn as_str(self) -> &'static str {
        match self {
            DealStage::Prospecting => "prospecting",
            DealStage::Qualification => "qualification",
            DealStage::Proposal => "proposal",
            DealStage::Negotiation => "negotiation",
            DealStage::ClosedWon => "closed-won",
            DealStage::ClosedLost => "closed-lost",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, DealStage::ClosedWon | DealStage::ClosedLost)
    }

    /// Etapas abertas circulam livremente; etapas fechadas são terminais.
    pub fn can_transition_to(self, next: DealStage) -> bool {
        self == next || !self.is_closed()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: Uuid,
    #[schema(example = "Consultoria ERP - Fase 2")]
    pub title: String,
    pub description: Option<String>,
    pub stage: DealStage,
    #[schema(example = "48000.00")]
    pub value: Decimal,
    #[schema(example = 60)]
    pub probability: i32,
    pub expected_close_date: NaiveDate,

    // Gravada uma única vez, na primeira entrada em etapa fechada
    pub actual_close_date: Option<DateTime<Utc>>,

    pub owner_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub win_reason: Option<String>,
    pub loss_reason: Option<String>,
    pub tags: Vec<String>,

    // Derivado de leads.deal_id, nunca persistido aqui
    #[sqlx(skip)]
    pub leads: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDeal {
    #[validate(length(min = 1, message = "required"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = "prospecting")]
    pub stage: Option<DealStage>,
    pub value: Option<Decimal>,
    #[validate(range(min = 0, max = 100, message = "invalid_probability"))]
    pub probability: Option<i32>,
    #[schema(value_type = Option<String>, format = Date, example = "2026-12-15")]
    pub expected_close_date: Option<NaiveDate>,
    pub owner_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub win_reason: Option<String>,
    pub loss_reason: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lead_ids: Vec<Uuid>,
}

/// Atualização parcial do negócio. `leadIds`, quando presente, é o conjunto
/// completo desejado de leads vinculados.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealChanges {
    #[validate(length(min = 1, message = "required"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = "closed-won")]
    pub stage: Option<DealStage>,
    pub value: Option<Decimal>,
    #[validate(range(min = 0, max = 100, message = "invalid_probability"))]
    pub probability: Option<i32>,
    #[schema(value_type = Option<String>, format = Date)]
    pub expected_close_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub owner_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub client_id: Option<Option<Uuid>>,

    pub win_reason: Option<String>,
    pub loss_reason: Option<String>,
    pub tags: Option<Vec<String>>,
    pub lead_ids: Option<Vec<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_stages_are_terminal() {
        assert!(DealStage::Prospecting.can_transition_to(DealStage::Negotiation));
        assert!(DealStage::Negotiation.can_transition_to(DealStage::Qualification));
        assert!(DealStage::Proposal.can_transition_to(DealStage::ClosedLost));
        assert!(DealStage::ClosedWon.can_transition_to(DealStage::ClosedWon));

        assert!(!DealStage::ClosedWon.can_transition_to(DealStage::ClosedLost));
        assert!(!DealStage::ClosedLost.can_transition_to(DealStage::Negotiation));
    }

    #[test]
    fn lead_ids_are_optional_on_update() {
        let changes: DealChanges = serde_json::from_str(r#"{"stage": "negotiation"}"#).unwrap();
        assert!(changes.lead_ids.is_none());

        let changes: DealChanges = serde_json::from_str(r#"{"leadIds": []}"#).unwrap();
        assert_eq!(changes.lead_ids, Some(vec![]));
    }
}
