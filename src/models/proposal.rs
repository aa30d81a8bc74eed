// src/models/proposal.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::serde_utils::nullable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "proposal_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
    Converted,
}

impl ProposalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Draft => "draft",
            ProposalStatus::Sent => "sent",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Expired => "expired",
            ProposalStatus::Converted => "converted",
        }
    }

    // draft -> sent -> {accepted, rejected, expired}; só a aceita vira conversão
    pub fn can_transition_to(self, next: ProposalStatus) -> bool {
        use ProposalStatus::*;

        self == next
            || matches!(
                (self, next),
                (Draft, Sent) | (Sent, Accepted | Rejected | Expired) | (Accepted, Converted)
            )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: Uuid,
    #[schema(example = "PROP-26-10-0007")]
    pub proposal_number: String,
    #[schema(example = "Proposta de Consultoria Tributária")]
    pub title: String,
    pub status: ProposalStatus,
    #[schema(example = 1)]
    pub version: i32,
    pub deal_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub content: Option<String>,
    #[schema(example = "1000.00")]
    pub total_value: Decimal,
    pub sent_date: Option<DateTime<Utc>>,
    pub valid_until: Option<NaiveDate>,
    // Arquivo gerado pelo serviço de documentos
    pub document_id: Option<Uuid>,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProposal {
    #[validate(length(min = 1, message = "required"))]
    pub title: Option<String>,
    #[schema(example = "draft")]
    pub status: Option<ProposalStatus>,
    #[schema(example = "1000.00")]
    pub total_value: Option<Decimal>,
    pub deal_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub content: Option<String>,
    pub sent_date: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = Date)]
    pub valid_until: Option<NaiveDate>,
    pub document_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposalChanges {
    #[validate(length(min = 1, message = "required"))]
    pub title: Option<String>,
    pub status: Option<ProposalStatus>,
    pub total_value: Option<Decimal>,
    pub content: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub deal_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub client_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub sent_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Date)]
    pub valid_until: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub document_id: Option<Option<Uuid>>,

    /// Quando `true`, a versão armazenada é incrementada em 1.
    #[serde(default)]
    pub create_new_version: bool,
}
