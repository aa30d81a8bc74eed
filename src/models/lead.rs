// src/models/lead.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::serde_utils::nullable;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    ClosedLost,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Converted => "converted",
            LeadStatus::ClosedLost => "closed-lost",
        }
    }

    /// Tabela de transições do funil. Manter o mesmo status é sempre permitido.
    pub fn can_transition_to(self, next: LeadStatus) -> bool {
        use LeadStatus::*;

        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (New, Contacted | Qualified | ClosedLost)
                | (Contacted, Qualified | ClosedLost)
                | (Qualified, Contacted | Converted | ClosedLost)
                | (ClosedLost, New)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_source", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum LeadSource {
    Website,
    Referral,
    SocialMedia,
    EmailCampaign,
    ColdCall,
    Event,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadPriority {
    High,
    Medium,
    Low,
}

// --- LEAD ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(example = "Acme Ltda")]
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub priority: Option<LeadPriority>,
    #[schema(example = "15000.00")]
    pub estimated_value: Option<Decimal>,
    pub assigned_to_id: Option<Uuid>,

    // Fonte autoritativa do vínculo lead -> negócio
    pub deal_id: Option<Uuid>,
    pub deal_opportunity_id: Option<Uuid>,

    pub last_contact: Option<DateTime<Utc>>,
    pub next_contact_date: Option<DateTime<Utc>>,
    pub conversion_date: Option<DateTime<Utc>>,

    #[schema(example = json!(["enterprise", "inbound"]))]
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- PAYLOADS ---

/// Dados de criação. Os obrigatórios (name, source, status) são opcionais aqui
/// para que a ausência vire erro de validação do serviço, não do parser.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Acme Ltda")]
    pub name: Option<String>,
    pub company: Option<String>,
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "contato@acme.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "website")]
    pub source: Option<LeadSource>,
    #[schema(example = "new")]
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub estimated_value: Option<Decimal>,
    pub assigned_to_id: Option<Uuid>,
    pub deal_id: Option<Uuid>,
    pub deal_opportunity_id: Option<Uuid>,
    pub last_contact: Option<DateTime<Utc>>,
    pub next_contact_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

/// Atualização parcial. Campo omitido mantém o valor armazenado;
/// nos campos anuláveis, `null` explícito limpa o valor.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadChanges {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    pub company: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<LeadSource>,
    #[schema(example = "qualified")]
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub estimated_value: Option<Decimal>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub assigned_to_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub deal_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub deal_opportunity_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_contact: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub next_contact_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub conversion_date: Option<Option<DateTime<Utc>>>,

    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}
