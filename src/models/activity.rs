// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "activity_owner", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Lead,
    Deal,
}

impl OwnerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OwnerKind::Lead => "lead",
            OwnerKind::Deal => "deal",
        }
    }
}

/// A quem pertence uma linha do histórico.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerRef {
    pub kind: OwnerKind,
    pub id: Uuid,
}

impl OwnerRef {
    pub fn lead(id: Uuid) -> Self {
        Self { kind: OwnerKind::Lead, id }
    }

    pub fn deal(id: Uuid) -> Self {
        Self { kind: OwnerKind::Deal, id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "activity_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    Note,
    Assignment,
    Status,
    Stage,
}

impl ActivityType {
    /// Contato efetivo com o lead (atualiza lastContact).
    pub fn is_contact(self) -> bool {
        matches!(self, ActivityType::Call | ActivityType::Email | ActivityType::Meeting)
    }

    /// Tipos gravados apenas pelo próprio motor do funil.
    pub fn is_system(self) -> bool {
        matches!(self, ActivityType::Assignment | ActivityType::Status | ActivityType::Stage)
    }
}

/// Linha imutável do histórico de um lead ou negócio.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub owner_kind: OwnerKind,
    pub owner_id: Uuid,
    pub activity_type: ActivityType,
    #[schema(example = "Status changed from new to qualified")]
    pub description: String,
    pub date: DateTime<Utc>,
    pub performed_by_id: Uuid,
    pub outcome: Option<String>,
    pub notes: Option<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Atividade registrada manualmente (ligação, e-mail, reunião, nota).
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[schema(example = "call")]
    pub activity_type: Option<ActivityType>,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Ligação de qualificação")]
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub outcome: Option<String>,
    pub notes: Option<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
}
