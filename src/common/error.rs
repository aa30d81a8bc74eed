use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::common::i18n::I18nStore;

// SQLSTATEs que indicam disputa entre transações (vale tentar de novo)
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// As cinco categorias de erro que a borda da API conhece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    Validation,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Token inválido ou ausente")]
    Unauthorized,

    #[error("{entity} {id} não encontrado")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Campo inválido: {field} ({code})")]
    InvalidField { field: &'static str, code: &'static str },

    #[error("Transição inválida de {entity}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Conflito de concorrência: {0}")]
    Conflict(String),

    #[error("Transação excedeu o tempo limite")]
    TransactionTimeout,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        AppError::NotFound { entity, id }
    }

    pub fn missing(field: &'static str) -> Self {
        AppError::InvalidField { field, code: "required" }
    }

    pub fn invalid(field: &'static str, code: &'static str) -> Self {
        AppError::InvalidField { field, code }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthorized => ErrorKind::Unauthorized,
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::ValidationError(_)
            | AppError::InvalidField { .. }
            | AppError::InvalidTransition { .. } => ErrorKind::Validation,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::DatabaseError(e) => classify_db_error(e),
            AppError::TransactionTimeout
            | AppError::InternalServerError(_)
            | AppError::JwtError(_) => ErrorKind::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Código estável usado para buscar a mensagem traduzida.
    fn message_code(&self) -> &'static str {
        match self {
            AppError::NotFound { entity, .. } => match *entity {
                "lead" => "lead_not_found",
                "deal" => "deal_not_found",
                "proposal" => "proposal_not_found",
                _ => "not_found",
            },
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::TransactionTimeout => "timeout",
            other => match other.kind() {
                ErrorKind::Unauthorized => "unauthorized",
                ErrorKind::NotFound => "not_found",
                ErrorKind::Validation => "invalid_fields",
                ErrorKind::Conflict => "conflict",
                ErrorKind::Internal => "internal",
            },
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let codes: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), codes);
                }
                Some(json!(details))
            }
            AppError::InvalidField { field, code } => {
                let mut details = serde_json::Map::new();
                details.insert(field.to_string(), json!([code]));
                Some(Value::Object(details))
            }
            AppError::InvalidTransition { from, to, .. } => Some(json!({ "from": from, "to": to })),
            AppError::NotFound { id, .. } => Some(json!({ "id": id })),
            _ => None,
        }
    }

    /// Converte o erro de domínio no corpo público, no idioma do cliente.
    /// Falhas internas são logadas aqui e nunca vazam detalhes.
    pub fn to_api_error(&self, locale: &str, i18n: &I18nStore) -> ApiError {
        let kind = self.kind();
        if kind == ErrorKind::Internal {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        ApiError {
            status: kind.status(),
            kind,
            message: i18n.message(locale, self.message_code()),
            details: self.details(),
        }
    }
}

fn classify_db_error(error: &sqlx::Error) -> ErrorKind {
    match error {
        sqlx::Error::RowNotFound => ErrorKind::NotFound,
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                return ErrorKind::Conflict;
            }
            match db_err.code().as_deref() {
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => ErrorKind::Conflict,
                _ => ErrorKind::Internal,
            }
        }
        _ => ErrorKind::Internal,
    }
}

/// O erro que sai pela API: tipo + mensagem legível, sem stack trace.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = json!({
            "kind": self.kind,
            "message": self.message,
        });
        if let Some(details) = self.details {
            error["details"] = details;
        }

        (self.status, Json(json!({ "error": error }))).into_response()
    }
}
