// src/services/rules.rs
// Regras de entrada compartilhadas pelos serviços do funil.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{common::error::AppError, db::UnitOfWork};

/// Texto obrigatório: ausente ou só espaços vira `required`.
pub fn required_text(value: Option<String>, field: &'static str) -> Result<String, AppError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(AppError::missing(field)),
    }
}

pub fn required<T>(value: Option<T>, field: &'static str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::missing(field))
}

pub fn non_negative(value: Option<Decimal>, field: &'static str) -> Result<(), AppError> {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => Err(AppError::invalid(field, "negative_value")),
        _ => Ok(()),
    }
}

pub fn probability(value: Option<i32>) -> Result<(), AppError> {
    match value {
        Some(p) if !(0..=100).contains(&p) => Err(AppError::invalid("probability", "invalid_probability")),
        _ => Ok(()),
    }
}

pub fn transition(
    entity: &'static str,
    allowed: bool,
    from: &str,
    to: &str,
) -> Result<(), AppError> {
    if allowed {
        return Ok(());
    }
    Err(AppError::InvalidTransition {
        entity,
        from: from.to_string(),
        to: to.to_string(),
    })
}

/// Toda referência a negócio precisa apontar para um negócio existente.
pub async fn ensure_deal_exists(uow: &mut dyn UnitOfWork, deal_id: Uuid) -> Result<(), AppError> {
    match uow.find_deal(deal_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("deal", deal_id)),
    }
}
