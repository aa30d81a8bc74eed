// src/handlers/activities.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::activity::{Activity, NewActivity, OwnerRef},
};

// =============================================================================
//  HISTÓRICO DE LEADS
// =============================================================================

// POST /api/leads/{id}/activities
#[utoipa::path(
    post,
    path = "/api/leads/{id}/activities",
    tag = "Activities",
    request_body = NewActivity,
    params(("id" = Uuid, Path, description = "ID do Lead")),
    responses(
        (status = 201, description = "Atividade registrada; contatos atualizam o lead", body = Activity),
        (status = 400, description = "Tipo reservado ou campos inválidos"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn log_lead_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewActivity>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale.0, &app_state.i18n_store))?;

    let activity = app_state
        .pipeline
        .log_lead_activity(id, payload, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(activity)))
}

// GET /api/leads/{id}/activities
#[utoipa::path(
    get,
    path = "/api/leads/{id}/activities",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "ID do Lead")),
    responses(
        (status = 200, description = "Histórico do lead, mais recente primeiro", body = Vec<Activity>),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_lead_activities(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let activities = app_state
        .pipeline
        .list_activities(OwnerRef::lead(id))
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok(Json(activities))
}

// =============================================================================
//  HISTÓRICO DE NEGÓCIOS
// =============================================================================

// POST /api/deals/{id}/activities
#[utoipa::path(
    post,
    path = "/api/deals/{id}/activities",
    tag = "Activities",
    request_body = NewActivity,
    params(("id" = Uuid, Path, description = "ID do Negócio")),
    responses(
        (status = 201, description = "Atividade registrada", body = Activity),
        (status = 400, description = "Tipo reservado ou campos inválidos"),
        (status = 404, description = "Negócio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn log_deal_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewActivity>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale.0, &app_state.i18n_store))?;

    let activity = app_state
        .pipeline
        .log_deal_activity(id, payload, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(activity)))
}

// GET /api/deals/{id}/activities
#[utoipa::path(
    get,
    path = "/api/deals/{id}/activities",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "ID do Negócio")),
    responses(
        (status = 200, description = "Histórico do negócio, mais recente primeiro", body = Vec<Activity>),
        (status = 404, description = "Negócio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_deal_activities(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let activities = app_state
        .pipeline
        .list_activities(OwnerRef::deal(id))
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok(Json(activities))
}
