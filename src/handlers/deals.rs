// src/handlers/deals.rs

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
    models::deal::{Deal, DealChanges, NewDeal},
};

// POST /api/deals
#[utoipa::path(
    post,
    path = "/api/deals",
    tag = "Deals",
    request_body = NewDeal,
    responses(
        (status = 201, description = "Negócio criado com os leads vinculados", body = Deal),
        (status = 400, description = "Campos inválidos ou motivo de fechamento ausente"),
        (status = 404, description = "Lead referenciado não existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_deal(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<NewDeal>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale.0, &app_state.i18n_store))?;

    let deal = app_state
        .pipeline
        .create_deal(payload, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(deal)))
}

// GET /api/deals
#[utoipa::path(
    get,
    path = "/api/deals",
    tag = "Deals",
    responses(
        (status = 200, description = "Negócios com seus leads, mais recentes primeiro", body = Vec<Deal>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_deals(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let deals = app_state
        .pipeline
        .list_deals()
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok(Json(deals))
}

// GET /api/deals/{id}
#[utoipa::path(
    get,
    path = "/api/deals/{id}",
    tag = "Deals",
    params(("id" = Uuid, Path, description = "ID do Negócio")),
    responses(
        (status = 200, description = "Negócio com seus leads", body = Deal),
        (status = 404, description = "Negócio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_deal(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deal = app_state
        .pipeline
        .get_deal(id)
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok(Json(deal))
}

// PATCH /api/deals/{id}
#[utoipa::path(
    patch,
    path = "/api/deals/{id}",
    tag = "Deals",
    request_body = DealChanges,
    params(("id" = Uuid, Path, description = "ID do Negócio")),
    responses(
        (status = 200, description = "Negócio atualizado e leads reconciliados", body = Deal),
        (status = 400, description = "Transição de etapa ou campos inválidos"),
        (status = 404, description = "Negócio não encontrado"),
        (status = 409, description = "Conflito de concorrência")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_deal(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DealChanges>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale.0, &app_state.i18n_store))?;

    let deal = app_state
        .pipeline
        .update_deal(id, payload, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok(Json(deal))
}

// DELETE /api/deals/{id}
#[utoipa::path(
    delete,
    path = "/api/deals/{id}",
    tag = "Deals",
    params(("id" = Uuid, Path, description = "ID do Negócio")),
    responses(
        (status = 204, description = "Negócio removido e leads desvinculados"),
        (status = 404, description = "Negócio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_deal(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .pipeline
        .delete_deal(id, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
