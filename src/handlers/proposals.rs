// src/handlers/proposals.rs

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
    models::proposal::{NewProposal, Proposal, ProposalChanges},
};

// POST /api/proposals
#[utoipa::path(
    post,
    path = "/api/proposals",
    tag = "Proposals",
    request_body = NewProposal,
    responses(
        (status = 201, description = "Proposta criada com número sequencial", body = Proposal),
        (status = 400, description = "Campos inválidos"),
        (status = 404, description = "Negócio referenciado não existe"),
        (status = 500, description = "Numeração indisponível após novas tentativas")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_proposal(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<NewProposal>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale.0, &app_state.i18n_store))?;

    let proposal = app_state
        .pipeline
        .create_proposal(payload, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(proposal)))
}

// GET /api/proposals
#[utoipa::path(
    get,
    path = "/api/proposals",
    tag = "Proposals",
    responses(
        (status = 200, description = "Propostas, mais recentes primeiro", body = Vec<Proposal>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_proposals(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let proposals = app_state
        .pipeline
        .list_proposals()
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok(Json(proposals))
}

// GET /api/proposals/{id}
#[utoipa::path(
    get,
    path = "/api/proposals/{id}",
    tag = "Proposals",
    params(("id" = Uuid, Path, description = "ID da Proposta")),
    responses(
        (status = 200, description = "Proposta", body = Proposal),
        (status = 404, description = "Proposta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_proposal(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let proposal = app_state
        .pipeline
        .get_proposal(id)
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok(Json(proposal))
}

// PATCH /api/proposals/{id}
#[utoipa::path(
    patch,
    path = "/api/proposals/{id}",
    tag = "Proposals",
    request_body = ProposalChanges,
    params(("id" = Uuid, Path, description = "ID da Proposta")),
    responses(
        (status = 200, description = "Proposta atualizada", body = Proposal),
        (status = 400, description = "Transição ou campos inválidos"),
        (status = 404, description = "Proposta não encontrada"),
        (status = 409, description = "Conflito de concorrência")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_proposal(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProposalChanges>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale.0, &app_state.i18n_store))?;

    let proposal = app_state
        .pipeline
        .update_proposal(id, payload, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok(Json(proposal))
}

// DELETE /api/proposals/{id}
#[utoipa::path(
    delete,
    path = "/api/proposals/{id}",
    tag = "Proposals",
    params(("id" = Uuid, Path, description = "ID da Proposta")),
    responses(
        (status = 204, description = "Proposta removida"),
        (status = 404, description = "Proposta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_proposal(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .pipeline
        .delete_proposal(id, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale.0, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
