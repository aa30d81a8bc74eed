// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::auth_guard};

/// Monta o roteador completo. Toda rota do funil exige um Bearer válido.
pub fn app(app_state: AppState) -> Router {
    let lead_routes = Router::new()
        .route("/"
               ,post(handlers::leads::create_lead)
               .get(handlers::leads::list_leads)
        )
        .route("/{id}"
               ,get(handlers::leads::get_lead)
               .patch(handlers::leads::update_lead)
               .delete(handlers::leads::delete_lead)
        )
        .route("/{id}/activities"
               ,post(handlers::activities::log_lead_activity)
               .get(handlers::activities::list_lead_activities)
        );

    let deal_routes = Router::new()
        .route("/"
               ,post(handlers::deals::create_deal)
               .get(handlers::deals::list_deals)
        )
        .route("/{id}"
               ,get(handlers::deals::get_deal)
               .patch(handlers::deals::update_deal)
               .delete(handlers::deals::delete_deal)
        )
        .route("/{id}/activities"
               ,post(handlers::activities::log_deal_activity)
               .get(handlers::activities::list_deal_activities)
        );

    let proposal_routes = Router::new()
        .route("/"
               ,post(handlers::proposals::create_proposal)
               .get(handlers::proposals::list_proposals)
        )
        .route("/{id}"
               ,get(handlers::proposals::get_proposal)
               .patch(handlers::proposals::update_proposal)
               .delete(handlers::proposals::delete_proposal)
        );

    let pipeline_routes = Router::new()
        .nest("/leads", lead_routes)
        .nest("/deals", deal_routes)
        .nest("/proposals", proposal_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", pipeline_routes)
        .with_state(app_state)
}
