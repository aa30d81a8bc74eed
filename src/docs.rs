// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Leads ---
        handlers::leads::create_lead,
        handlers::leads::list_leads,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::delete_lead,

        // --- Deals ---
        handlers::deals::create_deal,
        handlers::deals::list_deals,
        handlers::deals::get_deal,
        handlers::deals::update_deal,
        handlers::deals::delete_deal,

        // --- Proposals ---
        handlers::proposals::create_proposal,
        handlers::proposals::list_proposals,
        handlers::proposals::get_proposal,
        handlers::proposals::update_proposal,
        handlers::proposals::delete_proposal,

        // --- Activities ---
        handlers::activities::log_lead_activity,
        handlers::activities::list_lead_activities,
        handlers::activities::log_deal_activity,
        handlers::activities::list_deal_activities,
    ),
    components(
        schemas(
            // --- Leads ---
            models::lead::Lead,
            models::lead::LeadStatus,
            models::lead::LeadSource,
            models::lead::LeadPriority,
            models::lead::NewLead,
            models::lead::LeadChanges,

            // --- Deals ---
            models::deal::Deal,
            models::deal::DealStage,
            models::deal::NewDeal,
            models::deal::DealChanges,

            // --- Proposals ---
            models::proposal::Proposal,
            models::proposal::ProposalStatus,
            models::proposal::NewProposal,
            models::proposal::ProposalChanges,

            // --- Activities ---
            models::activity::Activity,
            models::activity::ActivityType,
            models::activity::OwnerKind,
            models::activity::NewActivity,
        )
    ),
    tags(
        (name = "Leads", description = "Captação e qualificação de leads"),
        (name = "Deals", description = "Negócios e seus leads vinculados"),
        (name = "Proposals", description = "Propostas comerciais numeradas por período"),
        (name = "Activities", description = "Histórico de contatos e eventos do funil")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
