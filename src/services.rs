pub mod activity_ledger;
pub mod auth;
pub mod deal_service;
pub mod lead_service;
pub mod pipeline;
pub mod proposal_service;
pub mod rules;
pub mod sequence;

pub use pipeline::{PipelineService, TxSettings};
