pub mod activity;
pub mod auth;
pub mod deal;
pub mod lead;
pub mod proposal;
