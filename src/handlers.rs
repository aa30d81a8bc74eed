pub mod activities;
pub mod deals;
pub mod leads;
pub mod proposals;
