pub mod unit_of_work;
pub use unit_of_work::{Database, UnitOfWork};
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod deal_repo;
pub use deal_repo::DealRepository;
pub mod proposal_repo;
pub use proposal_repo::ProposalRepository;
pub mod activity_repo;
pub use activity_repo::ActivityRepository;
pub mod sequence_repo;
pub use sequence_repo::SequenceRepository;

pub mod pg;
pub use pg::PgDatabase;
pub mod memory;
pub use memory::MemoryDatabase;
