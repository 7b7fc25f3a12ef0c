pub mod error;
pub mod pg;
pub mod registry;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use error::RegistryError;
pub use pg::{migrate, with_retries, PgCandidateStore, PgDomainRegistry, PgSessionStore};
pub use registry::{CandidateStore, DomainRegistry, SessionStore};
pub use types::{
    Candidate, CheckResult, DiscoverySessionRow, Domain, NewCandidate, ProcessingLogEntry,
    SessionTotals,
};
