//! Recruitment allocation: registration, document submission, and the
//! first-come-first-serve hire claim contested by zone Deputy Commissioners.
//!
//! Every status change goes through `CandidateRepository::compare_and_set`, so a
//! transition commits only while the stored status still matches what it expects.

pub mod domain;
pub mod pool;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;
pub mod validation;
pub mod zones;

#[cfg(test)]
mod tests;

pub use domain::{
    Assignment, Candidate, CandidateId, CandidateRegistration, PartialAssignment,
    StatusTransition, VerificationStatus,
};
pub use pool::{ClaimResolution, PendingPool};
pub use repository::{
    CandidateRepository, CasOutcome, NotifyError, RecruitmentNotice, RecruitmentNotifier,
    RepositoryError,
};
pub use router::{recruitment_router, RecruitmentApi, ValidJson};
pub use service::{RecruitmentService, RecruitmentServiceError};
pub use store::{MemoryCandidateRepository, SqliteCandidateRepository};
pub use validation::ValidationError;
pub use zones::{Placement, Zone, ZoneDirectory};
