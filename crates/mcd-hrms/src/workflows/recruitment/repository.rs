use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Candidate, CandidateId, StatusTransition, VerificationStatus};

/// Result of a conditional status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// The stored status matched and the transition committed.
    Applied(Candidate),
    /// No record exists under the id.
    Missing,
    /// The stored status did not match; carries the record as it stands.
    Stale(Candidate),
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Implementations must make `compare_and_set` a single indivisible operation:
/// the status check and the write commit together or not at all.
pub trait CandidateRepository: Send + Sync {
    fn insert(&self, candidate: Candidate) -> Result<Candidate, RepositoryError>;
    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError>;
    /// Candidates in `status`, oldest submission first.
    fn with_status(&self, status: VerificationStatus) -> Result<Vec<Candidate>, RepositoryError>;
    /// Approved candidates posted to `zone`, earliest hire first.
    fn hired_into(&self, zone: &str) -> Result<Vec<Candidate>, RepositoryError>;
    fn compare_and_set(
        &self,
        id: &CandidateId,
        transition: &StatusTransition,
    ) -> Result<CasOutcome, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    /// A stored row broke a schema rule other than uniqueness.
    #[error("repository integrity violation: {0}")]
    Integrity(String),
}

/// Outbound hook for recruitment events (e-mail, SMS or dashboard feeds).
pub trait RecruitmentNotifier: Send + Sync {
    fn publish(&self, notice: RecruitmentNotice) -> Result<(), NotifyError>;
}

/// Event payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecruitmentNotice {
    pub template: String,
    pub candidate_id: CandidateId,
    pub details: BTreeMap<String, String>,
}

impl RecruitmentNotice {
    pub fn hired(candidate: &Candidate) -> Self {
        let mut details = BTreeMap::new();
        if let Some(assignment) = &candidate.assignment {
            details.insert("zone".to_string(), assignment.assigned_zone.clone());
            details.insert("ward".to_string(), assignment.assigned_ward.clone());
        }
        details.insert("email".to_string(), candidate.email.clone());
        Self {
            template: "candidate_hired".to_string(),
            candidate_id: candidate.id.clone(),
            details,
        }
    }

    pub fn rejected(candidate: &Candidate) -> Self {
        let mut details = BTreeMap::new();
        if let Some(reason) = &candidate.rejection_reason {
            details.insert("reason".to_string(), reason.clone());
        }
        details.insert("email".to_string(), candidate.email.clone());
        Self {
            template: "candidate_rejected".to_string(),
            candidate_id: candidate.id.clone(),
            details,
        }
    }
}

/// Notice dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
