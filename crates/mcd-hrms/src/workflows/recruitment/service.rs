use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    Assignment, Candidate, CandidateId, CandidateRegistration, StatusTransition,
    VerificationStatus,
};
use super::pool::ClaimResolution;
use super::repository::{
    CandidateRepository, CasOutcome, RecruitmentNotice, RecruitmentNotifier, RepositoryError,
};
use super::validation::{
    parse_candidate_id, require_dossier_link, require_reason, RegistrationGuard, ValidationError,
};
use super::zones::{Zone, ZoneDirectory};

/// Service composing validation, the zone directory, storage, and notifications.
pub struct RecruitmentService<R, N> {
    guard: RegistrationGuard,
    zones: Arc<ZoneDirectory>,
    repository: Arc<R>,
    notifier: Arc<N>,
}

impl<R, N> RecruitmentService<R, N>
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self::with_zones(ZoneDirectory::standard(), repository, notifier)
    }

    pub fn with_zones(zones: ZoneDirectory, repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            guard: RegistrationGuard,
            zones: Arc::new(zones),
            repository,
            notifier,
        }
    }

    /// Register a candidate whose exam result qualifies them for onboarding.
    pub fn register(
        &self,
        registration: CandidateRegistration,
    ) -> Result<Candidate, RecruitmentServiceError> {
        let candidate = self.guard.candidate_from(registration, Utc::now())?;
        let stored = self.repository.insert(candidate)?;
        info!(candidate_id = %stored.id, "candidate registered");
        Ok(stored)
    }

    /// Mark a pending candidate's exam credentials as verified.
    pub fn verify(&self, candidate_id: &str) -> Result<Candidate, RecruitmentServiceError> {
        let id = parse_candidate_id(candidate_id)?;
        self.transition(&id, StatusTransition::Verify { at: Utc::now() })
    }

    /// Record the document dossier and place the candidate into the hiring pool.
    pub fn submit_documents(
        &self,
        candidate_id: &str,
        dossier_url: &str,
    ) -> Result<Candidate, RecruitmentServiceError> {
        let id = parse_candidate_id(candidate_id)?;
        let dossier_url = require_dossier_link(dossier_url)?;
        self.transition(
            &id,
            StatusTransition::SubmitDocuments {
                dossier_url,
                at: Utc::now(),
            },
        )
    }

    /// First-come-first-serve hire. Exactly one concurrent caller wins; the rest
    /// receive `AlreadyHired` naming the winning zone.
    pub fn claim(
        &self,
        candidate_id: &str,
        zone: &str,
        ward: Option<&str>,
    ) -> Result<Candidate, RecruitmentServiceError> {
        let id = parse_candidate_id(candidate_id)?;
        let placement = self.zones.place(zone, ward)?;

        let transition = StatusTransition::Hire(Assignment {
            hired_by: placement.zone.clone(),
            assigned_zone: placement.zone,
            assigned_ward: placement.ward,
            hired_at: Utc::now(),
        });

        self.transition(&id, transition)
    }

    /// Return a candidate with a mandatory reason. Loses to a hire that committed first.
    pub fn reject(
        &self,
        candidate_id: &str,
        reason: &str,
    ) -> Result<Candidate, RecruitmentServiceError> {
        let id = parse_candidate_id(candidate_id)?;
        let reason = require_reason(reason)?;
        self.transition(
            &id,
            StatusTransition::Reject {
                reason,
                at: Utc::now(),
            },
        )
    }

    /// Fresh read of a single candidate.
    pub fn get(&self, candidate_id: &str) -> Result<Candidate, RecruitmentServiceError> {
        let id = parse_candidate_id(candidate_id)?;
        self.repository
            .fetch(&id)?
            .ok_or(RecruitmentServiceError::NotFound(id))
    }

    /// Every candidate still open for hiring, first submission first.
    pub fn pending_pool(&self) -> Result<Vec<Candidate>, RecruitmentServiceError> {
        Ok(self
            .repository
            .with_status(VerificationStatus::Submitted)?)
    }

    pub fn zone_hires(&self, zone: &str) -> Result<Vec<Candidate>, RecruitmentServiceError> {
        let zone_name = zone.trim();
        if zone_name.is_empty() {
            return Err(ValidationError::MissingZone.into());
        }
        let zone = self
            .zones
            .find(zone_name)
            .ok_or_else(|| ValidationError::UnknownZone(zone_name.to_string()))?;
        Ok(self.repository.hired_into(&zone.name)?)
    }

    pub fn zones(&self) -> &[Zone] {
        self.zones.zones()
    }

    /// Settles a claim whose response never arrived, from a fresh read.
    pub fn claim_status(
        &self,
        candidate_id: &str,
        zone: &str,
    ) -> Result<ClaimResolution, RecruitmentServiceError> {
        let id = parse_candidate_id(candidate_id)?;
        let placement = self.zones.place(zone, None)?;
        let current = self.repository.fetch(&id)?;
        Ok(ClaimResolution::observe(current.as_ref(), &placement.zone))
    }

    fn transition(
        &self,
        id: &CandidateId,
        transition: StatusTransition,
    ) -> Result<Candidate, RecruitmentServiceError> {
        match self.repository.compare_and_set(id, &transition)? {
            CasOutcome::Applied(candidate) => {
                info!(
                    candidate_id = %candidate.id,
                    status = %candidate.verification_status,
                    zone = candidate.assigned_zone().unwrap_or_default(),
                    "candidate {}",
                    transition.action()
                );
                self.announce(&candidate);
                Ok(candidate)
            }
            CasOutcome::Missing => Err(RecruitmentServiceError::NotFound(id.clone())),
            CasOutcome::Stale(current) => {
                let error = RecruitmentServiceError::refused(&transition, current);
                warn!(candidate_id = %id, error = %error, "transition refused");
                Err(error)
            }
        }
    }

    /// Notices are best effort: the transition has already committed.
    fn announce(&self, candidate: &Candidate) {
        let notice = match candidate.verification_status {
            VerificationStatus::Approved => RecruitmentNotice::hired(candidate),
            VerificationStatus::Rejected => RecruitmentNotice::rejected(candidate),
            _ => return,
        };

        if let Err(err) = self.notifier.publish(notice) {
            warn!(candidate_id = %candidate.id, error = %err, "recruitment notice dropped");
        }
    }
}

/// Error raised by the recruitment service.
#[derive(Debug, thiserror::Error)]
pub enum RecruitmentServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("candidate {0} not found")]
    NotFound(CandidateId),
    #[error("already hired")]
    AlreadyHired {
        candidate_id: CandidateId,
        hired_by: String,
    },
    #[error("candidate {candidate_id} is not claimable while {status}")]
    NotClaimable {
        candidate_id: CandidateId,
        status: VerificationStatus,
    },
    #[error("candidate {candidate_id} cannot be {action} while {status}")]
    InvalidTransition {
        candidate_id: CandidateId,
        action: &'static str,
        status: VerificationStatus,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RecruitmentServiceError {
    /// Classifies a compare-and-set that found the record in another state.
    fn refused(transition: &StatusTransition, current: Candidate) -> Self {
        let status = current.verification_status;
        if let Some(assignment) = current.assignment {
            return Self::AlreadyHired {
                candidate_id: current.id,
                hired_by: assignment.assigned_zone,
            };
        }

        match transition {
            StatusTransition::Hire(_) => Self::NotClaimable {
                candidate_id: current.id,
                status,
            },
            other => Self::InvalidTransition {
                candidate_id: current.id,
                action: other.action(),
                status,
            },
        }
    }

    /// Whether the caller's view of the candidate is settled and should be dropped.
    pub fn settles_candidate(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::AlreadyHired { .. } | Self::NotClaimable { .. }
        )
    }
}
