//! Client-side view of the first-come-first-serve pool.
//!
//! Deputy Commissioner dashboards hold a local copy of the pending candidates and
//! refresh it on a timer. The server stays the source of truth: any claim response
//! that settles a candidate removes it locally, and anything ambiguous marks the
//! view stale so the next poll re-derives it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Candidate, CandidateId, VerificationStatus};
use super::service::RecruitmentServiceError;

/// What a fresh read says about a claim whose response was lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClaimResolution {
    /// Approved by the asking zone: treat the earlier attempt as a success.
    Won { candidate: Box<Candidate> },
    /// Approved by another zone.
    #[serde(rename_all = "camelCase")]
    Lost { hired_by: String },
    /// Still submitted; retrying the claim is safe.
    Open,
    /// Neither claimable nor hired (not ready, or rejected).
    Closed { status: VerificationStatus },
    Missing,
}

impl ClaimResolution {
    pub fn observe(current: Option<&Candidate>, zone: &str) -> Self {
        let Some(candidate) = current else {
            return Self::Missing;
        };

        match (&candidate.assignment, candidate.verification_status) {
            (Some(assignment), _) if assignment.assigned_zone == zone => Self::Won {
                candidate: Box::new(candidate.clone()),
            },
            (Some(assignment), _) => Self::Lost {
                hired_by: assignment.assigned_zone.clone(),
            },
            (None, status) if status.is_claimable() => Self::Open,
            (None, status) => Self::Closed { status },
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, Self::Won { .. })
    }
}

/// Optimistic local list of claimable candidates.
#[derive(Debug, Clone)]
pub struct PendingPool {
    entries: Vec<Candidate>,
    refresh_every: Duration,
    refreshed_at: Option<DateTime<Utc>>,
    stale: bool,
}

impl PendingPool {
    pub fn new(refresh_every: Duration) -> Self {
        Self {
            entries: Vec::new(),
            refresh_every,
            refreshed_at: None,
            stale: true,
        }
    }

    pub fn entries(&self) -> &[Candidate] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &CandidateId) -> bool {
        self.entries.iter().any(|candidate| &candidate.id == id)
    }

    /// Replaces the local view with a server snapshot.
    pub fn refresh(&mut self, snapshot: Vec<Candidate>, now: DateTime<Utc>) {
        self.entries = snapshot
            .into_iter()
            .filter(|candidate| candidate.verification_status.is_claimable())
            .collect();
        self.refreshed_at = Some(now);
        self.stale = false;
    }

    /// True once the poll interval has elapsed or a response invalidated the view.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        let Some(refreshed_at) = self.refreshed_at else {
            return true;
        };
        if self.stale {
            return true;
        }

        let elapsed = now.signed_duration_since(refreshed_at);
        elapsed
            .to_std()
            .map(|elapsed| elapsed >= self.refresh_every)
            .unwrap_or(false)
    }

    /// Applies a claim response for `id`. Returns true when the entry was dropped.
    pub fn reconcile(
        &mut self,
        id: &CandidateId,
        response: &Result<Candidate, RecruitmentServiceError>,
    ) -> bool {
        let settled = match response {
            Ok(_) => true,
            Err(err) => err.settles_candidate(),
        };

        if settled {
            self.remove(id)
        } else {
            self.stale = true;
            false
        }
    }

    /// Applies a resolution obtained after an unknown outcome.
    pub fn settle(&mut self, id: &CandidateId, resolution: &ClaimResolution) -> bool {
        match resolution {
            ClaimResolution::Open => false,
            _ => self.remove(id),
        }
    }

    fn remove(&mut self, id: &CandidateId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|candidate| &candidate.id != id);
        before != self.entries.len()
    }
}
