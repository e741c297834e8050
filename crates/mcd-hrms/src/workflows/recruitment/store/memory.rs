use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::workflows::recruitment::domain::{
    Candidate, CandidateId, StatusTransition, VerificationStatus,
};
use crate::workflows::recruitment::repository::{
    CandidateRepository, CasOutcome, RepositoryError,
};

/// Process-local store; the status check and the write share one lock acquisition.
#[derive(Default, Clone)]
pub struct MemoryCandidateRepository {
    records: Arc<Mutex<HashMap<CandidateId, Candidate>>>,
}

impl MemoryCandidateRepository {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<CandidateId, Candidate>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }

    pub fn len(&self) -> usize {
        self.lock().map(|guard| guard.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CandidateRepository for MemoryCandidateRepository {
    fn insert(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        let mut guard = self.lock()?;
        let duplicate = guard.contains_key(&candidate.id)
            || guard
                .values()
                .any(|existing| existing.enrollment_number == candidate.enrollment_number);
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(candidate.id.clone(), candidate.clone());
        Ok(candidate)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }

    fn with_status(&self, status: VerificationStatus) -> Result<Vec<Candidate>, RepositoryError> {
        let guard = self.lock()?;
        let mut matching: Vec<Candidate> = guard
            .values()
            .filter(|candidate| candidate.verification_status == status)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(matching)
    }

    fn hired_into(&self, zone: &str) -> Result<Vec<Candidate>, RepositoryError> {
        let guard = self.lock()?;
        let mut hires: Vec<Candidate> = guard
            .values()
            .filter(|candidate| candidate.assigned_zone() == Some(zone))
            .cloned()
            .collect();
        hires.sort_by(|a, b| {
            let hired_at = |candidate: &Candidate| {
                candidate
                    .assignment
                    .as_ref()
                    .map(|assignment| assignment.hired_at)
            };
            hired_at(a)
                .cmp(&hired_at(b))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(hires)
    }

    fn compare_and_set(
        &self,
        id: &CandidateId,
        transition: &StatusTransition,
    ) -> Result<CasOutcome, RepositoryError> {
        let mut guard = self.lock()?;
        let Some(current) = guard.get_mut(id) else {
            return Ok(CasOutcome::Missing);
        };

        if !transition.permits(current.verification_status) {
            return Ok(CasOutcome::Stale(current.clone()));
        }

        *current = current.apply(transition);
        Ok(CasOutcome::Applied(current.clone()))
    }
}
