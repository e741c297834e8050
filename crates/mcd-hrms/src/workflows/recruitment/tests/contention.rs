use std::sync::{Arc, Barrier};
use std::thread;

use super::common::*;
use crate::workflows::recruitment::domain::{Candidate, VerificationStatus};
use crate::workflows::recruitment::repository::{CandidateRepository, RecruitmentNotifier};
use crate::workflows::recruitment::store::{MemoryCandidateRepository, SqliteCandidateRepository};
use crate::workflows::recruitment::{RecruitmentService, RecruitmentServiceError};

const ZONES: [&str; 6] = ["Central", "Rohini", "Karol Bagh", "South", "West", "Narela"];

type ClaimResult = (String, Result<Candidate, RecruitmentServiceError>);

/// Fires one claim per zone at the same candidate, released together by a barrier.
fn race_claims<R, N>(
    service: Arc<RecruitmentService<R, N>>,
    candidate_id: &str,
) -> Vec<ClaimResult>
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    let barrier = Arc::new(Barrier::new(ZONES.len()));
    let handles: Vec<_> = ZONES
        .iter()
        .map(|zone| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let candidate_id = candidate_id.to_string();
            let zone = zone.to_string();
            thread::spawn(move || {
                barrier.wait();
                let result = service.claim(&candidate_id, &zone, None);
                (zone, result)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().expect("claim thread panicked"))
        .collect()
}

fn assert_single_winner(results: &[ClaimResult], stored: &Candidate) {
    let winners: Vec<_> = results
        .iter()
        .filter(|(_, result)| result.is_ok())
        .collect();
    assert_eq!(winners.len(), 1, "exactly one zone must win: {results:?}");
    let winning_zone = winners[0].0.as_str();

    for (zone, result) in results {
        if zone == winning_zone {
            continue;
        }
        match result {
            Err(RecruitmentServiceError::AlreadyHired { hired_by, .. }) => {
                assert_eq!(hired_by, winning_zone);
            }
            other => panic!("losing zone {zone} got {other:?}"),
        }
    }

    assert_eq!(stored.verification_status, VerificationStatus::Approved);
    assert_eq!(stored.assigned_zone(), Some(winning_zone));
    assert!(stored.is_consistent());
}

#[test]
fn memory_store_admits_one_winner_per_candidate() {
    let repository = Arc::new(MemoryCandidateRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = Arc::new(RecruitmentService::new(
        repository.clone(),
        notifier.clone(),
    ));
    let candidate = submitted_candidate(service.as_ref(), "MCD/SI/2024/201");

    let results = race_claims(Arc::clone(&service), candidate.id.as_str());
    let stored = repository
        .fetch(&candidate.id)
        .expect("fetch")
        .expect("present");

    assert_single_winner(&results, &stored);
    assert_eq!(notifier.events().len(), 1, "only the winner notifies");
}

#[test]
fn sqlite_connections_sharing_a_file_admit_one_winner() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("recruitment.db");

    let seed = RecruitmentService::new(
        Arc::new(SqliteCandidateRepository::open(&path).expect("open seed")),
        Arc::new(MemoryNotifier::default()),
    );
    let candidate = submitted_candidate(&seed, "MCD/SI/2024/202");

    // Each zone gets its own connection, as separate server processes would.
    let barrier = Arc::new(Barrier::new(ZONES.len()));
    let handles: Vec<_> = ZONES
        .iter()
        .map(|zone| {
            let repository =
                Arc::new(SqliteCandidateRepository::open(&path).expect("open connection"));
            let service =
                RecruitmentService::new(repository, Arc::new(MemoryNotifier::default()));
            let barrier = Arc::clone(&barrier);
            let candidate_id = candidate.id.to_string();
            let zone = zone.to_string();
            thread::spawn(move || {
                barrier.wait();
                let result = service.claim(&candidate_id, &zone, None);
                (zone, result)
            })
        })
        .collect();

    let results: Vec<ClaimResult> = handles
        .into_iter()
        .map(|handle| handle.join().expect("claim thread panicked"))
        .collect();

    let stored = seed.get(candidate.id.as_str()).expect("stored candidate");
    assert_single_winner(&results, &stored);
}

#[test]
fn many_candidates_each_get_exactly_one_zone() {
    let (service, repository, _) = build_service();
    let service = Arc::new(service);
    let candidates: Vec<_> = (0..8)
        .map(|n| submitted_candidate(service.as_ref(), &format!("MCD/SI/2024/3{n:02}")))
        .collect();

    for candidate in &candidates {
        let results = race_claims(Arc::clone(&service), candidate.id.as_str());
        let stored = repository
            .fetch(&candidate.id)
            .expect("fetch")
            .expect("present");
        assert_single_winner(&results, &stored);
    }

    assert!(service.pending_pool().expect("pool").is_empty());
}

#[test]
fn approve_and_reject_race_settles_on_one_outcome() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let candidate = submitted_candidate(service.as_ref(), "MCD/SI/2024/203");
    let barrier = Arc::new(Barrier::new(2));

    let approver = {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let id = candidate.id.to_string();
        thread::spawn(move || {
            barrier.wait();
            service.claim(&id, "West", None)
        })
    };
    let rejecter = {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let id = candidate.id.to_string();
        thread::spawn(move || {
            barrier.wait();
            service.reject(&id, "Medical certificate expired")
        })
    };

    let approved = approver.join().expect("approver panicked");
    let rejected = rejecter.join().expect("rejecter panicked");
    assert!(approved.is_ok() ^ rejected.is_ok(), "exactly one side commits");

    let stored = service.get(candidate.id.as_str()).expect("stored");
    assert!(stored.is_consistent());
    if approved.is_ok() {
        assert_eq!(stored.verification_status, VerificationStatus::Approved);
        assert!(matches!(
            rejected,
            Err(RecruitmentServiceError::AlreadyHired { .. })
        ));
    } else {
        assert_eq!(stored.verification_status, VerificationStatus::Rejected);
        assert!(matches!(
            approved,
            Err(RecruitmentServiceError::NotClaimable {
                status: VerificationStatus::Rejected,
                ..
            })
        ));
    }
}
