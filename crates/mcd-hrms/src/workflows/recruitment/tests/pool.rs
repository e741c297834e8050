use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use super::common::*;
use crate::workflows::recruitment::domain::CandidateId;
use crate::workflows::recruitment::repository::RepositoryError;
use crate::workflows::recruitment::{ClaimResolution, PendingPool, RecruitmentServiceError};

#[test]
fn refresh_keeps_only_claimable_candidates() {
    let (service, _, _) = build_service();
    let open = submitted_candidate(&service, "MCD/SI/2024/501");
    let pending = service
        .register(registration("MCD/SI/2024/502"))
        .expect("registration");

    let mut pool = PendingPool::new(Duration::from_secs(30));
    pool.refresh(vec![open.clone(), pending.clone()], Utc::now());

    assert_eq!(pool.len(), 1);
    assert!(pool.contains(&open.id));
    assert!(!pool.contains(&pending.id));
}

#[test]
fn needs_refresh_tracks_interval_and_staleness() {
    let now = Utc::now();
    let mut pool = PendingPool::new(Duration::from_secs(30));
    assert!(pool.needs_refresh(now), "never refreshed");

    pool.refresh(Vec::new(), now);
    assert!(!pool.needs_refresh(now + ChronoDuration::seconds(10)));
    assert!(pool.needs_refresh(now + ChronoDuration::seconds(30)));

    let unavailable: Result<_, RecruitmentServiceError> =
        Err(RepositoryError::Unavailable("timeout".to_string()).into());
    pool.reconcile(&CandidateId("cand-x".to_string()), &unavailable);
    assert!(pool.needs_refresh(now + ChronoDuration::seconds(1)));
}

#[test]
fn losing_a_claim_removes_the_candidate_locally() {
    let (service, _, _) = build_service();
    let candidate = submitted_candidate(&service, "MCD/SI/2024/503");
    let mut pool = PendingPool::new(Duration::from_secs(30));
    pool.refresh(service.pending_pool().expect("pool"), Utc::now());

    service
        .claim(candidate.id.as_str(), "Rohini", None)
        .expect("rival zone wins");
    let lost = service.claim(candidate.id.as_str(), "Karol Bagh", None);

    assert!(matches!(lost, Err(RecruitmentServiceError::AlreadyHired { .. })));
    assert!(pool.reconcile(&candidate.id, &lost));
    assert!(pool.is_empty());
}

#[test]
fn winning_a_claim_removes_the_candidate_locally() {
    let (service, _, _) = build_service();
    let candidate = submitted_candidate(&service, "MCD/SI/2024/504");
    let mut pool = PendingPool::new(Duration::from_secs(30));
    pool.refresh(service.pending_pool().expect("pool"), Utc::now());

    let won = service.claim(candidate.id.as_str(), "Central", None);
    assert!(pool.reconcile(&candidate.id, &won));
    assert!(!pool.contains(&candidate.id));
}

#[test]
fn settle_uses_a_fresh_read_after_lost_responses() {
    let (service, _, _) = build_service();
    let candidate = submitted_candidate(&service, "MCD/SI/2024/505");
    let mut pool = PendingPool::new(Duration::from_secs(30));
    pool.refresh(service.pending_pool().expect("pool"), Utc::now());

    let open = service
        .claim_status(candidate.id.as_str(), "West")
        .expect("status");
    assert_eq!(open, ClaimResolution::Open);
    assert!(!pool.settle(&candidate.id, &open));
    assert!(pool.contains(&candidate.id));

    service
        .claim(candidate.id.as_str(), "West", None)
        .expect("claim");
    let won = service
        .claim_status(candidate.id.as_str(), "West")
        .expect("status");
    assert!(won.is_win());
    assert!(pool.settle(&candidate.id, &won));
    assert!(pool.is_empty());
}
