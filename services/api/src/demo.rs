use crate::infra::{CandidateStore, NoticeLog};
use chrono::{NaiveDate, Utc};
use clap::Args;
use mcd_hrms::config::{RecruitmentConfig, StorageConfig};
use mcd_hrms::error::AppError;
use mcd_hrms::workflows::recruitment::{
    Candidate, CandidateRegistration, PendingPool, RecruitmentService, RecruitmentServiceError,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Barrier;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Zones competing for every candidate (comma separated).
    #[arg(
        long,
        value_delimiter = ',',
        default_values = ["Central", "Rohini", "Karol Bagh", "South"]
    )]
    pub(crate) zones: Vec<String>,
    /// Number of candidates placed in the hiring pool.
    #[arg(long, default_value_t = 3)]
    pub(crate) candidates: usize,
    /// Run the race against this SQLite file instead of memory.
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

type DemoService = RecruitmentService<CandidateStore, NoticeLog>;

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        zones,
        candidates,
        database,
    } = args;

    let storage = match database {
        Some(path) => StorageConfig::Sqlite { path },
        None => StorageConfig::Memory,
    };
    let store = CandidateStore::from_config(&storage)?;
    println!("Recruitment allocation demo ({} store)", store.label());

    let notices = Arc::new(NoticeLog::default());
    let service = Arc::new(RecruitmentService::new(Arc::new(store), notices.clone()));

    let pool_candidates = seed_pool(&service, candidates);
    if pool_candidates.is_empty() {
        println!("No candidates reached the hiring pool");
        return Ok(());
    }

    let mut pool = PendingPool::new(RecruitmentConfig::default().pending_refresh);
    match service.pending_pool() {
        Ok(snapshot) => pool.refresh(snapshot, Utc::now()),
        Err(err) => {
            println!("Pending pool unavailable: {}", err);
            return Ok(());
        }
    }
    println!(
        "- {} candidates open | {} zones competing: {}",
        pool.len(),
        zones.len(),
        zones.join(", ")
    );

    for candidate in &pool_candidates {
        println!("\nRace for {} ({})", candidate.full_name, candidate.id);
        for (zone, result) in race(&service, candidate, &zones).await {
            match &result {
                Ok(hired) => println!(
                    "  + {} hired into ward {}",
                    zone,
                    hired
                        .assignment
                        .as_ref()
                        .map(|assignment| assignment.assigned_ward.as_str())
                        .unwrap_or("-")
                ),
                Err(RecruitmentServiceError::AlreadyHired { hired_by, .. }) => {
                    println!("  - {} lost: already hired by {}", zone, hired_by)
                }
                Err(err) => println!("  ! {} failed: {}", zone, err),
            }
            pool.reconcile(&candidate.id, &result);
        }
    }

    println!("\nHires per zone");
    for zone in &zones {
        match service.zone_hires(zone) {
            Ok(hires) => println!("- {}: {}", zone, hires.len()),
            Err(err) => println!("- {}: {}", zone, err),
        }
    }
    println!("Candidates still open locally: {}", pool.len());

    let events = notices.events();
    if events.is_empty() {
        println!("Notices: none dispatched");
    } else {
        println!("Notices:");
        for notice in events {
            println!("  - template={} -> {}", notice.template, notice.candidate_id);
        }
    }

    Ok(())
}

fn seed_pool(service: &DemoService, count: usize) -> Vec<Candidate> {
    let date_of_birth = NaiveDate::from_ymd_opt(1998, 1, 15).unwrap_or_default();
    let run = Utc::now().timestamp();

    (1..=count)
        .filter_map(|n| {
            let registration = CandidateRegistration {
                full_name: format!("Demo Candidate {n}"),
                email: format!("candidate{n}@example.in"),
                date_of_birth,
                exam_id: "DSSSB-DEMO".to_string(),
                enrollment_number: format!("DEMO/{run}/{n:03}"),
            };
            let submitted = service.register(registration).and_then(|candidate| {
                service.submit_documents(
                    candidate.id.as_str(),
                    &format!("https://dossiers.example.in/{}", candidate.id),
                )
            });
            match submitted {
                Ok(candidate) => Some(candidate),
                Err(err) => {
                    println!("  Skipping candidate {n}: {err}");
                    None
                }
            }
        })
        .collect()
}

/// Releases one claim per zone at the same instant and collects every answer.
async fn race(
    service: &Arc<DemoService>,
    candidate: &Candidate,
    zones: &[String],
) -> Vec<(String, Result<Candidate, RecruitmentServiceError>)> {
    let barrier = Arc::new(Barrier::new(zones.len()));
    let handles: Vec<_> = zones
        .iter()
        .map(|zone| {
            let service = Arc::clone(service);
            let barrier = Arc::clone(&barrier);
            let candidate_id = candidate.id.to_string();
            let zone = zone.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                let claim_zone = zone.clone();
                let result = tokio::task::spawn_blocking(move || {
                    service.claim(&candidate_id, &claim_zone, None)
                })
                .await;
                (zone, result)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok((zone, Ok(result))) => results.push((zone, result)),
            Ok((zone, Err(err))) => println!("  ! {} claim task aborted: {}", zone, err),
            Err(err) => println!("  ! claim task aborted: {}", err),
        }
    }
    results
}
