use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::recruitment::domain::{
    Candidate, CandidateId, CandidateRegistration, StatusTransition, VerificationStatus,
};
use crate::workflows::recruitment::repository::{
    CandidateRepository, CasOutcome, NotifyError, RecruitmentNotice, RecruitmentNotifier,
    RepositoryError,
};
use crate::workflows::recruitment::store::MemoryCandidateRepository;
use crate::workflows::recruitment::{recruitment_router, RecruitmentService};

pub(super) const DOSSIER: &str = "https://drive.example.in/dossiers/mcd-si";

pub(super) fn registration(enrollment: &str) -> CandidateRegistration {
    CandidateRegistration {
        full_name: "Priya Sharma".to_string(),
        email: "priya.sharma@example.in".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1997, 5, 21).expect("valid date"),
        exam_id: "DSSSB-SI-2024".to_string(),
        enrollment_number: enrollment.to_string(),
    }
}

pub(super) type MemoryService = RecruitmentService<MemoryCandidateRepository, MemoryNotifier>;

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryCandidateRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(MemoryCandidateRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = RecruitmentService::new(repository.clone(), notifier.clone());
    (service, repository, notifier)
}

/// Registers a candidate and walks them into the hiring pool.
pub(super) fn submitted_candidate<R, N>(
    service: &RecruitmentService<R, N>,
    enrollment: &str,
) -> Candidate
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    let registered = service
        .register(registration(enrollment))
        .expect("registration succeeds");
    service
        .submit_documents(registered.id.as_str(), DOSSIER)
        .expect("documents accepted")
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<RecruitmentNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<RecruitmentNotice> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl RecruitmentNotifier for MemoryNotifier {
    fn publish(&self, notice: RecruitmentNotice) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl RecruitmentNotifier for FailingNotifier {
    fn publish(&self, _notice: RecruitmentNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

/// Repository that must never be reached; proves validation runs first.
pub(super) struct UntouchableRepository;

impl CandidateRepository for UntouchableRepository {
    fn insert(&self, _candidate: Candidate) -> Result<Candidate, RepositoryError> {
        panic!("insert must not be called")
    }

    fn fetch(&self, _id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        panic!("fetch must not be called")
    }

    fn with_status(
        &self,
        _status: VerificationStatus,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        panic!("with_status must not be called")
    }

    fn hired_into(&self, _zone: &str) -> Result<Vec<Candidate>, RepositoryError> {
        panic!("hired_into must not be called")
    }

    fn compare_and_set(
        &self,
        _id: &CandidateId,
        _transition: &StatusTransition,
    ) -> Result<CasOutcome, RepositoryError> {
        panic!("compare_and_set must not be called")
    }
}

pub(super) struct UnavailableRepository;

impl CandidateRepository for UnavailableRepository {
    fn insert(&self, _candidate: Candidate) -> Result<Candidate, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn with_status(
        &self,
        _status: VerificationStatus,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn hired_into(&self, _zone: &str) -> Result<Vec<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn compare_and_set(
        &self,
        _id: &CandidateId,
        _transition: &StatusTransition,
    ) -> Result<CasOutcome, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Memory store whose `compare_and_set` parks until the test opens the gate,
/// standing in for a SQLite write waiting on another process's lock.
pub(super) struct GatedRepository {
    inner: Arc<MemoryCandidateRepository>,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl GatedRepository {
    /// Returns the repository, a receiver signalled when a write starts
    /// waiting, and the sender that lets it through.
    pub(super) fn around(
        inner: Arc<MemoryCandidateRepository>,
    ) -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let repository = Self {
            inner,
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        (repository, entered_rx, release_tx)
    }
}

impl CandidateRepository for GatedRepository {
    fn insert(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        self.inner.insert(candidate)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn with_status(
        &self,
        status: VerificationStatus,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        self.inner.with_status(status)
    }

    fn hired_into(&self, zone: &str) -> Result<Vec<Candidate>, RepositoryError> {
        self.inner.hired_into(zone)
    }

    fn compare_and_set(
        &self,
        id: &CandidateId,
        transition: &StatusTransition,
    ) -> Result<CasOutcome, RepositoryError> {
        let _ = self.entered.lock().expect("gate mutex poisoned").send(());
        self.release
            .lock()
            .expect("gate mutex poisoned")
            .recv_timeout(Duration::from_secs(5))
            .map_err(|_| RepositoryError::Unavailable("write lock never released".to_string()))?;
        self.inner.compare_and_set(id, transition)
    }
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    recruitment_router(Arc::new(service), 30)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
