use mcd_hrms::config::StorageConfig;
use mcd_hrms::workflows::recruitment::{
    Candidate, CandidateId, CandidateRepository, CasOutcome, MemoryCandidateRepository,
    NotifyError, RecruitmentNotice, RecruitmentNotifier, RepositoryError,
    SqliteCandidateRepository, StatusTransition, VerificationStatus,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Candidate storage selected at startup.
pub(crate) enum CandidateStore {
    Memory(MemoryCandidateRepository),
    Sqlite(SqliteCandidateRepository),
}

impl CandidateStore {
    pub(crate) fn from_config(storage: &StorageConfig) -> Result<Self, RepositoryError> {
        match storage {
            StorageConfig::Memory => Ok(Self::Memory(MemoryCandidateRepository::default())),
            StorageConfig::Sqlite { path } => {
                SqliteCandidateRepository::open(path).map(Self::Sqlite)
            }
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Sqlite(_) => "sqlite",
        }
    }

    fn backend(&self) -> &dyn CandidateRepository {
        match self {
            Self::Memory(store) => store,
            Self::Sqlite(store) => store,
        }
    }
}

impl CandidateRepository for CandidateStore {
    fn insert(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        self.backend().insert(candidate)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        self.backend().fetch(id)
    }

    fn with_status(&self, status: VerificationStatus) -> Result<Vec<Candidate>, RepositoryError> {
        self.backend().with_status(status)
    }

    fn hired_into(&self, zone: &str) -> Result<Vec<Candidate>, RepositoryError> {
        self.backend().hired_into(zone)
    }

    fn compare_and_set(
        &self,
        id: &CandidateId,
        transition: &StatusTransition,
    ) -> Result<CasOutcome, RepositoryError> {
        self.backend().compare_and_set(id, transition)
    }
}

/// Emits notices as structured log events for downstream mail relays to tail.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingNotifier;

impl RecruitmentNotifier for TracingNotifier {
    fn publish(&self, notice: RecruitmentNotice) -> Result<(), NotifyError> {
        info!(
            template = %notice.template,
            candidate_id = %notice.candidate_id,
            details = ?notice.details,
            "recruitment notice"
        );
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct NoticeLog {
    events: Arc<Mutex<Vec<RecruitmentNotice>>>,
}

impl RecruitmentNotifier for NoticeLog {
    fn publish(&self, notice: RecruitmentNotice) -> Result<(), NotifyError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NotifyError::Transport("notice log poisoned".to_string()))?;
        guard.push(notice);
        Ok(())
    }
}

impl NoticeLog {
    pub(crate) fn events(&self) -> Vec<RecruitmentNotice> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}
