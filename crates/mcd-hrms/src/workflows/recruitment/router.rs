use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use super::domain::{Candidate, CandidateRegistration};
use super::repository::{CandidateRepository, RecruitmentNotifier, RepositoryError};
use super::service::{RecruitmentService, RecruitmentServiceError};
use super::validation::ValidationError;

/// Shared handler state: the service plus the poll interval advertised to dashboards.
pub struct RecruitmentApi<R, N> {
    pub service: Arc<RecruitmentService<R, N>>,
    pub refresh_after_secs: u64,
}

impl<R, N> Clone for RecruitmentApi<R, N> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            refresh_after_secs: self.refresh_after_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    #[serde(default)]
    pub candidate_id: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub ward: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    #[serde(default)]
    pub candidate_id: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsRequest {
    #[serde(default)]
    pub dossier_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ZoneQuery {
    #[serde(default)]
    pub zone: String,
}

/// JSON body extractor whose rejections use the `validation` error envelope.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(error_response(
                ValidationError::MalformedBody(rejection.body_text()).into(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CandidateEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    user: Candidate,
}

impl CandidateEnvelope {
    fn of(user: Candidate) -> Self {
        Self {
            success: true,
            message: None,
            user,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PendingEnvelope {
    success: bool,
    candidates: Vec<Candidate>,
    refresh_after_secs: u64,
}

/// Router builder exposing the recruitment allocation endpoints.
pub fn recruitment_router<R, N>(
    service: Arc<RecruitmentService<R, N>>,
    refresh_after_secs: u64,
) -> Router
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/recruitment/candidates",
            post(register_handler::<R, N>),
        )
        .route(
            "/api/v1/recruitment/candidates/:candidate_id",
            get(candidate_handler::<R, N>),
        )
        .route(
            "/api/v1/recruitment/candidates/:candidate_id/verify",
            post(verify_handler::<R, N>),
        )
        .route(
            "/api/v1/recruitment/candidates/:candidate_id/documents",
            post(documents_handler::<R, N>),
        )
        .route(
            "/api/v1/recruitment/candidates/:candidate_id/claim",
            get(claim_status_handler::<R, N>),
        )
        .route("/api/v1/recruitment/pending", get(pending_handler::<R, N>))
        .route("/api/v1/recruitment/approve", post(approve_handler::<R, N>))
        .route("/api/v1/recruitment/reject", post(reject_handler::<R, N>))
        .route("/api/v1/recruitment/zones", get(zones_handler::<R, N>))
        .route(
            "/api/v1/recruitment/zones/:zone/hires",
            get(zone_hires_handler::<R, N>),
        )
        .with_state(RecruitmentApi {
            service,
            refresh_after_secs,
        })
}

pub(crate) async fn register_handler<R, N>(
    State(api): State<RecruitmentApi<R, N>>,
    ValidJson(registration): ValidJson<CandidateRegistration>,
) -> Response
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    match off_runtime(&api.service, move |service| service.register(registration)).await {
        Ok(candidate) => {
            (StatusCode::CREATED, axum::Json(CandidateEnvelope::of(candidate))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn candidate_handler<R, N>(
    State(api): State<RecruitmentApi<R, N>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    candidate_response(off_runtime(&api.service, move |service| service.get(&candidate_id)).await)
}

pub(crate) async fn verify_handler<R, N>(
    State(api): State<RecruitmentApi<R, N>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    candidate_response(
        off_runtime(&api.service, move |service| service.verify(&candidate_id)).await,
    )
}

pub(crate) async fn documents_handler<R, N>(
    State(api): State<RecruitmentApi<R, N>>,
    Path(candidate_id): Path<String>,
    ValidJson(request): ValidJson<DocumentsRequest>,
) -> Response
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    candidate_response(
        off_runtime(&api.service, move |service| {
            service.submit_documents(&candidate_id, &request.dossier_url)
        })
        .await,
    )
}

pub(crate) async fn claim_status_handler<R, N>(
    State(api): State<RecruitmentApi<R, N>>,
    Path(candidate_id): Path<String>,
    Query(query): Query<ZoneQuery>,
) -> Response
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    let status = off_runtime(&api.service, move |service| {
        service.claim_status(&candidate_id, &query.zone)
    });
    match status.await {
        Ok(resolution) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "resolution": resolution })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn pending_handler<R, N>(State(api): State<RecruitmentApi<R, N>>) -> Response
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    match off_runtime(&api.service, |service| service.pending_pool()).await {
        Ok(candidates) => (
            StatusCode::OK,
            axum::Json(PendingEnvelope {
                success: true,
                candidates,
                refresh_after_secs: api.refresh_after_secs,
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approve_handler<R, N>(
    State(api): State<RecruitmentApi<R, N>>,
    ValidJson(request): ValidJson<ClaimRequest>,
) -> Response
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    let claim = off_runtime(&api.service, move |service| {
        service.claim(
            &request.candidate_id,
            &request.zone,
            request.ward.as_deref(),
        )
    });
    candidate_response(claim.await)
}

pub(crate) async fn reject_handler<R, N>(
    State(api): State<RecruitmentApi<R, N>>,
    ValidJson(request): ValidJson<RejectRequest>,
) -> Response
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    let rejection = off_runtime(&api.service, move |service| {
        service.reject(&request.candidate_id, &request.reason)
    });
    match rejection.await {
        Ok(candidate) => (
            StatusCode::OK,
            axum::Json(CandidateEnvelope {
                success: true,
                message: Some("candidate rejected".to_string()),
                user: candidate,
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn zones_handler<R, N>(State(api): State<RecruitmentApi<R, N>>) -> Response
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    (
        StatusCode::OK,
        axum::Json(json!({ "success": true, "zones": api.service.zones() })),
    )
        .into_response()
}

pub(crate) async fn zone_hires_handler<R, N>(
    State(api): State<RecruitmentApi<R, N>>,
    Path(zone): Path<String>,
) -> Response
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
{
    match off_runtime(&api.service, move |service| service.zone_hires(&zone)).await {
        Ok(candidates) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "candidates": candidates })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

/// Runs a service call on the blocking pool; storage may wait on locks held by
/// other processes and must not stall the async workers.
async fn off_runtime<R, N, T, F>(
    service: &Arc<RecruitmentService<R, N>>,
    call: F,
) -> Result<T, RecruitmentServiceError>
where
    R: CandidateRepository + 'static,
    N: RecruitmentNotifier + 'static,
    T: Send + 'static,
    F: FnOnce(&RecruitmentService<R, N>) -> Result<T, RecruitmentServiceError> + Send + 'static,
{
    let service = Arc::clone(service);
    match tokio::task::spawn_blocking(move || call(&service)).await {
        Ok(result) => result,
        Err(join_error) => Err(RepositoryError::Unavailable(format!(
            "storage task did not complete: {join_error}"
        ))
        .into()),
    }
}

fn candidate_response(result: Result<Candidate, RecruitmentServiceError>) -> Response {
    match result {
        Ok(candidate) => {
            (StatusCode::OK, axum::Json(CandidateEnvelope::of(candidate))).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Maps service failures onto `{ success: false, message, code }` payloads.
pub(crate) fn error_response(error: RecruitmentServiceError) -> Response {
    let message = error.to_string();
    let (status, payload) = match &error {
        RecruitmentServiceError::Validation(_) => (
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "code": "validation", "message": message }),
        ),
        RecruitmentServiceError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            json!({ "success": false, "code": "not_found", "message": message }),
        ),
        RecruitmentServiceError::AlreadyHired { hired_by, .. } => (
            StatusCode::CONFLICT,
            json!({
                "success": false,
                "code": "already_hired",
                "message": message,
                "hiredBy": hired_by,
            }),
        ),
        RecruitmentServiceError::NotClaimable { status, .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "success": false,
                "code": "not_claimable",
                "message": message,
                "status": status,
            }),
        ),
        RecruitmentServiceError::InvalidTransition { status, .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "success": false,
                "code": "invalid_transition",
                "message": message,
                "status": status,
            }),
        ),
        RecruitmentServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({
                "success": false,
                "code": "conflict",
                "message": "candidate already registered",
            }),
        ),
        RecruitmentServiceError::Repository(RepositoryError::Unavailable(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "success": false, "code": "storage_unavailable", "message": message }),
        ),
        RecruitmentServiceError::Repository(RepositoryError::Integrity(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "success": false, "code": "storage_integrity", "message": message }),
        ),
    };

    (status, axum::Json(payload)).into_response()
}
