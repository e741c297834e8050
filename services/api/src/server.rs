use crate::cli::ServeArgs;
use crate::infra::{AppState, CandidateStore, TracingNotifier};
use crate::routes::with_recruitment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mcd_hrms::config::{AppConfig, StorageConfig};
use mcd_hrms::error::AppError;
use mcd_hrms::telemetry;
use mcd_hrms::workflows::recruitment::RecruitmentService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.database.take() {
        config.storage = StorageConfig::Sqlite { path };
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = CandidateStore::from_config(&config.storage)?;
    let store_label = store.label();
    let service = Arc::new(RecruitmentService::new(
        Arc::new(store),
        Arc::new(TracingNotifier),
    ));

    let app = with_recruitment_routes(service, config.recruitment.pending_refresh.as_secs())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        storage = store_label,
        "recruitment allocation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
