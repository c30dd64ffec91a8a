use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApplicationRepository, InMemoryOcrExtractor, InMemoryVerificationStore,
};
use crate::routes::with_verification_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_verify::config::AppConfig;
use loan_verify::error::AppError;
use loan_verify::telemetry;
use loan_verify::verification::VerificationService;
use std::sync::atomic::Ordering;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let repository = Arc::new(InMemoryApplicationRepository::default());
    let extractions = Arc::new(InMemoryOcrExtractor::default());
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        documents: repository.clone(),
        extractions: extractions.clone(),
    };

    let results = Arc::new(InMemoryVerificationStore::default());
    let verification_service = Arc::new(VerificationService::new(
        repository,
        results,
        extractions,
        config.verification.clone(),
    ));

    let app = with_verification_routes(verification_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        salary_tolerance = config.verification.salary_tolerance,
        missing_ssn = config.verification.missing_ssn.label(),
        "loan verification service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
