use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAuditRepository};
use crate::routes::with_audit_routes;
use ar_audit::config::AppConfig;
use ar_audit::error::AppError;
use ar_audit::telemetry;
use ar_audit::workflows::receivables::{
    AuditService, Collaborators, RiskFlagger, RiskRulesConfig,
};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryAuditRepository::default());
    let collaborators = Collaborators::offline(RiskFlagger::new(RiskRulesConfig::default()));
    let audit_service = Arc::new(AuditService::new(
        repository,
        collaborators,
        config.audit.clone(),
    ));

    let app = with_audit_routes(audit_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        fiscal_year_end = %config.audit.fiscal_year_end,
        risk_policy = config.audit.risk_policy.label(),
        "receivables audit service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
