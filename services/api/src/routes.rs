use crate::infra::AppState;
use ar_audit::error::AppError;
use ar_audit::workflows::receivables::{
    audit_router, AuditRepository, AuditService, LedgerImporter, RiskBands, RiskRun,
};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct LedgerImportRequest {
    pub(crate) ledger_csv: String,
    /// Run a risk assessment straight after loading.
    #[serde(default)]
    pub(crate) assess: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct LedgerImportResponse {
    pub(crate) loaded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) assessment: Option<RiskRun>,
    pub(crate) bands: RiskBands,
}

pub(crate) fn with_audit_routes<R>(service: Arc<AuditService<R>>) -> axum::Router
where
    R: AuditRepository + 'static,
{
    audit_router(service.clone())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/audit/ledger/import",
            axum::routing::post(ledger_import_endpoint::<R>),
        )
        .layer(Extension(service))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn ledger_import_endpoint<R>(
    Extension(service): Extension<Arc<AuditService<R>>>,
    Json(payload): Json<LedgerImportRequest>,
) -> Result<Json<LedgerImportResponse>, AppError>
where
    R: AuditRepository + 'static,
{
    let LedgerImportRequest { ledger_csv, assess } = payload;

    let transactions = LedgerImporter::from_reader(Cursor::new(ledger_csv.into_bytes()))?;
    let loaded = service.load_transactions(transactions)?;

    let assessment = if assess {
        Some(service.assess_risk()?)
    } else {
        None
    };
    let bands = match &assessment {
        Some(run) => run.bands,
        None => RiskBands::from_transactions(&service.transactions()?),
    };

    Ok(Json(LedgerImportResponse {
        loaded,
        assessment,
        bands,
    }))
}
