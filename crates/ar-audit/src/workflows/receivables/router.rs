use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::collaborators::DocumentUpload;
use super::cutoff::parse_document_date;
use super::domain::{DocumentId, ExtractedDocumentData, Transaction};
use super::repository::{AuditRepository, RepositoryError};
use super::service::{AuditService, AuditServiceError};

/// Router builder exposing the audit workbench over HTTP.
pub fn audit_router<R>(service: Arc<AuditService<R>>) -> Router
where
    R: AuditRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/audit/transactions",
            get(list_transactions_handler::<R>).put(load_transactions_handler::<R>),
        )
        .route(
            "/api/v1/audit/risk-assessment",
            post(risk_assessment_handler::<R>),
        )
        .route("/api/v1/audit/dashboard", get(dashboard_handler::<R>))
        .route(
            "/api/v1/audit/documents",
            get(list_documents_handler::<R>).post(submit_document_handler::<R>),
        )
        .route(
            "/api/v1/audit/documents/:document_id",
            get(document_handler::<R>),
        )
        .route("/api/v1/audit/cutoff", post(cutoff_handler::<R>))
        .route("/api/v1/audit/report", post(report_handler::<R>))
        .route("/api/v1/audit/chat", post(chat_handler::<R>))
        .with_state(service)
}

/// Either a raw upload (base64 `content`) or fields extracted upstream.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DocumentSubmission {
    Extracted {
        file_name: String,
        extraction: ExtractedDocumentData,
    },
    Upload {
        file_name: String,
        mime_type: String,
        content: String,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct CutoffRequest {
    #[serde(default)]
    invoice_date: Option<String>,
    #[serde(default)]
    delivery_date: Option<String>,
    #[serde(default)]
    fiscal_year_end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatRequest {
    question: String,
}

pub(crate) async fn load_transactions_handler<R>(
    State(service): State<Arc<AuditService<R>>>,
    axum::Json(transactions): axum::Json<Vec<Transaction>>,
) -> Response
where
    R: AuditRepository + 'static,
{
    match service.load_transactions(transactions) {
        Ok(count) => (StatusCode::OK, axum::Json(json!({ "loaded": count }))).into_response(),
        Err(other) => service_error(other),
    }
}

pub(crate) async fn list_transactions_handler<R>(
    State(service): State<Arc<AuditService<R>>>,
) -> Response
where
    R: AuditRepository + 'static,
{
    match service.transactions() {
        Ok(transactions) => (StatusCode::OK, axum::Json(transactions)).into_response(),
        Err(other) => service_error(other),
    }
}

pub(crate) async fn risk_assessment_handler<R>(
    State(service): State<Arc<AuditService<R>>>,
) -> Response
where
    R: AuditRepository + 'static,
{
    match service.assess_risk() {
        Ok(run) => (StatusCode::OK, axum::Json(run)).into_response(),
        Err(other) => service_error(other),
    }
}

pub(crate) async fn dashboard_handler<R>(State(service): State<Arc<AuditService<R>>>) -> Response
where
    R: AuditRepository + 'static,
{
    match service.dashboard() {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(other) => service_error(other),
    }
}

pub(crate) async fn submit_document_handler<R>(
    State(service): State<Arc<AuditService<R>>>,
    axum::Json(submission): axum::Json<DocumentSubmission>,
) -> Response
where
    R: AuditRepository + 'static,
{
    let uploaded_at = Utc::now();
    let outcome = match submission {
        DocumentSubmission::Extracted {
            file_name,
            extraction,
        } => service.record_extraction(file_name, extraction, uploaded_at),
        DocumentSubmission::Upload {
            file_name,
            mime_type,
            content,
        } => {
            let bytes = match STANDARD.decode(content.trim()) {
                Ok(bytes) => bytes,
                Err(error) => {
                    let payload = json!({
                        "error": format!("content is not valid base64: {error}"),
                    });
                    return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
                }
            };
            service.verify_document(DocumentUpload::new(file_name, mime_type, bytes), uploaded_at)
        }
    };

    match outcome {
        Ok(document) => (StatusCode::CREATED, axum::Json(document)).into_response(),
        Err(AuditServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "document already exists",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => service_error(other),
    }
}

pub(crate) async fn list_documents_handler<R>(
    State(service): State<Arc<AuditService<R>>>,
) -> Response
where
    R: AuditRepository + 'static,
{
    match service.documents() {
        Ok(documents) => (StatusCode::OK, axum::Json(documents)).into_response(),
        Err(other) => service_error(other),
    }
}

pub(crate) async fn document_handler<R>(
    State(service): State<Arc<AuditService<R>>>,
    Path(document_id): Path<String>,
) -> Response
where
    R: AuditRepository + 'static,
{
    let id = DocumentId(document_id);
    match service.document(&id) {
        Ok(document) => (StatusCode::OK, axum::Json(document)).into_response(),
        Err(AuditServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": format!("document {} not found", id.0),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => service_error(other),
    }
}

pub(crate) async fn cutoff_handler<R>(
    State(service): State<Arc<AuditService<R>>>,
    axum::Json(request): axum::Json<CutoffRequest>,
) -> Response
where
    R: AuditRepository + 'static,
{
    let fiscal_year_end = match request.fiscal_year_end.as_deref() {
        None => None,
        Some(raw) => match parse_document_date(raw) {
            Some(date) => Some(date),
            None => {
                let payload = json!({
                    "error": format!("invalid fiscal_year_end '{raw}'"),
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
        },
    };

    let result = service.evaluate_cutoff(
        request.invoice_date.as_deref(),
        request.delivery_date.as_deref(),
        fiscal_year_end,
    );
    let payload = json!({
        "status": result.status,
        "passed": result.passed(),
        "notes": result.notes,
        "fiscal_year_end": fiscal_year_end.unwrap_or(service.config().fiscal_year_end),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn report_handler<R>(State(service): State<Arc<AuditService<R>>>) -> Response
where
    R: AuditRepository + 'static,
{
    match service.draft_summary() {
        Ok(report) => (StatusCode::OK, axum::Json(json!({ "report": report }))).into_response(),
        Err(other) => service_error(other),
    }
}

pub(crate) async fn chat_handler<R>(
    State(service): State<Arc<AuditService<R>>>,
    axum::Json(request): axum::Json<ChatRequest>,
) -> Response
where
    R: AuditRepository + 'static,
{
    match service.ask(&request.question) {
        Ok(answer) => (StatusCode::OK, axum::Json(answer)).into_response(),
        Err(AuditServiceError::EmptyQuestion) => {
            let payload = json!({
                "error": AuditServiceError::EmptyQuestion.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(other) => service_error(other),
    }
}

fn service_error(error: AuditServiceError) -> Response {
    let status = match &error {
        AuditServiceError::EmptyQuestion => StatusCode::UNPROCESSABLE_ENTITY,
        AuditServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AuditServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AuditServiceError::Collaborator(_) => StatusCode::BAD_GATEWAY,
        AuditServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
