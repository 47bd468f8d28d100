use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::AuditConfig;
use crate::workflows::receivables::collaborators::{
    CollaboratorError, GenerationRequest, TextGenerator,
};
use crate::workflows::receivables::domain::{
    ChatMessage, DocumentId, DocumentType, DocumentVerificationResult, ExtractedDocumentData,
    Transaction,
};
use crate::workflows::receivables::repository::{AuditRepository, RepositoryError};
use crate::workflows::receivables::risk::{RiskFlagger, ScoringPolicy};
use crate::workflows::receivables::service::{AuditService, Collaborators};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn fiscal_year_end() -> NaiveDate {
    date(2024, 12, 31)
}

pub(super) fn uploaded_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn transaction(id: &str, posted: Option<NaiveDate>, amount: Decimal) -> Transaction {
    Transaction::new(id, posted, "Acme Corp", amount, "Receivable")
}

/// The six-line sample ledger used across the workbench.
pub(super) fn sample_ledger() -> Vec<Transaction> {
    vec![
        Transaction::new(
            "TXN-001",
            Some(date(2024, 11, 15)),
            "Acme Corp",
            Decimal::from(5000),
            "Consulting Services",
        )
        .rescored(10, Some("Seeded".to_string())),
        Transaction::new(
            "TXN-002",
            Some(date(2024, 12, 24)),
            "Globex Inc",
            Decimal::from(9999),
            "Software License",
        ),
        Transaction::new(
            "TXN-003",
            Some(date(2024, 12, 31)),
            "Soylent Corp",
            Decimal::from(250000),
            "Bulk Purchase",
        ),
        Transaction::new(
            "TXN-004",
            Some(date(2024, 12, 30)),
            "Initech",
            Decimal::new(123456, 2),
            "Office Supplies",
        ),
        Transaction::new(
            "TXN-005",
            Some(date(2025, 1, 2)),
            "Umbrella Corp",
            Decimal::from(5000),
            "Medical Supplies",
        ),
        Transaction::new(
            "TXN-006",
            Some(date(2024, 12, 25)),
            "Cyberdyne",
            Decimal::from(50000),
            "R&D Hardware",
        ),
    ]
}

pub(super) fn extraction(
    invoice_date: Option<NaiveDate>,
    delivery_date: Option<NaiveDate>,
) -> ExtractedDocumentData {
    ExtractedDocumentData {
        invoice_number: "INV-2024-118".to_string(),
        invoice_date,
        delivery_date,
        total_amount: Decimal::new(1250050, 2),
        customer_name: "Soylent Corp".to_string(),
        line_items_summary: None,
        document_type: DocumentType::Invoice,
    }
}

pub(super) fn audit_config(risk_policy: ScoringPolicy) -> AuditConfig {
    AuditConfig {
        fiscal_year_end: fiscal_year_end(),
        risk_policy,
    }
}

pub(super) fn build_service(
    collaborators: Collaborators,
    risk_policy: ScoringPolicy,
) -> (AuditService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = AuditService::new(repository.clone(), collaborators, audit_config(risk_policy));
    (service, repository)
}

pub(super) fn offline_service() -> (AuditService<MemoryRepository>, Arc<MemoryRepository>) {
    build_service(
        Collaborators::offline(RiskFlagger::default()),
        ScoringPolicy::HeuristicFloor,
    )
}

#[derive(Default)]
pub(super) struct MemoryState {
    pub(super) transactions: Vec<Transaction>,
    pub(super) documents: Vec<DocumentVerificationResult>,
    pub(super) report: Option<String>,
    pub(super) messages: Vec<ChatMessage>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) state: Arc<Mutex<MemoryState>>,
}

impl AuditRepository for MemoryRepository {
    fn transactions(&self) -> Result<Vec<Transaction>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.transactions.clone())
    }

    fn replace_transactions(&self, transactions: Vec<Transaction>) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.transactions = transactions;
        Ok(())
    }

    fn append_document(
        &self,
        document: DocumentVerificationResult,
    ) -> Result<DocumentVerificationResult, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        if guard.documents.iter().any(|stored| stored.id == document.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.documents.push(document.clone());
        Ok(document)
    }

    fn documents(&self) -> Result<Vec<DocumentVerificationResult>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.documents.iter().rev().cloned().collect())
    }

    fn fetch_document(
        &self,
        id: &DocumentId,
    ) -> Result<Option<DocumentVerificationResult>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.documents.iter().find(|stored| &stored.id == id).cloned())
    }

    fn store_report(&self, report: String) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.report = Some(report);
        Ok(())
    }

    fn report(&self) -> Result<Option<String>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.report.clone())
    }

    fn append_message(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.messages.push(message);
        Ok(())
    }

    fn messages(&self) -> Result<Vec<ChatMessage>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.messages.clone())
    }
}

pub(super) struct UnavailableRepository;

impl AuditRepository for UnavailableRepository {
    fn transactions(&self) -> Result<Vec<Transaction>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn replace_transactions(&self, _transactions: Vec<Transaction>) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn append_document(
        &self,
        _document: DocumentVerificationResult,
    ) -> Result<DocumentVerificationResult, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn documents(&self) -> Result<Vec<DocumentVerificationResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_document(
        &self,
        _id: &DocumentId,
    ) -> Result<Option<DocumentVerificationResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn store_report(&self, _report: String) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn report(&self) -> Result<Option<String>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn append_message(&self, _message: ChatMessage) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn messages(&self) -> Result<Vec<ChatMessage>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Text generator replaying canned replies in order; `Err` entries simulate
/// an unreachable provider. Every request is recorded.
#[derive(Default)]
pub(super) struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub(super) fn replying(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("generator mutex poisoned").clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, CollaboratorError> {
        self.requests
            .lock()
            .expect("generator mutex poisoned")
            .push(request.clone());

        match self
            .replies
            .lock()
            .expect("generator mutex poisoned")
            .pop_front()
        {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(CollaboratorError::Unavailable(message)),
            None => Err(CollaboratorError::Unavailable("no scripted reply".to_string())),
        }
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
