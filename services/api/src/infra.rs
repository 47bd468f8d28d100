use ar_audit::workflows::receivables::{
    AuditRepository, ChatMessage, DocumentId, DocumentVerificationResult, RepositoryError,
    ScoringPolicy, Transaction,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct EngagementState {
    transactions: Vec<Transaction>,
    /// Insertion order; listings reverse it.
    documents: Vec<DocumentVerificationResult>,
    report: Option<String>,
    messages: Vec<ChatMessage>,
}

/// Process-local store for a single audit engagement.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAuditRepository {
    state: Arc<Mutex<EngagementState>>,
}

impl AuditRepository for InMemoryAuditRepository {
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
        Ok(guard
            .documents
            .iter()
            .find(|stored| &stored.id == id)
            .cloned())
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

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_policy(raw: &str) -> Result<ScoringPolicy, String> {
    ScoringPolicy::parse(raw).ok_or_else(|| {
        format!("unknown scoring policy '{raw}' (expected heuristic, model_preferred or heuristic_floor)")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn document(id: &str) -> DocumentVerificationResult {
        DocumentVerificationResult {
            id: DocumentId(id.to_string()),
            file_name: format!("{id}.pdf"),
            uploaded_at: Utc
                .with_ymd_and_hms(2025, 1, 10, 8, 0, 0)
                .single()
                .expect("timestamp"),
            extraction: None,
            cut_off_test_passed: None,
            notes: String::new(),
        }
    }

    #[test]
    fn documents_are_append_only_and_listed_newest_first() {
        let repository = InMemoryAuditRepository::default();
        repository.append_document(document("doc-1")).expect("first");
        repository.append_document(document("doc-2")).expect("second");

        assert!(matches!(
            repository.append_document(document("doc-1")),
            Err(RepositoryError::Conflict)
        ));

        let ids: Vec<String> = repository
            .documents()
            .expect("documents")
            .into_iter()
            .map(|document| document.id.0)
            .collect();
        assert_eq!(ids, vec!["doc-2", "doc-1"]);
    }

    #[test]
    fn parse_date_requires_iso_dates() {
        assert_eq!(
            parse_date(" 2024-12-31 "),
            Ok(NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid"))
        );
        assert!(parse_date("31/12/2024").is_err());
    }

    #[test]
    fn parse_policy_lists_the_options_on_error() {
        assert_eq!(parse_policy("floor"), Ok(ScoringPolicy::HeuristicFloor));
        let error = parse_policy("median").expect_err("unknown policy");
        assert!(error.contains("heuristic_floor"));
    }
}
