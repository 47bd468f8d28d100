use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AuditConfig;

use super::aggregate::{DashboardView, RiskBands};
use super::collaborators::{
    DocumentExtractor, DocumentUpload, HeuristicRiskScorer, ModelDocumentExtractor, ModelDrafter,
    ModelRiskScorer, NarrativeDrafter, RiskScorer, StructuredPayloadExtractor, TemplateDrafter,
    TextGenerator,
};
use super::cutoff::CutoffEvaluator;
use super::domain::{
    ChatMessage, CutoffResult, DocumentId, DocumentVerificationResult, ExtractedDocumentData,
    Transaction,
};
use super::findings::{chat_context, AuditFindings};
use super::repository::{AuditRepository, RepositoryError};
use super::risk::{reconcile, RiskFlagger, ScoreSource, ScoringPolicy};

pub const SUMMARY_FALLBACK: &str =
    "Error generating audit summary. Please check API configuration.";
pub const CHAT_FALLBACK: &str = "I'm having trouble connecting to the audit brain right now.";

/// The pluggable parts of the workbench.
#[derive(Clone)]
pub struct Collaborators {
    pub heuristic: Arc<dyn RiskScorer>,
    pub model: Option<Arc<dyn RiskScorer>>,
    pub extractor: Arc<dyn DocumentExtractor>,
    pub drafter: Arc<dyn NarrativeDrafter>,
}

impl Collaborators {
    /// Everything runs locally; no model is consulted.
    pub fn offline(flagger: RiskFlagger) -> Self {
        Self {
            heuristic: Arc::new(HeuristicRiskScorer::new(flagger)),
            model: None,
            extractor: Arc::new(StructuredPayloadExtractor),
            drafter: Arc::new(TemplateDrafter),
        }
    }

    /// Model-backed scoring, extraction and drafting on top of `generator`.
    pub fn with_generator<G>(flagger: RiskFlagger, generator: Arc<G>) -> Self
    where
        G: TextGenerator + 'static,
    {
        Self {
            heuristic: Arc::new(HeuristicRiskScorer::new(flagger)),
            model: Some(Arc::new(ModelRiskScorer::new(Arc::clone(&generator)))),
            extractor: Arc::new(ModelDocumentExtractor::new(Arc::clone(&generator))),
            drafter: Arc::new(ModelDrafter::new(generator)),
        }
    }

    pub fn with_model_scorer(mut self, scorer: Arc<dyn RiskScorer>) -> Self {
        self.model = Some(scorer);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_drafter(mut self, drafter: Arc<dyn NarrativeDrafter>) -> Self {
        self.drafter = drafter;
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::offline(RiskFlagger::default())
    }
}

/// Outcome of one risk assessment run.
#[derive(Debug, Clone, Serialize)]
pub struct RiskRun {
    pub policy: ScoringPolicy,
    pub source: ScoreSource,
    pub bands: RiskBands,
    pub transactions: Vec<Transaction>,
}

/// Service composing the store, the cut-off evaluator and the collaborators.
pub struct AuditService<R> {
    repository: Arc<R>,
    collaborators: Collaborators,
    config: AuditConfig,
    evaluator: CutoffEvaluator,
}

static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_document_id() -> DocumentId {
    let id = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DocumentId(format!("doc-{id:06}"))
}

impl<R> AuditService<R>
where
    R: AuditRepository + 'static,
{
    pub fn new(repository: Arc<R>, collaborators: Collaborators, config: AuditConfig) -> Self {
        Self {
            repository,
            collaborators,
            evaluator: CutoffEvaluator::new(config.fiscal_year_end),
            config,
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Replace the batch under review. Scores supplied by the caller are kept
    /// until the next assessment run.
    pub fn load_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<usize, AuditServiceError> {
        let count = transactions.len();
        self.repository.replace_transactions(transactions)?;
        info!(count, "transaction batch loaded");
        Ok(count)
    }

    pub fn transactions(&self) -> Result<Vec<Transaction>, AuditServiceError> {
        Ok(self.repository.transactions()?)
    }

    /// Score the stored batch and persist the re-scored copy.
    pub fn assess_risk(&self) -> Result<RiskRun, AuditServiceError> {
        let batch = self.repository.transactions()?;
        let policy = self.config.risk_policy;
        let heuristic = self.collaborators.heuristic.score_batch(&batch)?;

        let (model, source) = match (&self.collaborators.model, policy.consults_model()) {
            (Some(scorer), true) => match scorer.score_batch(&batch) {
                Ok(assessments) => (Some(assessments), ScoreSource::for_policy(policy)),
                Err(error) => {
                    warn!(%error, policy = policy.label(), "model risk scoring failed; keeping heuristic scores");
                    (
                        None,
                        ScoreSource::HeuristicFallback {
                            error: error.to_string(),
                        },
                    )
                }
            },
            _ => (None, ScoreSource::Heuristic),
        };

        let transactions = reconcile(policy, &heuristic, model.as_deref());
        let bands = RiskBands::from_transactions(&transactions);
        self.repository.replace_transactions(transactions.clone())?;

        info!(
            total = transactions.len(),
            high = bands.high,
            medium = bands.medium,
            low = bands.low,
            policy = policy.label(),
            "risk assessment completed"
        );

        Ok(RiskRun {
            policy,
            source,
            bands,
            transactions,
        })
    }

    /// Extract fields from an upload, run the cut-off test and record the result.
    /// A failed extraction is still recorded, with an indeterminate cut-off.
    pub fn verify_document(
        &self,
        upload: DocumentUpload,
        uploaded_at: DateTime<Utc>,
    ) -> Result<DocumentVerificationResult, AuditServiceError> {
        match self.collaborators.extractor.extract(&upload) {
            Ok(extraction) => self.record_extraction(upload.file_name, extraction, uploaded_at),
            Err(error) => {
                warn!(%error, file_name = %upload.file_name, "document extraction failed");
                let document = DocumentVerificationResult {
                    id: next_document_id(),
                    file_name: upload.file_name,
                    uploaded_at,
                    extraction: None,
                    cut_off_test_passed: None,
                    notes: format!("Extraction failed: {error}"),
                };
                Ok(self.repository.append_document(document)?)
            }
        }
    }

    /// Record a document whose fields were extracted elsewhere.
    pub fn record_extraction(
        &self,
        file_name: String,
        extraction: ExtractedDocumentData,
        uploaded_at: DateTime<Utc>,
    ) -> Result<DocumentVerificationResult, AuditServiceError> {
        let outcome = self
            .evaluator
            .evaluate(extraction.invoice_date, extraction.delivery_date);

        let document = DocumentVerificationResult {
            id: next_document_id(),
            file_name,
            uploaded_at,
            extraction: Some(extraction),
            cut_off_test_passed: outcome.passed(),
            notes: outcome.notes,
        };
        debug!(
            id = %document.id.0,
            status = document.cutoff_status().label(),
            "document verified"
        );

        Ok(self.repository.append_document(document)?)
    }

    pub fn documents(&self) -> Result<Vec<DocumentVerificationResult>, AuditServiceError> {
        Ok(self.repository.documents()?)
    }

    pub fn document(
        &self,
        id: &DocumentId,
    ) -> Result<DocumentVerificationResult, AuditServiceError> {
        let document = self
            .repository
            .fetch_document(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(document)
    }

    /// Stateless cut-off check; `fiscal_year_end` defaults to the configured one.
    pub fn evaluate_cutoff(
        &self,
        invoice_date: Option<&str>,
        delivery_date: Option<&str>,
        fiscal_year_end: Option<NaiveDate>,
    ) -> CutoffResult {
        let evaluator = fiscal_year_end
            .map(CutoffEvaluator::new)
            .unwrap_or(self.evaluator);
        evaluator.evaluate_raw(invoice_date, delivery_date)
    }

    pub fn dashboard(&self) -> Result<DashboardView, AuditServiceError> {
        let transactions = self.repository.transactions()?;
        let documents = self.repository.documents()?;
        Ok(DashboardView::build(&transactions, &documents))
    }

    pub fn findings(&self) -> Result<AuditFindings, AuditServiceError> {
        let transactions = self.repository.transactions()?;
        let documents = self.repository.documents()?;
        Ok(AuditFindings::collect(
            &transactions,
            &documents,
            self.config.fiscal_year_end,
        ))
    }

    /// Draft the executive summary and keep it as the latest report.
    pub fn draft_summary(&self) -> Result<String, AuditServiceError> {
        let findings = self.findings()?;
        let report = match self.collaborators.drafter.draft_summary(&findings) {
            Ok(report) => report,
            Err(error) => {
                warn!(%error, "audit summary drafting failed");
                SUMMARY_FALLBACK.to_string()
            }
        };

        self.repository.store_report(report.clone())?;
        Ok(report)
    }

    pub fn latest_report(&self) -> Result<Option<String>, AuditServiceError> {
        Ok(self.repository.report()?)
    }

    /// Answer an auditor question grounded in the current audit state.
    pub fn ask(&self, question: &str) -> Result<ChatMessage, AuditServiceError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AuditServiceError::EmptyQuestion);
        }

        self.repository.append_message(ChatMessage::user(question))?;
        let history = self.repository.messages()?;
        let transactions = self.repository.transactions()?;
        let documents = self.repository.documents()?;
        let report = self.repository.report()?;
        let context = chat_context(&transactions, &documents, report.as_deref());

        let text = match self.collaborators.drafter.answer(&history, &context) {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "chat collaborator failed");
                CHAT_FALLBACK.to_string()
            }
        };

        let answer = ChatMessage::model(text);
        self.repository.append_message(answer.clone())?;
        Ok(answer)
    }

    pub fn chat_history(&self) -> Result<Vec<ChatMessage>, AuditServiceError> {
        Ok(self.repository.messages()?)
    }
}

/// Error raised by the audit service.
#[derive(Debug, thiserror::Error)]
pub enum AuditServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Collaborator(#[from] super::collaborators::CollaboratorError),
    #[error("question must not be empty")]
    EmptyQuestion,
}
