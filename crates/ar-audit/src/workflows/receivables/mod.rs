//! Accounts-receivable audit workbench: heuristic risk flagging, cut-off
//! testing of source documents, dashboard aggregation and drafted findings.
//!
//! The scoring and cut-off cores are pure functions. Anything generative
//! (model scoring, field extraction, narrative drafting) sits behind the
//! traits in [`collaborators`] so the workflow runs fully offline.

pub(crate) mod aggregate;
pub mod collaborators;
pub mod cutoff;
pub mod domain;
pub(crate) mod findings;
pub mod import;
pub mod repository;
pub(crate) mod risk;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use aggregate::{
    top_risks, CutoffTally, DashboardView, RiskBand, RiskBands, TopRiskEntry, HIGH_RISK_ABOVE,
    MEDIUM_RISK_ABOVE, TOP_RISK_LIMIT,
};
pub use collaborators::{
    CollaboratorError, DocumentExtractor, DocumentUpload, GenerationRequest, ModelTier,
    NarrativeDrafter, RiskScorer, TextGenerator,
};
pub use cutoff::{parse_document_date, CutoffEvaluator};
pub use domain::{
    ChatMessage, ChatRole, CutoffResult, CutoffStatus, DocumentId, DocumentType,
    DocumentVerificationResult, ExtractedDocumentData, Transaction, MAX_RISK_SCORE,
};
pub use findings::{
    chat_context, cutoff_adjustment, format_amount, AuditFindings, DraftJournalEntry, OverallRisk,
};
pub use import::{LedgerImportError, LedgerImporter};
pub use repository::{AuditRepository, RepositoryError};
pub use risk::{
    reconcile, RiskAssessment, RiskFlagger, RiskRule, RiskRulesConfig, RiskSignal, ScoreSource,
    ScoringPolicy,
};
pub use router::audit_router;
pub use service::{
    AuditService, AuditServiceError, Collaborators, RiskRun, CHAT_FALLBACK, SUMMARY_FALLBACK,
};
