use super::domain::{ChatMessage, DocumentId, DocumentVerificationResult, Transaction};

/// Storage abstraction for one audit engagement so the service can be
/// exercised against any backing store.
pub trait AuditRepository: Send + Sync {
    fn transactions(&self) -> Result<Vec<Transaction>, RepositoryError>;
    fn replace_transactions(&self, transactions: Vec<Transaction>) -> Result<(), RepositoryError>;

    /// Documents are append-only; a duplicate id is a conflict.
    fn append_document(
        &self,
        document: DocumentVerificationResult,
    ) -> Result<DocumentVerificationResult, RepositoryError>;
    /// Newest first.
    fn documents(&self) -> Result<Vec<DocumentVerificationResult>, RepositoryError>;
    fn fetch_document(
        &self,
        id: &DocumentId,
    ) -> Result<Option<DocumentVerificationResult>, RepositoryError>;

    fn store_report(&self, report: String) -> Result<(), RepositoryError>;
    fn report(&self) -> Result<Option<String>, RepositoryError>;

    fn append_message(&self, message: ChatMessage) -> Result<(), RepositoryError>;
    fn messages(&self) -> Result<Vec<ChatMessage>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
