//! Seams to the generative collaborators: risk scoring, field extraction and
//! narrative drafting. Offline implementations live in `heuristic`; the
//! `model` implementations turn any [`TextGenerator`] into a collaborator.

mod heuristic;
mod model;
pub(crate) mod prompts;
mod response;

pub use heuristic::{HeuristicRiskScorer, StructuredPayloadExtractor, TemplateDrafter};
pub use model::{ModelDocumentExtractor, ModelDrafter, ModelRiskScorer};
pub use response::{clean_json_string, parse_extraction_response, parse_scoring_response};

use serde::{Deserialize, Serialize};

use super::domain::{ChatMessage, ExtractedDocumentData, Transaction};
use super::findings::AuditFindings;
use super::risk::RiskAssessment;

/// Capability: "score a batch".
pub trait RiskScorer: Send + Sync {
    fn score_batch(&self, batch: &[Transaction]) -> Result<Vec<RiskAssessment>, CollaboratorError>;
}

/// Capability: "extract fields from an uploaded document".
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, upload: &DocumentUpload) -> Result<ExtractedDocumentData, CollaboratorError>;
}

/// Capability: "draft a narrative given structured findings".
pub trait NarrativeDrafter: Send + Sync {
    fn draft_summary(&self, findings: &AuditFindings) -> Result<String, CollaboratorError>;

    /// Answer the last user message in `history`, grounded in `context`.
    fn answer(&self, history: &[ChatMessage], context: &str) -> Result<String, CollaboratorError>;
}

/// The one vendor-facing capability: turn a prompt (and optional attachment)
/// into text. Integrators implement this against their model provider.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String, CollaboratorError>;
}

/// Raw upload as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn mime(&self) -> Option<mime::Mime> {
        self.mime_type.trim().parse().ok()
    }
}

/// Quick models for structured output, stronger models for report writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Fast,
    Reasoning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub tier: ModelTier,
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub attachment: Option<Attachment>,
    /// Ask the provider for a JSON body instead of prose.
    pub json_response: bool,
}

impl GenerationRequest {
    pub fn text(tier: ModelTier, prompt: impl Into<String>) -> Self {
        Self {
            tier,
            prompt: prompt.into(),
            system_instruction: None,
            attachment: None,
            json_response: false,
        }
    }

    pub fn json(tier: ModelTier, prompt: impl Into<String>) -> Self {
        Self {
            json_response: true,
            ..Self::text(tier, prompt)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("unsupported document type '{mime_type}'")]
    UnsupportedDocument { mime_type: String },
    #[error("collaborator returned an empty response")]
    EmptyResponse,
    #[error("malformed collaborator response: {0}")]
    MalformedResponse(String),
}
