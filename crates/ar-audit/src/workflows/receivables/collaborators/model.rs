use std::sync::Arc;

use super::super::domain::{ChatMessage, ExtractedDocumentData, Transaction};
use super::super::findings::AuditFindings;
use super::super::risk::RiskAssessment;
use super::prompts;
use super::response::{parse_extraction_response, parse_scoring_response};
use super::{
    Attachment, CollaboratorError, DocumentExtractor, DocumentUpload, GenerationRequest, ModelTier,
    NarrativeDrafter, RiskScorer, TextGenerator,
};

/// Batch risk scoring through a text generator returning JSON.
pub struct ModelRiskScorer<G: ?Sized> {
    generator: Arc<G>,
}

impl<G: ?Sized> ModelRiskScorer<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }
}

impl<G> RiskScorer for ModelRiskScorer<G>
where
    G: TextGenerator + ?Sized,
{
    fn score_batch(&self, batch: &[Transaction]) -> Result<Vec<RiskAssessment>, CollaboratorError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let request = GenerationRequest::json(ModelTier::Fast, prompts::risk_scoring(batch));
        let text = self.generator.generate(&request)?;
        parse_scoring_response(&text, batch)
    }
}

/// Vision extraction for scanned invoices and delivery notes.
pub struct ModelDocumentExtractor<G: ?Sized> {
    generator: Arc<G>,
}

impl<G: ?Sized> ModelDocumentExtractor<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }
}

impl<G> DocumentExtractor for ModelDocumentExtractor<G>
where
    G: TextGenerator + ?Sized,
{
    fn extract(&self, upload: &DocumentUpload) -> Result<ExtractedDocumentData, CollaboratorError> {
        let Some(mime) = upload.mime().filter(is_visual_document) else {
            return Err(CollaboratorError::UnsupportedDocument {
                mime_type: upload.mime_type.clone(),
            });
        };

        let request = GenerationRequest {
            attachment: Some(Attachment {
                mime_type: mime.essence_str().to_string(),
                data: upload.bytes.clone(),
            }),
            ..GenerationRequest::json(ModelTier::Fast, prompts::DOCUMENT_EXTRACTION)
        };
        let text = self.generator.generate(&request)?;
        parse_extraction_response(&text)
    }
}

fn is_visual_document(mime: &mime::Mime) -> bool {
    mime.type_() == mime::IMAGE || mime.essence_str() == mime::APPLICATION_PDF.essence_str()
}

/// Report drafting on the reasoning tier, chat on the fast tier.
pub struct ModelDrafter<G: ?Sized> {
    generator: Arc<G>,
}

impl<G: ?Sized> ModelDrafter<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }
}

impl<G> NarrativeDrafter for ModelDrafter<G>
where
    G: TextGenerator + ?Sized,
{
    fn draft_summary(&self, findings: &AuditFindings) -> Result<String, CollaboratorError> {
        let request = GenerationRequest::text(ModelTier::Reasoning, prompts::audit_summary(findings));
        non_empty(self.generator.generate(&request)?)
    }

    fn answer(&self, history: &[ChatMessage], context: &str) -> Result<String, CollaboratorError> {
        let request = GenerationRequest {
            system_instruction: Some(prompts::chat_system_instruction(context)),
            ..GenerationRequest::text(ModelTier::Fast, prompts::chat_turn(history, context))
        };
        non_empty(self.generator.generate(&request)?)
    }
}

fn non_empty(text: String) -> Result<String, CollaboratorError> {
    if text.trim().is_empty() {
        Err(CollaboratorError::EmptyResponse)
    } else {
        Ok(text)
    }
}
