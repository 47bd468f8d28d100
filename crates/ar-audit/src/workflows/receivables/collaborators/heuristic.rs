use std::fmt::Write as _;

use super::super::aggregate::RiskBand;
use super::super::domain::{ChatMessage, ChatRole, ExtractedDocumentData, Transaction};
use super::super::findings::{format_amount, AuditFindings};
use super::super::risk::{RiskAssessment, RiskFlagger};
use super::response::parse_extraction_response;
use super::{CollaboratorError, DocumentExtractor, DocumentUpload, NarrativeDrafter, RiskScorer};

/// Rule-based scorer; never fails.
#[derive(Debug, Clone, Default)]
pub struct HeuristicRiskScorer {
    flagger: RiskFlagger,
}

impl HeuristicRiskScorer {
    pub fn new(flagger: RiskFlagger) -> Self {
        Self { flagger }
    }
}

impl RiskScorer for HeuristicRiskScorer {
    fn score_batch(&self, batch: &[Transaction]) -> Result<Vec<RiskAssessment>, CollaboratorError> {
        Ok(self.flagger.score_batch(batch))
    }
}

/// Reads documents that already carry their fields as JSON, e.g. exports
/// from an upstream OCR step. Images and PDFs need a model-backed extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredPayloadExtractor;

impl DocumentExtractor for StructuredPayloadExtractor {
    fn extract(&self, upload: &DocumentUpload) -> Result<ExtractedDocumentData, CollaboratorError> {
        let supported = upload.mime().is_some_and(|mime| {
            mime.essence_str() == mime::APPLICATION_JSON.essence_str()
                || mime.essence_str() == mime::TEXT_PLAIN.essence_str()
        });
        if !supported {
            return Err(CollaboratorError::UnsupportedDocument {
                mime_type: upload.mime_type.clone(),
            });
        }

        let text = std::str::from_utf8(&upload.bytes)
            .map_err(|err| CollaboratorError::MalformedResponse(err.to_string()))?;
        parse_extraction_response(text)
    }
}

/// Offline drafter producing the four-section report from the findings alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDrafter;

impl NarrativeDrafter for TemplateDrafter {
    fn draft_summary(&self, findings: &AuditFindings) -> Result<String, CollaboratorError> {
        Ok(render_summary(findings))
    }

    fn answer(&self, history: &[ChatMessage], context: &str) -> Result<String, CollaboratorError> {
        let question = history
            .iter()
            .rev()
            .find(|message| message.role == ChatRole::User)
            .map(|message| message.text.trim())
            .unwrap_or_default();

        Ok(format!(
            "Regarding \"{question}\", here is the current audit position:\n\n{context}"
        ))
    }
}

fn render_summary(findings: &AuditFindings) -> String {
    let bands = &findings.risk_bands;
    let tally = &findings.cutoff;
    let overall = findings.overall_risk();
    let mut report = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(report, "## Executive Summary\n");
    let _ = writeln!(
        report,
        "Receivables for the period ending {} were reviewed. {} transactions were analysed: \
         {} high risk, {} medium risk and {} low risk. {} supporting documents were tested for \
         cut-off ({} passed, {} failed, {} awaiting data).\n",
        findings.fiscal_year_end,
        findings.total_transactions,
        bands.high,
        bands.medium,
        bands.low,
        tally.total(),
        tally.passed,
        tally.failed,
        tally.indeterminate,
    );

    let _ = writeln!(report, "## Key Findings\n");
    let mut findings_listed = 0;
    for transaction in &findings.high_risk {
        let _ = writeln!(
            report,
            "- {} ({}, {}): {} [score {}]",
            transaction.id,
            transaction.customer,
            format_amount(transaction.amount),
            transaction.risk_reason.as_deref().unwrap_or("Flagged"),
            transaction.risk_score,
        );
        findings_listed += 1;
    }
    for document in findings.failed_documents() {
        let _ = writeln!(report, "- {}: {}", document.file_name, document.notes);
        findings_listed += 1;
    }
    for document in findings.indeterminate_documents() {
        let _ = writeln!(
            report,
            "- {}: cut-off could not be evaluated ({})",
            document.file_name, document.notes
        );
        findings_listed += 1;
    }
    if findings_listed == 0 {
        let _ = writeln!(report, "- No exceptions identified.");
    }

    let _ = writeln!(report, "\n## Recommended Adjustments\n");
    let adjustments = findings.adjustments();
    if adjustments.is_empty() {
        let _ = writeln!(report, "No adjustments proposed.");
    }
    for entry in &adjustments {
        let amount = format_amount(entry.amount);
        let _ = writeln!(report, "**{}**: {}", entry.reference, entry.memo);
        let _ = writeln!(report, "- Dr {} {amount}", entry.debit_account);
        let _ = writeln!(report, "- Cr {} {amount}\n", entry.credit_account);
    }

    let _ = writeln!(report, "\n## Conclusion\n");
    let _ = write!(
        report,
        "Overall audit risk is assessed as **{}**.",
        overall.label()
    );
    if bands.high > 0 {
        let _ = write!(
            report,
            " {} transaction(s) fall in the {} band and require substantive testing.",
            bands.high,
            RiskBand::High.label()
        );
    }
    report.push('\n');

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_extractor_rejects_images() {
        let upload = DocumentUpload::new("scan.png", "image/png", vec![0x89, 0x50]);
        match StructuredPayloadExtractor.extract(&upload) {
            Err(CollaboratorError::UnsupportedDocument { mime_type }) => {
                assert_eq!(mime_type, "image/png")
            }
            other => panic!("expected unsupported document, got {other:?}"),
        }
    }

    #[test]
    fn structured_extractor_reads_json_payloads() {
        let upload = DocumentUpload::new(
            "inv-7.json",
            "application/json; charset=utf-8",
            br#"{"invoiceNumber":"INV-7","invoiceDate":"2025-01-02","deliveryDate":"2024-12-28","totalAmount":1200.5,"documentType":"Invoice"}"#.to_vec(),
        );

        let data = StructuredPayloadExtractor
            .extract(&upload)
            .expect("json payload is supported");

        assert_eq!(data.invoice_number, "INV-7");
        assert!(data.delivery_date.is_some());
    }
}
