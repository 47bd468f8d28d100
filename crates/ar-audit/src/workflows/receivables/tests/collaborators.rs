use super::common::*;
use std::sync::Arc;

use crate::workflows::receivables::collaborators::{
    CollaboratorError, DocumentExtractor, DocumentUpload, ModelDocumentExtractor, ModelDrafter,
    ModelRiskScorer, ModelTier, NarrativeDrafter, RiskScorer, TemplateDrafter,
};
use crate::workflows::receivables::domain::{ChatMessage, DocumentType};
use crate::workflows::receivables::findings::AuditFindings;
use crate::workflows::receivables::risk::RiskFlagger;

#[test]
fn model_scorer_sends_one_json_request_per_batch() {
    let generator = Arc::new(ScriptedGenerator::replying(vec![Ok(r#"```json
        [{"id": "TXN-003", "riskScore": 92, "riskReason": "Year-end bulk sale"}]
        ```"#
        .to_string())]));
    let scorer = ModelRiskScorer::new(generator.clone());

    let assessments = scorer
        .score_batch(&sample_ledger())
        .expect("scripted reply parses");

    assert_eq!(assessments.len(), 1);
    assert_eq!(assessments[0].transaction.id, "TXN-003");
    assert_eq!(assessments[0].score, 92);

    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].json_response);
    assert_eq!(requests[0].tier, ModelTier::Fast);
    assert!(requests[0].prompt.contains("TXN-006"));
}

#[test]
fn model_scorer_skips_the_call_for_empty_batches() {
    let generator = Arc::new(ScriptedGenerator::default());
    let scorer = ModelRiskScorer::new(generator.clone());

    assert!(scorer.score_batch(&[]).expect("empty batch").is_empty());
    assert!(generator.requests().is_empty());
}

#[test]
fn model_extractor_attaches_visual_documents() {
    let generator = Arc::new(ScriptedGenerator::replying(vec![Ok(r#"{
            "invoiceNumber": "INV-88",
            "invoiceDate": "2025-01-04",
            "deliveryDate": "2024-12-30",
            "totalAmount": "12,500.50",
            "customerName": "Soylent Corp",
            "documentType": "Delivery Note"
        }"#
    .to_string())]));
    let extractor = ModelDocumentExtractor::new(generator.clone());
    let upload = DocumentUpload::new("inv-88.png", "image/png", vec![1, 2, 3]);

    let data = extractor.extract(&upload).expect("extraction succeeds");

    assert_eq!(data.invoice_number, "INV-88");
    assert_eq!(data.invoice_date, Some(date(2025, 1, 4)));
    assert_eq!(data.document_type, DocumentType::DeliveryNote);
    assert_eq!(data.total_amount, rust_decimal::Decimal::new(1250050, 2));

    let requests = generator.requests();
    let attachment = requests[0].attachment.as_ref().expect("image attached");
    assert_eq!(attachment.mime_type, "image/png");
    assert_eq!(attachment.data, vec![1, 2, 3]);
}

#[test]
fn model_extractor_rejects_unsupported_types_without_calling_out() {
    let generator = Arc::new(ScriptedGenerator::default());
    let extractor = ModelDocumentExtractor::new(generator.clone());
    let upload = DocumentUpload::new("ledger.xlsx", "application/vnd.ms-excel", vec![0]);

    match extractor.extract(&upload) {
        Err(CollaboratorError::UnsupportedDocument { .. }) => {}
        other => panic!("expected unsupported document, got {other:?}"),
    }
    assert!(generator.requests().is_empty());
}

#[test]
fn model_drafter_uses_reasoning_tier_for_reports() {
    let generator = Arc::new(ScriptedGenerator::replying(vec![
        Ok("## Executive Summary\nAll good.".to_string()),
        Ok("   ".to_string()),
    ]));
    let drafter = ModelDrafter::new(generator.clone());
    let findings = AuditFindings::collect(&sample_ledger(), &[], fiscal_year_end());

    let report = drafter.draft_summary(&findings).expect("report drafted");
    assert!(report.starts_with("## Executive Summary"));

    let history = vec![ChatMessage::user("Which invoices failed?")];
    match drafter.answer(&history, "ctx") {
        Err(CollaboratorError::EmptyResponse) => {}
        other => panic!("expected empty response, got {other:?}"),
    }

    let requests = generator.requests();
    assert_eq!(requests[0].tier, ModelTier::Reasoning);
    assert!(requests[0].prompt.contains("Fiscal Year End: 2024-12-31"));
    assert_eq!(requests[1].tier, ModelTier::Fast);
    assert!(requests[1]
        .system_instruction
        .as_deref()
        .is_some_and(|instruction| instruction.contains("Context Data: ctx")));
}

#[test]
fn template_drafter_writes_all_report_sections() {
    let assessments = RiskFlagger::default().score_batch(&sample_ledger());
    let scored: Vec<_> = assessments
        .into_iter()
        .map(|assessment| assessment.transaction.rescored(assessment.score.max(80), assessment.reason))
        .collect();
    let (service, _) = offline_service();
    let failed = service
        .record_extraction(
            "late-invoice.pdf".to_string(),
            extraction(Some(date(2025, 1, 5)), Some(date(2024, 12, 20))),
            uploaded_at(),
        )
        .expect("document recorded");
    let findings = AuditFindings::collect(&scored, &[failed], fiscal_year_end());

    let report = TemplateDrafter
        .draft_summary(&findings)
        .expect("template never fails");

    for heading in [
        "## Executive Summary",
        "## Key Findings",
        "## Recommended Adjustments",
        "## Conclusion",
    ] {
        assert!(report.contains(heading), "missing {heading}");
    }
    assert!(report.contains("- Dr Accounts Receivable $12,500.50"));
    assert!(report.contains("- Cr Revenue $12,500.50"));
    assert!(report.contains("**High**"));
}

#[test]
fn template_answers_restate_the_context() {
    let history = vec![
        ChatMessage::user("first question"),
        ChatMessage::model("first answer"),
        ChatMessage::user("  How many documents failed?  "),
    ];

    let answer = TemplateDrafter
        .answer(&history, "Failed Cut-off Tests: 1")
        .expect("template never fails");

    assert!(answer.contains("\"How many documents failed?\""));
    assert!(answer.ends_with("Failed Cut-off Tests: 1"));
}
