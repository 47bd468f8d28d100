use rust_decimal::prelude::ToPrimitive;
use serde_json::json;

use super::super::aggregate::HIGH_RISK_ABOVE;
use super::super::domain::{ChatMessage, ChatRole, Transaction};
use super::super::findings::{transcript, AuditFindings};

pub(crate) fn risk_scoring(batch: &[Transaction]) -> String {
    let rows: Vec<_> = batch
        .iter()
        .map(|transaction| {
            json!({
                "id": transaction.id,
                "date": transaction.date.map(|date| date.to_string()),
                "amount": transaction.amount.to_f64(),
                "customer": transaction.customer,
                "description": transaction.description,
            })
        })
        .collect();

    format!(
        "Act as an Accounts Receivable Audit Risk Model.\n\
         Analyze the following list of transactions for anomalies.\n\
         Look for:\n\
         1. Round number amounts (potential fraud/estimation).\n\
         2. Weekend postings (unusual activity).\n\
         3. High values relative to others.\n\
         4. Duplicate amounts.\n\n\
         Return a JSON array with one object per transaction holding its 'id', \
         a 'riskScore' (0-100) and a 'riskReason'.\n\n\
         Input Data:\n{}",
        serde_json::Value::Array(rows)
    )
}

pub(crate) const DOCUMENT_EXTRACTION: &str = "Extract the following fields from this invoice or delivery note for audit verification:\n\
     - invoiceNumber\n\
     - invoiceDate (YYYY-MM-DD format)\n\
     - deliveryDate (if present, YYYY-MM-DD format)\n\
     - totalAmount (numeric)\n\
     - customerName\n\
     - documentType (Invoice, Delivery Note or Unknown)\n\n\
     If a field is missing, return null or an empty string. Respond with a single JSON object.";

pub(crate) fn audit_summary(findings: &AuditFindings) -> String {
    let high_risk = serde_json::to_string(&findings.high_risk).unwrap_or_else(|_| "[]".to_string());
    let documents: Vec<_> = findings
        .documents
        .iter()
        .map(|document| {
            json!({
                "fileName": document.file_name,
                "status": document.cutoff_status().label(),
                "notes": document.notes,
                "data": document.extraction,
            })
        })
        .collect();

    format!(
        "You are a Senior Audit Manager.\n\
         Write a concise Audit Executive Summary and Draft Journal Entries based on the following findings.\n\n\
         Fiscal Year End: {fye}\n\n\
         ANOMALY DETECTION FINDINGS:\n\
         Total Transactions Analyzed: {total}\n\
         High Risk Transactions Detected (score above {threshold}): {high}\n\
         Details of High Risk Items: {high_risk}\n\n\
         DOCUMENT VERIFICATION FINDINGS:\n{documents}\n\n\
         Please structure the response as follows:\n\
         1. **Executive Summary**: Brief overview of the AR audit health.\n\
         2. **Key Findings**: Bullet points of specific anomalies and cut-off errors.\n\
         3. **Recommended Adjustments**: Draft Journal Entries (Debits/Credits) for any material misstatements found (especially cut-off errors).\n\
         4. **Conclusion**: Final risk assessment (Low/Medium/High).\n\n\
         Use professional auditing tone. Format with Markdown.",
        fye = findings.fiscal_year_end,
        total = findings.total_transactions,
        threshold = HIGH_RISK_ABOVE,
        high = findings.high_risk.len(),
        high_risk = high_risk,
        documents = serde_json::Value::Array(documents),
    )
}

pub(crate) fn chat_system_instruction(context: &str) -> String {
    format!(
        "You are an AI Audit Assistant.\n\
         You have access to the current audit context provided below.\n\
         Answer questions about specific transactions, risks, or accounting standards (IFRS/GAAP).\n\
         Context Data: {context}"
    )
}

pub(crate) fn chat_turn(history: &[ChatMessage], context: &str) -> String {
    let question = history
        .iter()
        .rev()
        .find(|message| message.role == ChatRole::User)
        .map(|message| message.text.as_str())
        .unwrap_or_default();

    format!(
        "Context: {context}\n\nChat History:\n{}\n\nUser: {question}\nModel:",
        transcript(history)
    )
}
