use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::aggregate::{CutoffTally, RiskBand, RiskBands};
use super::domain::{ChatMessage, CutoffStatus, DocumentVerificationResult, Transaction};

/// Characters of the latest drafted report echoed into the chat context.
pub const REPORT_EXCERPT_CHARS: usize = 500;

/// Overall engagement risk stated in the report conclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallRisk {
    Low,
    Medium,
    High,
}

impl OverallRisk {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Proposed correcting entry for a cut-off exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftJournalEntry {
    pub reference: String,
    pub debit_account: &'static str,
    pub credit_account: &'static str,
    pub amount: Decimal,
    pub memo: String,
}

/// Structured snapshot handed to a narrative drafter.
#[derive(Debug, Clone, Serialize)]
pub struct AuditFindings {
    pub fiscal_year_end: NaiveDate,
    pub total_transactions: usize,
    pub risk_bands: RiskBands,
    pub high_risk: Vec<Transaction>,
    pub documents: Vec<DocumentVerificationResult>,
    pub cutoff: CutoffTally,
}

impl AuditFindings {
    pub fn collect(
        transactions: &[Transaction],
        documents: &[DocumentVerificationResult],
        fiscal_year_end: NaiveDate,
    ) -> Self {
        let high_risk = transactions
            .iter()
            .filter(|transaction| RiskBand::for_score(transaction.risk_score) == RiskBand::High)
            .cloned()
            .collect();

        Self {
            fiscal_year_end,
            total_transactions: transactions.len(),
            risk_bands: RiskBands::from_transactions(transactions),
            high_risk,
            documents: documents.to_vec(),
            cutoff: CutoffTally::from_documents(documents),
        }
    }

    pub fn failed_documents(&self) -> impl Iterator<Item = &DocumentVerificationResult> {
        self.documents
            .iter()
            .filter(|document| document.cutoff_status() == CutoffStatus::Failed)
    }

    pub fn indeterminate_documents(&self) -> impl Iterator<Item = &DocumentVerificationResult> {
        self.documents
            .iter()
            .filter(|document| document.cutoff_status() == CutoffStatus::Indeterminate)
    }

    pub fn overall_risk(&self) -> OverallRisk {
        if self.cutoff.failed > 0 || self.risk_bands.high > 0 {
            OverallRisk::High
        } else if self.cutoff.indeterminate > 0 || self.risk_bands.medium > 0 {
            OverallRisk::Medium
        } else {
            OverallRisk::Low
        }
    }

    pub fn adjustments(&self) -> Vec<DraftJournalEntry> {
        self.failed_documents()
            .filter_map(|document| cutoff_adjustment(document, self.fiscal_year_end))
            .collect()
    }
}

/// Journal entry correcting a failed cut-off, derived from the extracted dates.
///
/// Delivered in-period but invoiced later: revenue was earned and is missing.
/// Invoiced in-period but delivered later: revenue was recognised too early.
pub fn cutoff_adjustment(
    document: &DocumentVerificationResult,
    fiscal_year_end: NaiveDate,
) -> Option<DraftJournalEntry> {
    let extraction = document.extraction.as_ref()?;
    let invoiced = extraction.invoice_date?;
    let delivered = extraction.delivery_date?;

    let reference = if extraction.invoice_number.is_empty() {
        document.file_name.clone()
    } else {
        extraction.invoice_number.clone()
    };

    if invoiced > fiscal_year_end && delivered <= fiscal_year_end {
        Some(DraftJournalEntry {
            memo: format!("Accrue revenue for goods delivered {delivered}, invoiced {invoiced}"),
            reference,
            debit_account: "Accounts Receivable",
            credit_account: "Revenue",
            amount: extraction.total_amount,
        })
    } else if invoiced <= fiscal_year_end && delivered > fiscal_year_end {
        Some(DraftJournalEntry {
            memo: format!("Defer revenue invoiced {invoiced}, goods delivered {delivered}"),
            reference,
            debit_account: "Revenue",
            credit_account: "Contract Liabilities",
            amount: extraction.total_amount,
        })
    } else {
        None
    }
}

/// Compact audit-state digest used as chat grounding. Failed and
/// indeterminate cut-off tests are listed separately.
pub fn chat_context(
    transactions: &[Transaction],
    documents: &[DocumentVerificationResult],
    report: Option<&str>,
) -> String {
    let bands = RiskBands::from_transactions(transactions);
    let tally = CutoffTally::from_documents(documents);
    let excerpt: String = report
        .unwrap_or_default()
        .chars()
        .take(REPORT_EXCERPT_CHARS)
        .collect();

    format!(
        "Summary of Audit State:\n\
         Transactions Count: {}\n\
         High Risk Transactions: {}\n\
         Document Verifications: {}\n\
         Failed Cut-off Tests: {}\n\
         Cut-off Tests Awaiting Data: {}\n\
         Current Generated Report: {}...",
        transactions.len(),
        bands.high,
        documents.len(),
        tally.failed,
        tally.indeterminate,
        excerpt
    )
}

/// Render a chat transcript the way prompt-based models expect it.
pub fn transcript(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|message| format!("{}: {}", message.role.label(), message.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `1234567.891` -> `$1,234,567.89`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}
