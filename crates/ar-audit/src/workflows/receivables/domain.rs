use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::cutoff::parse_document_date;

/// Upper bound of every risk score, heuristic or model-provided.
pub const MAX_RISK_SCORE: u8 = 100;

/// Identifier wrapper for processed documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

/// Receivable ledger line under review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// Posting date; unparseable input arrives as `None`.
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub customer: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "riskScore", deserialize_with = "clamped_score")]
    pub risk_score: u8,
    #[serde(default, alias = "riskReason", skip_serializing_if = "Option::is_none")]
    pub risk_reason: Option<String>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        date: Option<NaiveDate>,
        customer: impl Into<String>,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            customer: customer.into(),
            amount,
            description: description.into(),
            risk_score: 0,
            risk_reason: None,
        }
    }

    /// Copy of this transaction carrying a new score. The reason is dropped
    /// when the score is zero so the "reason iff score" invariant holds.
    pub fn rescored(&self, score: u8, reason: Option<String>) -> Self {
        let score = score.min(MAX_RISK_SCORE);
        let reason = reason.filter(|text| score > 0 && !text.trim().is_empty());
        Self {
            risk_score: score,
            risk_reason: reason,
            ..self.clone()
        }
    }
}

/// Kind of source document recognised by the extraction collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    DeliveryNote,
    #[default]
    Unknown,
}

impl DocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::DeliveryNote => "Delivery Note",
            Self::Unknown => "Unknown",
        }
    }

    /// Accepts the model labels ("Delivery Note") as well as snake_case.
    pub fn from_label(raw: &str) -> Self {
        let squashed: String = raw
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match squashed.as_str() {
            "invoice" => Self::Invoice,
            "deliverynote" => Self::DeliveryNote,
            _ => Self::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for DocumentType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(Value::as_str)
            .map(Self::from_label)
            .unwrap_or_default())
    }
}

/// Fields read off an invoice or delivery note. Produced by an external
/// collaborator and therefore untrusted: malformed fields deserialize to
/// their empty value instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedDocumentData {
    #[serde(default, alias = "invoiceNumber", deserialize_with = "lenient_text")]
    pub invoice_number: String,
    #[serde(default, alias = "invoiceDate", deserialize_with = "lenient_date")]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default, alias = "deliveryDate", deserialize_with = "lenient_date")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(
        default,
        alias = "totalAmount",
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "lenient_amount"
    )]
    pub total_amount: Decimal,
    #[serde(default, alias = "customerName", deserialize_with = "lenient_text")]
    pub customer_name: String,
    #[serde(
        default,
        alias = "lineItemsSummary",
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_items_summary: Option<String>,
    #[serde(default, alias = "documentType")]
    pub document_type: DocumentType,
}

/// Tri-state outcome of the cut-off test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffStatus {
    Passed,
    Failed,
    /// Not enough data to decide; never reported as a failure.
    Indeterminate,
}

impl CutoffStatus {
    pub const fn passed(self) -> Option<bool> {
        match self {
            Self::Passed => Some(true),
            Self::Failed => Some(false),
            Self::Indeterminate => None,
        }
    }

    pub const fn from_passed(passed: Option<bool>) -> Self {
        match passed {
            Some(true) => Self::Passed,
            Some(false) => Self::Failed,
            None => Self::Indeterminate,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "Cut-off OK",
            Self::Failed => "Cut-off Risk",
            Self::Indeterminate => "Needs More Data",
        }
    }
}

/// Cut-off classification plus the rationale shown to the auditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutoffResult {
    pub status: CutoffStatus,
    pub notes: String,
}

impl CutoffResult {
    pub fn passed(&self) -> Option<bool> {
        self.status.passed()
    }
}

/// One processed upload. Created once and never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVerificationResult {
    pub id: DocumentId,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub extraction: Option<ExtractedDocumentData>,
    pub cut_off_test_passed: Option<bool>,
    pub notes: String,
}

impl DocumentVerificationResult {
    pub fn cutoff_status(&self) -> CutoffStatus {
        CutoffStatus::from_passed(self.cut_off_test_passed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_document_date))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_text(deserializer)?.unwrap_or_default())
}

fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let text = match raw {
        Some(Value::String(text)) => Some(text.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    };
    Ok(text.filter(|value| !value.is_empty()))
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let parsed = match raw {
        Some(Value::Number(number)) => parse_amount(&number.to_string()),
        Some(Value::String(text)) => parse_amount(&text),
        _ => None,
    };
    Ok(parsed.unwrap_or(Decimal::ZERO))
}

fn clamped_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let value = match raw {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.map(clamp_score).unwrap_or(0))
}

/// Clamp any numeric score into `0..=100`; non-finite values count as zero.
pub(crate) fn clamp_score(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, f64::from(MAX_RISK_SCORE)) as u8
}

/// Parse a monetary amount, tolerating currency symbols and thousands separators.
pub(crate) fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '$' | '€' | '£' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}
