use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use super::cutoff::parse_document_date;
use super::domain::{clamp_score, parse_amount, Transaction};

/// Reads receivable ledgers exported as CSV
/// (`id,date,customer,amount,description[,risk_score,risk_reason]`).
/// Transaction ids must be unique within a ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerImporter;

impl LedgerImporter {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<Transaction>, LedgerImportError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Transaction>, LedgerImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut transactions = Vec::new();
        let mut seen_ids = HashSet::new();

        for (index, record) in csv_reader.deserialize::<LedgerRow>().enumerate() {
            let row = record?;
            let line = index + 1;
            if !seen_ids.insert(row.id.clone()) {
                return Err(LedgerImportError::DuplicateId { line, id: row.id });
            }
            transactions.push(row.into_transaction(line)?);
        }

        Ok(transactions)
    }
}

#[derive(Debug, Deserialize)]
struct LedgerRow {
    id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    date: Option<String>,
    #[serde(default)]
    customer: String,
    amount: String,
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    risk_score: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    risk_reason: Option<String>,
}

impl LedgerRow {
    fn into_transaction(self, line: usize) -> Result<Transaction, LedgerImportError> {
        let amount = parse_amount(&self.amount).ok_or_else(|| LedgerImportError::InvalidAmount {
            line,
            value: self.amount.clone(),
        })?;
        if amount < Decimal::ZERO {
            return Err(LedgerImportError::NegativeAmount { line, amount });
        }

        let score = self
            .risk_score
            .as_deref()
            .and_then(|raw| raw.parse::<f64>().ok())
            .map(clamp_score)
            .unwrap_or(0);

        let transaction = Transaction::new(
            self.id,
            self.date.as_deref().and_then(parse_document_date),
            self.customer,
            amount,
            self.description,
        );
        Ok(transaction.rescored(score, self.risk_reason))
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerImportError {
    #[error("failed to read ledger: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed ledger CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {line}: amount '{value}' is not a number")]
    InvalidAmount { line: usize, value: String },
    #[error("row {line}: amount {amount} is negative")]
    NegativeAmount { line: usize, amount: Decimal },
    #[error("row {line}: transaction id '{id}' appears more than once")]
    DuplicateId { line: usize, id: String },
}
