use serde::{Deserialize, Serialize};

use super::domain::{CutoffStatus, DocumentVerificationResult, Transaction};

pub const HIGH_RISK_ABOVE: u8 = 75;
pub const MEDIUM_RISK_ABOVE: u8 = 30;
/// Size of the dashboard's "top risk factors" list.
pub const TOP_RISK_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    High,
    Medium,
    Low,
}

impl RiskBand {
    pub const fn for_score(score: u8) -> Self {
        if score > HIGH_RISK_ABOVE {
            Self::High
        } else if score > MEDIUM_RISK_ABOVE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High Risk",
            Self::Medium => "Medium Risk",
            Self::Low => "Low Risk",
        }
    }
}

/// Partition of a batch by risk band. Counts always sum to the batch size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBands {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskBands {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions
            .iter()
            .fold(Self::default(), |mut bands, transaction| {
                match RiskBand::for_score(transaction.risk_score) {
                    RiskBand::High => bands.high += 1,
                    RiskBand::Medium => bands.medium += 1,
                    RiskBand::Low => bands.low += 1,
                }
                bands
            })
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Cut-off outcomes across processed documents. `failed` counts only
/// documents with a definite failure; missing data lands in `indeterminate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutoffTally {
    pub passed: usize,
    pub failed: usize,
    pub indeterminate: usize,
}

impl CutoffTally {
    pub fn from_documents(documents: &[DocumentVerificationResult]) -> Self {
        documents.iter().fold(Self::default(), |mut tally, document| {
            match document.cutoff_status() {
                CutoffStatus::Passed => tally.passed += 1,
                CutoffStatus::Failed => tally.failed += 1,
                CutoffStatus::Indeterminate => tally.indeterminate += 1,
            }
            tally
        })
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.indeterminate
    }
}

/// Highest-scoring transactions first; ties keep batch order and unscored
/// transactions are left out.
pub fn top_risks(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut ranked: Vec<&Transaction> = transactions
        .iter()
        .filter(|transaction| transaction.risk_score > 0)
        .collect();
    ranked.sort_by(|left, right| right.risk_score.cmp(&left.risk_score));
    ranked.into_iter().take(limit).cloned().collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct TopRiskEntry {
    pub transaction: Transaction,
    pub band: RiskBand,
    pub band_label: &'static str,
}

/// Everything the dashboard renders in one payload.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub total_analyzed: usize,
    pub risk_bands: RiskBands,
    pub top_risks: Vec<TopRiskEntry>,
    pub documents_processed: usize,
    pub cutoff: CutoffTally,
}

impl DashboardView {
    pub fn build(transactions: &[Transaction], documents: &[DocumentVerificationResult]) -> Self {
        let top_risks = top_risks(transactions, TOP_RISK_LIMIT)
            .into_iter()
            .map(|transaction| {
                let band = RiskBand::for_score(transaction.risk_score);
                TopRiskEntry {
                    transaction,
                    band,
                    band_label: band.label(),
                }
            })
            .collect();

        Self {
            total_analyzed: transactions.len(),
            risk_bands: RiskBands::from_transactions(transactions),
            top_risks,
            documents_processed: documents.len(),
            cutoff: CutoffTally::from_documents(documents),
        }
    }
}
