mod config;
mod policy;
mod rules;

pub use config::RiskRulesConfig;
pub use policy::{reconcile, ScoreSource, ScoringPolicy};

use super::domain::{Transaction, MAX_RISK_SCORE};
use rules::{evaluate_rules, ReferenceProfile};
use serde::{Deserialize, Serialize};

/// Separator used whenever several reasons describe one score.
pub const REASON_SEPARATOR: &str = "; ";

/// Heuristic rules, listed in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskRule {
    RoundNumber,
    WeekendPosting,
    DuplicateAmount,
    MagnitudeOutlier,
}

impl RiskRule {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::RoundNumber,
            Self::WeekendPosting,
            Self::DuplicateAmount,
            Self::MagnitudeOutlier,
        ]
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::RoundNumber => "Round-number amount",
            Self::WeekendPosting => "Weekend posting",
            Self::DuplicateAmount => "Duplicate amount with another transaction",
            Self::MagnitudeOutlier => "Magnitude outlier relative to batch",
        }
    }
}

/// A rule that fired for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSignal {
    pub rule: RiskRule,
    pub contribution: u8,
}

impl RiskSignal {
    pub const fn new(rule: RiskRule, contribution: u8) -> Self {
        Self { rule, contribution }
    }
}

/// Scored view of one transaction; `transaction` is a re-scored copy of the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub transaction: Transaction,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<RiskSignal>,
}

impl RiskAssessment {
    pub fn new(transaction: &Transaction, score: u8, reason: Option<String>) -> Self {
        let transaction = transaction.rescored(score, reason);
        Self {
            score: transaction.risk_score,
            reason: transaction.risk_reason.clone(),
            transaction,
            signals: Vec::new(),
        }
    }
}

/// Deterministic pre-filter that scores transactions without any model call.
///
/// Each rule is evaluated independently; the final score is the largest
/// contribution (capped at 100), never the sum, and every triggered reason is
/// reported in rule order.
#[derive(Debug, Clone, Default)]
pub struct RiskFlagger {
    config: RiskRulesConfig,
}

impl RiskFlagger {
    pub fn new(config: RiskRulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskRulesConfig {
        &self.config
    }

    /// Score `transactions`, comparing amounts against `reference` for the
    /// duplicate and outlier rules. Inputs are left untouched.
    ///
    /// Ids are assumed unique: a reference entry sharing a transaction's id is
    /// that transaction, so it never counts as its duplicate.
    pub fn score(
        &self,
        transactions: &[Transaction],
        reference: &[Transaction],
    ) -> Vec<RiskAssessment> {
        let profile = ReferenceProfile::build(reference);
        transactions
            .iter()
            .map(|transaction| self.assess(transaction, &profile))
            .collect()
    }

    /// Score a batch against itself.
    pub fn score_batch(&self, transactions: &[Transaction]) -> Vec<RiskAssessment> {
        self.score(transactions, transactions)
    }

    fn assess(&self, transaction: &Transaction, profile: &ReferenceProfile<'_>) -> RiskAssessment {
        let signals = evaluate_rules(transaction, profile, &self.config);

        let score = signals
            .iter()
            .map(|signal| signal.contribution)
            .max()
            .unwrap_or(0)
            .min(MAX_RISK_SCORE);

        let reason = if signals.is_empty() {
            None
        } else {
            Some(
                signals
                    .iter()
                    .map(|signal| signal.rule.reason())
                    .collect::<Vec<_>>()
                    .join(REASON_SEPARATOR),
            )
        };

        let mut assessment = RiskAssessment::new(transaction, score, reason);
        assessment.signals = signals;
        assessment
    }
}
