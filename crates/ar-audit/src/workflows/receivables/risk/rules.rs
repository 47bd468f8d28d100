use std::collections::HashMap;

use chrono::{Datelike, Weekday};
use rust_decimal::Decimal;

use super::super::domain::Transaction;
use super::config::RiskRulesConfig;
use super::{RiskRule, RiskSignal};

/// Batch-level statistics the relative rules compare against.
pub(crate) struct ReferenceProfile<'a> {
    /// Ids carrying each amount, used for the duplicate check.
    ids_by_amount: HashMap<Decimal, Vec<&'a str>>,
    median: Option<Decimal>,
}

impl<'a> ReferenceProfile<'a> {
    pub(crate) fn build(reference: &'a [Transaction]) -> Self {
        let usable: Vec<&Transaction> = reference
            .iter()
            .filter(|transaction| is_usable_amount(transaction.amount))
            .collect();

        // Relative rules need something to be relative to.
        if usable.len() < 2 {
            return Self {
                ids_by_amount: HashMap::new(),
                median: None,
            };
        }

        let mut ids_by_amount: HashMap<Decimal, Vec<&'a str>> = HashMap::new();
        for transaction in &usable {
            ids_by_amount
                .entry(transaction.amount.normalize())
                .or_default()
                .push(transaction.id.as_str());
        }

        let mut amounts: Vec<Decimal> = usable.iter().map(|transaction| transaction.amount).collect();
        amounts.sort();

        Self {
            ids_by_amount,
            median: median_of_sorted(&amounts),
        }
    }

    fn has_duplicate_of(&self, transaction: &Transaction) -> bool {
        self.ids_by_amount
            .get(&transaction.amount.normalize())
            .map(|ids| ids.iter().any(|id| *id != transaction.id))
            .unwrap_or(false)
    }
}

pub(crate) fn evaluate_rules(
    transaction: &Transaction,
    profile: &ReferenceProfile<'_>,
    config: &RiskRulesConfig,
) -> Vec<RiskSignal> {
    let mut signals = Vec::new();

    // Negative amounts are malformed ledger lines; they carry no signal at all.
    if !is_usable_amount(transaction.amount) {
        return signals;
    }

    if is_round_number(transaction.amount, config.round_number_unit) {
        signals.push(RiskSignal::new(
            RiskRule::RoundNumber,
            config.round_number_score,
        ));
    }

    if transaction.date.map(is_weekend).unwrap_or(false) {
        signals.push(RiskSignal::new(
            RiskRule::WeekendPosting,
            config.weekend_posting_score,
        ));
    }

    if profile.has_duplicate_of(transaction) {
        signals.push(RiskSignal::new(
            RiskRule::DuplicateAmount,
            config.duplicate_amount_score,
        ));
    }

    if let Some(median) = profile.median {
        // A limit past Decimal::MAX can't be exceeded.
        let above_limit = median
            .checked_mul(config.outlier_multiple)
            .is_some_and(|limit| transaction.amount > limit);
        if above_limit {
            signals.push(RiskSignal::new(
                RiskRule::MagnitudeOutlier,
                config.outlier_score,
            ));
        }
    }

    signals
}

fn is_usable_amount(amount: Decimal) -> bool {
    !amount.is_sign_negative() || amount.is_zero()
}

fn is_round_number(amount: Decimal, unit: Decimal) -> bool {
    if unit <= Decimal::ZERO {
        return false;
    }
    amount >= unit && (amount % unit).is_zero()
}

fn is_weekend(date: chrono::NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn median_of_sorted(amounts: &[Decimal]) -> Option<Decimal> {
    let len = amounts.len();
    if len == 0 {
        return None;
    }

    let mid = len / 2;
    if len % 2 == 1 {
        Some(amounts[mid])
    } else {
        let (low, high) = (amounts[mid - 1], amounts[mid]);
        Some(low.checked_add((high - low) / Decimal::TWO).unwrap_or(high))
    }
}
