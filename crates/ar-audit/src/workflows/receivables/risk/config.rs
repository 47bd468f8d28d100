use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Thresholds and contributions backing the heuristic risk rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRulesConfig {
    /// Amounts that are an exact multiple of this unit (and at least one unit) look estimated.
    pub round_number_unit: Decimal,
    pub round_number_score: u8,
    pub weekend_posting_score: u8,
    pub duplicate_amount_score: u8,
    /// An amount strictly above `outlier_multiple * median` is an outlier.
    pub outlier_multiple: Decimal,
    pub outlier_score: u8,
}

impl Default for RiskRulesConfig {
    fn default() -> Self {
        Self {
            round_number_unit: Decimal::ONE_THOUSAND,
            round_number_score: 40,
            weekend_posting_score: 35,
            duplicate_amount_score: 30,
            outlier_multiple: Decimal::from(3),
            outlier_score: 50,
        }
    }
}
