use chrono::{DateTime, NaiveDate};

use super::domain::{CutoffResult, CutoffStatus};

pub const NOTE_DATES_MISSING: &str = "Dates missing for cut-off test.";
pub const NOTE_DELIVERED_BEFORE_INVOICED_AFTER: &str =
    "Potential Cut-off Error: Goods delivered before Year End, Invoiced after.";
pub const NOTE_INVOICED_BEFORE_DELIVERED_AFTER: &str =
    "Potential Cut-off Error: Invoiced before Year End, Goods delivered after.";
pub const NOTE_VERIFIED: &str = "Verified.";

/// Classifies whether a document was booked in the right fiscal period.
///
/// The fiscal year end is inclusive: a date equal to it counts as "before".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffEvaluator {
    fiscal_year_end: NaiveDate,
}

impl CutoffEvaluator {
    pub fn new(fiscal_year_end: NaiveDate) -> Self {
        Self { fiscal_year_end }
    }

    pub fn fiscal_year_end(&self) -> NaiveDate {
        self.fiscal_year_end
    }

    pub fn evaluate(
        &self,
        invoice_date: Option<NaiveDate>,
        delivery_date: Option<NaiveDate>,
    ) -> CutoffResult {
        evaluate(invoice_date, delivery_date, self.fiscal_year_end)
    }

    /// Same as [`CutoffEvaluator::evaluate`] for dates still in string form.
    pub fn evaluate_raw(
        &self,
        invoice_date: Option<&str>,
        delivery_date: Option<&str>,
    ) -> CutoffResult {
        self.evaluate(
            invoice_date.and_then(parse_document_date),
            delivery_date.and_then(parse_document_date),
        )
    }
}

pub fn evaluate(
    invoice_date: Option<NaiveDate>,
    delivery_date: Option<NaiveDate>,
    fiscal_year_end: NaiveDate,
) -> CutoffResult {
    let (Some(invoiced), Some(delivered)) = (invoice_date, delivery_date) else {
        return CutoffResult {
            status: CutoffStatus::Indeterminate,
            notes: NOTE_DATES_MISSING.to_string(),
        };
    };

    let invoiced_after = invoiced > fiscal_year_end;
    let delivered_after = delivered > fiscal_year_end;

    let (status, notes) = match (invoiced_after, delivered_after) {
        (true, false) => (CutoffStatus::Failed, NOTE_DELIVERED_BEFORE_INVOICED_AFTER),
        (false, true) => (CutoffStatus::Failed, NOTE_INVOICED_BEFORE_DELIVERED_AFTER),
        _ => (CutoffStatus::Passed, NOTE_VERIFIED),
    };

    CutoffResult {
        status,
        notes: notes.to_string(),
    }
}

/// Parse a calendar date as emitted by extraction models and ledger exports.
/// Anything unrecognised yields `None`.
pub fn parse_document_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    ["%Y-%m-%d", "%Y/%m/%d", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| {
            NaiveDate::parse_from_str(trimmed, format)
                .ok()
                .or_else(|| {
                    chrono::NaiveDateTime::parse_from_str(trimmed, format)
                        .ok()
                        .map(|dt| dt.date())
                })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_document_date_supports_common_spellings() {
        let expected = NaiveDate::from_ymd_opt(2024, 12, 20);
        assert_eq!(parse_document_date("2024-12-20"), expected);
        assert_eq!(parse_document_date(" 2024/12/20 "), expected);
        assert_eq!(parse_document_date("2024-12-20T09:30:00Z"), expected);
        assert_eq!(parse_document_date("2024-12-20T09:30:00"), expected);

        assert!(parse_document_date("").is_none());
        assert!(parse_document_date("   ").is_none());
        assert!(parse_document_date("2024-02-30").is_none());
        assert!(parse_document_date("next Tuesday").is_none());
    }
}
