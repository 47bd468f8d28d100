use super::common::*;
use rust_decimal::Decimal;

use crate::workflows::receivables::domain::Transaction;
use crate::workflows::receivables::risk::{reconcile, RiskAssessment, ScoringPolicy};

fn batch() -> Vec<Transaction> {
    vec![
        transaction("A", Some(date(2024, 11, 13)), Decimal::from(100)),
        transaction("B", Some(date(2024, 11, 13)), Decimal::from(200)),
        transaction("C", Some(date(2024, 11, 13)), Decimal::from(300)),
    ]
}

fn assess(transaction: &Transaction, score: u8, reason: &str) -> RiskAssessment {
    RiskAssessment::new(transaction, score, Some(reason.to_string()))
}

fn heuristic(batch: &[Transaction]) -> Vec<RiskAssessment> {
    vec![
        assess(&batch[0], 40, "Round-number amount"),
        assess(&batch[1], 50, "Magnitude outlier relative to batch"),
        assess(&batch[2], 0, ""),
    ]
}

fn model(batch: &[Transaction]) -> Vec<RiskAssessment> {
    vec![
        assess(&batch[0], 85, "Unusual customer pattern"),
        assess(&batch[1], 50, "Large relative to peers"),
    ]
}

#[test]
fn parse_accepts_labels_and_aliases() {
    assert_eq!(ScoringPolicy::parse("heuristic"), Some(ScoringPolicy::Heuristic));
    assert_eq!(
        ScoringPolicy::parse(" Model-Preferred "),
        Some(ScoringPolicy::ModelPreferred)
    );
    assert_eq!(
        ScoringPolicy::parse("heuristic_floor"),
        Some(ScoringPolicy::HeuristicFloor)
    );
    assert_eq!(ScoringPolicy::parse("average"), None);
    assert_eq!(ScoringPolicy::default(), ScoringPolicy::HeuristicFloor);
}

#[test]
fn heuristic_policy_ignores_model_scores() {
    let batch = batch();
    let merged = reconcile(
        ScoringPolicy::Heuristic,
        &heuristic(&batch),
        Some(&model(&batch)),
    );

    assert_eq!(merged[0].risk_score, 40);
    assert_eq!(merged[1].risk_score, 50);
}

#[test]
fn model_preferred_falls_back_for_omitted_transactions() {
    let batch = batch();
    let mut model = model(&batch);
    model.pop();

    let merged = reconcile(ScoringPolicy::ModelPreferred, &heuristic(&batch), Some(&model));

    assert_eq!(merged[0].risk_score, 85);
    assert_eq!(merged[0].risk_reason.as_deref(), Some("Unusual customer pattern"));
    assert_eq!(merged[1].risk_score, 50);
    assert_eq!(
        merged[1].risk_reason.as_deref(),
        Some("Magnitude outlier relative to batch")
    );
}

#[test]
fn floor_takes_the_higher_score_and_joins_reasons_on_ties() {
    let batch = batch();
    let merged = reconcile(
        ScoringPolicy::HeuristicFloor,
        &heuristic(&batch),
        Some(&model(&batch)),
    );

    assert_eq!(merged[0].risk_score, 85);
    assert_eq!(merged[0].risk_reason.as_deref(), Some("Unusual customer pattern"));
    assert_eq!(merged[1].risk_score, 50);
    assert_eq!(
        merged[1].risk_reason.as_deref(),
        Some("Magnitude outlier relative to batch; Large relative to peers")
    );
    assert_eq!(merged[2].risk_score, 0);
    assert!(merged[2].risk_reason.is_none());
}

#[test]
fn floor_never_lowers_the_heuristic_score() {
    let batch = batch();
    let low_model = vec![assess(&batch[1], 5, "Looks fine")];

    let merged = reconcile(ScoringPolicy::HeuristicFloor, &heuristic(&batch), Some(&low_model));

    assert_eq!(merged[1].risk_score, 50);
    assert_eq!(
        merged[1].risk_reason.as_deref(),
        Some("Magnitude outlier relative to batch")
    );
}

#[test]
fn model_cannot_alter_transaction_fields() {
    let batch = batch();
    let mut tampered = batch[0].clone();
    tampered.amount = Decimal::from(1);
    tampered.customer = "Someone Else".to_string();
    let model = vec![assess(&tampered, 99, "Tampered")];

    let merged = reconcile(ScoringPolicy::ModelPreferred, &heuristic(&batch), Some(&model));

    assert_eq!(merged[0].risk_score, 99);
    assert_eq!(merged[0].amount, Decimal::from(100));
    assert_eq!(merged[0].customer, "Acme Corp");
}

#[test]
fn missing_model_output_keeps_heuristic_scores() {
    let batch = batch();
    let merged = reconcile(ScoringPolicy::ModelPreferred, &heuristic(&batch), None);

    let scores: Vec<u8> = merged.iter().map(|transaction| transaction.risk_score).collect();
    assert_eq!(scores, vec![40, 50, 0]);
}
