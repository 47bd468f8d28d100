use std::collections::HashMap;

use serde_json::Value;

use super::super::domain::{clamp_score, ExtractedDocumentData, Transaction};
use super::super::risk::RiskAssessment;
use super::CollaboratorError;

/// Strip the markdown code fence models like to wrap JSON in.
pub fn clean_json_string(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = body
        .strip_prefix("json")
        .or_else(|| body.strip_prefix("JSON"))
        .unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model's field-extraction reply.
pub fn parse_extraction_response(text: &str) -> Result<ExtractedDocumentData, CollaboratorError> {
    let body = clean_json_string(text);
    if body.is_empty() {
        return Err(CollaboratorError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|err| CollaboratorError::MalformedResponse(err.to_string()))?;
    if !value.is_object() {
        return Err(CollaboratorError::MalformedResponse(
            "expected a JSON object of extracted fields".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|err| CollaboratorError::MalformedResponse(err.to_string()))
}

/// Parse a model's batch-scoring reply into assessments of `batch`.
///
/// Rows for ids outside the batch are dropped, scores are clamped into
/// `0..=100`, and only `riskScore`/`riskReason` are read: the model cannot
/// alter any other transaction field.
pub fn parse_scoring_response(
    text: &str,
    batch: &[Transaction],
) -> Result<Vec<RiskAssessment>, CollaboratorError> {
    let body = clean_json_string(text);
    if body.is_empty() {
        return Err(CollaboratorError::EmptyResponse);
    }

    let rows: Vec<Value> = serde_json::from_str(body)
        .map_err(|err| CollaboratorError::MalformedResponse(err.to_string()))?;

    let by_id: HashMap<&str, &Transaction> = batch
        .iter()
        .map(|transaction| (transaction.id.as_str(), transaction))
        .collect();

    let assessments = rows
        .iter()
        .filter_map(|row| {
            let id = row.get("id")?.as_str()?;
            let transaction = by_id.get(id)?;
            let score = field(row, "riskScore", "risk_score")
                .and_then(score_value)
                .unwrap_or(0);
            let reason = field(row, "riskReason", "risk_reason")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|reason| !reason.is_empty())
                .map(str::to_string);
            Some(RiskAssessment::new(transaction, score, reason))
        })
        .collect();

    Ok(assessments)
}

fn field<'a>(row: &'a Value, camel: &str, snake: &str) -> Option<&'a Value> {
    row.get(camel).or_else(|| row.get(snake))
}

fn score_value(value: &Value) -> Option<u8> {
    match value {
        Value::Number(number) => number.as_f64().map(clamp_score),
        Value::String(text) => text.trim().parse::<f64>().ok().map(clamp_score),
        _ => None,
    }
}
