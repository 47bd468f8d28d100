use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::super::domain::Transaction;
use super::{RiskAssessment, REASON_SEPARATOR};

/// How heuristic scores and model scores combine into the stored score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Never consult the model.
    Heuristic,
    /// Model scores replace heuristic ones; the heuristic covers failures and omissions.
    ModelPreferred,
    /// The heuristic score is a floor under the model score.
    #[default]
    HeuristicFloor,
}

impl ScoringPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "heuristic" | "heuristic_only" => Some(Self::Heuristic),
            "model_preferred" | "model" => Some(Self::ModelPreferred),
            "heuristic_floor" | "floor" => Some(Self::HeuristicFloor),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::ModelPreferred => "model_preferred",
            Self::HeuristicFloor => "heuristic_floor",
        }
    }

    pub const fn consults_model(self) -> bool {
        !matches!(self, Self::Heuristic)
    }
}

/// Where the stored scores of a run came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ScoreSource {
    Heuristic,
    Model,
    Blended,
    /// The model was consulted and failed; heuristic scores were kept.
    HeuristicFallback { error: String },
}

impl ScoreSource {
    pub fn for_policy(policy: ScoringPolicy) -> Self {
        match policy {
            ScoringPolicy::Heuristic => Self::Heuristic,
            ScoringPolicy::ModelPreferred => Self::Model,
            ScoringPolicy::HeuristicFloor => Self::Blended,
        }
    }
}

/// Combine heuristic and model assessments per `policy`.
///
/// Output follows the heuristic (input) order. Only score and reason are taken
/// from the model; every other field comes from the original transaction.
/// Model assessments for unknown ids are ignored.
pub fn reconcile(
    policy: ScoringPolicy,
    heuristic: &[RiskAssessment],
    model: Option<&[RiskAssessment]>,
) -> Vec<Transaction> {
    let by_id: HashMap<&str, &RiskAssessment> = model
        .unwrap_or_default()
        .iter()
        .map(|assessment| (assessment.transaction.id.as_str(), assessment))
        .collect();

    heuristic
        .iter()
        .map(|local| {
            let remote = if policy.consults_model() {
                by_id.get(local.transaction.id.as_str()).copied()
            } else {
                None
            };

            match (policy, remote) {
                (_, None) => local.transaction.clone(),
                (ScoringPolicy::ModelPreferred, Some(remote)) => local
                    .transaction
                    .rescored(remote.score, remote.reason.clone()),
                (_, Some(remote)) => floor(local, remote),
            }
        })
        .collect()
}

fn floor(local: &RiskAssessment, remote: &RiskAssessment) -> Transaction {
    let base = &local.transaction;
    if remote.score > local.score {
        return base.rescored(remote.score, remote.reason.clone());
    }
    if local.score > remote.score {
        return base.rescored(local.score, local.reason.clone());
    }

    let mut reasons: Vec<&str> = Vec::new();
    for reason in [local.reason.as_deref(), remote.reason.as_deref()]
        .into_iter()
        .flatten()
    {
        let reason = reason.trim();
        if !reason.is_empty() && !reasons.contains(&reason) {
            reasons.push(reason);
        }
    }

    let reason = if reasons.is_empty() {
        None
    } else {
        Some(reasons.join(REASON_SEPARATOR))
    };
    base.rescored(local.score, reason)
}
