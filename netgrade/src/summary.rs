//! The JSON document a grading run produces.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::grade::GradeError;
use crate::normalize::UnparsedLine;
use crate::scoring::{round_half_up, CheckScore};

/// Shown instead of the details of an internal scoring failure.
pub const SCORING_FAILED: &str = "internal error while computing the score";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingSummary {
    pub final_score: f64,
    /// Check name -> pooled result. Named after the per-router report it
    /// replaces.
    pub per_router: BTreeMap<String, CheckSummary>,
    pub assignment_type: String,
    /// Number of master devices.
    pub num_devices: usize,
    /// Master device id -> what happened to it.
    pub devices: BTreeMap<String, DeviceSummary>,
    pub unmatched_master: Vec<String>,
    pub unmatched_student: Vec<String>,
    pub notes: Vec<String>,
    /// `"A-B"` -> shared subnets.
    pub master_edges: BTreeMap<String, String>,
    pub student_edges: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckSummary {
    /// `null` when the check applied to no device.
    pub score: Option<f64>,
    pub weight: u32,
    pub effective_weight: f64,
    pub applicable: bool,
    pub feedback: Vec<String>,
}

impl From<&CheckScore> for CheckSummary {
    fn from(score: &CheckScore) -> Self {
        Self {
            score: score.score.map(round_half_up),
            weight: score.weight,
            effective_weight: round_half_up(score.effective_weight),
            applicable: score.score.is_some(),
            feedback: score.feedback.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Graded,
    Missing,
    Unparsable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub status: DeviceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_file: Option<String>,
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unparsed_lines: Vec<UnparsedLine>,
    /// Structural differences from the master, one per line.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diff: Vec<String>,
}

/// What is printed for a run: the summary, or an error document.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success(GradingSummary),
    Failure(Failure),
}

#[derive(Debug, Serialize)]
pub struct Failure {
    pub success: bool,
    pub error: String,
    pub final_score: f64,
    pub per_router: BTreeMap<String, CheckSummary>,
}

impl Envelope {
    /// Wrap the outcome of a run. Scoring failures are internal and are
    /// reported with a fixed message.
    pub fn from_result(result: Result<GradingSummary, GradeError>) -> Self {
        match result {
            Ok(summary) => Envelope::Success(summary),
            Err(err) => {
                let error = match err {
                    GradeError::Aggregation(_) => SCORING_FAILED.to_string(),
                    other => other.to_string(),
                };
                Envelope::Failure(Failure {
                    success: false,
                    error,
                    final_score: 0.0,
                    per_router: BTreeMap::new(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Envelope, SCORING_FAILED};
    use crate::grade::GradeError;
    use crate::identity::IdentityError;
    use crate::scoring::AggregationError;

    #[test]
    fn failures_render_the_error_document() {
        let envelope = Envelope::from_result(Err(GradeError::InvalidHint(
            IdentityError::InvalidPrefix("abc".to_string()),
        )));
        let value = serde_json::to_value(&envelope).expect("serializes");
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["final_score"], json!(0.0));
        assert_eq!(value["per_router"], json!({}));
        assert!(value["error"].as_str().expect("message").contains("abc"));
    }

    #[test]
    fn scoring_failures_are_not_shown_verbatim() {
        let envelope = Envelope::from_result(Err(GradeError::Aggregation(
            AggregationError::WeightsNotHundred {
                name: "lab".to_string(),
                total: 90,
            },
        )));
        let value = serde_json::to_value(&envelope).expect("serializes");
        assert_eq!(value["error"], json!(SCORING_FAILED));
    }
}
