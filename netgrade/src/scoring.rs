//! Turn per-device check results into per-check and final scores.
//!
//! Each check is pooled across devices: the sum of scores over the sum of
//! maxima. The final score is the weight-averaged pooled score over the checks
//! that applied to at least one device; the weight of a check that applied
//! nowhere is shared out over the others in proportion to their own weight.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::checks::{known_checks, CheckResult, MAX_SCORE};
use crate::profile::AssignmentProfile;

#[derive(Debug, Error, PartialEq)]
pub enum AggregationError {
    #[error("weights of assignment '{name}' sum to {total}, expected 100")]
    WeightsNotHundred { name: String, total: u32 },
    #[error("assignment '{name}' weights unknown check '{check}'")]
    UnknownCheck { name: String, check: String },
    #[error("check {check} on {device} scored {score} out of {max}")]
    ScoreOutOfRange {
        check: String,
        device: String,
        score: f64,
        max: f64,
    },
}

/// Pooled result of one check across every device.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckScore {
    /// Percentage, `None` when the check applied to no device.
    pub score: Option<f64>,
    /// Weight from the assignment profile.
    pub weight: u32,
    /// Weight after redistribution; zero when not applicable.
    pub effective_weight: f64,
    /// Feedback of every device, each block headed by the device name.
    pub feedback: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scoreboard {
    pub final_score: f64,
    pub checks: BTreeMap<String, CheckScore>,
    /// Weighted score of each device over the checks that applied to it.
    pub devices: BTreeMap<String, Option<f64>>,
}

pub fn aggregate(
    results: &[CheckResult],
    profile: &AssignmentProfile,
) -> Result<Scoreboard, AggregationError> {
    validate(results, profile)?;

    let mut pooled: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for name in profile.weights.keys() {
        pooled.entry(name.as_str()).or_default();
    }
    for result in results {
        let entry = pooled.entry(result.check.as_str()).or_default();
        entry.0 += result.score;
        entry.1 += result.max;
    }

    let applicable_weight: u32 = pooled
        .iter()
        .filter(|(_, (_, max))| *max > 0.0)
        .map(|(name, _)| profile.weight(name))
        .sum();

    let mut checks = BTreeMap::new();
    let mut weighted = 0.0;
    for (name, (score, max)) in &pooled {
        let weight = profile.weight(name);
        let percent = (*max > 0.0).then(|| MAX_SCORE * score / max);
        let effective_weight = match percent {
            Some(_) if applicable_weight > 0 => {
                f64::from(weight) * MAX_SCORE / f64::from(applicable_weight)
            }
            _ => 0.0,
        };
        if let Some(percent) = percent {
            weighted += effective_weight * percent;
        }
        checks.insert(
            name.to_string(),
            CheckScore {
                score: percent,
                weight,
                effective_weight,
                feedback: feedback_for(results, name),
            },
        );
    }

    let final_score = if applicable_weight > 0 {
        weighted / MAX_SCORE
    } else {
        0.0
    };

    Ok(Scoreboard {
        final_score: final_score.clamp(0.0, MAX_SCORE),
        checks,
        devices: device_scores(results, profile),
    })
}

fn validate(results: &[CheckResult], profile: &AssignmentProfile) -> Result<(), AggregationError> {
    let total: u32 = profile.weights.values().sum();
    if total != 100 {
        return Err(AggregationError::WeightsNotHundred {
            name: profile.name.clone(),
            total,
        });
    }
    let known = known_checks();
    if let Some(check) = profile
        .weights
        .keys()
        .find(|check| !known.contains(&check.as_str()))
    {
        return Err(AggregationError::UnknownCheck {
            name: profile.name.clone(),
            check: check.clone(),
        });
    }
    for result in results {
        let in_range = result.max >= 0.0 && result.score >= 0.0 && result.score <= result.max;
        if !in_range {
            return Err(AggregationError::ScoreOutOfRange {
                check: result.check.clone(),
                device: result.device.clone(),
                score: result.score,
                max: result.max,
            });
        }
    }
    Ok(())
}

/// Feedback of one check, grouped by device in result order.
fn feedback_for(results: &[CheckResult], check: &str) -> Vec<String> {
    let mut out = Vec::new();
    for result in results.iter().filter(|r| r.check == check) {
        if result.feedback.is_empty() {
            continue;
        }
        out.push(format!("--- {} ---", result.device));
        out.extend(result.feedback.iter().cloned());
    }
    out
}

fn device_scores(
    results: &[CheckResult],
    profile: &AssignmentProfile,
) -> BTreeMap<String, Option<f64>> {
    let mut sums: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for result in results {
        let entry = sums.entry(result.device.as_str()).or_default();
        let weight = f64::from(profile.weight(&result.check));
        if result.max > 0.0 && weight > 0.0 {
            entry.0 += weight * MAX_SCORE * result.score / result.max;
            entry.1 += weight;
        }
    }
    sums.into_iter()
        .map(|(device, (score, weight))| {
            (device.to_string(), (weight > 0.0).then(|| score / weight))
        })
        .collect()
}

/// Round half away from zero to two decimals. Scores are never negative.
pub fn round_half_up(value: f64) -> f64 {
    ((value * 100.0) + 0.5 + 1e-9).floor() / 100.0
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::{aggregate, round_half_up, AggregationError};
    use crate::checks::CheckResult;
    use crate::profile::AssignmentProfile;

    fn profile(weights: &[(&str, u32)]) -> AssignmentProfile {
        AssignmentProfile {
            name: "lab".to_string(),
            description: String::new(),
            weights: weights
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn result(check: &str, device: &str, score: f64) -> CheckResult {
        CheckResult::new(check, device, score, Vec::new())
    }

    #[test]
    fn pools_across_devices() {
        let results = vec![
            result("interfaces", "R1", 100.0),
            result("interfaces", "R2", 50.0),
            result("hostname", "R1", 100.0),
            result("hostname", "R2", 100.0),
        ];
        let board = aggregate(&results, &profile(&[("hostname", 20), ("interfaces", 80)]))
            .expect("aggregates");
        assert_eq!(board.checks["interfaces"].score, Some(75.0));
        assert_eq!(board.final_score, 80.0);
        assert_eq!(board.devices["R2"], Some(60.0));
    }

    #[test]
    fn redistributes_weight_of_checks_that_never_applied() {
        let results = vec![result("hostname", "R1", 50.0), result("interfaces", "R1", 100.0)];
        let board = aggregate(
            &results,
            &profile(&[("hostname", 10), ("interfaces", 30), ("ospf", 60)]),
        )
        .expect("aggregates");
        let ospf = &board.checks["ospf"];
        assert_eq!(ospf.score, None);
        assert_eq!(ospf.effective_weight, 0.0);
        assert_eq!(board.checks["hostname"].effective_weight, 25.0);
        assert_eq!(board.checks["interfaces"].effective_weight, 75.0);
        assert_eq!(board.final_score, 87.5);
    }

    #[test]
    fn unweighted_checks_are_reported_without_effect() {
        let results = vec![result("hostname", "R1", 100.0), result("acl", "R1", 0.0)];
        let board = aggregate(&results, &profile(&[("hostname", 100)])).expect("aggregates");
        assert_eq!(board.final_score, 100.0);
        assert_eq!(board.checks["acl"].weight, 0);
        assert_eq!(board.checks["acl"].score, Some(0.0));
    }

    #[test]
    fn feedback_is_grouped_by_device() {
        let results = vec![
            CheckResult::new("hostname", "R1", 100.0, Vec::new()),
            CheckResult::new("hostname", "R2", 75.0, vec!["hostname: expected R2, found R3".into()]),
        ];
        let board = aggregate(&results, &profile(&[("hostname", 100)])).expect("aggregates");
        assert_eq!(
            board.checks["hostname"].feedback,
            vec!["--- R2 ---".to_string(), "hostname: expected R2, found R3".to_string()]
        );
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(
            aggregate(&[], &profile(&[("hostname", 90)])),
            Err(AggregationError::WeightsNotHundred {
                name: "lab".to_string(),
                total: 90
            })
        );
        let mut bad = result("hostname", "R1", 100.0);
        bad.score = 120.0;
        assert!(matches!(
            aggregate(&[bad], &profile(&[("hostname", 100)])),
            Err(AggregationError::ScoreOutOfRange { .. })
        ));
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_half_up(87.125), 87.13);
        assert_eq!(round_half_up(66.666_666), 66.67);
        assert_eq!(round_half_up(2.675), 2.68);
        assert_eq!(round_half_up(100.0), 100.0);
    }
}
