//! Submission-wide check on the links between devices.

use super::CheckResult;
use crate::topology::Edges;

pub const TOPOLOGY: &str = "topology";

/// Device name the topology result is reported under.
pub const NETWORK: &str = "network";

const PARTITIONED: f64 = 80.0;
const ONE_MISSING: f64 = 90.0;
const SEVERAL_MISSING: f64 = 70.0;
const HALF_MISSING: f64 = 50.0;

/// Compare the student's link graph with the master's.
///
/// Returns `None` when the master has no links, in which case the check does
/// not apply. A student graph split into more pieces than the master's caps
/// the score at 80 regardless of how many links are missing.
pub fn evaluate_topology(
    master: &Edges,
    student: &Edges,
    master_components: usize,
    student_components: usize,
) -> Option<CheckResult> {
    if master.is_empty() {
        return None;
    }

    let missing: Vec<String> = master
        .keys()
        .filter(|pair| !student.contains_key(*pair))
        .map(|(a, b)| format!("link {a}-{b} missing"))
        .collect();
    let extra = student
        .keys()
        .filter(|pair| !master.contains_key(*pair))
        .map(|(a, b)| format!("link {a}-{b} is not in the master topology"));

    let score = if student_components > master_components {
        PARTITIONED
    } else if missing.is_empty() {
        100.0
    } else if missing.len() * 2 >= master.len() {
        HALF_MISSING
    } else if missing.len() >= 2 {
        SEVERAL_MISSING
    } else {
        ONE_MISSING
    };

    let mut feedback = Vec::new();
    if student_components > master_components {
        feedback.push(format!(
            "network is split into {student_components} parts, expected {master_components}"
        ));
    }
    feedback.extend(missing);
    feedback.extend(extra);
    Some(CheckResult::new(TOPOLOGY, NETWORK, score, feedback))
}
