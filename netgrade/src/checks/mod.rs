//! Per-device comparisons between a master configuration and a submission.
//!
//! Each check looks at one aspect of the configuration and scores it out of
//! 100. Checks are pure: everything they need is in the [`CheckContext`], and
//! their feedback follows the sort order of the master items they inspect,
//! so the same pair of configurations always yields the same result.

mod acl;
mod address_plan;
mod hostname;
mod interfaces;
mod ospf;
mod static_routes;
pub mod topology;

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use serde::Serialize;

use crate::identity::IdentityHint;
use crate::normalize::ParsedDevice;

pub use acl::AclCheck;
pub use address_plan::AddressPlanCheck;
pub use hostname::HostnameCheck;
pub use interfaces::InterfacesCheck;
pub use ospf::OspfCheck;
pub use static_routes::StaticRoutesCheck;
pub use topology::{evaluate_topology, TOPOLOGY};

/// Full marks for one check on one device.
pub const MAX_SCORE: f64 = 100.0;

/// Outcome of one check on one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub check: String,
    pub device: String,
    pub score: f64,
    pub max: f64,
    pub feedback: Vec<String>,
}

impl CheckResult {
    /// A result out of [`MAX_SCORE`]; the score is clamped into range.
    pub fn new(check: &str, device: &str, score: f64, feedback: Vec<String>) -> Self {
        Self {
            check: check.to_string(),
            device: device.to_string(),
            score: score.clamp(0.0, MAX_SCORE),
            max: MAX_SCORE,
            feedback,
        }
    }

    pub fn zero(check: &str, device: &str, feedback: Vec<String>) -> Self {
        Self::new(check, device, 0.0, feedback)
    }
}

/// Facts shared by every device in one grading run.
#[derive(Debug)]
pub struct CheckScope<'a> {
    pub hint: &'a IdentityHint,
    /// Whether the lab uses personal address space.
    pub personal_space: bool,
    /// Addresses typed anywhere in the master set, before personal-space
    /// rewriting.
    pub master_addresses: &'a BTreeSet<Ipv4Addr>,
    /// Whether the assignment awards points for static routes.
    pub static_routes_graded: bool,
}

/// Everything a check may look at for one device pair.
#[derive(Debug)]
pub struct CheckContext<'a> {
    pub scope: &'a CheckScope<'a>,
    pub device: &'a str,
    pub master: &'a ParsedDevice,
    pub student: &'a ParsedDevice,
    /// Peer addresses the device should see, from the master topology or
    /// the master neighbour table.
    pub expected_neighbors: &'a BTreeSet<Ipv4Addr>,
    /// Neighbour table submitted for this device, if any.
    pub student_neighbors: Option<&'a BTreeSet<Ipv4Addr>>,
}

pub trait Check {
    fn name(&self) -> &'static str;

    /// Whether the check has anything to grade for this master device.
    fn applies_to(&self, master: &ParsedDevice, scope: &CheckScope<'_>) -> bool;

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckResult;
}

/// All per-device checks, in reporting order.
pub fn registry() -> Vec<&'static dyn Check> {
    vec![
        &HostnameCheck,
        &InterfacesCheck,
        &StaticRoutesCheck,
        &OspfCheck,
        &AclCheck,
        &AddressPlanCheck,
    ]
}

/// Names a profile may assign weight to.
pub fn known_checks() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = registry().iter().map(|c| c.name()).collect();
    names.push(TOPOLOGY);
    names
}

/// Run every applicable check on a matched pair.
pub fn run_checks(ctx: &CheckContext<'_>) -> Vec<CheckResult> {
    registry()
        .into_iter()
        .filter(|check| check.applies_to(ctx.master, ctx.scope))
        .map(|check| check.evaluate(ctx))
        .collect()
}

/// Zero on every applicable check for a master device nobody submitted.
pub fn missing_device(
    device: &str,
    master: &ParsedDevice,
    scope: &CheckScope<'_>,
) -> Vec<CheckResult> {
    zero_all(device, master, scope, format!("{device}: no submission found"))
}

/// Zero on every applicable check for a submission that failed to parse.
pub fn unparsable_device(
    device: &str,
    master: &ParsedDevice,
    scope: &CheckScope<'_>,
    reason: &str,
) -> Vec<CheckResult> {
    zero_all(
        device,
        master,
        scope,
        format!("{device}: submitted configuration could not be parsed ({reason})"),
    )
}

fn zero_all(
    device: &str,
    master: &ParsedDevice,
    scope: &CheckScope<'_>,
    message: String,
) -> Vec<CheckResult> {
    registry()
        .into_iter()
        .filter(|check| check.applies_to(master, scope))
        .map(|check| CheckResult::zero(check.name(), device, vec![message.clone()]))
        .collect()
}

/// Fixed deductions from full marks.
#[derive(Debug, Default)]
struct Deductions {
    points: f64,
    feedback: Vec<String>,
}

impl Deductions {
    fn deduct(&mut self, points: f64, message: impl Into<String>) {
        self.points += points;
        self.feedback.push(message.into());
    }

    /// Deduct `per_item` for each message, at most `cap` in total.
    fn deduct_capped(&mut self, per_item: f64, cap: f64, messages: Vec<String>) {
        if messages.is_empty() {
            return;
        }
        self.points += (per_item * messages.len() as f64).min(cap);
        self.feedback.extend(messages);
    }

    fn note(&mut self, message: impl Into<String>) {
        self.feedback.push(message.into());
    }

    fn finish(self, check: &str, device: &str) -> CheckResult {
        CheckResult::new(check, device, MAX_SCORE - self.points, self.feedback)
    }
}

/// Equal-share credit over a fixed number of graded items.
#[derive(Debug)]
struct Shares {
    items: usize,
    credit: f64,
    feedback: Vec<String>,
}

impl Shares {
    fn new(items: usize) -> Self {
        Self {
            items,
            credit: 0.0,
            feedback: Vec::new(),
        }
    }

    /// Award `fraction` of one item's share.
    fn award(&mut self, fraction: f64) {
        self.credit += fraction;
    }

    fn fail(&mut self, fraction: f64, message: impl Into<String>) {
        self.credit += fraction;
        self.feedback.push(message.into());
    }

    fn note(&mut self, message: impl Into<String>) {
        self.feedback.push(message.into());
    }

    /// With nothing to award, full marks minus one share per penalty.
    fn score(&self) -> f64 {
        if self.items == 0 {
            return MAX_SCORE * (1.0 + self.credit.min(0.0));
        }
        MAX_SCORE * self.credit / self.items as f64
    }

    fn finish(self, check: &str, device: &str) -> CheckResult {
        CheckResult::new(check, device, self.score(), self.feedback)
    }
}


#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::test_support::{context, device, hint, scope};
    use super::{known_checks, missing_device, run_checks};

    const MASTER: &str = "hostname R1\n\
        interface g0/0\n ip address 10.0.1.1 255.255.255.0\n\
        interface g0/1\n ip address 10.0.12.1 255.255.255.0\n\
        ip route 10.0.3.0 255.255.255.0 10.0.12.2\n";

    #[test]
    fn identical_configs_score_full_marks() {
        let hint = hint();
        let literals = BTreeSet::new();
        let scope = scope(&hint, &literals);
        let master = device(MASTER);
        let student = device(MASTER);
        let expected = BTreeSet::new();
        let results = run_checks(&context(&scope, &master, &student, &expected));
        let names: Vec<&str> = results.iter().map(|r| r.check.as_str()).collect();
        assert_eq!(names, vec!["hostname", "interfaces", "static_routes"]);
        assert!(results.iter().all(|r| r.score == 100.0 && r.feedback.is_empty()));
    }

    #[test]
    fn missing_device_zeroes_applicable_checks() {
        let hint = hint();
        let literals = BTreeSet::new();
        let scope = scope(&hint, &literals);
        let results = missing_device("R2", &device(MASTER), &scope);
        assert_eq!(results.len(), 3);
        for result in results {
            assert_eq!(result.score, 0.0);
            assert_eq!(result.max, 100.0);
            assert_eq!(result.feedback, vec!["R2: no submission found".to_string()]);
        }
    }

    #[test]
    fn profile_names_include_topology() {
        let names = known_checks();
        assert!(names.contains(&"topology"));
        assert!(names.contains(&"address_plan"));
        assert_eq!(names.len(), 7);
    }
}
