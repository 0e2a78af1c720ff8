use super::{Check, CheckContext, CheckResult, CheckScope, Shares};
use crate::addr::IfAddr;
use crate::normalize::model::Interface;
use crate::normalize::names::InterfaceName;
use crate::normalize::ParsedDevice;

/// Credit kept when the address is right but the interface state is not.
const WRONG_STATE_CREDIT: f64 = 0.5;

pub struct InterfacesCheck;

impl Check for InterfacesCheck {
    fn name(&self) -> &'static str {
        "interfaces"
    }

    fn applies_to(&self, master: &ParsedDevice, _scope: &CheckScope<'_>) -> bool {
        master.config.addressed_interfaces().next().is_some()
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckResult {
        let master = &ctx.master.config;
        let student = &ctx.student.config;

        let items = master
            .interfaces
            .values()
            .map(|iface| usize::from(iface.address.is_some()) + iface.secondary.len())
            .sum();
        let mut shares = Shares::new(items);

        for (name, expected) in &master.interfaces {
            let Some(primary) = expected.address else {
                continue;
            };
            let found = student.interfaces.get(name);
            let short = name.short();

            match found.and_then(|f| f.address) {
                Some(addr) if addr == primary => match found {
                    Some(f) if f.enabled != expected.enabled => {
                        shares.fail(WRONG_STATE_CREDIT, state_message(&short, expected.enabled));
                    }
                    _ => shares.award(1.0),
                },
                Some(addr) => {
                    shares.fail(0.0, format!("{short}: expected {primary}, found {addr}"));
                }
                None => {
                    let found = describe_missing(found);
                    shares.fail(0.0, format!("{short}: expected {primary}, found {found}"));
                }
            }

            for secondary in &expected.secondary {
                if found.is_some_and(|f| f.secondary.contains(secondary)) {
                    shares.award(1.0);
                } else {
                    shares.fail(0.0, format!("{short}: secondary address {secondary} missing"));
                }
            }
        }

        for (name, addr) in student.addressed_interfaces() {
            if !has_address(master.interfaces.get(name)) {
                shares.note(extra_message(name, addr));
            }
        }

        shares.finish(self.name(), ctx.device)
    }
}

fn has_address(iface: Option<&Interface>) -> bool {
    iface.is_some_and(|i| i.address.is_some())
}

fn describe_missing(found: Option<&Interface>) -> String {
    match found.and_then(|f| f.invalid_address.as_deref()) {
        Some(raw) => format!("invalid address '{raw}'"),
        None => "none".to_string(),
    }
}

fn state_message(short: &str, expected_up: bool) -> String {
    if expected_up {
        format!("{short}: interface is shut down")
    } else {
        format!("{short}: interface should be shut down")
    }
}

fn extra_message(name: &InterfaceName, addr: &IfAddr) -> String {
    format!("{}: {addr} is not in the master configuration", name.short())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::InterfacesCheck;
    use crate::checks::test_support::{context, device, hint, scope};
    use crate::checks::Check;

    const MASTER: &str = "interface g0/0\n ip address 10.0.0.1 255.255.255.0\n\
        interface g0/1\n ip address 10.0.12.1 255.255.255.0\n\
        interface s0/0/0\n ip address 10.0.13.1 255.255.255.252\n shutdown\n";

    fn grade(student: &str) -> (f64, Vec<String>) {
        let hint = hint();
        let literals = BTreeSet::new();
        let scope = scope(&hint, &literals);
        let (master, student) = (device(MASTER), device(student));
        let expected = BTreeSet::new();
        let result = InterfacesCheck.evaluate(&context(&scope, &master, &student, &expected));
        (result.score, result.feedback)
    }

    #[test]
    fn identical_scores_full() {
        assert_eq!(grade(MASTER), (100.0, Vec::new()));
    }

    #[test]
    fn wrong_address_loses_the_share() {
        let (score, feedback) = grade(
            "interface g0/0\n ip address 10.0.0.2 255.255.255.0\n\
             interface g0/1\n ip address 10.0.12.1 255.255.255.0\n\
             interface s0/0/0\n ip address 10.0.13.1 255.255.255.252\n shutdown\n",
        );
        assert!((score - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            feedback,
            vec!["Gi0/0: expected 10.0.0.1/24, found 10.0.0.2/24".to_string()]
        );
    }

    #[test]
    fn state_mismatch_costs_half_a_share() {
        let (score, feedback) = grade(
            "interface g0/0\n ip address 10.0.0.1 255.255.255.0\n\
             interface g0/1\n ip address 10.0.12.1 255.255.255.0\n\
             interface s0/0/0\n ip address 10.0.13.1 255.255.255.252\n\
             interface g0/2\n ip address 10.9.9.1 255.255.255.0\n",
        );
        assert!((score - 250.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            feedback,
            vec![
                "Se0/0/0: interface should be shut down".to_string(),
                "Gi0/2: 10.9.9.1/24 is not in the master configuration".to_string(),
            ]
        );
    }

    #[test]
    fn missing_and_invalid_addresses() {
        let (score, feedback) = grade("interface g0/1\n ip address 10.0.12.1 255.0.255.0\n");
        assert_eq!(score, 0.0);
        assert_eq!(
            feedback,
            vec![
                "Gi0/0: expected 10.0.0.1/24, found none".to_string(),
                "Gi0/1: expected 10.0.12.1/24, found invalid address '10.0.12.1 255.0.255.0'"
                    .to_string(),
                "Se0/0/0: expected 10.0.13.1/30, found none".to_string(),
            ]
        );
    }
}
