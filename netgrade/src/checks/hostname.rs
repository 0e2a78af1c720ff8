use super::{Check, CheckContext, CheckResult, CheckScope, Deductions};
use crate::normalize::ParsedDevice;

const MISSING: f64 = 50.0;
const LEFT_AT_DEFAULT: f64 = 50.0;
const MISMATCH: f64 = 25.0;

pub struct HostnameCheck;

impl Check for HostnameCheck {
    fn name(&self) -> &'static str {
        "hostname"
    }

    fn applies_to(&self, _master: &ParsedDevice, _scope: &CheckScope<'_>) -> bool {
        true
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckResult {
        let expected = ctx.master.config.hostname.as_deref();
        let mut deductions = Deductions::default();

        match ctx.student.config.hostname.as_deref() {
            None => deductions.deduct(MISSING, "hostname not configured"),
            Some(found) if is_default(found) && !expected.is_some_and(is_default) => {
                deductions.deduct(LEFT_AT_DEFAULT, format!("hostname left at default '{found}'"));
            }
            Some(found) => {
                if let Some(expected) = expected {
                    if !found.eq_ignore_ascii_case(expected) {
                        deductions.deduct(
                            MISMATCH,
                            format!("hostname: expected {expected}, found {found}"),
                        );
                    }
                }
            }
        }
        deductions.finish(self.name(), ctx.device)
    }
}

fn is_default(name: &str) -> bool {
    name.eq_ignore_ascii_case("router") || name.eq_ignore_ascii_case("switch")
}
