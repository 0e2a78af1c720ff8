use super::{Check, CheckContext, CheckResult, CheckScope, Deductions};
use crate::addr::parse_ipv4;
use crate::identity::is_personal_literal;
use crate::normalize::ParsedDevice;

const STRAY_ADDRESS: f64 = 5.0;

/// Addresses typed by the student must come from their own address space or
/// appear in the master configurations as written there.
pub struct AddressPlanCheck;

impl Check for AddressPlanCheck {
    fn name(&self) -> &'static str {
        "address_plan"
    }

    fn applies_to(&self, _master: &ParsedDevice, scope: &CheckScope<'_>) -> bool {
        scope.personal_space
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckResult {
        let hint = ctx.scope.hint;
        let mut deductions = Deductions::default();

        for literal in &ctx.student.literals {
            let Some(ip) = parse_ipv4(literal) else {
                continue;
            };
            if hint.contains(ip) || ctx.scope.master_addresses.contains(&ip) {
                continue;
            }
            if is_personal_literal(literal) {
                deductions.deduct(
                    STRAY_ADDRESS,
                    format!("{literal}: outside your address space {}", hint.as_str()),
                );
            } else {
                deductions.deduct(
                    STRAY_ADDRESS,
                    format!("{literal}: not part of the addressing plan"),
                );
            }
        }

        deductions.finish(self.name(), ctx.device)
    }
}
