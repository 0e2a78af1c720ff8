use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use super::{Check, CheckContext, CheckResult, CheckScope, Deductions, MAX_SCORE};
use crate::normalize::names::InterfaceName;
use crate::normalize::ParsedDevice;

const MISSING_NETWORK: f64 = 20.0;
const MISSING_NETWORK_CAP: f64 = 80.0;
const WRONG_AREA: f64 = 10.0;
const EXTRA_NETWORK: f64 = 2.0;
const EXTRA_NETWORK_CAP: f64 = 10.0;
const ROUTER_ID: f64 = 5.0;
const PASSIVE: f64 = 5.0;
const PASSIVE_CAP: f64 = 10.0;
const STATIC_ROUTES: f64 = 5.0;

pub struct OspfCheck;

impl Check for OspfCheck {
    fn name(&self) -> &'static str {
        "ospf"
    }

    fn applies_to(&self, master: &ParsedDevice, _scope: &CheckScope<'_>) -> bool {
        !master.config.ospf.is_empty()
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckResult {
        let master = &ctx.master.config;
        let student = &ctx.student.config;
        let mut deductions = Deductions::default();

        if student.ospf.is_empty() {
            deductions.deduct(MAX_SCORE, "OSPF is not configured");
            return deductions.finish(self.name(), ctx.device);
        }

        let expected = master.ospf_advertised();
        let found = student.ospf_advertised();
        let mut missing = Vec::new();
        let mut wrong_area = Vec::new();
        for (net, area) in &expected {
            match found.get(net) {
                None => missing.push(format!("{net}: network not advertised in OSPF")),
                Some(other) if other != area => {
                    wrong_area.push(format!("{net}: expected area {area}, found area {other}"));
                }
                Some(_) => {}
            }
        }
        let extra: Vec<String> = found
            .keys()
            .filter(|net| !expected.contains_key(*net))
            .map(|net| format!("{net}: network should not be advertised in OSPF"))
            .collect();
        deductions.deduct_capped(MISSING_NETWORK, MISSING_NETWORK_CAP, missing);
        for message in wrong_area {
            deductions.deduct(WRONG_AREA, message);
        }
        deductions.deduct_capped(EXTRA_NETWORK, EXTRA_NETWORK_CAP, extra);

        if let Some(rid) = master.ospf_router_id() {
            match student.ospf_router_id() {
                Some(found) if found == rid => {}
                Some(found) => deductions.deduct(
                    ROUTER_ID,
                    format!("router-id: expected {rid}, found {found}"),
                ),
                None => {
                    deductions.deduct(ROUTER_ID, format!("router-id: expected {rid}, found none"));
                }
            }
        }

        deductions.deduct_capped(
            PASSIVE,
            PASSIVE_CAP,
            passive_mismatches(
                &master.ospf_passive(),
                &student.ospf_passive(),
                |name| master.interfaces.contains_key(name),
            ),
        );

        let wants_default = master.ospf.values().any(|p| p.default_originate);
        let has_default = student.ospf.values().any(|p| p.default_originate);
        if wants_default && !has_default {
            deductions.note("default-information originate missing");
        } else if has_default && !wants_default {
            deductions.note("default-information originate is not expected");
        }

        if !ctx.scope.static_routes_graded
            && master.static_routes.is_empty()
            && !student.static_routes.is_empty()
        {
            deductions.deduct(
                STATIC_ROUTES,
                format!(
                    "{} static route(s) configured where OSPF should provide the routes",
                    student.static_routes.len()
                ),
            );
        }

        if let Some(seen) = ctx.student_neighbors {
            for message in neighbor_differences(ctx.expected_neighbors, seen) {
                deductions.note(message);
            }
        }

        deductions.finish(self.name(), ctx.device)
    }
}

fn passive_mismatches(
    expected: &BTreeSet<InterfaceName>,
    found: &BTreeSet<InterfaceName>,
    graded: impl Fn(&InterfaceName) -> bool,
) -> Vec<String> {
    expected
        .symmetric_difference(found)
        .filter(|name| graded(name))
        .map(|name| {
            if expected.contains(name) {
                format!("{}: should be passive", name.short())
            } else {
                format!("{}: should not be passive", name.short())
            }
        })
        .collect()
}

fn neighbor_differences(expected: &BTreeSet<Ipv4Addr>, seen: &BTreeSet<Ipv4Addr>) -> Vec<String> {
    let missing = expected
        .difference(seen)
        .map(|ip| format!("neighbor {ip} not in the submitted neighbor table"));
    let extra = seen
        .difference(expected)
        .map(|ip| format!("neighbor {ip} is not expected"));
    missing.chain(extra).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::net::Ipv4Addr;

    use super::OspfCheck;
    use crate::checks::test_support::{context, device, hint, scope};
    use crate::checks::Check;

    const MASTER: &str = "interface g0/0\n ip address 10.0.1.1 255.255.255.0\n\
        interface g0/1\n ip address 10.0.12.1 255.255.255.0\n\
        router ospf 1\n router-id 1.1.1.1\n\
         network 10.0.1.0 0.0.0.255 area 0\n\
         network 10.0.12.0 0.0.0.255 area 0\n\
         passive-interface g0/0\n";

    fn grade(student: &str) -> (f64, Vec<String>) {
        let hint = hint();
        let literals = BTreeSet::new();
        let scope = scope(&hint, &literals);
        let (master, student) = (device(MASTER), device(student));
        let expected = BTreeSet::new();
        let result = OspfCheck.evaluate(&context(&scope, &master, &student, &expected));
        (result.score, result.feedback)
    }

    #[test]
    fn interface_mode_ospf_matches_network_statements() {
        let (score, feedback) = grade(
            "interface g0/0\n ip address 10.0.1.1 255.255.255.0\n ip ospf 1 area 0.0.0.0\n\
             interface g0/1\n ip address 10.0.12.1 255.255.255.0\n ip ospf 1 area 0\n\
             router ospf 1\n router-id 1.1.1.1\n passive-interface default\n\
              no passive-interface g0/1\n",
        );
        assert_eq!((score, feedback), (100.0, Vec::new()));
    }

    #[test]
    fn missing_network_and_router_id() {
        let (score, feedback) = grade(
            "interface g0/0\n ip address 10.0.1.1 255.255.255.0\n\
             interface g0/1\n ip address 10.0.12.1 255.255.255.0\n\
             router ospf 1\n network 10.0.12.0 0.0.0.255 area 1\n",
        );
        assert_eq!(
            feedback,
            vec![
                "10.0.1.0/24: network not advertised in OSPF".to_string(),
                "10.0.12.0/24: expected area 0, found area 1".to_string(),
                "router-id: expected 1.1.1.1, found none".to_string(),
                "Gi0/0: should be passive".to_string(),
            ]
        );
        assert_eq!(score, 60.0);
    }

    #[test]
    fn no_ospf_scores_zero() {
        let (score, feedback) = grade("hostname R1\n");
        assert_eq!(score, 0.0);
        assert_eq!(feedback, vec!["OSPF is not configured".to_string()]);
    }

    #[test]
    fn static_routes_cost_points_when_ungraded() {
        let hint = hint();
        let literals = BTreeSet::new();
        let mut scope = scope(&hint, &literals);
        scope.static_routes_graded = false;
        let master = device(MASTER);
        let student = device(&format!("{MASTER}ip route 0.0.0.0 0.0.0.0 10.0.12.2\n"));
        let expected: BTreeSet<Ipv4Addr> = [Ipv4Addr::new(10, 0, 12, 2)].into_iter().collect();
        let seen = BTreeSet::new();
        let mut ctx = context(&scope, &master, &student, &expected);
        ctx.student_neighbors = Some(&seen);
        let result = OspfCheck.evaluate(&ctx);
        assert_eq!(result.score, 95.0);
        assert_eq!(
            result.feedback,
            vec![
                "1 static route(s) configured where OSPF should provide the routes".to_string(),
                "neighbor 10.0.12.2 not in the submitted neighbor table".to_string(),
            ]
        );
    }
}
