use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use super::{Check, CheckContext, CheckResult, CheckScope, Shares};
use crate::addr::Ipv4Net;
use crate::normalize::model::{NormalizedConfig, StaticRoute};
use crate::normalize::names::InterfaceName;
use crate::normalize::ParsedDevice;

const WRONG_NEXT_HOP_CREDIT: f64 = 0.75;
const WRONG_MASK_CREDIT: f64 = 0.5;
const DUPLICATE_DEDUCTION: f64 = 2.0;
const DUPLICATE_CAP: f64 = 10.0;

pub struct StaticRoutesCheck;

impl Check for StaticRoutesCheck {
    fn name(&self) -> &'static str {
        "static_routes"
    }

    fn applies_to(&self, master: &ParsedDevice, _scope: &CheckScope<'_>) -> bool {
        !master.config.static_routes.is_empty()
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckResult {
        let master = &ctx.master.config;
        let student = &ctx.student.config;

        // Next hops that are one hop away: peers on shared links plus
        // whatever the master itself routes through.
        let mut reachable: BTreeSet<Ipv4Addr> = ctx.expected_neighbors.clone();
        reachable.extend(master.static_routes.iter().filter_map(|r| r.next_hop.address));
        let is_reachable = |route: &StaticRoute| match route.next_hop.address {
            Some(addr) => reachable.is_empty() || reachable.contains(&addr),
            None => true,
        };

        let mut shares = Shares::new(master.static_routes.len());
        for expected in &master.static_routes {
            let dest = expected.destination;
            let same_dest: Vec<&StaticRoute> = student
                .static_routes
                .iter()
                .filter(|r| r.destination == dest)
                .collect();

            if same_dest.iter().any(|r| same_next_hop(expected, r, student)) {
                shares.award(1.0);
                continue;
            }
            if let Some(found) = same_dest.first() {
                let message = format!(
                    "{dest}: expected next hop {}, found {}",
                    expected.next_hop, found.next_hop
                );
                if is_reachable(found) {
                    shares.fail(WRONG_NEXT_HOP_CREDIT, message);
                } else {
                    shares.fail(0.0, format!("{message} (not directly connected)"));
                }
                continue;
            }
            match student
                .static_routes
                .iter()
                .find(|r| overlaps(&r.destination, &dest))
            {
                Some(found) => shares.fail(
                    WRONG_MASK_CREDIT,
                    format!("{dest}: wrong mask, found {}", found.destination),
                ),
                None => shares.fail(0.0, format!("{dest}: route missing")),
            }
        }

        // Routes the master does not have still must point somewhere sane.
        let master_dests: BTreeSet<Ipv4Net> =
            master.static_routes.iter().map(|r| r.destination).collect();
        for route in &student.static_routes {
            if master_dests.contains(&route.destination)
                || master_dests.iter().any(|d| overlaps(d, &route.destination))
            {
                continue;
            }
            if !is_reachable(route) {
                shares.fail(
                    -1.0,
                    format!(
                        "{} via {}: next hop is not directly connected",
                        route.destination, route.next_hop
                    ),
                );
            }
        }

        // Equal-cost routes the master configures itself are not duplicates.
        let master_counts = floating_free_counts(master);
        let mut duplicates = Vec::new();
        let mut duplicate_count = 0;
        for (dest, count) in floating_free_counts(student) {
            let allowed = master_counts.get(&dest).copied().unwrap_or(0).max(1);
            if count <= allowed {
                continue;
            }
            duplicate_count += count - allowed;
            duplicates.push(if allowed > 1 {
                format!("{dest}: {count} routes to the same destination, expected {allowed}")
            } else {
                format!("{dest}: {count} routes to the same destination")
            });
        }
        let penalty = (DUPLICATE_DEDUCTION * duplicate_count as f64).min(DUPLICATE_CAP);

        let score = shares.score() - penalty;
        let mut feedback = shares.feedback;
        feedback.extend(duplicates);
        CheckResult::new(self.name(), ctx.device, score, feedback)
    }
}

/// Routes per destination, floating routes (with a distance) left out.
fn floating_free_counts(config: &NormalizedConfig) -> BTreeMap<Ipv4Net, usize> {
    let mut counts = BTreeMap::new();
    for route in config.static_routes.iter().filter(|r| r.distance.is_none()) {
        *counts.entry(route.destination).or_default() += 1;
    }
    counts
}

/// Whether two routes forward the same way. A route given only an exit
/// interface matches an address on that interface's subnet.
fn same_next_hop(expected: &StaticRoute, found: &StaticRoute, student: &NormalizedConfig) -> bool {
    let (e, f) = (&expected.next_hop, &found.next_hop);
    match (e.address, f.address) {
        (Some(a), Some(b)) => a == b,
        (None, None) => e.interface == f.interface,
        (Some(a), None) => interface_reaches(student, f.interface.as_ref(), a),
        (None, Some(b)) => interface_reaches(student, e.interface.as_ref(), b),
    }
}

fn interface_reaches(
    config: &NormalizedConfig,
    name: Option<&InterfaceName>,
    addr: Ipv4Addr,
) -> bool {
    name.and_then(|n| config.interfaces.get(n))
        .and_then(|iface| iface.address)
        .is_some_and(|own| own.network().contains(addr))
}

/// Same destination with a different mask.
fn overlaps(a: &Ipv4Net, b: &Ipv4Net) -> bool {
    a.prefix() != b.prefix() && (a.contains(b.addr()) || b.contains(a.addr()))
}
