//! Links between devices, derived from shared interface subnets.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::net::Ipv4Addr;

use crate::addr::Ipv4Net;
use crate::normalize::model::NormalizedConfig;

/// Device pair (sorted) -> subnets the two devices share.
pub type Edges = BTreeMap<(String, String), BTreeSet<Ipv4Net>>;

/// Link every pair of devices that have an interface on the same subnet.
pub fn build_edges<'a, I>(devices: I) -> Edges
where
    I: IntoIterator<Item = (&'a str, &'a NormalizedConfig)>,
{
    let mut by_subnet: BTreeMap<Ipv4Net, BTreeSet<&str>> = BTreeMap::new();
    for (id, config) in devices {
        for subnet in config.connected_subnets() {
            by_subnet.entry(subnet).or_default().insert(id);
        }
    }

    let mut edges = Edges::new();
    for (subnet, members) in by_subnet {
        let members: Vec<&str> = members.into_iter().collect();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                edges
                    .entry((a.to_string(), b.to_string()))
                    .or_default()
                    .insert(subnet);
            }
        }
    }
    edges
}

/// For every device, the peer interface addresses on its links.
pub fn expected_neighbors(
    devices: &BTreeMap<String, &NormalizedConfig>,
    edges: &Edges,
) -> BTreeMap<String, BTreeSet<Ipv4Addr>> {
    let mut out: BTreeMap<String, BTreeSet<Ipv4Addr>> = BTreeMap::new();
    for ((a, b), subnets) in edges {
        for subnet in subnets {
            if let Some(ip) = devices.get(b).and_then(|c| address_in(c, subnet)) {
                out.entry(a.clone()).or_default().insert(ip);
            }
            if let Some(ip) = devices.get(a).and_then(|c| address_in(c, subnet)) {
                out.entry(b.clone()).or_default().insert(ip);
            }
        }
    }
    out
}

fn address_in(config: &NormalizedConfig, subnet: &Ipv4Net) -> Option<Ipv4Addr> {
    config
        .interfaces
        .values()
        .flat_map(|iface| iface.address.iter().chain(iface.secondary.iter()))
        .find(|addr| addr.network() == *subnet)
        .map(|addr| addr.ip)
}

/// Number of connected components over `nodes`. Nodes without any edge
/// count as their own component.
pub fn component_count<'a, I>(nodes: I, edges: &Edges) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    let mut adjacency: BTreeMap<&str, Vec<&str>> =
        nodes.into_iter().map(|n| (n, Vec::new())).collect();
    for (a, b) in edges.keys() {
        adjacency.entry(a.as_str()).or_default().push(b.as_str());
        adjacency.entry(b.as_str()).or_default().push(a.as_str());
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut components = 0;
    for start in adjacency.keys() {
        if !seen.insert(*start) {
            continue;
        }
        components += 1;
        let mut queue = VecDeque::from([*start]);
        while let Some(node) = queue.pop_front() {
            for next in adjacency.get(node).into_iter().flatten() {
                if seen.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }
    }
    components
}

/// Render an edge map as `"A-B" -> "subnet[, subnet]"` for reports.
pub fn describe(edges: &Edges) -> BTreeMap<String, String> {
    edges
        .iter()
        .map(|((a, b), subnets)| {
            let nets: Vec<String> = subnets.iter().map(ToString::to_string).collect();
            (format!("{a}-{b}"), nets.join(", "))
        })
        .collect()
}
