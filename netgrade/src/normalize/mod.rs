//! Turn a parsed configuration tree into comparable device state.
//!
//! Everything that can be written more than one way is brought to a single
//! form here (interface names, masks, wildcards, `host` keywords, port names,
//! OSPF areas), so the checks compare values instead of spellings. Statements
//! the normalizer does not model are either known-irrelevant and skipped, or
//! kept as unparsed lines for reporting; neither is an error on its own.

mod acl;
pub mod model;
pub mod names;

use std::collections::BTreeSet;

use ios_config_core::{parse, ConfigNode, ParseError};
use serde::Serialize;
use tracing::debug;

use crate::addr::{mask_to_prefix, parse_ipv4, wildcard_to_prefix, IfAddr, Ipv4Net};
use crate::identity::AddressRewriter;
use model::{
    AccessGroup, AccessList, AclId, AclKind, Direction, NextHop, NormalizedConfig, StaticRoute,
};
use names::InterfaceName;

/// Top-level commands that are understood but carry nothing graded.
const IGNORED: &[&[&str]] = &[
    &["version"],
    &["service"],
    &["enable"],
    &["banner"],
    &["line"],
    &["username"],
    &["boot-start-marker"],
    &["boot-end-marker"],
    &["boot"],
    &["logging"],
    &["ntp"],
    &["snmp-server"],
    &["spanning-tree"],
    &["vtp"],
    &["cdp"],
    &["crypto"],
    &["license"],
    &["memory-size"],
    &["redundancy"],
    &["control-plane"],
    &["aaa"],
    &["clock"],
    &["security"],
    &["login"],
    &["multilink"],
    &["archive"],
    &["vlan"],
    &["class-map"],
    &["policy-map"],
    &["building"],
    &["current"],
    &["last"],
    &["no"],
    &["ip", "domain-name"],
    &["ip", "domain-lookup"],
    &["ip", "cef"],
    &["ip", "classless"],
    &["ip", "http"],
    &["ip", "ssh"],
    &["ip", "subnet-zero"],
    &["ip", "forward-protocol"],
    &["ip", "source-route"],
    &["ip", "dhcp"],
    &["ip", "routing"],
    &["ipv6", "cef"],
];

/// Commands whose arguments are free text rather than names or addresses.
const FREE_TEXT: &[&str] = &["hostname", "description", "banner", "username", "remark"];

/// A configuration line the normalizer could not interpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnparsedLine {
    pub line: usize,
    pub text: String,
}

/// One device after parsing and normalization.
#[derive(Debug, Clone)]
pub struct ParsedDevice {
    pub config: NormalizedConfig,
    /// Address literals exactly as typed in interface addresses and route
    /// next hops.
    pub literals: BTreeSet<String>,
    pub unparsed: Vec<UnparsedLine>,
    /// Parse tree with canonical interface names and rewritten addresses.
    pub tree: ConfigNode,
}

/// Parse configuration text and normalize it.
pub fn parse_device(text: &str, rewriter: &AddressRewriter) -> Result<ParsedDevice, ParseError> {
    let root = parse(text)?;
    normalize(&root, rewriter)
}

/// Normalize a parsed tree.
///
/// Fails with [`ParseError::NoStructure`] only when not a single graded
/// element (hostname, interface, static route, OSPF process, access list)
/// could be extracted.
pub fn normalize(
    root: &ConfigNode,
    rewriter: &AddressRewriter,
) -> Result<ParsedDevice, ParseError> {
    let mut normalizer = Normalizer {
        rewriter,
        config: NormalizedConfig::default(),
        literals: BTreeSet::new(),
        unparsed: Vec::new(),
    };
    for node in &root.children {
        normalizer.global(node);
    }
    normalizer.resolve_ospf();

    if !normalizer.config.has_structure() {
        let first = normalizer
            .unparsed
            .first()
            .cloned()
            .or_else(|| {
                root.children.first().map(|n| UnparsedLine {
                    line: n.line,
                    text: n.command(),
                })
            })
            .unwrap_or(UnparsedLine {
                line: 0,
                text: String::new(),
            });
        return Err(ParseError::NoStructure {
            line: first.line,
            text: first.text,
        });
    }

    Ok(ParsedDevice {
        config: normalizer.config,
        literals: normalizer.literals,
        unparsed: normalizer.unparsed,
        tree: canonical_tree(root, rewriter),
    })
}

/// Copy of `node` with interface names canonicalized and address literals
/// rewritten, used for structural diffs.
pub fn canonical_tree(node: &ConfigNode, rewriter: &AddressRewriter) -> ConfigNode {
    let words = if node.starts_with(&["interface"]) && node.words.len() > 1 {
        let mut words = vec![node.words[0].clone()];
        if let Some(name) = InterfaceName::from_words(&node.words[1..]) {
            words.push(name.to_string());
        }
        words
    } else if FREE_TEXT.iter().any(|kw| node.starts_with(&[*kw])) {
        node.words.clone()
    } else {
        node.words
            .iter()
            .map(|word| {
                if InterfaceName::is_interface(word) {
                    InterfaceName::parse(word).to_string()
                } else {
                    rewriter.token(word)
                }
            })
            .collect()
    };
    ConfigNode {
        words,
        line: node.line,
        children: node
            .children
            .iter()
            .map(|child| canonical_tree(child, rewriter))
            .collect(),
    }
}

struct Normalizer<'a> {
    rewriter: &'a AddressRewriter,
    config: NormalizedConfig,
    literals: BTreeSet<String>,
    unparsed: Vec<UnparsedLine>,
}

impl Normalizer<'_> {
    fn global(&mut self, node: &ConfigNode) {
        let handled = if let Some(args) = node.args_after(&["hostname"]) {
            match args.first() {
                Some(name) => {
                    self.config.hostname = Some(name.clone());
                    true
                }
                None => false,
            }
        } else if node.starts_with(&["interface"]) {
            self.interface(node)
        } else if let Some(args) = node.args_after(&["ip", "route"]) {
            self.static_route(args)
        } else if let Some(args) = node.args_after(&["router", "ospf"]) {
            self.ospf(node, args)
        } else if let Some(args) = node.args_after(&["access-list"]) {
            self.numbered_acl(args)
        } else if let Some(args) = node.args_after(&["ip", "access-list"]) {
            self.named_acl(node, args)
        } else {
            IGNORED.iter().any(|prefix| node.starts_with(prefix))
        };

        if !handled {
            debug!(line = node.line, text = %node.command(), "unparsed configuration line");
            self.unparsed.push(UnparsedLine {
                line: node.line,
                text: node.command(),
            });
        }
    }

    fn interface(&mut self, node: &ConfigNode) -> bool {
        let Some(name) = InterfaceName::from_words(&node.words[1..]) else {
            return false;
        };
        let mut literals = Vec::new();
        let iface = self.config.interfaces.entry(name).or_default();

        for child in &node.children {
            if let Some(args) = child.args_after(&["ip", "address"]) {
                match parse_if_addr(args, self.rewriter) {
                    Some((addr, secondary)) => {
                        literals.push(args[0].clone());
                        if secondary {
                            iface.secondary.insert(addr);
                        } else {
                            iface.address = Some(addr);
                            iface.invalid_address = None;
                        }
                    }
                    None if args.first().is_some_and(|a| parse_ipv4(a).is_some()) => {
                        iface.invalid_address = Some(args.join(" "));
                    }
                    None => {
                        iface.settings.insert(child.command());
                    }
                }
            } else if child.starts_with(&["no", "ip", "address"]) {
                iface.address = None;
                iface.secondary.clear();
            } else if child.starts_with(&["shutdown"]) {
                iface.enabled = false;
            } else if child.starts_with(&["no", "shutdown"]) {
                iface.enabled = true;
            } else if let Some(args) = child.args_after(&["description"]) {
                iface.description = Some(args.join(" "));
            } else if let Some(area) = child
                .args_after(&["ip", "ospf"])
                .and_then(interface_ospf_area)
            {
                iface.ospf_area = Some(area);
            } else if let Some(group) = child
                .args_after(&["ip", "access-group"])
                .and_then(access_group)
            {
                iface.access_groups.insert(group);
            } else {
                let words: Vec<String> = child
                    .words
                    .iter()
                    .map(|w| self.rewriter.token(w))
                    .collect();
                iface.settings.insert(words.join(" "));
            }
        }
        self.literals.extend(literals);
        true
    }

    fn static_route(&mut self, args: &[String]) -> bool {
        let destination = match (args.first(), args.get(1)) {
            (Some(dest), Some(mask)) => self
                .rewriter
                .address(dest)
                .zip(parse_ipv4(mask).and_then(mask_to_prefix))
                .and_then(|(ip, prefix)| Ipv4Net::new(ip, prefix)),
            _ => None,
        };
        let Some(destination) = destination else {
            return false;
        };

        let mut next_hop = NextHop {
            interface: None,
            address: None,
        };
        let mut distance = None;
        let mut rest = args[2..].iter();
        while let Some(word) = rest.next() {
            let lower = word.to_ascii_lowercase();
            if matches!(lower.as_str(), "name" | "tag" | "track") {
                rest.next();
            } else if next_hop.address.is_none() && parse_ipv4(word).is_some() {
                next_hop.address = self.rewriter.address(word);
                self.literals.insert(word.clone());
            } else if next_hop.interface.is_none()
                && next_hop.address.is_none()
                && InterfaceName::is_interface(word)
            {
                next_hop.interface = Some(InterfaceName::parse(word));
            } else if distance.is_none() {
                distance = word.parse::<u8>().ok().filter(|d| *d > 0);
            }
        }
        if next_hop.interface.is_none() && next_hop.address.is_none() {
            return false;
        }
        self.config.static_routes.insert(StaticRoute {
            destination,
            next_hop,
            distance,
        });
        true
    }

    fn ospf(&mut self, node: &ConfigNode, args: &[String]) -> bool {
        let Some(pid) = args.first().and_then(|p| p.parse::<u32>().ok()) else {
            return false;
        };
        let process = self.config.ospf.entry(pid).or_default();
        for child in &node.children {
            if let Some(id) = child
                .args_after(&["router-id"])
                .and_then(|a| a.first())
                .and_then(|a| self.rewriter.address(a))
            {
                process.router_id = Some(id);
            } else if let Some((net, area)) = child
                .args_after(&["network"])
                .and_then(|a| ospf_network(a, self.rewriter))
            {
                process.networks.insert(net, area);
            } else if child.starts_with(&["passive-interface", "default"]) {
                process.passive_default = true;
            } else if let Some(args) = child.args_after(&["passive-interface"]) {
                if let Some(name) = InterfaceName::from_words(args) {
                    process.active.remove(&name);
                    process.passive.insert(name);
                }
            } else if let Some(args) = child.args_after(&["no", "passive-interface"]) {
                if let Some(name) = InterfaceName::from_words(args) {
                    process.passive.remove(&name);
                    process.active.insert(name);
                }
            } else if child.starts_with(&["default-information", "originate"]) {
                process.default_originate = true;
            } else {
                process.settings.insert(child.command());
            }
        }
        true
    }

    fn numbered_acl(&mut self, args: &[String]) -> bool {
        let Some(number) = args.first().and_then(|n| n.parse::<u32>().ok()) else {
            return false;
        };
        let Some(kind) = acl::kind_for_number(number) else {
            return false;
        };
        let list = self
            .config
            .acls
            .entry(AclId::Number(number))
            .or_insert_with(|| AccessList {
                kind,
                entries: Default::default(),
            });
        if args.get(1).is_some_and(|w| w.eq_ignore_ascii_case("remark")) {
            return true;
        }
        match acl::parse_entry(&args[1..], kind, self.rewriter) {
            Some(entry) => {
                *list.entries.entry(entry).or_insert(0) += 1;
                true
            }
            None => false,
        }
    }

    fn named_acl(&mut self, node: &ConfigNode, args: &[String]) -> bool {
        let kind = match args.first().map(|k| k.to_ascii_lowercase()).as_deref() {
            Some("standard") => AclKind::Standard,
            Some("extended") => AclKind::Extended,
            _ => return false,
        };
        let Some(name) = args.get(1) else {
            return false;
        };
        let id = AclId::parse(name);
        let mut failed = Vec::new();
        let list = self.config.acls.entry(id).or_insert_with(|| AccessList {
            kind,
            entries: Default::default(),
        });
        for child in &node.children {
            if child.starts_with(&["remark"]) {
                continue;
            }
            match acl::parse_entry(&child.words, kind, self.rewriter) {
                Some(entry) => *list.entries.entry(entry).or_insert(0) += 1,
                None => failed.push(UnparsedLine {
                    line: child.line,
                    text: child.command(),
                }),
            }
        }
        self.unparsed.extend(failed);
        true
    }

    /// Work out which subnets each OSPF process actually runs on.
    fn resolve_ospf(&mut self) {
        let interfaces = &self.config.interfaces;
        for (name, iface) in interfaces {
            let (Some((pid, area)), Some(addr)) = (iface.ospf_area, iface.address) else {
                continue;
            };
            debug!(interface = %name, pid, area, "interface-level OSPF");
            self.config
                .ospf
                .entry(pid)
                .or_default()
                .advertised
                .insert(addr.network(), area);
        }

        for process in self.config.ospf.values_mut() {
            // The most specific network statement claims an interface.
            let mut statements: Vec<(Ipv4Net, u32)> =
                process.networks.iter().map(|(n, a)| (*n, *a)).collect();
            statements.sort_by(|a, b| b.0.prefix().cmp(&a.0.prefix()).then(a.0.cmp(&b.0)));

            for (net, area) in statements {
                let mut covered = false;
                for iface in interfaces.values() {
                    for addr in iface.address.iter().chain(iface.secondary.iter()) {
                        if net.contains(addr.ip) {
                            covered = true;
                            process.advertised.entry(addr.network()).or_insert(area);
                        }
                    }
                }
                if !covered {
                    process.advertised.entry(net).or_insert(area);
                }
            }
        }
    }
}

/// `A.B.C.D M.M.M.M [secondary]`.
fn parse_if_addr(args: &[String], rewriter: &AddressRewriter) -> Option<(IfAddr, bool)> {
    let ip = rewriter.address(args.first()?)?;
    let prefix = mask_to_prefix(parse_ipv4(args.get(1)?)?)?;
    let secondary = args
        .get(2)
        .is_some_and(|w| w.eq_ignore_ascii_case("secondary"));
    Some((IfAddr { ip, prefix }, secondary))
}

/// `ip ospf <pid> area <area>`.
fn interface_ospf_area(args: &[String]) -> Option<(u32, u32)> {
    let pid = args.first()?.parse::<u32>().ok()?;
    if !args.get(1)?.eq_ignore_ascii_case("area") {
        return None;
    }
    Some((pid, parse_area(args.get(2)?)?))
}

/// `network <addr> <wildcard> area <area>`.
fn ospf_network(args: &[String], rewriter: &AddressRewriter) -> Option<(Ipv4Net, u32)> {
    let ip = rewriter.address(args.first()?)?;
    let prefix = wildcard_to_prefix(parse_ipv4(args.get(1)?)?)?;
    if !args.get(2)?.eq_ignore_ascii_case("area") {
        return None;
    }
    let area = parse_area(args.get(3)?)?;
    Some((Ipv4Net::new(ip, prefix)?, area))
}

/// Areas are written as a number or in dotted form (`0.0.0.0` == `0`).
fn parse_area(text: &str) -> Option<u32> {
    text.parse::<u32>()
        .ok()
        .or_else(|| parse_ipv4(text).map(u32::from))
}

fn access_group(args: &[String]) -> Option<AccessGroup> {
    let acl = AclId::parse(args.first()?);
    let direction = match args.get(1)?.to_ascii_lowercase().as_str() {
        "in" => Direction::In,
        "out" => Direction::Out,
        _ => return None,
    };
    Some(AccessGroup { acl, direction })
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use ios_config_core::ParseError;

    use super::parse_device;
    use crate::addr::Ipv4Net;
    use crate::identity::{AddressRewriter, IdentityHint};
    use crate::normalize::names::InterfaceName;

    fn device(text: &str) -> super::ParsedDevice {
        parse_device(text, &AddressRewriter::identity()).expect("device normalizes")
    }

    fn net(a: u8, b: u8, c: u8, d: u8, prefix: u8) -> Ipv4Net {
        Ipv4Net::new(Ipv4Addr::new(a, b, c, d), prefix).expect("valid prefix")
    }

    #[test]
    fn abbreviations_and_order_do_not_matter() {
        let full = device(
            "hostname R1\n\
             interface GigabitEthernet0/0\n\
              ip address 10.0.1.1 255.255.255.0\n\
              no shutdown\n\
             ip route 10.0.3.0 255.255.255.0 10.0.12.2\n",
        );
        let short = device(
            "ip route 10.0.3.0 255.255.255.0 10.0.12.2\n\
             int g0/0\n\
             no shut\n\
             ip add 10.0.1.1 255.255.255.0\n\
             hostname R1\n",
        );
        assert_eq!(full.config, short.config);
    }

    #[test]
    fn interface_ospf_matches_network_statement() {
        let by_network = device(
            "interface g0/0\n ip address 10.0.1.1 255.255.255.0\n\
             router ospf 1\n network 10.0.1.1 0.0.0.0 area 0\n",
        );
        let by_interface = device(
            "interface g0/0\n ip address 10.0.1.1 255.255.255.0\n ip ospf 1 area 0.0.0.0\n\
             router ospf 1\n",
        );
        assert_eq!(
            by_network.config.ospf_advertised(),
            by_interface.config.ospf_advertised()
        );
        assert_eq!(
            by_network.config.ospf_advertised().get(&net(10, 0, 1, 0, 24)),
            Some(&0)
        );
    }

    #[test]
    fn unknown_lines_are_kept_not_fatal() {
        let parsed = device("hostname R1\nfrobnicate everything\n");
        assert_eq!(parsed.unparsed.len(), 1);
        assert_eq!(parsed.unparsed[0].line, 2);
        assert_eq!(parsed.config.hostname.as_deref(), Some("R1"));
    }

    #[test]
    fn no_structure_is_an_error() {
        let err = parse_device("this is not\na router config\n", &AddressRewriter::identity())
            .expect_err("nothing structured");
        assert!(matches!(err, ParseError::NoStructure { line: 1, .. }));
    }

    #[test]
    fn records_literals_and_rewrites_personal_space() {
        let hint = IdentityHint::parse("212.05").expect("hint");
        let rewriter = AddressRewriter::new(&hint, None).expect("rewriter");
        let parsed = parse_device(
            "interface g0/1\n ip address 201.17.12.1 255.255.255.0\n\
             ip route 201.17.3.0 255.255.255.0 201.17.12.2\n",
            &rewriter,
        )
        .expect("device normalizes");
        let iface = &parsed.config.interfaces[&InterfaceName::parse("g0/1")];
        assert_eq!(
            iface.address.map(|a| a.to_string()).as_deref(),
            Some("212.5.12.1/24")
        );
        assert!(parsed.literals.contains("201.17.12.1"));
        assert!(parsed.literals.contains("201.17.12.2"));
        let route = parsed.config.static_routes.iter().next().expect("route");
        assert_eq!(route.destination, net(212, 5, 3, 0, 24));
    }

    #[test]
    fn invalid_mask_is_reported_not_dropped() {
        let parsed = device("interface s0/0/0\n ip address 10.0.0.1 255.0.255.0\n");
        let iface = &parsed.config.interfaces[&InterfaceName::parse("Serial0/0/0")];
        assert_eq!(iface.address, None);
        assert_eq!(iface.invalid_address.as_deref(), Some("10.0.0.1 255.0.255.0"));
    }

    #[test]
    fn named_and_numbered_acls() {
        let parsed = device(
            "access-list 10 remark mgmt\n\
             access-list 10 permit host 10.0.1.5\n\
             ip access-list extended WEB\n\
              10 permit tcp any host 10.0.2.10 eq www\n\
              remark web only\n\
              deny ip any any\n\
             interface g0/0\n ip access-group WEB in\n",
        );
        assert_eq!(parsed.config.acls.len(), 2);
        let iface = &parsed.config.interfaces[&InterfaceName::parse("g0/0")];
        assert_eq!(iface.access_groups.len(), 1);
    }
}
