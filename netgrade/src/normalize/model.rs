use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;

use serde::{Serialize, Serializer};

use crate::addr::{IfAddr, Ipv4Net};
use crate::normalize::names::InterfaceName;

/// Configuration state of one device, independent of statement order,
/// keyword abbreviation and address notation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedConfig {
    pub hostname: Option<String>,
    pub interfaces: BTreeMap<InterfaceName, Interface>,
    pub static_routes: BTreeSet<StaticRoute>,
    /// Keyed by process id.
    pub ospf: BTreeMap<u32, OspfProcess>,
    pub acls: BTreeMap<AclId, AccessList>,
}

impl NormalizedConfig {
    /// Whether anything graded was extracted.
    pub fn has_structure(&self) -> bool {
        self.hostname.is_some()
            || !self.interfaces.is_empty()
            || !self.static_routes.is_empty()
            || !self.ospf.is_empty()
            || !self.acls.is_empty()
    }

    /// Interfaces carrying a primary address.
    pub fn addressed_interfaces(&self) -> impl Iterator<Item = (&InterfaceName, &IfAddr)> {
        self.interfaces
            .iter()
            .filter_map(|(name, iface)| iface.address.as_ref().map(|addr| (name, addr)))
    }

    /// All connected subnets, primary and secondary.
    pub fn connected_subnets(&self) -> BTreeSet<Ipv4Net> {
        self.interfaces
            .values()
            .flat_map(|iface| iface.address.iter().chain(iface.secondary.iter()))
            .map(IfAddr::network)
            .collect()
    }

    /// Subnets advertised into OSPF across every process, with their area.
    pub fn ospf_advertised(&self) -> BTreeMap<Ipv4Net, u32> {
        let mut out = BTreeMap::new();
        for process in self.ospf.values() {
            for (net, area) in &process.advertised {
                out.entry(*net).or_insert(*area);
            }
        }
        out
    }

    /// Router id of the lowest-numbered process that sets one.
    pub fn ospf_router_id(&self) -> Option<Ipv4Addr> {
        self.ospf.values().find_map(|p| p.router_id)
    }

    /// Interfaces that do not send OSPF hellos.
    pub fn ospf_passive(&self) -> BTreeSet<InterfaceName> {
        let mut out = BTreeSet::new();
        for process in self.ospf.values() {
            if process.passive_default {
                out.extend(
                    self.interfaces
                        .keys()
                        .filter(|name| !process.active.contains(*name))
                        .cloned(),
                );
            } else {
                out.extend(process.passive.iter().cloned());
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interface {
    pub address: Option<IfAddr>,
    /// Raw `ip address` arguments that did not form a valid address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_address: Option<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub secondary: BTreeSet<IfAddr>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `ip ospf <process> area <area>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ospf_area: Option<(u32, u32)>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub access_groups: BTreeSet<AccessGroup>,
    /// Remaining sub-commands in canonical text form.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub settings: BTreeSet<String>,
}

impl Default for Interface {
    fn default() -> Self {
        Self {
            address: None,
            invalid_address: None,
            secondary: BTreeSet::new(),
            enabled: true,
            description: None,
            ospf_area: None,
            access_groups: BTreeSet::new(),
            settings: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// An `ip access-group` binding on an interface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AccessGroup {
    pub acl: AclId,
    pub direction: Direction,
}

/// Where a static route sends traffic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NextHop {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<InterfaceName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Ipv4Addr>,
}

impl Display for NextHop {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (&self.interface, &self.address) {
            (Some(iface), Some(addr)) => write!(f, "{} {addr}", iface.short()),
            (Some(iface), None) => write!(f, "{}", iface.short()),
            (None, Some(addr)) => write!(f, "{addr}"),
            (None, None) => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StaticRoute {
    pub destination: Ipv4Net,
    pub next_hop: NextHop,
    /// Administrative distance when set explicitly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OspfProcess {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_id: Option<Ipv4Addr>,
    /// `network` statements as written, with their area.
    pub networks: BTreeMap<Ipv4Net, u32>,
    /// Effective subnets running OSPF: interface subnets matched by a
    /// `network` statement or enabled with `ip ospf`, plus statements that
    /// match no interface.
    pub advertised: BTreeMap<Ipv4Net, u32>,
    pub passive: BTreeSet<InterfaceName>,
    pub passive_default: bool,
    /// `no passive-interface` exceptions under `passive-interface default`.
    pub active: BTreeSet<InterfaceName>,
    pub default_originate: bool,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub settings: BTreeSet<String>,
}

/// Access list identifier: a number or a name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AclId {
    Number(u32),
    Name(String),
}

impl AclId {
    pub fn parse(text: &str) -> Self {
        match text.parse::<u32>() {
            Ok(n) => AclId::Number(n),
            Err(_) => AclId::Name(text.to_string()),
        }
    }
}

impl Display for AclId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AclId::Number(n) => write!(f, "{n}"),
            AclId::Name(name) => write!(f, "{name}"),
        }
    }
}

impl Serialize for AclId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AclKind {
    Standard,
    Extended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessList {
    pub kind: AclKind,
    /// Canonical entry -> number of occurrences.
    pub entries: BTreeMap<AclEntry, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Permit,
    Deny,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Action::Permit => write!(f, "permit"),
            Action::Deny => write!(f, "deny"),
        }
    }
}

/// Address match in an ACL entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AclAddr {
    Any,
    Host(Ipv4Addr),
    Net(Ipv4Net),
    /// Non-contiguous wildcard, kept as address and wildcard.
    Wildcard(Ipv4Addr, Ipv4Addr),
}

impl Display for AclAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AclAddr::Any => write!(f, "any"),
            AclAddr::Host(ip) => write!(f, "host {ip}"),
            AclAddr::Net(net) => write!(f, "{net}"),
            AclAddr::Wildcard(ip, wc) => write!(f, "{ip} {wc}"),
        }
    }
}

/// Port match in an extended ACL entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PortMatch {
    Eq(Vec<u16>),
    Neq(u16),
    Lt(u16),
    Gt(u16),
    Range(u16, u16),
}

impl Display for PortMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PortMatch::Eq(ports) => {
                write!(f, "eq")?;
                for port in ports {
                    write!(f, " {port}")?;
                }
                Ok(())
            }
            PortMatch::Neq(p) => write!(f, "neq {p}"),
            PortMatch::Lt(p) => write!(f, "lt {p}"),
            PortMatch::Gt(p) => write!(f, "gt {p}"),
            PortMatch::Range(lo, hi) => write!(f, "range {lo} {hi}"),
        }
    }
}

/// One access-list entry in canonical form. Remarks and sequence numbers
/// are not part of an entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AclEntry {
    pub action: Action,
    /// `ip` for standard lists.
    pub protocol: String,
    pub source: AclAddr,
    pub source_port: Option<PortMatch>,
    /// `None` for standard lists.
    pub destination: Option<AclAddr>,
    pub destination_port: Option<PortMatch>,
    /// Trailing keywords (`established`, `log`, ICMP types).
    pub flags: BTreeSet<String>,
}

impl Display for AclEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action)?;
        if self.destination.is_some() {
            write!(f, " {}", self.protocol)?;
        }
        write!(f, " {}", self.source)?;
        if let Some(port) = &self.source_port {
            write!(f, " {port}")?;
        }
        if let Some(dst) = &self.destination {
            write!(f, " {dst}")?;
        }
        if let Some(port) = &self.destination_port {
            write!(f, " {port}")?;
        }
        for flag in &self.flags {
            write!(f, " {flag}")?;
        }
        Ok(())
    }
}

impl Serialize for AclEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
