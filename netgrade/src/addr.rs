use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;

use serde::{Serialize, Serializer};

/// Parse a dotted-quad IPv4 address.
///
/// Octets may carry leading zeros (`212.05.1.1`), which students type when
/// deriving addresses from a date. Anything else that is not four decimal
/// octets in range is rejected.
pub fn parse_ipv4(text: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in &mut octets {
        *octet = parse_octet(parts.next()?)?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}

/// Parse one decimal octet, allowing leading zeros.
pub fn parse_octet(text: &str) -> Option<u8> {
    if text.is_empty() || text.len() > 3 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u16>().ok().and_then(|v| u8::try_from(v).ok())
}

/// Prefix length of a contiguous netmask (`255.255.255.0` -> 24).
pub fn mask_to_prefix(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(mask);
    let len = bits.leading_ones();
    if bits.checked_shl(len).unwrap_or(0) != 0 {
        return None;
    }
    u8::try_from(len).ok()
}

/// Prefix length of a contiguous wildcard mask (`0.0.0.255` -> 24).
pub fn wildcard_to_prefix(wildcard: Ipv4Addr) -> Option<u8> {
    mask_to_prefix(Ipv4Addr::from(!u32::from(wildcard)))
}

fn prefix_bits(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p if p >= 32 => u32::MAX,
        p => u32::MAX << (32 - u32::from(p)),
    }
}

/// An IPv4 network: the address is always masked to the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ipv4Net {
    addr: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Net {
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Option<Self> {
        if prefix > 32 {
            return None;
        }
        Some(Self {
            addr: Ipv4Addr::from(u32::from(addr) & prefix_bits(prefix)),
            prefix,
        })
    }

    /// Network from an address and a dotted netmask.
    pub fn with_mask(addr: Ipv4Addr, mask: Ipv4Addr) -> Option<Self> {
        Self::new(addr, mask_to_prefix(mask)?)
    }

    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        u32::from(ip) & prefix_bits(self.prefix) == u32::from(self.addr)
    }
}

impl Display for Ipv4Net {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

impl Serialize for Ipv4Net {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An address assigned to an interface: host address plus prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IfAddr {
    pub ip: Ipv4Addr,
    pub prefix: u8,
}

impl IfAddr {
    /// The connected subnet.
    pub fn network(&self) -> Ipv4Net {
        Ipv4Net {
            addr: Ipv4Addr::from(u32::from(self.ip) & prefix_bits(self.prefix)),
            prefix: self.prefix,
        }
    }
}

impl Display for IfAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix)
    }
}

impl Serialize for IfAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
