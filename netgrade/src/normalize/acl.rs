use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use crate::addr::{parse_ipv4, wildcard_to_prefix, Ipv4Net};
use crate::identity::AddressRewriter;
use crate::normalize::model::{AclAddr, AclEntry, AclKind, Action, PortMatch};

const PORT_NAMES: &[(&str, u16)] = &[
    ("echo", 7),
    ("discard", 9),
    ("ftp-data", 20),
    ("ftp", 21),
    ("ssh", 22),
    ("telnet", 23),
    ("smtp", 25),
    ("time", 37),
    ("tacacs", 49),
    ("domain", 53),
    ("bootps", 67),
    ("bootpc", 68),
    ("tftp", 69),
    ("gopher", 70),
    ("finger", 79),
    ("www", 80),
    ("http", 80),
    ("pop2", 109),
    ("pop3", 110),
    ("sunrpc", 111),
    ("ident", 113),
    ("nntp", 119),
    ("ntp", 123),
    ("netbios-ns", 137),
    ("netbios-dgm", 138),
    ("netbios-ss", 139),
    ("snmp", 161),
    ("snmptrap", 162),
    ("bgp", 179),
    ("irc", 194),
    ("ldap", 389),
    ("https", 443),
    ("isakmp", 500),
    ("syslog", 514),
    ("rip", 520),
];

const PROTOCOL_NUMBERS: &[(&str, &str)] = &[
    ("1", "icmp"),
    ("2", "igmp"),
    ("6", "tcp"),
    ("17", "udp"),
    ("47", "gre"),
    ("50", "esp"),
    ("51", "ahp"),
    ("88", "eigrp"),
    ("89", "ospf"),
];

const ICMP_TYPES: &[(&str, &str)] = &[
    ("0", "echo-reply"),
    ("3", "unreachable"),
    ("8", "echo"),
    ("11", "time-exceeded"),
];

/// List kind implied by an access-list number.
pub(crate) fn kind_for_number(number: u32) -> Option<AclKind> {
    match number {
        1..=99 | 1300..=1999 => Some(AclKind::Standard),
        100..=199 | 2000..=2699 => Some(AclKind::Extended),
        _ => None,
    }
}

/// Parse one entry starting at its action (`permit ...` / `deny ...`).
/// A leading sequence number is skipped.
pub(crate) fn parse_entry(
    words: &[String],
    kind: AclKind,
    rewriter: &AddressRewriter,
) -> Option<AclEntry> {
    let words = match words.first() {
        Some(first) if first.bytes().all(|b| b.is_ascii_digit()) => &words[1..],
        _ => words,
    };
    let mut cursor = Cursor { words, pos: 0 };

    let action = match cursor.next()?.to_ascii_lowercase().as_str() {
        "permit" => Action::Permit,
        "deny" => Action::Deny,
        _ => return None,
    };

    let entry = match kind {
        AclKind::Standard => AclEntry {
            action,
            protocol: "ip".to_string(),
            source: parse_addr(&mut cursor, rewriter)?,
            source_port: None,
            destination: None,
            destination_port: None,
            flags: cursor.rest_lowercase(),
        },
        AclKind::Extended => {
            let protocol = canonical_protocol(cursor.next()?);
            let has_ports = matches!(protocol.as_str(), "tcp" | "udp");
            let source = parse_addr(&mut cursor, rewriter)?;
            let source_port = if has_ports { parse_ports(&mut cursor) } else { None };
            let destination = parse_addr(&mut cursor, rewriter)?;
            let destination_port = if has_ports { parse_ports(&mut cursor) } else { None };
            let mut flags = cursor.rest_lowercase();
            if protocol == "icmp" {
                flags = flags.into_iter().map(canonical_icmp_type).collect();
            }
            AclEntry {
                action,
                protocol,
                source,
                source_port,
                destination: Some(destination),
                destination_port,
                flags,
            }
        }
    };
    Some(entry)
}

struct Cursor<'a> {
    words: &'a [String],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.words.get(self.pos).map(String::as_str)
    }

    fn next(&mut self) -> Option<&'a str> {
        let word = self.peek()?;
        self.pos += 1;
        Some(word)
    }

    fn rest_lowercase(&mut self) -> BTreeSet<String> {
        let rest = self.words[self.pos.min(self.words.len())..]
            .iter()
            .map(|w| w.to_ascii_lowercase())
            .collect();
        self.pos = self.words.len();
        rest
    }
}

fn parse_addr(cursor: &mut Cursor<'_>, rewriter: &AddressRewriter) -> Option<AclAddr> {
    let word = cursor.next()?;
    match word.to_ascii_lowercase().as_str() {
        "any" => Some(AclAddr::Any),
        "host" => Some(AclAddr::Host(rewriter.address(cursor.next()?)?)),
        _ => {
            let ip = rewriter.address(word)?;
            match cursor.peek().and_then(parse_ipv4) {
                Some(wildcard) => {
                    cursor.next();
                    Some(canonical_wildcard(ip, wildcard))
                }
                None => Some(AclAddr::Host(ip)),
            }
        }
    }
}

/// `X 0.0.0.0` is `host X`, `X 255.255.255.255` is `any`, contiguous
/// wildcards become a prefix.
fn canonical_wildcard(ip: Ipv4Addr, wildcard: Ipv4Addr) -> AclAddr {
    let bits = u32::from(wildcard);
    if bits == 0 {
        return AclAddr::Host(ip);
    }
    if bits == u32::MAX {
        return AclAddr::Any;
    }
    match wildcard_to_prefix(wildcard).and_then(|p| Ipv4Net::new(ip, p)) {
        Some(net) => AclAddr::Net(net),
        None => AclAddr::Wildcard(Ipv4Addr::from(u32::from(ip) & !bits), wildcard),
    }
}

fn parse_ports(cursor: &mut Cursor<'_>) -> Option<PortMatch> {
    let op = cursor.peek()?.to_ascii_lowercase();
    let matched = match op.as_str() {
        "eq" => {
            cursor.next();
            let mut ports = Vec::new();
            while let Some(port) = cursor.peek().and_then(port_number) {
                cursor.next();
                ports.push(port);
            }
            ports.sort_unstable();
            ports.dedup();
            PortMatch::Eq(ports)
        }
        "neq" | "lt" | "gt" => {
            cursor.next();
            let port = port_number(cursor.next()?)?;
            match op.as_str() {
                "neq" => PortMatch::Neq(port),
                "lt" => PortMatch::Lt(port),
                _ => PortMatch::Gt(port),
            }
        }
        "range" => {
            cursor.next();
            let lo = port_number(cursor.next()?)?;
            let hi = port_number(cursor.next()?)?;
            PortMatch::Range(lo.min(hi), lo.max(hi))
        }
        _ => return None,
    };
    Some(matched)
}

/// Port number for a numeric or named port (`www` -> 80).
pub(crate) fn port_number(word: &str) -> Option<u16> {
    if let Ok(n) = word.parse::<u16>() {
        return Some(n);
    }
    let lower = word.to_ascii_lowercase();
    PORT_NAMES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, port)| *port)
}

fn canonical_protocol(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    PROTOCOL_NUMBERS
        .iter()
        .find(|(number, _)| *number == lower)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or(lower)
}

fn canonical_icmp_type(flag: String) -> String {
    ICMP_TYPES
        .iter()
        .find(|(number, _)| *number == flag)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or(flag)
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::{kind_for_number, parse_entry, port_number};
    use crate::identity::AddressRewriter;
    use crate::normalize::model::{AclAddr, AclKind, PortMatch};

    fn entry(text: &str, kind: AclKind) -> String {
        let words: Vec<String> = text.split_whitespace().map(ToString::to_string).collect();
        parse_entry(&words, kind, &AddressRewriter::identity())
            .expect("entry parses")
            .to_string()
    }

    #[test]
    fn standard_forms_are_equivalent() {
        assert_eq!(
            entry("permit host 10.0.1.5", AclKind::Standard),
            entry("permit 10.0.1.5 0.0.0.0", AclKind::Standard)
        );
        assert_eq!(
            entry("deny 0.0.0.0 255.255.255.255", AclKind::Standard),
            "deny any"
        );
        assert_eq!(
            entry("permit 10.0.1.0 0.0.0.255", AclKind::Standard),
            "permit 10.0.1.0/24"
        );
        assert_eq!(entry("10 permit 10.0.1.9", AclKind::Standard), "permit host 10.0.1.9");
    }

    #[test]
    fn extended_ports_and_protocols() {
        assert_eq!(
            entry("permit 6 10.0.1.0 0.0.0.255 host 10.0.2.10 eq www", AclKind::Extended),
            "permit tcp 10.0.1.0/24 host 10.0.2.10 eq 80"
        );
        assert_eq!(
            entry("permit tcp any any range 443 80", AclKind::Extended),
            "permit tcp any any range 80 443"
        );
        assert_eq!(
            entry("deny icmp any any 8", AclKind::Extended),
            entry("deny icmp any any echo", AclKind::Extended)
        );
    }

    #[test]
    fn non_contiguous_wildcards_are_kept() {
        let words: Vec<String> = "permit 10.0.7.1 0.0.255.0"
            .split_whitespace()
            .map(ToString::to_string)
            .collect();
        let parsed = parse_entry(&words, AclKind::Standard, &AddressRewriter::identity())
            .expect("entry parses");
        assert_eq!(
            parsed.source,
            AclAddr::Wildcard(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(0, 0, 255, 0))
        );
        assert_eq!(parsed.source_port, None::<PortMatch>);
    }

    #[test]
    fn numbers_imply_kind() {
        assert_eq!(kind_for_number(10), Some(AclKind::Standard));
        assert_eq!(kind_for_number(101), Some(AclKind::Extended));
        assert_eq!(kind_for_number(1500), Some(AclKind::Standard));
        assert_eq!(kind_for_number(700), None);
        assert_eq!(port_number("telnet"), Some(23));
        assert_eq!(port_number("nonsense"), None);
    }
}
