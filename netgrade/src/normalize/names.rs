use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// Interface type spellings, canonical name and short display form.
///
/// Spellings are matched against the alphabetic part of an interface name,
/// case-insensitively. Only the forms listed here are accepted, so `g0/0`
/// and `gig0/0` resolve while an unknown `x0/0` is left as written.
const INTERFACE_TYPES: &[(&[&str], &str, &str)] = &[
    (
        &["g", "gi", "gig", "giga", "gigabit", "gigabitethernet"],
        "GigabitEthernet",
        "Gi",
    ),
    (
        &["f", "fa", "fas", "fast", "fastethernet"],
        "FastEthernet",
        "Fa",
    ),
    (
        &["te", "ten", "tengig", "tengigabitethernet"],
        "TenGigabitEthernet",
        "Te",
    ),
    (&["e", "et", "eth", "ethernet"], "Ethernet", "Et"),
    (&["s", "se", "ser", "serial"], "Serial", "Se"),
    (&["lo", "loop", "loopback"], "Loopback", "Lo"),
    (&["vl", "vlan"], "Vlan", "Vl"),
    (&["po", "port-channel"], "Port-channel", "Po"),
    (&["tu", "tun", "tunnel"], "Tunnel", "Tu"),
    (&["nu", "null"], "Null", "Nu"),
];

/// Canonical interface name (`GigabitEthernet0/0`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Canonicalize an interface name. Unknown types are kept as written.
    pub fn parse(name: &str) -> Self {
        let split = name
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(name.len());
        let (kind, number) = name.split_at(split);
        let kind_lower = kind.trim().to_ascii_lowercase();
        let canonical = INTERFACE_TYPES
            .iter()
            .find(|(spellings, _, _)| spellings.contains(&kind_lower.as_str()))
            .map(|(_, canonical, _)| *canonical);
        match canonical {
            Some(canonical) if !number.is_empty() => {
                InterfaceName(format!("{canonical}{}", number.trim()))
            }
            _ => InterfaceName(name.to_string()),
        }
    }

    /// Canonicalize from command arguments, joining a split type and number.
    pub fn from_words(words: &[String]) -> Option<Self> {
        let first = words.first()?;
        if !first.chars().any(|c| c.is_ascii_digit()) {
            if let Some(number) = words.get(1) {
                if number.starts_with(|c: char| c.is_ascii_digit()) {
                    return Some(Self::parse(&format!("{first}{number}")));
                }
            }
        }
        Some(Self::parse(first))
    }

    /// Whether the text names an interface of a known type.
    pub fn is_interface(text: &str) -> bool {
        let split = match text.find(|c: char| c.is_ascii_digit()) {
            Some(idx) if idx > 0 => idx,
            _ => return false,
        };
        let kind = text[..split].to_ascii_lowercase();
        INTERFACE_TYPES
            .iter()
            .any(|(spellings, _, _)| spellings.contains(&kind.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short display form used in feedback (`Gi0/0`).
    pub fn short(&self) -> String {
        for (_, canonical, short) in INTERFACE_TYPES {
            if let Some(number) = self.0.strip_prefix(canonical) {
                if number.starts_with(|c: char| c.is_ascii_digit()) {
                    return format!("{short}{number}");
                }
            }
        }
        self.0.clone()
    }
}

impl Display for InterfaceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
