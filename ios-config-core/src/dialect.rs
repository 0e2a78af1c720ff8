//! Keyword tables for IOS-style configuration syntax.
//!
//! IOS accepts any unambiguous abbreviation of a keyword, and the same
//! directive shows up in submissions as `int`, `interf` or `interface`. This
//! module keeps an explicit synonym table instead of resolving arbitrary
//! prefixes: every accepted spelling is listed, with a minimum length chosen so
//! that no two keywords in the same position collide (`rou` is not accepted
//! because it is both `route` and `router`).
//!
//! The dialect also knows which commands open a sub-mode (`interface`,
//! `router`, `ip access-list`, ...) and which commands are only valid at the
//! global level. The parser uses the latter to leave a sub-mode when a
//! submission omits `exit` between blocks.

use std::collections::BTreeMap;

/// Keyword synonyms and mode structure for one configuration language.
#[derive(Debug, Clone)]
pub struct Dialect {
    /// Spelling -> canonical keyword for the first word of a command.
    commands: BTreeMap<String, &'static str>,
    /// Spelling -> canonical keyword for the word following a prefix keyword
    /// such as `ip`.
    subcommands: BTreeMap<&'static str, BTreeMap<String, &'static str>>,
    /// Canonical command prefixes that open a sub-mode from global context.
    mode_openers: Vec<Vec<&'static str>>,
    /// Canonical command prefixes that open a sub-mode nested in another one,
    /// keyed by the parent's first word.
    nested_openers: Vec<(&'static str, Vec<&'static str>)>,
    /// Commands that close a nested sub-mode without leaving the parent.
    nested_closers: Vec<&'static str>,
    /// Canonical command prefixes only valid in global context.
    global_only: Vec<Vec<&'static str>>,
}

impl Dialect {
    /// The Cisco IOS dialect used by routers and switches in lab assignments.
    pub fn ios() -> Self {
        let mut commands = BTreeMap::new();
        for (canonical, min) in [
            ("interface", 3),
            ("hostname", 4),
            ("description", 4),
            ("shutdown", 4),
            ("network", 3),
            ("passive-interface", 7),
            ("access-list", 6),
            ("router-id", 9),
            ("default-information", 9),
            ("redistribute", 5),
            ("permit", 4),
            ("deny", 4),
            ("remark", 3),
            ("banner", 3),
            ("encapsulation", 5),
            ("switchport", 6),
            ("bandwidth", 4),
            ("clock", 5),
            ("duplex", 3),
            ("speed", 3),
            ("username", 4),
            ("service", 4),
            ("enable", 3),
            ("line", 4),
            ("vlan", 4),
            ("exit", 4),
            ("end", 3),
            ("no", 2),
            ("ip", 2),
            ("ipv6", 4),
            ("router", 6),
            ("address-family", 7),
            ("exit-address-family", 19),
            ("control-plane", 7),
            ("class-map", 9),
            ("policy-map", 10),
            ("class", 5),
            ("snmp-server", 4),
            ("ntp", 3),
            ("logging", 3),
            ("login", 5),
            ("password", 4),
            ("transport", 5),
            ("exec-timeout", 6),
        ] {
            insert_abbreviations(&mut commands, canonical, min);
        }
        // Accepted short forms that are not prefixes of the keyword.
        commands.insert("sw".to_string(), "switchport");
        commands.insert("bw".to_string(), "bandwidth");

        let mut ip = BTreeMap::new();
        for (canonical, min) in [
            ("address", 3),
            ("route", 5),
            ("routing", 7),
            ("access-list", 8),
            ("access-group", 8),
            ("ospf", 2),
            ("domain-name", 6),
            ("domain-lookup", 8),
            ("helper-address", 6),
            ("default-gateway", 9),
            ("dhcp", 4),
            ("nat", 3),
            ("cef", 3),
            ("classless", 5),
            ("http", 4),
        ] {
            insert_abbreviations(&mut ip, canonical, min);
        }

        let mut subcommands = BTreeMap::new();
        subcommands.insert("ip", ip.clone());
        subcommands.insert("ipv6", ip);

        Self {
            commands,
            subcommands,
            mode_openers: vec![
                vec!["interface"],
                vec!["router"],
                vec!["line"],
                vec!["vlan"],
                vec!["ip", "access-list"],
                vec!["ip", "dhcp", "pool"],
                vec!["ipv6", "access-list"],
                vec!["control-plane"],
                vec!["class-map"],
                vec!["policy-map"],
            ],
            nested_openers: vec![
                ("router", vec!["address-family"]),
                ("policy-map", vec!["class"]),
            ],
            nested_closers: vec!["exit-address-family"],
            global_only: vec![
                vec!["hostname"],
                vec!["access-list"],
                vec!["ip", "route"],
                vec!["ip", "routing"],
                vec!["ip", "domain-name"],
                vec!["ip", "domain-lookup"],
                vec!["ip", "default-gateway"],
                vec!["ip", "cef"],
                vec!["ip", "classless"],
                vec!["ip", "http"],
                vec!["ipv6", "route"],
                vec!["ipv6", "routing"],
                vec!["enable"],
                vec!["service"],
                vec!["username"],
                vec!["banner"],
                vec!["snmp-server"],
                vec!["ntp"],
            ],
        }
    }

    /// Canonicalize the keywords of one tokenized command.
    ///
    /// Known keywords become their lowercase canonical spelling. Unknown words
    /// and arguments are returned unchanged. A leading `no` is kept and the
    /// rest of the command is canonicalized as a command of its own.
    pub fn canonicalize(&self, words: &[&str]) -> Vec<String> {
        let Some((first, rest)) = words.split_first() else {
            return Vec::new();
        };
        let lowered = first.to_ascii_lowercase();
        let Some(&canonical) = self.commands.get(&lowered) else {
            return words.iter().map(ToString::to_string).collect();
        };

        let mut out = vec![canonical.to_string()];
        if canonical == "no" {
            out.extend(self.canonicalize(rest));
            return out;
        }

        let mut tail = rest.iter();
        if let Some(table) = self.subcommands.get(canonical) {
            if let Some(second) = tail.next() {
                let lowered = second.to_ascii_lowercase();
                match table.get(&lowered) {
                    Some(sub) => out.push((*sub).to_string()),
                    None => out.push((*second).to_string()),
                }
            }
        }
        out.extend(tail.map(ToString::to_string));
        out
    }

    /// Whether the canonical command opens a sub-mode from global context.
    pub fn opens_mode(&self, words: &[String]) -> bool {
        self.mode_openers.iter().any(|p| has_prefix(words, p))
    }

    /// Whether the canonical command opens a mode nested under `parent`.
    pub fn opens_nested_mode(&self, parent: &[String], words: &[String]) -> bool {
        let Some(parent_first) = parent.first() else {
            return false;
        };
        self.nested_openers
            .iter()
            .any(|(p, prefix)| parent_first == p && has_prefix(words, prefix))
    }

    /// Whether the canonical command closes a nested mode.
    pub fn closes_nested_mode(&self, words: &[String]) -> bool {
        words
            .first()
            .is_some_and(|w| self.nested_closers.iter().any(|c| w == c))
    }

    /// Whether the canonical command is only valid in global context.
    ///
    /// A `no` form of a global command is global as well.
    pub fn is_global_only(&self, words: &[String]) -> bool {
        let words = match words.first() {
            Some(first) if first == "no" => &words[1..],
            _ => words,
        };
        self.global_only.iter().any(|p| has_prefix(words, p)) || self.opens_mode(words)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::ios()
    }
}

fn insert_abbreviations(
    table: &mut BTreeMap<String, &'static str>,
    canonical: &'static str,
    min: usize,
) {
    for len in min.min(canonical.len())..=canonical.len() {
        table.insert(canonical[..len].to_string(), canonical);
    }
}

fn has_prefix(words: &[String], prefix: &[&str]) -> bool {
    prefix.len() <= words.len() && words.iter().zip(prefix).all(|(w, p)| w == p)
}
