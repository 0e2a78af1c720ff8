//! Per-student identity hint and personal address space rewriting.
//!
//! Students build their lab addressing from a personal prefix (typically a
//! birthday written as `2MM.DD`), so the same master topology shows up as
//! `212.05.1.1` for one student and `201.17.1.1` for another. Before any
//! comparison both sides are rewritten onto one target prefix so the checks
//! only see the parts of the address the student was actually asked to get
//! right.

use std::net::Ipv4Addr;

use thiserror::Error;

use crate::addr::{parse_ipv4, parse_octet};

/// Errors for identity hints and prefix overrides.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid prefix '{0}': expected two dotted octets such as 212.05")]
    InvalidPrefix(String),
}

/// A validated two-octet prefix such as `212.05`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityHint {
    raw: String,
    octets: [u8; 2],
}

impl IdentityHint {
    pub fn parse(text: &str) -> Result<Self, IdentityError> {
        let raw = text.trim();
        let octets =
            parse_prefix(raw).ok_or_else(|| IdentityError::InvalidPrefix(text.to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            octets,
        })
    }

    /// The prefix as the student supplied it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn octets(&self) -> [u8; 2] {
        self.octets
    }

    /// Whether `ip` lies inside this prefix.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let o = ip.octets();
        [o[0], o[1]] == self.octets
    }

    /// Strip the prefix from a file identifier.
    ///
    /// Students often name files `212.05_R1` or `R1-21205`; the prefix is
    /// removed from either end together with `_`, `-`, `.` and space
    /// separators. Identifiers without the prefix are returned unchanged.
    pub fn strip_from<'a>(&self, id: &'a str) -> &'a str {
        let compact = self.raw.replace('.', "");
        let forms = [self.raw.as_str(), compact.as_str()];
        let separators: &[char] = &['_', '-', '.', ' '];
        for form in forms {
            if form.is_empty() {
                continue;
            }
            if let Some(rest) = strip_prefix_ignore_case(id, form) {
                let rest = rest.trim_start_matches(separators);
                if !rest.is_empty() {
                    return rest;
                }
            }
            if let Some(rest) = strip_suffix_ignore_case(id, form) {
                let rest = rest.trim_end_matches(separators);
                if !rest.is_empty() {
                    return rest;
                }
            }
        }
        id
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let start = text.len().checked_sub(suffix.len())?;
    let tail = text.get(start..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &text[..start])
}

fn parse_prefix(text: &str) -> Option<[u8; 2]> {
    let (first, second) = text.split_once('.')?;
    Some([parse_octet(first)?, parse_octet(second)?])
}

/// Whether an address literal follows the personal `2NN.NN.x.y` convention.
pub fn is_personal_literal(text: &str) -> bool {
    let parts: Vec<&str> = text.split('.').collect();
    parts.len() == 4
        && parts[0].len() == 3
        && parts[0].starts_with('2')
        && parts[1].len() == 2
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
        && parse_ipv4(text).is_some()
}

/// Rewrites address literals onto a common personal prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRewriter {
    target: [u8; 2],
}

impl AddressRewriter {
    /// Build a rewriter targeting `override_prefix` when given, else the hint.
    pub fn new(hint: &IdentityHint, override_prefix: Option<&str>) -> Result<Self, IdentityError> {
        let target = match override_prefix.map(str::trim).filter(|p| !p.is_empty()) {
            Some(prefix) => parse_prefix(prefix)
                .ok_or_else(|| IdentityError::InvalidPrefix(prefix.to_string()))?,
            None => hint.octets(),
        };
        Ok(Self { target })
    }

    /// Rewriter that only canonicalizes literals, for inspecting a single
    /// configuration outside of a grading run.
    pub fn identity() -> Self {
        Self { target: [0, 0] }
    }

    /// Parse an address literal, moving personal-space addresses onto the
    /// target prefix.
    pub fn address(&self, text: &str) -> Option<Ipv4Addr> {
        let ip = parse_ipv4(text)?;
        if self.target != [0, 0] && is_personal_literal(text) {
            let o = ip.octets();
            return Some(Ipv4Addr::new(self.target[0], self.target[1], o[2], o[3]));
        }
        Some(ip)
    }

    /// Canonical form of one configuration token: address literals are
    /// rewritten, everything else is returned unchanged.
    pub fn token(&self, text: &str) -> String {
        match self.address(text) {
            Some(ip) => ip.to_string(),
            None => text.to_string(),
        }
    }
}
