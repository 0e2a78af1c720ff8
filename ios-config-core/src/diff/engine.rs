use std::collections::{BTreeMap, BTreeSet};

use crate::diff::result::DiffEntry;
use crate::ConfigNode;

/// Configures tree diff behavior.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Include [`DiffEntry::Identical`] rows.
    pub include_identical: bool,
    /// Maximum recursion depth. `-1` means unlimited.
    pub max_depth: i32,
    /// Command prefix -> number of leading words that identify the command.
    ///
    /// Commands sharing an identity are compared as one value (a changed
    /// `ip address` is reported as modified rather than removed and added).
    /// Commands without a matching prefix are identified by their full text.
    pub key_words: Vec<(Vec<String>, usize)>,
    /// Command prefixes to leave out of the comparison.
    pub ignore_commands: Vec<Vec<String>>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            include_identical: false,
            max_depth: -1,
            key_words: Vec::new(),
            ignore_commands: Vec::new(),
        }
    }
}

impl DiffOptions {
    /// Identity rules for canonical IOS commands.
    pub fn ios() -> Self {
        let rules: &[(&str, usize)] = &[
            ("hostname", 1),
            ("description", 1),
            ("ip address", 2),
            ("router-id", 1),
            ("bandwidth", 1),
            ("encapsulation", 1),
            ("clock rate", 2),
            ("ip route", 4),
            ("network", 3),
            ("enable secret", 2),
            ("enable password", 2),
            ("ip domain-name", 2),
            ("ip default-gateway", 2),
        ];
        Self {
            key_words: rules
                .iter()
                .map(|(prefix, n)| (split_words(prefix), *n))
                .collect(),
            ignore_commands: ["version", "building", "current configuration"]
                .iter()
                .map(|p| split_words(p))
                .collect(),
            ..Self::default()
        }
    }
}

/// Diff two configuration trees with default options.
pub fn diff(left: &ConfigNode, right: &ConfigNode) -> Vec<DiffEntry> {
    diff_with_options(left, right, &DiffOptions::default())
}

/// Diff two configuration trees with custom options.
///
/// Entries are emitted in command-identity order, so reordering statements on
/// either side does not change the result.
pub fn diff_with_options(
    left: &ConfigNode,
    right: &ConfigNode,
    opts: &DiffOptions,
) -> Vec<DiffEntry> {
    let mut out = Vec::new();
    diff_children(left, right, "", 0, opts, &mut out);
    out
}

fn diff_node(
    left: &ConfigNode,
    right: &ConfigNode,
    path: &str,
    depth: i32,
    opts: &DiffOptions,
    out: &mut Vec<DiffEntry>,
) {
    if opts.max_depth >= 0 && depth > opts.max_depth {
        return;
    }

    let start_len = out.len();

    if left.children.is_empty() != right.children.is_empty() {
        out.push(DiffEntry::Structural {
            path: path.to_string(),
            description: format!(
                "block mismatch: left has {} sub-commands, right has {}",
                left.children.len(),
                right.children.len()
            ),
        });
        return;
    }

    if left.words != right.words {
        out.push(DiffEntry::Modified {
            path: path.to_string(),
            left: left.command(),
            right: right.command(),
        });
    }

    diff_children(left, right, path, depth, opts, out);

    let changed = out[start_len..]
        .iter()
        .any(|e| !matches!(e, DiffEntry::Identical { .. }));
    if opts.include_identical && !changed {
        out.push(DiffEntry::Identical {
            path: path.to_string(),
        });
    }
}

fn diff_children(
    left: &ConfigNode,
    right: &ConfigNode,
    path: &str,
    depth: i32,
    opts: &DiffOptions,
    out: &mut Vec<DiffEntry>,
) {
    let left_groups = group_by_key(&left.children, opts);
    let right_groups = group_by_key(&right.children, opts);

    let keys: BTreeSet<&String> = left_groups.keys().chain(right_groups.keys()).collect();
    for key in keys {
        let left_nodes = left_groups.get(key).map(Vec::as_slice).unwrap_or_default();
        let right_nodes = right_groups.get(key).map(Vec::as_slice).unwrap_or_default();
        let repeated = left_nodes.len().max(right_nodes.len()) > 1;

        for i in 0..left_nodes.len().max(right_nodes.len()) {
            let child_path = child_path(path, key, repeated.then_some(i + 1));
            match (left_nodes.get(i), right_nodes.get(i)) {
                (Some(l), Some(r)) => diff_node(l, r, &child_path, depth + 1, opts, out),
                (Some(l), None) => out.push(DiffEntry::OnlyLeft {
                    path: child_path,
                    node: (*l).clone(),
                }),
                (None, Some(r)) => out.push(DiffEntry::OnlyRight {
                    path: child_path,
                    node: (*r).clone(),
                }),
                (None, None) => {}
            }
        }
    }
}

fn group_by_key<'a>(
    nodes: &'a [ConfigNode],
    opts: &DiffOptions,
) -> BTreeMap<String, Vec<&'a ConfigNode>> {
    let mut groups: BTreeMap<String, Vec<&ConfigNode>> = BTreeMap::new();
    for node in nodes.iter().filter(|n| !should_ignore(n, opts)) {
        groups.entry(identity_key(node, opts)).or_default().push(node);
    }
    // Repeated identities pair up in content order, not line order.
    for group in groups.values_mut() {
        group.sort_by(|a, b| a.words.cmp(&b.words));
    }
    groups
}

fn identity_key(node: &ConfigNode, opts: &DiffOptions) -> String {
    let len = opts
        .key_words
        .iter()
        .filter(|(prefix, _)| {
            let prefix: Vec<&str> = prefix.iter().map(String::as_str).collect();
            node.starts_with(&prefix)
        })
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, n)| *n)
        .unwrap_or(node.words.len());
    node.words[..len.min(node.words.len())].join(" ")
}

fn should_ignore(node: &ConfigNode, opts: &DiffOptions) -> bool {
    opts.ignore_commands.iter().any(|prefix| {
        let prefix: Vec<&str> = prefix.iter().map(String::as_str).collect();
        node.starts_with(&prefix)
    })
}

fn child_path(parent: &str, key: &str, index: Option<usize>) -> String {
    let segment = match index {
        Some(i) => format!("{key}[{i}]"),
        None => key.to_string(),
    };
    if parent.is_empty() {
        segment
    } else {
        format!("{parent} > {segment}")
    }
}

fn split_words(s: &str) -> Vec<String> {
    s.split_whitespace().map(ToString::to_string).collect()
}
