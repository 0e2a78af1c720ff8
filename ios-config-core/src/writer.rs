use std::fs;
use std::path::Path;

use crate::tree::ConfigNode;

/// Render a [`ConfigNode`] tree as canonical configuration text.
///
/// Keywords come out in their canonical spelling, sub-mode commands are
/// indented by one space per level and every top-level block is followed by a
/// `!` separator, matching `show running-config` output.
pub fn write(node: &ConfigNode) -> String {
    let mut out = String::new();
    if node.words.is_empty() {
        for child in &node.children {
            write_node(&mut out, child, 0);
            if !child.children.is_empty() {
                out.push_str("!\n");
            }
        }
    } else {
        write_node(&mut out, node, 0);
    }
    out
}

/// Render a [`ConfigNode`] tree and write it to `path`.
pub fn write_file(node: &ConfigNode, path: &Path) -> std::io::Result<()> {
    fs::write(path, write(node))
}

fn write_node(out: &mut String, node: &ConfigNode, depth: usize) {
    for _ in 0..depth {
        out.push(' ');
    }
    out.push_str(&node.command());
    out.push('\n');
    for child in &node.children {
        write_node(out, child, depth + 1);
    }
    // Nested modes need an explicit exit so following commands return to the parent.
    if depth > 0 && !node.children.is_empty() {
        for _ in 0..=depth {
            out.push(' ');
        }
        out.push_str("exit\n");
    }
}
