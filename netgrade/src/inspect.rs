use ios_config_core::ConfigNode;

/// Render a configuration tree with a configurable max depth, one command per
/// line prefixed by its source line number.
pub fn render_tree(node: &ConfigNode, max_depth: usize) -> String {
    let mut out = String::new();
    for child in &node.children {
        render_node(child, 0, max_depth, &mut out);
    }
    out
}

fn render_node(node: &ConfigNode, depth: usize, max_depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!("{:>4} {}{}\n", node.line, indent, node.command()));

    if depth >= max_depth {
        return;
    }

    for child in &node.children {
        render_node(child, depth + 1, max_depth, out);
    }
}
