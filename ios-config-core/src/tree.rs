use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// One command in a configuration tree.
///
/// The root node has no words. Every other node is a single command line whose
/// keywords have been canonicalized by the dialect; its children are the
/// commands issued while the mode it opened was active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigNode {
    /// Command tokens. Keywords are lowercase canonical spellings, arguments
    /// keep the case they were written in.
    pub words: Vec<String>,
    /// 1-based source line number. `0` for the root.
    pub line: usize,
    /// Commands issued inside the mode this command opened.
    pub children: Vec<ConfigNode>,
}

impl ConfigNode {
    /// Create an empty root node.
    pub fn root() -> Self {
        Self {
            words: Vec::new(),
            line: 0,
            children: Vec::new(),
        }
    }

    /// Create a command node with no children.
    pub fn new(words: Vec<String>, line: usize) -> Self {
        Self {
            words,
            line,
            children: Vec::new(),
        }
    }

    /// Whether the command starts with the given word sequence.
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.words.len()
            && self
                .words
                .iter()
                .zip(prefix)
                .all(|(word, expected)| word.eq_ignore_ascii_case(expected))
    }

    /// Return the first child whose command starts with `prefix`.
    pub fn get_child(&self, prefix: &[&str]) -> Option<&ConfigNode> {
        self.children.iter().find(|child| child.starts_with(prefix))
    }

    /// Return all children whose command starts with `prefix`.
    pub fn get_children(&self, prefix: &[&str]) -> Vec<&ConfigNode> {
        self.children
            .iter()
            .filter(|child| child.starts_with(prefix))
            .collect()
    }

    /// Words following a matched `prefix`, if the command starts with it.
    pub fn args_after(&self, prefix: &[&str]) -> Option<&[String]> {
        if self.starts_with(prefix) {
            Some(&self.words[prefix.len()..])
        } else {
            None
        }
    }

    /// The command rendered back as one space-separated line.
    pub fn command(&self) -> String {
        self.words.join(" ")
    }

    /// Whether any statement was parsed into this tree.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.children.is_empty()
    }
}

impl Display for ConfigNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command())?;
        if !self.children.is_empty() {
            write!(f, " {{")?;
            for (idx, child) in self.children.iter().enumerate() {
                if idx > 0 {
                    write!(f, ";")?;
                }
                write!(f, " {child}")?;
            }
            write!(f, " }}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ConfigNode;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(ToString::to_string).collect()
    }

    #[test]
    fn get_child_matches_on_word_prefix() {
        let mut root = ConfigNode::root();
        let mut iface = ConfigNode::new(words("interface GigabitEthernet0/0"), 1);
        iface
            .children
            .push(ConfigNode::new(words("ip address 10.0.0.1 255.255.255.0"), 2));
        root.children.push(iface);

        let found = root.get_child(&["interface"]).expect("interface node");
        let addr = found.get_child(&["ip", "address"]).expect("address node");
        assert_eq!(
            addr.args_after(&["ip", "address"]),
            Some(&words("10.0.0.1 255.255.255.0")[..])
        );
        assert!(found.get_child(&["ip", "ospf"]).is_none());
    }

    #[test]
    fn display_renders_nested_blocks() {
        let mut router = ConfigNode::new(words("router ospf 1"), 1);
        router
            .children
            .push(ConfigNode::new(words("network 10.0.0.0 0.0.0.255 area 0"), 2));
        assert_eq!(
            router.to_string(),
            "router ospf 1 { network 10.0.0.0 0.0.0.255 area 0 }"
        );
    }
}
