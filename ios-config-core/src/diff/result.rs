use serde::Serialize;

use crate::ConfigNode;

/// A single diff outcome for a command path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DiffEntry {
    /// Command exists on both sides with identical content.
    Identical { path: String },
    /// Command with the same identity exists on both sides but its value differs.
    Modified {
        path: String,
        left: String,
        right: String,
    },
    /// Command only on the left side.
    OnlyLeft { path: String, node: ConfigNode },
    /// Command only on the right side.
    OnlyRight { path: String, node: ConfigNode },
    /// Shape mismatch, such as a block on one side and a plain command on the other.
    Structural { path: String, description: String },
}

impl DiffEntry {
    /// Path of the command this entry describes.
    pub fn path(&self) -> &str {
        match self {
            DiffEntry::Identical { path }
            | DiffEntry::Modified { path, .. }
            | DiffEntry::OnlyLeft { path, .. }
            | DiffEntry::OnlyRight { path, .. }
            | DiffEntry::Structural { path, .. } => path,
        }
    }
}
