//! Synthesis manifest written next to the stack templates.

use serde::{Deserialize, Serialize};

use crate::types::GroupKind;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Stacks of one synthesis run, in deploy order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub application: String,
    pub environment: String,
    pub stacks: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub stack: String,
    pub group: GroupKind,
    pub template_file: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl Manifest {
    /// Stack names in deploy order.
    pub fn deploy_order(&self) -> impl Iterator<Item = &str> {
        self.stacks.iter().map(|s| s.stack.as_str())
    }

    /// Stack names in delete order (reverse of deploy order).
    pub fn destroy_order(&self) -> impl Iterator<Item = &str> {
        self.stacks.iter().rev().map(|s| s.stack.as_str())
    }

    /// Checks that every stack is listed after all of its dependencies.
    #[must_use]
    pub fn is_topologically_ordered(&self) -> bool {
        self.stacks.iter().enumerate().all(|(idx, entry)| {
            entry
                .depends_on
                .iter()
                .all(|dep| self.stacks[..idx].iter().any(|s| &s.stack == dep))
        })
    }
}
