//! Snapshot codec
//!
//! A snapshot is a serde document of a node tree. In diff mode children
//! that still equal their type's default are left out, and diverged default
//! children carry only the parts that diverge; decoding rebuilds the tree
//! from the *current* defaults and applies the document on top.
//!
//! ```json
//! {"type":"counter","children":[{"name":"count","value":{"kind":"number","value":5}}]}
//! ```

pub mod decode;
pub mod digest;
pub mod encode;

use serde::{Deserialize, Serialize};

use crate::model::{InfoFlags, Metadata, Value};

pub use decode::{decode, from_json, restore_into};
pub use digest::compute_tree_digest;
pub use encode::{encode, to_json, to_json_pretty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeMode {
    /// Omit whatever equals the default
    #[default]
    Diff,
    /// Every non-transient child, in full
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildSnapshot>,
    /// Default children that were removed from this instance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<InfoFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeSnapshot>,
}

impl NodeSnapshot {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            children: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn child(&self, name: &str) -> Option<&ChildSnapshot> {
        self.children.iter().find(|c| c.name == name)
    }
}

impl ChildSnapshot {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: None,
            metadata: None,
            value: None,
            node: None,
        }
    }
}
