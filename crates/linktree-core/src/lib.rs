//! LinkTree Core - live node tree for protocol links
//!
//! This crate provides the object model a protocol link exposes to remote
//! peers:
//! - Typed containers ([`Node`]) with ordered, named child records ([`Info`])
//! - One canonical default instance per node type, shared structurally by
//!   every instance and used for divergence tracking
//! - A bottom-up lifecycle (stopped, started, stable)
//! - Per-node topic subscriptions with first/last transition hooks
//! - A diff-based snapshot codec and digest
//!
//! # Example
//!
//! ```
//! use linktree_core::{Node, NodeBehavior, NodeType, Result};
//!
//! #[derive(Default)]
//! struct Counter;
//!
//! impl NodeBehavior for Counter {
//!     fn declare_defaults(&self, node: &Node) -> Result<()> {
//!         node.declare_default("count", 0)?;
//!         Ok(())
//!     }
//! }
//!
//! impl NodeType for Counter {
//!     const TYPE_NAME: &'static str = "doc_counter";
//! }
//!
//! let counter = Node::new::<Counter>()?;
//! assert!(counter.get_info("count").unwrap().equals_default());
//! counter.put("count", 5)?;
//! assert!(!counter.get_info("count").unwrap().equals_default_value());
//! # Ok::<(), linktree_core::LinkTreeError>(())
//! ```

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod node;
pub mod registry;
pub mod snapshot;
pub mod subscription;
pub mod traversal;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, LinkTreeError, Result};
pub use model::{InfoFlags, Metadata, Value, ValueKind};
pub use node::{
    BasicNode, HookError, HookResult, Info, Lifecycle, Node, NodeBehavior, NodeKind, NodeType,
    Slot, SlotType, INDEX_THRESHOLD,
};
pub use registry::DefaultRegistry;
pub use snapshot::{EncodeMode, NodeSnapshot};
pub use subscription::{NodeEvent, Subscriber, Topic};
