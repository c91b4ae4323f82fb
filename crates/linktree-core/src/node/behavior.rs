//! Per-type node behavior
//!
//! A node type is a `NodeBehavior` implementation plus a `NodeType` name.
//! The `Default` bound on `NodeType` is the type's zero-argument
//! constructor: the registry uses it once to build the type's default
//! instance, and copies use it to create fresh instances.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use super::{Info, Node};
use crate::errors::Result;
use crate::subscription::{Subscriber, Topic};

/// Error returned by a hook or subscriber callback
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a hook or subscriber callback
///
/// Failures are logged with the node path and never propagated.
pub type HookResult = std::result::Result<(), HookError>;

/// Hooks and schema for one node type
///
/// Every method has a no-op default. Hooks run after the change they report
/// is visible, on the caller's thread, with no node lock held, so they may
/// freely read or mutate the tree.
pub trait NodeBehavior: Any + Send + Sync {
    /// Declare the schema-fixed children of this type
    ///
    /// Called exactly once per type, on the instance that becomes the type's
    /// default. Use [`Node::declare_default`] for each child. An error here
    /// makes the type unusable until a later construction retries.
    fn declare_defaults(&self, _node: &Node) -> Result<()> {
        Ok(())
    }

    /// The node and all of its descendants have started
    fn on_started(&self, _node: &Node) -> HookResult {
        Ok(())
    }

    /// The node and all of its descendants are stable
    fn on_stable(&self, _node: &Node) -> HookResult {
        Ok(())
    }

    /// The node and all of its descendants have stopped
    fn on_stopped(&self, _node: &Node) -> HookResult {
        Ok(())
    }

    fn on_child_added(&self, _node: &Node, _child: &Info) -> HookResult {
        Ok(())
    }

    fn on_child_removed(&self, _node: &Node, _child: &Info) -> HookResult {
        Ok(())
    }

    /// A child's slot was replaced
    fn on_child_changed(&self, _node: &Node, _child: &Info) -> HookResult {
        Ok(())
    }

    /// A child's flags or metadata changed
    fn on_info_changed(&self, _node: &Node, _child: &Info) -> HookResult {
        Ok(())
    }

    /// A subscription was added (every time)
    fn on_subscribe(
        &self,
        _node: &Node,
        _topic: &Topic,
        _child: Option<&Info>,
        _subscriber: &Arc<dyn Subscriber>,
    ) -> HookResult {
        Ok(())
    }

    /// The first subscriber for this (topic, child) pair arrived
    fn on_subscribed_to(&self, _node: &Node, _topic: &Topic, _child: Option<&Info>) -> HookResult {
        Ok(())
    }

    /// The node went from zero subscriptions to one
    fn on_subscribed(&self, _node: &Node) -> HookResult {
        Ok(())
    }

    /// A subscription was removed (every time)
    fn on_unsubscribe(
        &self,
        _node: &Node,
        _topic: &Topic,
        _child: Option<&Info>,
        _subscriber: &Arc<dyn Subscriber>,
    ) -> HookResult {
        Ok(())
    }

    /// The last subscriber for this (topic, child) pair left
    fn on_unsubscribed_from(
        &self,
        _node: &Node,
        _topic: &Topic,
        _child: Option<&Info>,
    ) -> HookResult {
        Ok(())
    }

    /// The node went from one subscription to zero
    fn on_unsubscribed(&self, _node: &Node) -> HookResult {
        Ok(())
    }
}

/// A concrete, registrable node type
pub trait NodeType: NodeBehavior + Default {
    /// Stable name used by the snapshot codec
    const TYPE_NAME: &'static str;
}

/// Type token for a node type
///
/// Carries the type identity, its persisted name and its constructor.
#[derive(Clone, Copy)]
pub struct NodeKind {
    type_id: TypeId,
    type_name: &'static str,
    make: fn() -> Box<dyn NodeBehavior>,
}

fn make_behavior<T: NodeType>() -> Box<dyn NodeBehavior> {
    Box::new(T::default())
}

impl NodeKind {
    pub fn of<T: NodeType>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: T::TYPE_NAME,
            make: make_behavior::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn make_behavior(&self) -> Box<dyn NodeBehavior> {
        (self.make)()
    }
}

impl PartialEq for NodeKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for NodeKind {}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeKind({})", self.type_name)
    }
}

/// Plain container with no declared children
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicNode;

impl NodeBehavior for BasicNode {}

impl NodeType for BasicNode {
    const TYPE_NAME: &'static str = "node";
}
