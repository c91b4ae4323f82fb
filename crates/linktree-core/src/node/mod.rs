//! Containers
//!
//! A [`Node`] is a cheap-clone handle to a container: an ordered list of
//! named child records, a lifecycle state and a subscription list. Every
//! node of a registered type is populated at construction with proxies of
//! its type's default instance (see [`crate::registry`]).
//!
//! Ownership runs downward: a container owns its records, a record owns its
//! slot. The upward links (node to its record, record to its container) are
//! weak, so dropping a root releases the whole tree.

pub mod behavior;
pub mod children;
pub(crate) mod hooks;
pub mod info;
pub mod lifecycle;
pub mod slot;
pub mod structure;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::{Mutex, RwLock};

use linktree_core_types::path;

use crate::errors::{LinkTreeError, Result};
use crate::registry::{DefaultRegistry, Resolution};
use crate::subscription::dispatcher::SubscriptionList;

pub use behavior::{BasicNode, HookError, HookResult, NodeBehavior, NodeKind, NodeType};
pub use children::INDEX_THRESHOLD;
pub use info::Info;
pub use lifecycle::Lifecycle;
pub use slot::{Slot, SlotType};

use children::ChildList;
use info::InfoCell;

/// What a node instance is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Role {
    Instance = 0,
    /// Being built as its type's default; `declare_default` is allowed
    Bootstrapping = 1,
    /// Its type's default instance; immutable
    Default = 2,
}

impl Role {
    fn from_u8(raw: u8) -> Role {
        match raw {
            1 => Role::Bootstrapping,
            2 => Role::Default,
            _ => Role::Instance,
        }
    }
}

pub(crate) struct NodeInner {
    kind: NodeKind,
    behavior: Box<dyn NodeBehavior>,
    role: AtomicU8,
    pub(crate) state: AtomicU8,
    pub(crate) children: RwLock<ChildList>,
    pub(crate) subscriptions: Mutex<SubscriptionList>,
    parent: Mutex<Weak<InfoCell>>,
    default_instance: OnceLock<Node>,
    pending_defaults: AtomicBool,
    path_cache: Mutex<Option<Arc<str>>>,
}

/// Handle to a container
#[derive(Clone)]
pub struct Node(pub(crate) Arc<NodeInner>);

impl Node {
    /// Construct an instance of `T`, populated from its default instance
    ///
    /// Builds the default instance first if this is the first use of `T`.
    ///
    /// # Errors
    ///
    /// Returns `DefaultBootstrapFailed` if `T::declare_defaults` fails.
    pub fn new<T: NodeType>() -> Result<Node> {
        Self::from_behavior(T::default())
    }

    /// Like [`Node::new`] with a pre-built behavior value
    ///
    /// # Errors
    ///
    /// Returns `DefaultBootstrapFailed` if `T::declare_defaults` fails.
    pub fn from_behavior<T: NodeType>(behavior: T) -> Result<Node> {
        Self::instantiate(NodeKind::of::<T>(), Box::new(behavior))
    }

    /// An empty [`BasicNode`] container
    pub fn basic() -> Node {
        Node::raw(NodeKind::of::<BasicNode>(), Box::new(BasicNode), Role::Instance)
    }

    /// Construct an instance of a type known only by its token
    pub(crate) fn instantiate_kind(kind: NodeKind) -> Result<Node> {
        Self::instantiate(kind, kind.make_behavior())
    }

    fn instantiate(kind: NodeKind, behavior: Box<dyn NodeBehavior>) -> Result<Node> {
        DefaultRegistry::global().register_kind(kind);
        let node = Node::raw(kind, behavior, Role::Instance);
        node.resolve_defaults()?;
        Ok(node)
    }

    pub(crate) fn raw(kind: NodeKind, behavior: Box<dyn NodeBehavior>, role: Role) -> Node {
        Node(Arc::new(NodeInner {
            kind,
            behavior,
            role: AtomicU8::new(role as u8),
            state: AtomicU8::new(Lifecycle::Stopped as u8),
            children: RwLock::new(ChildList::default()),
            subscriptions: Mutex::new(SubscriptionList::default()),
            parent: Mutex::new(Weak::new()),
            default_instance: OnceLock::new(),
            pending_defaults: AtomicBool::new(false),
            path_cache: Mutex::new(None),
        }))
    }

    // ----- type -----

    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.0.kind.type_name()
    }

    pub fn type_id(&self) -> TypeId {
        self.0.kind.type_id()
    }

    pub fn is_type<T: NodeType>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    pub(crate) fn behavior(&self) -> &dyn NodeBehavior {
        self.0.behavior.as_ref()
    }

    /// Borrow the behavior as its concrete type
    pub fn behavior_as<T: NodeBehavior>(&self) -> Option<&T> {
        let any: &dyn Any = self.0.behavior.as_ref();
        any.downcast_ref::<T>()
    }

    // ----- defaults -----

    pub(crate) fn role(&self) -> Role {
        Role::from_u8(self.0.role.load(Ordering::Acquire))
    }

    pub(crate) fn set_role(&self, role: Role) {
        self.0.role.store(role as u8, Ordering::Release);
    }

    /// True for the one canonical default instance of a type
    pub fn is_default_instance(&self) -> bool {
        self.role() == Role::Default
    }

    /// True while this node's type is running `declare_defaults` on it
    pub fn is_declaring_defaults(&self) -> bool {
        self.role() == Role::Bootstrapping
    }

    /// The default instance this node was populated from
    pub fn default_instance(&self) -> Option<Node> {
        self.ensure_defaults();
        self.0.default_instance.get().cloned()
    }

    /// True while the type's default was still being built at construction
    pub fn has_pending_defaults(&self) -> bool {
        self.0.pending_defaults.load(Ordering::Acquire)
    }

    pub(crate) fn ensure_mutable(&self) -> Result<()> {
        if self.is_default_instance() {
            return Err(LinkTreeError::DefaultInstanceImmutable {
                type_name: self.type_name().to_string(),
            });
        }
        Ok(())
    }

    fn resolve_defaults(&self) -> Result<()> {
        match DefaultRegistry::global().resolve(self.kind())? {
            Resolution::Building => {
                self.0.pending_defaults.store(true, Ordering::Release);
            }
            Resolution::Ready(default) => {
                if default.ptr_eq(self) {
                    return Ok(());
                }
                // Set before populating, so copies taken during population
                // (self-referential types) stay finite.
                let _ = self.0.default_instance.set(default.clone());
                self.populate_from(&default);
            }
        }
        Ok(())
    }

    /// Re-check a default that was mid-bootstrap at construction
    pub(crate) fn ensure_defaults(&self) {
        if self
            .0
            .pending_defaults
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        if let Err(err) = self.resolve_defaults() {
            self.0.pending_defaults.store(true, Ordering::Release);
            tracing::warn!(
                node_type = self.type_name(),
                error = %err,
                "deferred default resolution failed"
            );
        }
    }

    /// Add a proxy for every default child whose name is not yet taken
    fn populate_from(&self, default: &Node) {
        let templates = default.0.children.read().snapshot();
        for template in templates {
            let info = Info::proxy_of(&template);
            {
                let mut children = self.0.children.write();
                if children.contains(template.name()) {
                    continue;
                }
                self.link_record(&mut children, &info);
            }
            if self.is_running() {
                if let Some(child) = info.node() {
                    self.bring_up(&child);
                }
            }
        }
    }

    /// Append a record whose node (if any) is known to be unparented
    fn link_record(&self, children: &mut ChildList, info: &Info) {
        if let Some(child) = info.node() {
            child.adopt(info);
        }
        let key = children.push_back(info.clone());
        info.attach(self, key);
    }

    // ----- parent and path -----

    /// The record holding this node in its parent
    pub fn info(&self) -> Option<Info> {
        self.0.parent.lock().upgrade().map(Info)
    }

    pub fn parent(&self) -> Option<Node> {
        self.info().and_then(|info| info.parent())
    }

    pub fn name(&self) -> Option<String> {
        self.info()
            .filter(|info| info.is_attached())
            .map(|info| info.name().to_string())
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// True if `candidate` is this node or one of its ancestors
    pub fn is_descendant_of(&self, candidate: &Node) -> bool {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.ptr_eq(candidate) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Point this node at the record that is about to hold it
    ///
    /// The claim is taken under this node's parent lock, so of two racing
    /// inserts only one can hold it. A record that is not yet attached still
    /// holds its claim until the insert lands or releases it.
    pub(crate) fn claim_parent(&self, info: &Info, container: &Node) -> Result<()> {
        if self.is_default_instance() {
            return Err(LinkTreeError::DefaultInstanceImmutable {
                type_name: self.type_name().to_string(),
            });
        }
        if container.is_descendant_of(self) {
            return Err(LinkTreeError::CycleDetected {
                path: container.path(),
                name: info.name().to_string(),
            });
        }
        {
            let mut parent = self.0.parent.lock();
            if let Some(existing) = parent.upgrade().map(Info) {
                if !existing.ptr_eq(info) && existing.holds_claim() {
                    return Err(LinkTreeError::AlreadyParented {
                        name: info.name().to_string(),
                        parent_path: existing
                            .parent()
                            .map_or_else(|| path::ROOT.to_string(), |owner| owner.path()),
                    });
                }
            }
            *parent = Arc::downgrade(&info.0);
        }
        self.invalidate_path();
        Ok(())
    }

    fn adopt(&self, info: &Info) {
        *self.0.parent.lock() = Arc::downgrade(&info.0);
        self.invalidate_path();
    }

    pub(crate) fn release_parent(&self) {
        *self.0.parent.lock() = Weak::new();
        self.invalidate_path();
    }

    /// Encoded path from the root; `/` for an unparented node
    pub fn path(&self) -> String {
        if let Some(cached) = self.0.path_cache.lock().as_ref() {
            return cached.to_string();
        }
        let computed = match (self.parent(), self.info()) {
            (Some(parent), Some(info)) => path::join(&parent.path(), info.name()),
            _ => path::ROOT.to_string(),
        };
        *self.0.path_cache.lock() = Some(Arc::from(computed.as_str()));
        computed
    }

    fn invalidate_path(&self) {
        self.0.path_cache.lock().take();
        let nodes: Vec<Node> = self
            .0
            .children
            .read()
            .iter()
            .filter_map(Info::node)
            .collect();
        for child in nodes {
            child.invalidate_path();
        }
    }

    // ----- copy and equality -----

    /// Deep structural copy sharing this node's default
    ///
    /// The copy is stopped, unparented and has no subscriptions. Copying a
    /// default instance yields a fresh instance populated from it.
    pub fn copy(&self) -> Node {
        self.ensure_defaults();
        let copy = Node::raw(self.kind(), self.kind().make_behavior(), Role::Instance);
        if self.is_default_instance() {
            let _ = copy.0.default_instance.set(self.clone());
            copy.populate_from(self);
            return copy;
        }
        if let Some(default) = self.0.default_instance.get() {
            let _ = copy.0.default_instance.set(default.clone());
        }
        copy.0
            .pending_defaults
            .store(self.has_pending_defaults(), Ordering::Release);

        let records = self.0.children.read().snapshot();
        let mut children = copy.0.children.write();
        for record in records {
            copy.link_record(&mut children, &record.copy());
        }
        drop(children);
        copy
    }

    /// Same type and equal children, in any order
    pub fn is_equal(&self, other: &Node) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if self.type_id() != other.type_id() {
            return false;
        }
        let mine = self.child_records();
        if mine.len() != other.child_count() {
            return false;
        }
        mine.iter().all(|info| {
            other
                .get_info(info.name())
                .is_some_and(|theirs| info.same_content(&theirs, false))
        })
    }

    /// Same type and equal children in the same order
    pub fn is_identical(&self, other: &Node) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if self.type_id() != other.type_id() {
            return false;
        }
        let mine = self.child_records();
        let theirs = other.child_records();
        mine.len() == theirs.len()
            && mine
                .iter()
                .zip(theirs.iter())
                .all(|(a, b)| a.same_content(b, true))
    }

    fn child_records(&self) -> Vec<Info> {
        self.ensure_defaults();
        self.0.children.read().snapshot()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("type", &self.type_name())
            .field("path", &self.path())
            .field("lifecycle", &self.lifecycle())
            .field("children", &self.0.children.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_node_is_stopped_root() {
        let node = Node::basic();
        assert_eq!(node.lifecycle(), Lifecycle::Stopped);
        assert!(node.is_root());
        assert_eq!(node.path(), "/");
        assert_eq!(node.type_name(), "node");
        assert!(node.behavior_as::<BasicNode>().is_some());
    }

    #[test]
    fn test_path_follows_reparenting() {
        let root = Node::basic();
        let a = Node::basic();
        let b = Node::basic();
        root.add("a", a.clone()).unwrap();
        a.add("b/c", b.clone()).unwrap();
        assert_eq!(b.path(), "/a/b%2Fc");

        root.remove("a").unwrap();
        assert_eq!(a.path(), "/");
        assert_eq!(b.path(), "/b%2Fc");
    }

    #[test]
    fn test_copy_is_independent() {
        let root = Node::basic();
        root.add("x", 1).unwrap();
        let child = Node::basic();
        child.add("y", "z").unwrap();
        root.add("child", child).unwrap();

        let copy = root.copy();
        assert!(copy.is_identical(&root));
        copy.put("x", 2).unwrap();
        assert_eq!(root.get_value("x").unwrap().as_i64(), Some(1));
        let copied_child = copy.get_node("child").unwrap();
        assert_eq!(copied_child.path(), "/child");
        assert!(!copied_child.ptr_eq(&root.get_node("child").unwrap()));
    }

    #[test]
    fn test_equal_ignores_order_identical_does_not() {
        let a = Node::basic();
        a.add("x", 1).unwrap();
        a.add("y", 2).unwrap();
        let b = Node::basic();
        b.add("y", 2).unwrap();
        b.add("x", 1).unwrap();

        assert!(a.is_equal(&b));
        assert!(!a.is_identical(&b));
        b.put("x", 3).unwrap();
        assert!(!a.is_equal(&b));
    }
}
