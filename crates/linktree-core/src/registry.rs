//! Process-wide default registry
//!
//! Maps each node type to its one canonical default instance, built on
//! first use by calling the type's `declare_defaults`. While a type is
//! being built its entry is a placeholder; anyone who sees the placeholder
//! (the bootstrap itself recursing, or another thread) is told the default
//! is not available yet instead of waiting for it.
//!
//! The registry also holds the type-name table used by the snapshot codec
//! and the per-kind null value singletons.

use std::any::TypeId;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::errors::{LinkTreeError, Result};
use crate::model::{Value, ValueKind};
use crate::node::{BasicNode, Node, NodeKind, NodeType, Role};
use crate::{log_op_end, log_op_error, log_op_start};

enum Entry {
    Building,
    Ready(Node),
}

/// Outcome of looking up a type's default
pub(crate) enum Resolution {
    /// The type's default is mid-bootstrap
    Building,
    Ready(Node),
}

pub struct DefaultRegistry {
    defaults: Mutex<FxHashMap<TypeId, Entry>>,
    types: RwLock<FxHashMap<&'static str, NodeKind>>,
    nulls: [Value; 6],
}

static GLOBAL: OnceLock<DefaultRegistry> = OnceLock::new();

/// Removes the placeholder unless bootstrap completed
struct PlaceholderGuard<'a> {
    registry: &'a DefaultRegistry,
    type_id: TypeId,
    armed: bool,
}

impl Drop for PlaceholderGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut defaults = self.registry.defaults.lock();
        if matches!(defaults.get(&self.type_id), Some(Entry::Building)) {
            defaults.remove(&self.type_id);
        }
    }
}

impl DefaultRegistry {
    fn new() -> Self {
        let mut types = FxHashMap::default();
        types.insert(BasicNode::TYPE_NAME, NodeKind::of::<BasicNode>());
        Self {
            defaults: Mutex::new(FxHashMap::default()),
            types: RwLock::new(types),
            nulls: ValueKind::ALL.map(Value::null_singleton),
        }
    }

    pub fn global() -> &'static DefaultRegistry {
        GLOBAL.get_or_init(DefaultRegistry::new)
    }

    /// Make `T` decodable by name before any instance of it is built
    pub fn register<T: NodeType>(&self) {
        self.register_kind(NodeKind::of::<T>());
    }

    pub(crate) fn register_kind(&self, kind: NodeKind) {
        if let Some(existing) = self.types.read().get(kind.type_name()) {
            if *existing != kind {
                tracing::warn!(
                    node_type = kind.type_name(),
                    "type name already registered to another type; keeping the first"
                );
            }
            return;
        }
        self.types
            .write()
            .entry(kind.type_name())
            .or_insert(kind);
    }

    pub fn kind_by_name(&self, name: &str) -> Option<NodeKind> {
        self.types.read().get(name).copied()
    }

    /// The shared null of `kind`
    pub fn null_value(&self, kind: ValueKind) -> Value {
        self.nulls[kind.index()].clone()
    }

    /// The default instance of `T`, building it if needed
    ///
    /// Returns `Ok(None)` while `T` is mid-bootstrap.
    ///
    /// # Errors
    ///
    /// Returns `DefaultBootstrapFailed` if building the default fails.
    pub fn default_instance<T: NodeType>(&self) -> Result<Option<Node>> {
        self.register::<T>();
        match self.resolve(NodeKind::of::<T>())? {
            Resolution::Ready(node) => Ok(Some(node)),
            Resolution::Building => Ok(None),
        }
    }

    /// True while `T`'s default is being built
    pub fn is_building<T: NodeType>(&self) -> bool {
        matches!(
            self.defaults.lock().get(&TypeId::of::<T>()),
            Some(Entry::Building)
        )
    }

    pub(crate) fn resolve(&self, kind: NodeKind) -> Result<Resolution> {
        {
            let mut defaults = self.defaults.lock();
            match defaults.get(&kind.type_id()) {
                Some(Entry::Ready(node)) => return Ok(Resolution::Ready(node.clone())),
                Some(Entry::Building) => return Ok(Resolution::Building),
                None => {
                    defaults.insert(kind.type_id(), Entry::Building);
                }
            }
        }

        let mut guard = PlaceholderGuard {
            registry: self,
            type_id: kind.type_id(),
            armed: true,
        };
        let started = Instant::now();
        log_op_start!("bootstrap_default", node_type = kind.type_name());

        let node = Node::raw(kind, kind.make_behavior(), Role::Bootstrapping);
        let declared =
            panic::catch_unwind(AssertUnwindSafe(|| node.behavior().declare_defaults(&node)));
        let failure = match declared {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err.to_string()),
            Err(_) => Some("declare_defaults panicked".to_string()),
        };
        if let Some(reason) = failure {
            let err = LinkTreeError::DefaultBootstrapFailed {
                type_name: kind.type_name().to_string(),
                reason,
            };
            let duration = started.elapsed().as_millis() as u64;
            log_op_error!(
                "bootstrap_default",
                err.clone(),
                duration_ms = duration,
                node_type = kind.type_name()
            );
            return Err(err);
        }
        node.set_role(Role::Default);

        self.defaults
            .lock()
            .insert(kind.type_id(), Entry::Ready(node.clone()));
        guard.armed = false;

        let duration = started.elapsed().as_millis() as u64;
        log_op_end!(
            "bootstrap_default",
            duration_ms = duration,
            node_type = kind.type_name(),
            children = node.0.children.read().len()
        );
        Ok(Resolution::Ready(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_type_is_preregistered() {
        let kind = DefaultRegistry::global().kind_by_name("node").unwrap();
        assert_eq!(kind, NodeKind::of::<BasicNode>());
        assert!(DefaultRegistry::global().kind_by_name("no-such-type").is_none());
    }

    #[test]
    fn test_basic_default_is_empty_and_immutable() {
        let default = DefaultRegistry::global()
            .default_instance::<BasicNode>()
            .unwrap()
            .unwrap();
        assert!(default.is_default_instance());
        assert_eq!(default.child_count(), 0);
        assert!(matches!(
            default.add("x", 1),
            Err(LinkTreeError::DefaultInstanceImmutable { .. })
        ));
        assert!(!DefaultRegistry::global().is_building::<BasicNode>());
    }

    #[test]
    fn test_null_singletons_per_kind() {
        let registry = DefaultRegistry::global();
        for kind in ValueKind::ALL {
            let a = registry.null_value(kind);
            assert!(a.is_null());
            assert_eq!(a.kind(), kind);
            assert!(a.same(&registry.null_value(kind)));
        }
    }
}
