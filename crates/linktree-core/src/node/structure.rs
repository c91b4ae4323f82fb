//! Structural mutation and lookup
//!
//! Mutations take the child-list write lock only for the splice itself.
//! Starting new children, hooks and events all run after the lock is
//! released, and only when the container is running.

use std::sync::Arc;

use super::hooks::invoke_hook;
use super::{Info, Node, Role, Slot};
use crate::errors::{LinkTreeError, Result};
use crate::model::{InfoFlags, Value};
use crate::subscription::{NodeEvent, Topic};

impl Node {
    /// Add a new child
    ///
    /// # Errors
    ///
    /// - `DuplicateChild` if the name is taken
    /// - `AlreadyParented` if the slot is a node that already has a parent
    /// - `CycleDetected` if the slot is this node or one of its ancestors
    /// - `DefaultInstanceImmutable` if this node (or the slot) is a default
    ///   instance
    pub fn add(&self, name: &str, slot: impl Into<Slot>) -> Result<Info> {
        self.ensure_mutable()?;
        self.insert_child(name, slot.into(), InfoFlags::empty())
    }

    /// Declare a schema-fixed child of this type's default instance
    ///
    /// Only valid inside [`NodeBehavior::declare_defaults`]. The record is
    /// marked permanent.
    ///
    /// # Errors
    ///
    /// Returns `NotBootstrapping` outside of default construction, otherwise
    /// the same errors as [`Node::add`].
    ///
    /// [`NodeBehavior::declare_defaults`]: super::NodeBehavior::declare_defaults
    pub fn declare_default(&self, name: &str, slot: impl Into<Slot>) -> Result<Info> {
        if self.role() != Role::Bootstrapping {
            return Err(LinkTreeError::NotBootstrapping {
                type_name: self.type_name().to_string(),
            });
        }
        self.insert_child(name, slot.into(), InfoFlags::PERMANENT)
    }

    fn insert_child(&self, name: &str, slot: Slot, flags: InfoFlags) -> Result<Info> {
        self.ensure_defaults();
        if self.0.children.read().contains(name) {
            return Err(self.duplicate(name));
        }

        let info = Info::owned(Arc::from(name), flags, slot, None);
        let child = info.node();
        if let Some(child) = &child {
            child.claim_parent(&info, self)?;
        }

        let inserted = {
            let mut children = self.0.children.write();
            if children.contains(name) {
                false
            } else {
                let key = children.push_back(info.clone());
                info.attach(self, key);
                true
            }
        };
        if !inserted {
            if let Some(child) = &child {
                child.release_parent();
            }
            return Err(self.duplicate(name));
        }

        tracing::debug!(path = %self.path(), child = name, "child added");
        if self.is_running() {
            if let Some(child) = &child {
                self.bring_up(child);
            }
            invoke_hook(self, "on_child_added", || {
                self.behavior().on_child_added(self, &info)
            });
            self.fire(&Topic::Node, &NodeEvent::ChildAdded, Some(&info));
        }
        Ok(info)
    }

    fn duplicate(&self, name: &str) -> LinkTreeError {
        LinkTreeError::DuplicateChild {
            path: self.path(),
            name: name.to_string(),
        }
    }

    /// Replace a child's slot, or add the child if the name is free
    ///
    /// Putting a value equal to the current one changes nothing and fires
    /// nothing.
    ///
    /// # Errors
    ///
    /// Same as [`Node::add`] (except `DuplicateChild`).
    pub fn put(&self, name: &str, slot: impl Into<Slot>) -> Result<Info> {
        self.ensure_mutable()?;
        self.ensure_defaults();
        let slot = slot.into();
        match self.get_info(name) {
            Some(info) => {
                self.replace_slot(&info, slot)?;
                Ok(info)
            }
            None => self.insert_child(name, slot, InfoFlags::empty()),
        }
    }

    /// Replace the slot of a record this node owns
    ///
    /// # Errors
    ///
    /// Returns `ForeignInfo` if `info` belongs to another container, plus the
    /// node-slot errors of [`Node::add`].
    pub fn put_info(&self, info: &Info, slot: impl Into<Slot>) -> Result<()> {
        self.ensure_mutable()?;
        self.replace_slot(info, slot.into())
    }

    fn replace_slot(&self, info: &Info, slot: Slot) -> Result<()> {
        if !info.is_owned_by(self) {
            return Err(LinkTreeError::ForeignInfo {
                path: self.path(),
                name: info.name().to_string(),
            });
        }
        match (&slot, info.slot()) {
            (Slot::Node(new), Slot::Node(old)) if new.ptr_eq(&old) => return Ok(()),
            (Slot::Value(new), Slot::Value(old)) if *new == old => return Ok(()),
            _ => {}
        }
        if let Slot::Node(new) = &slot {
            new.claim_parent(info, self)?;
        }
        if let Some(old) = info.node() {
            old.stop();
        }
        if let Slot::Node(old) = info.replace_slot(slot) {
            old.release_parent();
        }

        tracing::debug!(path = %self.path(), child = info.name(), "child replaced");
        if self.is_running() {
            if let Some(new) = info.node() {
                self.bring_up(&new);
            }
            invoke_hook(self, "on_child_changed", || {
                self.behavior().on_child_changed(self, info)
            });
            self.fire(&Topic::Value, &NodeEvent::ChildChanged, Some(info));
        }
        Ok(())
    }

    /// Remove a child by name
    ///
    /// Returns `Ok(None)` if there is no such child.
    ///
    /// # Errors
    ///
    /// Returns `PermanentChild` if the child is permanent; the tree is left
    /// unchanged.
    pub fn remove(&self, name: &str) -> Result<Option<Info>> {
        self.ensure_mutable()?;
        self.ensure_defaults();
        match self.get_info(name) {
            Some(info) => self.remove_info(&info).map(Some),
            None => Ok(None),
        }
    }

    /// Remove a specific record
    ///
    /// # Errors
    ///
    /// - `PermanentChild` if the record is permanent
    /// - `ForeignInfo` if this node does not own the record
    pub fn remove_info(&self, info: &Info) -> Result<Info> {
        self.ensure_mutable()?;
        if info.is_permanent() {
            return Err(LinkTreeError::PermanentChild {
                path: self.path(),
                name: info.name().to_string(),
            });
        }

        let removed = {
            let mut children = self.0.children.write();
            info.key_in(self).and_then(|key| children.unlink(key))
        };
        let Some(removed) = removed else {
            return Err(LinkTreeError::ForeignInfo {
                path: self.path(),
                name: info.name().to_string(),
            });
        };
        removed.detach();
        if let Some(child) = removed.node() {
            child.stop();
            child.release_parent();
        }

        tracing::debug!(path = %self.path(), child = removed.name(), "child removed");
        if self.is_running() {
            invoke_hook(self, "on_child_removed", || {
                self.behavior().on_child_removed(self, &removed)
            });
            self.fire(&Topic::Node, &NodeEvent::ChildRemoved, Some(&removed));
        }
        self.unsubscribe_child(&removed);
        Ok(removed)
    }

    /// Remove every non-permanent child, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns `DefaultInstanceImmutable` on a default instance.
    pub fn clear(&self) -> Result<usize> {
        self.ensure_mutable()?;
        let mut removed = 0;
        for info in self.children() {
            if !info.is_permanent() && self.remove_info(&info).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    // ----- lookup -----

    pub fn get(&self, name: &str) -> Option<Slot> {
        self.get_info(name).map(|info| info.slot())
    }

    pub fn get_info(&self, name: &str) -> Option<Info> {
        self.ensure_defaults();
        self.0.children.read().get(name).cloned()
    }

    pub fn get_node(&self, name: &str) -> Option<Node> {
        self.get_info(name).and_then(|info| info.node())
    }

    pub fn get_value(&self, name: &str) -> Option<Value> {
        self.get_info(name).and_then(|info| info.value())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ensure_defaults();
        self.0.children.read().contains(name)
    }

    pub fn child_count(&self) -> usize {
        self.ensure_defaults();
        self.0.children.read().len()
    }

    /// Child records in insertion order
    ///
    /// Iterates a snapshot, so the tree may be mutated while iterating.
    pub fn children(&self) -> impl Iterator<Item = Info> {
        self.child_records().into_iter()
    }

    /// Container-valued children in insertion order
    pub fn child_nodes(&self) -> impl Iterator<Item = Node> {
        self.children().filter_map(|info| info.node())
    }

    /// Value-holding child records in insertion order
    pub fn child_values(&self) -> impl Iterator<Item = Info> {
        self.children().filter(|info| info.is_value())
    }

    /// Start (and stabilize, if this node is stable) a newly placed child
    pub(crate) fn bring_up(&self, child: &Node) {
        if child.is_stopped() {
            if let Err(err) = child.start() {
                tracing::debug!(path = %child.path(), error = %err, "child start skipped");
            }
        }
        if self.is_stable() && child.is_started() {
            if let Err(err) = child.stable() {
                tracing::debug!(path = %child.path(), error = %err, "child stable skipped");
            }
        }
    }
}
