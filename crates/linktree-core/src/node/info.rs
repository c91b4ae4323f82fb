//! Child records
//!
//! An [`Info`] is the record for one named child: flags, optional metadata
//! and the held [`Slot`]. Records synthesized from a type's default instance
//! are proxies that keep a link to the default's record; everything else is
//! owned. Divergence predicates are plain functions over the two variants.

use std::fmt;
use std::sync::{Arc, Weak};

use linktree_core_types::path;
use parking_lot::{Mutex, RwLock};

use super::slot::Slot;
use super::{Node, NodeInner};
use crate::errors::{LinkTreeError, Result};
use crate::model::{InfoFlags, Metadata, Value};

/// Handle to a child record
#[derive(Clone)]
pub struct Info(pub(crate) Arc<InfoCell>);

pub(crate) struct InfoCell {
    name: Arc<str>,
    origin: Origin,
    state: RwLock<InfoState>,
    owner: Mutex<Owner>,
}

#[derive(Clone)]
pub(crate) enum Origin {
    Owned,
    /// Overlays the record of the same name on the type's default instance
    Proxy(Info),
}

#[derive(Clone)]
pub(crate) struct InfoState {
    flags: InfoFlags,
    slot: Slot,
    metadata: Option<Metadata>,
}

#[derive(Default)]
struct Owner {
    node: Weak<NodeInner>,
    key: Option<usize>,
}

fn normalize(metadata: Option<Metadata>) -> Option<Metadata> {
    metadata.filter(|m| !m.is_empty())
}

impl Info {
    fn from_parts(name: Arc<str>, origin: Origin, state: InfoState) -> Info {
        Info(Arc::new(InfoCell {
            name,
            origin,
            state: RwLock::new(state),
            owner: Mutex::new(Owner::default()),
        }))
    }

    pub(crate) fn owned(
        name: Arc<str>,
        flags: InfoFlags,
        slot: Slot,
        metadata: Option<Metadata>,
    ) -> Info {
        Info::from_parts(
            name,
            Origin::Owned,
            InfoState {
                flags,
                slot,
                metadata: normalize(metadata),
            },
        )
    }

    /// A proxy for `template`, holding a copy of its current slot
    pub(crate) fn proxy_of(template: &Info) -> Info {
        let state = template.state();
        Info::from_parts(
            template.0.name.clone(),
            Origin::Proxy(template.clone()),
            InfoState {
                flags: state.flags,
                slot: state.slot.copy(),
                metadata: state.metadata,
            },
        )
    }

    pub(crate) fn state(&self) -> InfoState {
        self.0.state.read().clone()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        self.0.name.clone()
    }

    pub fn ptr_eq(&self, other: &Info) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // ----- slot -----

    pub fn slot(&self) -> Slot {
        self.0.state.read().slot.clone()
    }

    pub fn value(&self) -> Option<Value> {
        self.0.state.read().slot.as_value().cloned()
    }

    pub fn node(&self) -> Option<Node> {
        self.0.state.read().slot.as_node().cloned()
    }

    pub fn is_node(&self) -> bool {
        self.0.state.read().slot.is_node()
    }

    pub fn is_value(&self) -> bool {
        self.0.state.read().slot.is_value()
    }

    pub(crate) fn replace_slot(&self, slot: Slot) -> Slot {
        std::mem::replace(&mut self.0.state.write().slot, slot)
    }

    // ----- ownership -----

    /// The container this record belongs to
    pub fn parent(&self) -> Option<Node> {
        let owner = self.0.owner.lock();
        if owner.key.is_none() {
            return None;
        }
        owner.node.upgrade().map(Node)
    }

    pub fn is_attached(&self) -> bool {
        self.0.owner.lock().key.is_some()
    }

    pub fn is_owned_by(&self, node: &Node) -> bool {
        self.key_in(node).is_some()
    }

    /// Arena key of this record inside `node`, if `node` owns it
    pub(crate) fn key_in(&self, node: &Node) -> Option<usize> {
        let owner = self.0.owner.lock();
        if std::ptr::eq(owner.node.as_ptr(), Arc::as_ptr(&node.0)) {
            owner.key
        } else {
            None
        }
    }

    /// Whether a node pointing at this record is taken
    ///
    /// True while the record is attached to a live container, and also
    /// before its first attach, when an insert is still in flight.
    pub(crate) fn holds_claim(&self) -> bool {
        let owner = self.0.owner.lock();
        owner.key.is_none() || owner.node.strong_count() > 0
    }

    pub(crate) fn attach(&self, node: &Node, key: usize) {
        let mut owner = self.0.owner.lock();
        owner.node = Arc::downgrade(&node.0);
        owner.key = Some(key);
    }

    pub(crate) fn detach(&self) {
        let mut owner = self.0.owner.lock();
        owner.node = Weak::new();
        owner.key = None;
    }

    // ----- flags -----

    pub fn flags(&self) -> InfoFlags {
        self.0.state.read().flags
    }

    pub fn has_flag(&self, flag: InfoFlags) -> bool {
        self.flags().contains(flag)
    }

    pub fn is_admin(&self) -> bool {
        self.has_flag(InfoFlags::ADMIN)
    }

    pub fn is_hidden(&self) -> bool {
        self.has_flag(InfoFlags::HIDDEN)
    }

    pub fn is_transient(&self) -> bool {
        self.has_flag(InfoFlags::TRANSIENT)
    }

    pub fn is_read_only(&self) -> bool {
        self.has_flag(InfoFlags::READ_ONLY)
    }

    pub fn is_permanent(&self) -> bool {
        self.has_flag(InfoFlags::PERMANENT)
    }

    pub fn is_default_on_copy(&self) -> bool {
        self.has_flag(InfoFlags::DEFAULT_ON_COPY)
    }

    /// Replace the whole flag set
    ///
    /// Notifies the owning container when the set actually changes.
    ///
    /// # Errors
    ///
    /// - `DefaultInstanceImmutable` if the record belongs to a type's
    ///   default instance
    /// - `PermanentChild` if `flags` clears `PERMANENT` on a proxy for a
    ///   permanent default record
    pub fn set_flags(&self, flags: InfoFlags) -> Result<()> {
        let owner = self.parent();
        if let Some(owner) = &owner {
            owner.ensure_mutable()?;
        }
        if let Origin::Proxy(default) = &self.0.origin {
            if default.is_permanent() && !flags.contains(InfoFlags::PERMANENT) {
                return Err(LinkTreeError::PermanentChild {
                    path: owner.map_or_else(|| path::ROOT.to_string(), |o| o.path()),
                    name: self.name().to_string(),
                });
            }
        }
        let changed = {
            let mut state = self.0.state.write();
            let changed = state.flags != flags;
            state.flags = flags;
            changed
        };
        if let (true, Some(owner)) = (changed, owner) {
            owner.info_changed(self);
        }
        Ok(())
    }

    /// Set or clear one or more flags
    ///
    /// # Errors
    ///
    /// See [`Info::set_flags`].
    pub fn set_flag(&self, flag: InfoFlags, on: bool) -> Result<()> {
        let mut flags = self.flags();
        flags.set(flag, on);
        self.set_flags(flags)
    }

    /// # Errors
    ///
    /// See [`Info::set_flags`].
    pub fn set_admin(&self, on: bool) -> Result<()> {
        self.set_flag(InfoFlags::ADMIN, on)
    }

    /// # Errors
    ///
    /// See [`Info::set_flags`].
    pub fn set_hidden(&self, on: bool) -> Result<()> {
        self.set_flag(InfoFlags::HIDDEN, on)
    }

    /// # Errors
    ///
    /// See [`Info::set_flags`].
    pub fn set_transient(&self, on: bool) -> Result<()> {
        self.set_flag(InfoFlags::TRANSIENT, on)
    }

    /// # Errors
    ///
    /// See [`Info::set_flags`].
    pub fn set_read_only(&self, on: bool) -> Result<()> {
        self.set_flag(InfoFlags::READ_ONLY, on)
    }

    /// # Errors
    ///
    /// See [`Info::set_flags`].
    pub fn set_permanent(&self, on: bool) -> Result<()> {
        self.set_flag(InfoFlags::PERMANENT, on)
    }

    /// # Errors
    ///
    /// See [`Info::set_flags`].
    pub fn set_default_on_copy(&self, on: bool) -> Result<()> {
        self.set_flag(InfoFlags::DEFAULT_ON_COPY, on)
    }

    // ----- metadata -----

    pub fn metadata(&self) -> Option<Metadata> {
        self.0.state.read().metadata.clone()
    }

    /// Replace the metadata map; an empty map is stored as none
    ///
    /// # Errors
    ///
    /// Returns `DefaultInstanceImmutable` if the record belongs to a type's
    /// default instance.
    pub fn set_metadata(&self, metadata: Option<Metadata>) -> Result<()> {
        let owner = self.parent();
        if let Some(owner) = &owner {
            owner.ensure_mutable()?;
        }
        let metadata = normalize(metadata);
        let changed = {
            let mut state = self.0.state.write();
            let changed = state.metadata != metadata;
            state.metadata = metadata;
            changed
        };
        if let (true, Some(owner)) = (changed, owner) {
            owner.info_changed(self);
        }
        Ok(())
    }

    /// Set a single metadata entry
    ///
    /// # Errors
    ///
    /// See [`Info::set_metadata`].
    pub fn set_metadata_entry(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<()> {
        let mut metadata = self.metadata().unwrap_or_default();
        metadata.set(key, value);
        self.set_metadata(Some(metadata))
    }

    // ----- defaults -----

    pub fn is_proxy(&self) -> bool {
        matches!(self.0.origin, Origin::Proxy(_))
    }

    /// The default instance's record this one overlays
    pub fn default_info(&self) -> Option<Info> {
        match &self.0.origin {
            Origin::Proxy(default) => Some(default.clone()),
            Origin::Owned => None,
        }
    }

    /// Flags match the default record
    ///
    /// Owned records have no default, so only an empty flag set matches.
    pub fn equals_default_state(&self) -> bool {
        let local = self.state();
        match &self.0.origin {
            Origin::Owned => local.flags.is_empty(),
            Origin::Proxy(default) => state_matches(&local, &default.state()),
        }
    }

    /// Slot type matches the default record
    pub fn equals_default_type(&self) -> bool {
        match &self.0.origin {
            Origin::Owned => false,
            Origin::Proxy(default) => type_matches(&self.state(), &default.state()),
        }
    }

    /// Slot content matches the default record
    pub fn equals_default_value(&self) -> bool {
        match &self.0.origin {
            Origin::Owned => false,
            Origin::Proxy(default) => value_matches(&self.state(), &default.state()),
        }
    }

    /// Metadata matches the default record (none and empty are equal)
    pub fn equals_default_metadata(&self) -> bool {
        let local = self.state();
        match &self.0.origin {
            Origin::Owned => local.metadata.is_none(),
            Origin::Proxy(default) => metadata_matches(&local, &default.state()),
        }
    }

    /// No divergence at all; such records can be omitted from snapshots
    pub fn equals_default(&self) -> bool {
        match &self.0.origin {
            Origin::Owned => false,
            Origin::Proxy(default) => {
                let local = self.state();
                let default = default.state();
                state_matches(&local, &default)
                    && metadata_matches(&local, &default)
                    && type_matches(&local, &default)
                    && value_matches(&local, &default)
            }
        }
    }

    /// Compare against a record of the same name in another container
    ///
    /// Snapshots diff nested containers against the default record's node,
    /// whose records are not the ones a nested copy proxies.
    pub(crate) fn divergence_from(&self, base: &Info) -> Divergence {
        let local = self.state();
        let base = base.state();
        Divergence {
            flags: !state_matches(&local, &base),
            metadata: !metadata_matches(&local, &base),
            slot_type: !type_matches(&local, &base),
            value: !value_matches(&local, &base),
        }
    }

    /// Independent record with a copied slot
    ///
    /// Proxies keep their default link. With `DEFAULT_ON_COPY` set, a proxy
    /// copies the default record's current slot instead of its own.
    pub fn copy(&self) -> Info {
        let state = self.state();
        let slot = match &self.0.origin {
            Origin::Proxy(default) if state.flags.contains(InfoFlags::DEFAULT_ON_COPY) => {
                default.slot().copy()
            }
            _ => state.slot.copy(),
        };
        Info::from_parts(
            self.0.name.clone(),
            self.0.origin.clone(),
            InfoState {
                flags: state.flags,
                slot,
                metadata: state.metadata,
            },
        )
    }

    /// Same name, flags, metadata and slot content
    ///
    /// `ordered` selects order-sensitive comparison of nested containers.
    pub(crate) fn same_content(&self, other: &Info, ordered: bool) -> bool {
        if self.name() != other.name() {
            return false;
        }
        let a = self.state();
        let b = other.state();
        a.flags == b.flags
            && a.metadata == b.metadata
            && if ordered {
                a.slot.is_identical(&b.slot)
            } else {
                a.slot.is_equal(&b.slot)
            }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Divergence {
    pub flags: bool,
    pub metadata: bool,
    pub slot_type: bool,
    pub value: bool,
}

fn state_matches(local: &InfoState, default: &InfoState) -> bool {
    local.flags == default.flags
}

fn type_matches(local: &InfoState, default: &InfoState) -> bool {
    local.slot.slot_type() == default.slot.slot_type()
}

fn value_matches(local: &InfoState, default: &InfoState) -> bool {
    local.slot.is_equal(&default.slot)
}

fn metadata_matches(local: &InfoState, default: &InfoState) -> bool {
    normalize(local.metadata.clone()) == normalize(default.metadata.clone())
}

impl fmt::Debug for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Info")
            .field("name", &self.name())
            .field("proxy", &self.is_proxy())
            .field("flags", &state.flags)
            .field("slot", &state.slot)
            .finish()
    }
}
