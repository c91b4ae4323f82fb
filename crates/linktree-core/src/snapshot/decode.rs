use std::time::Instant;

use super::{ChildSnapshot, NodeSnapshot};
use crate::errors::{LinkTreeError, Result};
use crate::node::{Info, Node, Slot};
use crate::registry::DefaultRegistry;
use crate::{log_op_end, log_op_error, log_op_start};

/// Build a new, stopped tree from a snapshot
///
/// # Errors
///
/// - `UnknownNodeType` if a type name is not registered
/// - `InvalidSnapshot` if an entry holds both or neither of value and node
/// - any structural error raised while applying entries
pub fn decode(snapshot: &NodeSnapshot) -> Result<Node> {
    let kind = DefaultRegistry::global()
        .kind_by_name(&snapshot.node_type)
        .ok_or_else(|| LinkTreeError::UnknownNodeType {
            type_name: snapshot.node_type.clone(),
        })?;
    let node = Node::instantiate_kind(kind)?;
    apply(&node, snapshot)?;
    Ok(node)
}

/// Parse and decode a JSON snapshot
///
/// # Errors
///
/// `Serialization` for malformed JSON, otherwise as [`decode`].
pub fn from_json(text: &str) -> Result<Node> {
    let snapshot: NodeSnapshot = serde_json::from_str(text)?;
    decode(&snapshot)
}

/// Apply a snapshot onto an existing stopped node of the same type
///
/// # Errors
///
/// - `AlreadyRunning` if the node is not stopped
/// - `InvalidSnapshot` if the snapshot is for another type
/// - otherwise as [`decode`]
pub fn restore_into(node: &Node, snapshot: &NodeSnapshot) -> Result<()> {
    let started = Instant::now();
    log_op_start!("snapshot_restore", path = %node.path(), node_type = node.type_name());

    let result = if node.is_running() {
        Err(LinkTreeError::AlreadyRunning { path: node.path() })
    } else if snapshot.node_type != node.type_name() {
        Err(LinkTreeError::InvalidSnapshot {
            reason: format!(
                "snapshot of {} cannot be restored into {}",
                snapshot.node_type,
                node.type_name()
            ),
        })
    } else {
        apply(node, snapshot)
    };

    let duration = started.elapsed().as_millis() as u64;
    match &result {
        Ok(()) => {
            log_op_end!("snapshot_restore", duration_ms = duration, path = %node.path());
        }
        Err(err) => {
            log_op_error!(
                "snapshot_restore",
                err.clone(),
                duration_ms = duration,
                path = %node.path()
            );
        }
    }
    result
}

fn apply(node: &Node, snapshot: &NodeSnapshot) -> Result<()> {
    for name in &snapshot.removed {
        if let Some(info) = node.get_info(name) {
            if !info.is_permanent() {
                node.remove_info(&info)?;
            }
        }
    }
    for entry in &snapshot.children {
        apply_child(node, entry)?;
    }
    Ok(())
}

fn apply_child(node: &Node, entry: &ChildSnapshot) -> Result<()> {
    let info = match node.get_info(&entry.name) {
        Some(existing) => {
            apply_slot(node, &existing, entry)?;
            existing
        }
        None => node.add(&entry.name, new_slot(entry)?)?,
    };
    if let Some(flags) = entry.flags {
        info.set_flags(flags)?;
    }
    if let Some(metadata) = &entry.metadata {
        info.set_metadata(Some(metadata.clone()))?;
    }
    Ok(())
}

fn apply_slot(node: &Node, existing: &Info, entry: &ChildSnapshot) -> Result<()> {
    match (&entry.value, &entry.node) {
        (Some(value), None) => node.put_info(existing, value.clone()),
        (None, Some(nested)) => match existing.node() {
            Some(current) if current.type_name() == nested.node_type => apply(&current, nested),
            _ => node.put_info(existing, decode(nested)?),
        },
        (None, None) => Ok(()),
        (Some(_), Some(_)) => Err(both_slots(entry)),
    }
}

fn new_slot(entry: &ChildSnapshot) -> Result<Slot> {
    match (&entry.value, &entry.node) {
        (Some(value), None) => Ok(Slot::Value(value.clone())),
        (None, Some(nested)) => Ok(Slot::Node(decode(nested)?)),
        (None, None) => Err(LinkTreeError::InvalidSnapshot {
            reason: format!("child {} has neither a value nor a node", entry.name),
        }),
        (Some(_), Some(_)) => Err(both_slots(entry)),
    }
}

fn both_slots(entry: &ChildSnapshot) -> LinkTreeError {
    LinkTreeError::InvalidSnapshot {
        reason: format!("child {} has both a value and a node", entry.name),
    }
}
