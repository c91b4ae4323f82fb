use super::{ChildSnapshot, EncodeMode, NodeSnapshot};
use crate::errors::Result;
use crate::node::{Info, Node, Slot};

/// Encode a node tree
///
/// Transient children are never encoded. Children with no counterpart in the
/// default instance are always encoded in full. In [`EncodeMode::Diff`] the
/// others appear only when they diverge, and then only with the diverging
/// parts. A nested container is diffed against the node the default record
/// holds, so customised nested defaults are the baseline at every level.
pub fn encode(node: &Node, mode: EncodeMode) -> NodeSnapshot {
    encode_against(node, node.default_instance().as_ref(), mode)
}

fn encode_against(node: &Node, baseline: Option<&Node>, mode: EncodeMode) -> NodeSnapshot {
    let mut snapshot = NodeSnapshot::new(node.type_name());
    for info in node.children() {
        if info.is_transient() {
            continue;
        }
        let base = baseline.and_then(|b| b.get_info(info.name()));
        if let Some(entry) = encode_child(&info, base.as_ref(), mode) {
            snapshot.children.push(entry);
        }
    }
    if let Some(baseline) = baseline {
        snapshot.removed = baseline
            .children()
            .map(|template| template.name().to_string())
            .filter(|name| !node.contains(name))
            .collect();
    }
    snapshot
}

fn encode_child(info: &Info, base: Option<&Info>, mode: EncodeMode) -> Option<ChildSnapshot> {
    let mut entry = ChildSnapshot::named(info.name());
    let Some(base) = base else {
        let flags = info.flags();
        if !flags.is_empty() {
            entry.flags = Some(flags);
        }
        entry.metadata = info.metadata();
        match info.slot() {
            Slot::Value(value) => entry.value = Some(value),
            Slot::Node(child) => entry.node = Some(encode(&child, mode)),
        }
        return Some(entry);
    };

    let full = mode == EncodeMode::Full;
    let divergence = info.divergence_from(base);
    if full || divergence.flags {
        entry.flags = Some(info.flags());
    }
    if divergence.metadata {
        entry.metadata = Some(info.metadata().unwrap_or_default());
    } else if full {
        entry.metadata = info.metadata();
    }
    match (info.slot(), base.node()) {
        (Slot::Node(child), Some(base_node)) if !divergence.slot_type => {
            let nested = encode_against(&child, Some(&base_node), mode);
            if full || !nested.children.is_empty() || !nested.removed.is_empty() {
                entry.node = Some(nested);
            }
        }
        (Slot::Node(child), _) => entry.node = Some(encode(&child, mode)),
        (Slot::Value(value), _) => {
            if full || divergence.slot_type || divergence.value {
                entry.value = Some(value);
            }
        }
    }
    let emitted = entry.flags.is_some()
        || entry.metadata.is_some()
        || entry.value.is_some()
        || entry.node.is_some();
    (full || emitted).then_some(entry)
}

/// Diff-mode snapshot as compact JSON
///
/// # Errors
///
/// Returns `Serialization` if encoding fails.
pub fn to_json(node: &Node) -> Result<String> {
    Ok(serde_json::to_string(&encode(node, EncodeMode::Diff))?)
}

/// # Errors
///
/// Returns `Serialization` if encoding fails.
pub fn to_json_pretty(node: &Node) -> Result<String> {
    Ok(serde_json::to_string_pretty(&encode(node, EncodeMode::Diff))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_children_are_encoded_in_full() {
        let node = Node::basic();
        node.add("a", 1).unwrap();
        node.add("b", Node::basic()).unwrap();
        let snapshot = encode(&node, EncodeMode::Diff);
        assert_eq!(snapshot.node_type, "node");
        assert_eq!(snapshot.children.len(), 2);
        assert!(snapshot.child("a").unwrap().value.is_some());
        assert_eq!(snapshot.child("b").unwrap().node.as_ref().unwrap().node_type, "node");
    }

    #[test]
    fn test_transient_children_are_skipped() {
        let node = Node::basic();
        node.add("scratch", 1).unwrap().set_transient(true).unwrap();
        node.add("kept", 2).unwrap();
        for mode in [EncodeMode::Diff, EncodeMode::Full] {
            let snapshot = encode(&node, mode);
            assert!(snapshot.child("scratch").is_none());
            assert!(snapshot.child("kept").is_some());
        }
    }

    #[test]
    fn test_json_omits_empty_fields() {
        let node = Node::basic();
        node.add("a", 1).unwrap();
        let text = to_json(&node).unwrap();
        assert_eq!(
            text,
            r#"{"type":"node","children":[{"name":"a","value":{"kind":"number","value":1}}]}"#
        );
    }
}
