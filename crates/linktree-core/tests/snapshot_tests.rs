#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{Counter, Folder, Thermostat};
use linktree_core::snapshot::{
    compute_tree_digest, decode, encode, from_json, restore_into, to_json, EncodeMode,
};
use linktree_core::{
    DefaultRegistry, InfoFlags, LinkTreeError, Node, NodeBehavior, NodeType, Result,
};

#[test]
fn test_fresh_instance_encodes_to_its_type_only() {
    let counter = Node::new::<Counter>().unwrap();
    assert_eq!(to_json(&counter).unwrap(), r#"{"type":"counter"}"#);
}

#[test]
fn test_only_diverging_parts_are_encoded() {
    let counter = Node::new::<Counter>().unwrap();
    counter.put("count", 5).unwrap();
    counter.get_info("label").unwrap().set_hidden(true).unwrap();

    let snapshot = encode(&counter, EncodeMode::Diff);
    assert_eq!(snapshot.children.len(), 2);

    let count = snapshot.child("count").unwrap();
    assert_eq!(count.value.as_ref().unwrap().as_i64(), Some(5));
    assert!(count.flags.is_none());
    assert!(count.metadata.is_none());

    let label = snapshot.child("label").unwrap();
    assert!(label.value.is_none());
    assert_eq!(label.flags, Some(InfoFlags::PERMANENT | InfoFlags::HIDDEN));
}

#[test]
fn test_full_mode_includes_defaults() {
    let counter = Node::new::<Counter>().unwrap();
    let snapshot = encode(&counter, EncodeMode::Full);
    assert_eq!(snapshot.children.len(), 2);
    let count = snapshot.child("count").unwrap();
    assert_eq!(count.value.as_ref().unwrap().as_i64(), Some(0));
    assert_eq!(count.flags, Some(InfoFlags::PERMANENT));
}

#[test]
fn test_round_trip_restores_defaults_and_divergence() {
    let folder = Node::new::<Folder>().unwrap();
    folder.put("enabled", false).unwrap();
    folder
        .get_node("primary")
        .unwrap()
        .put("count", 7)
        .unwrap();
    folder.add("extra", Node::new::<Thermostat>().unwrap()).unwrap();
    folder
        .get_info("extra")
        .unwrap()
        .set_metadata_entry("room", serde_json::json!("kitchen"))
        .unwrap();

    let text = to_json(&folder).unwrap();
    let rebuilt = from_json(&text).unwrap();

    assert!(rebuilt.is_type::<Folder>());
    assert!(rebuilt.is_equal(&folder));
    assert!(rebuilt.is_identical(&folder));
    assert!(rebuilt.is_stopped());

    let primary = rebuilt.get_info("primary").unwrap();
    assert!(primary.is_proxy());
    assert!(!primary.equals_default_value());
    assert_eq!(
        rebuilt.get_node("primary").unwrap().get_value("count").unwrap().as_i64(),
        Some(7)
    );
    assert!(rebuilt.get_info("notes").unwrap().equals_default());
    assert!(!rebuilt.get_info("extra").unwrap().is_proxy());
    assert_eq!(
        rebuilt.get_info("extra").unwrap().metadata().unwrap().get("room"),
        Some(&serde_json::json!("kitchen"))
    );
}

#[test]
fn test_untouched_nested_defaults_are_omitted() {
    let folder = Node::new::<Folder>().unwrap();
    folder.put("enabled", false).unwrap();
    let snapshot = encode(&folder, EncodeMode::Diff);
    assert_eq!(snapshot.children.len(), 1);
    assert!(snapshot.child("primary").is_none());
}

#[test]
fn test_removed_defaults_stay_removed() {
    let folder = Node::new::<Folder>().unwrap();
    folder.remove("notes").unwrap();
    let snapshot = encode(&folder, EncodeMode::Diff);
    assert_eq!(snapshot.removed, vec!["notes".to_string()]);

    let rebuilt = decode(&snapshot).unwrap();
    assert!(!rebuilt.contains("notes"));
    assert!(rebuilt.is_identical(&folder));
}

#[test]
fn test_transient_children_are_not_persisted() {
    let counter = Node::new::<Counter>().unwrap();
    counter.add("scratch", 1).unwrap().set_transient(true).unwrap();
    counter.put("count", 2).unwrap();

    let rebuilt = from_json(&to_json(&counter).unwrap()).unwrap();
    assert!(!rebuilt.contains("scratch"));
    assert_eq!(rebuilt.get_value("count").unwrap().as_i64(), Some(2));
}

#[test]
fn test_restore_into_populates_silently_then_starts() {
    let source = Node::new::<Counter>().unwrap();
    source.put("count", 11).unwrap();
    source.add("extra", "x").unwrap();
    let snapshot = encode(&source, EncodeMode::Diff);

    let target = Node::new::<Counter>().unwrap();
    restore_into(&target, &snapshot).unwrap();
    assert!(target.is_equal(&source));

    target.start().unwrap();
    target.stable().unwrap();
    assert!(target.is_stable());
}

#[test]
fn test_restore_into_rejects_other_types() {
    let snapshot = encode(&Node::new::<Counter>().unwrap(), EncodeMode::Diff);
    let target = Node::new::<Thermostat>().unwrap();
    let err = restore_into(&target, &snapshot).unwrap_err();
    assert!(matches!(err, LinkTreeError::InvalidSnapshot { .. }));
}

#[test]
fn test_replaced_nested_type_round_trips() {
    let folder = Node::new::<Folder>().unwrap();
    folder.put("primary", Node::new::<Thermostat>().unwrap()).unwrap();
    let snapshot = encode(&folder, EncodeMode::Diff);
    let primary = snapshot.child("primary").unwrap();
    assert_eq!(primary.node.as_ref().unwrap().node_type, "thermostat");

    let rebuilt = decode(&snapshot).unwrap();
    assert!(rebuilt.get_node("primary").unwrap().is_type::<Thermostat>());
    assert!(!rebuilt.get_info("primary").unwrap().equals_default_type());
}

/// Declares `inner` as a counter already moved off its own default
#[derive(Default)]
struct Shelf;

impl NodeBehavior for Shelf {
    fn declare_defaults(&self, node: &Node) -> Result<()> {
        let inner = Node::new::<Counter>()?;
        inner.put("count", 9)?;
        node.declare_default("inner", inner)?;
        Ok(())
    }
}

impl NodeType for Shelf {
    const TYPE_NAME: &'static str = "shelf";
}

#[test]
fn test_customised_nested_default_is_the_baseline() {
    let shelf = Node::new::<Shelf>().unwrap();
    assert_eq!(to_json(&shelf).unwrap(), r#"{"type":"shelf"}"#);
    let rebuilt = from_json(r#"{"type":"shelf"}"#).unwrap();
    assert_eq!(
        rebuilt.get_node("inner").unwrap().get_value("count").unwrap().as_i64(),
        Some(9)
    );
}

#[test]
fn test_nested_value_reset_to_its_own_type_default_round_trips() {
    let shelf = Node::new::<Shelf>().unwrap();
    shelf.get_node("inner").unwrap().put("count", 0).unwrap();

    let snapshot = encode(&shelf, EncodeMode::Diff);
    let inner = snapshot.child("inner").unwrap().node.as_ref().unwrap();
    assert_eq!(inner.children.len(), 1);
    assert_eq!(inner.child("count").unwrap().value.as_ref().unwrap().as_i64(), Some(0));

    let rebuilt = decode(&snapshot).unwrap();
    assert_eq!(
        rebuilt.get_node("inner").unwrap().get_value("count").unwrap().as_i64(),
        Some(0)
    );
    assert!(rebuilt.is_identical(&shelf));
}

#[test]
fn test_nested_additions_keep_declared_values() {
    let shelf = Node::new::<Shelf>().unwrap();
    let inner = shelf.get_node("inner").unwrap();
    inner.add("tag", "x").unwrap();
    let rebuilt = from_json(&to_json(&shelf).unwrap()).unwrap();
    assert_eq!(
        rebuilt.get_node("inner").unwrap().get_value("tag").unwrap().as_str(),
        Some("x")
    );
    assert_eq!(
        rebuilt.get_node("inner").unwrap().get_value("count").unwrap().as_i64(),
        Some(9)
    );
}

#[test]
fn test_full_mode_writes_every_default_flag_set() {
    let folder = Node::new::<Folder>().unwrap();
    let snapshot = encode(&folder, EncodeMode::Full);
    assert_eq!(snapshot.child("notes").unwrap().flags, Some(InfoFlags::empty()));
    let primary = snapshot.child("primary").unwrap().node.as_ref().unwrap();
    assert_eq!(primary.child("label").unwrap().flags, Some(InfoFlags::PERMANENT));
}

#[test]
fn test_full_mode_keeps_cleared_default_flags_cleared() {
    let thermostat = Node::new::<Thermostat>().unwrap();
    let setpoint = thermostat.get_info("setpoint").unwrap();
    setpoint.set_default_on_copy(false).unwrap();

    let snapshot = encode(&thermostat, EncodeMode::Full);
    assert_eq!(snapshot.child("setpoint").unwrap().flags, Some(InfoFlags::PERMANENT));

    let rebuilt = decode(&snapshot).unwrap();
    assert!(!rebuilt.get_info("setpoint").unwrap().is_default_on_copy());
    assert!(rebuilt.is_identical(&thermostat));
}

#[test]
fn test_unknown_type_is_reported() {
    let err = from_json(r#"{"type":"gauge"}"#).unwrap_err();
    assert_eq!(
        err,
        LinkTreeError::UnknownNodeType {
            type_name: "gauge".to_string()
        }
    );
}

#[derive(Default)]
struct NeverBuilt;

impl NodeBehavior for NeverBuilt {}

impl NodeType for NeverBuilt {
    const TYPE_NAME: &'static str = "never_built";
}

#[test]
fn test_registered_types_decode_without_prior_construction() {
    DefaultRegistry::global().register::<NeverBuilt>();
    let node = from_json(r#"{"type":"never_built","children":[{"name":"a","value":{"kind":"bool","value":true}}]}"#)
        .unwrap();
    assert!(node.is_type::<NeverBuilt>());
    assert_eq!(node.get_value("a").unwrap().as_bool(), Some(true));
}

#[test]
fn test_digest_ignores_untouched_defaults() {
    let a = Node::new::<Folder>().unwrap();
    let b = Node::new::<Folder>().unwrap();
    let digest = compute_tree_digest(&a).unwrap();
    assert_eq!(digest, compute_tree_digest(&b).unwrap());
    assert_eq!(digest, compute_tree_digest(&a.copy()).unwrap());

    b.get_node("primary").unwrap().put("count", 1).unwrap();
    let diverged = compute_tree_digest(&b).unwrap();
    assert_ne!(digest, diverged);

    let rebuilt = from_json(&to_json(&b).unwrap()).unwrap();
    assert_eq!(compute_tree_digest(&rebuilt).unwrap(), diverged);
}
