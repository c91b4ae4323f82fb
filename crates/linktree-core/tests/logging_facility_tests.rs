#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{Counter, Thermostat};
use linktree_core::errors::LinkTreeError;
use linktree_core::logging_facility::test_capture::init_test_capture;
use linktree_core::snapshot::{encode, restore_into, EncodeMode};
use linktree_core::{log_op_end, log_op_error, log_op_start};
use linktree_core::{HookResult, Node, NodeBehavior, NodeType};
use linktree_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_HOOK_FAILED, EVENT_START};
use tracing::Level;

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events();
    let end_events: Vec<_> = events
        .iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .collect();
    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].fields.get("duration_ms"), Some(&"42".to_string()));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = LinkTreeError::ChildNotFound {
        path: "/a".to_string(),
        name: "b".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events();
    let error_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("end_error event");
    assert_eq!(error_event.level, Level::ERROR);
    assert_eq!(
        error_event.fields.get("err.code"),
        Some(&"ERR_NOT_FOUND".to_string())
    );
    assert_eq!(error_event.fields.get("err.kind"), Some(&"NotFound".to_string()));
}

#[derive(Default)]
struct Sulky;

impl NodeBehavior for Sulky {
    fn on_started(&self, _node: &Node) -> HookResult {
        Err("refusing to start".into())
    }
}

impl NodeType for Sulky {
    const TYPE_NAME: &'static str = "log_sample_sulky";
}

#[test]
fn test_hook_failure_is_logged_with_path() {
    let capture = init_test_capture();
    let root = Node::basic();
    let sample = Node::new::<Sulky>().unwrap();
    root.add("hook_sample_unique", sample.clone()).unwrap();

    root.start().unwrap();
    assert!(sample.is_started());

    let reports = capture.events_for_path("/hook_sample_unique");
    let failure = reports
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_HOOK_FAILED))
        .expect("hook failure report");
    assert_eq!(failure.level, Level::ERROR);
    assert_eq!(failure.hook.as_deref(), Some("on_started"));
    assert_eq!(
        failure.fields.get("node_type"),
        Some(&"log_sample_sulky".to_string())
    );
    assert_eq!(
        failure.fields.get("failure"),
        Some(&"refusing to start".to_string())
    );
}

#[derive(Default)]
struct Gauge;

impl NodeBehavior for Gauge {
    fn declare_defaults(&self, node: &Node) -> linktree_core::Result<()> {
        node.declare_default("reading", 0.0)?;
        Ok(())
    }
}

impl NodeType for Gauge {
    const TYPE_NAME: &'static str = "log_sample_gauge";
}

#[test]
fn test_default_bootstrap_is_logged_once() {
    let capture = init_test_capture();
    Node::new::<Gauge>().unwrap();
    Node::new::<Gauge>().unwrap();

    let for_gauge = |event: &str| {
        capture.count_events(|e| {
            e.op.as_deref() == Some("bootstrap_default")
                && e.event.as_deref() == Some(event)
                && e.fields.get("node_type").map(String::as_str) == Some("log_sample_gauge")
        })
    };
    assert_eq!(for_gauge(EVENT_START), 1);
    assert_eq!(for_gauge(EVENT_END), 1);
    assert_eq!(for_gauge(EVENT_END_ERROR), 0);
}

#[test]
fn test_failed_restore_logs_end_error() {
    let capture = init_test_capture();
    let root = Node::basic();
    let target = Node::new::<Counter>().unwrap();
    root.add("restore_sample_unique", target.clone()).unwrap();

    let snapshot = encode(&Node::new::<Thermostat>().unwrap(), EncodeMode::Diff);
    assert!(restore_into(&target, &snapshot).is_err());

    let events = capture.events_for_path("/restore_sample_unique");
    assert!(events
        .iter()
        .any(|e| e.op.as_deref() == Some("snapshot_restore")
            && e.event.as_deref() == Some(EVENT_START)));
    let failure = events
        .iter()
        .find(|e| {
            e.op.as_deref() == Some("snapshot_restore")
                && e.event.as_deref() == Some(EVENT_END_ERROR)
        })
        .expect("end_error event");
    assert_eq!(
        failure.fields.get("err.code"),
        Some(&"ERR_INVALID_SNAPSHOT".to_string())
    );
}
