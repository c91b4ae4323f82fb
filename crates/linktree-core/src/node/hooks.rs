//! The single place hooks and subscriber callbacks are invoked
//!
//! Both returned errors and panics are captured and reported with the node
//! path; neither ever reaches the code that triggered the hook.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use linktree_core_types::schema::EVENT_HOOK_FAILED;

use super::behavior::HookResult;
use super::Node;

/// Run a hook, logging any failure
///
/// Returns whether the hook completed successfully.
pub(crate) fn invoke_hook<F>(node: &Node, hook: &'static str, f: F) -> bool
where
    F: FnOnce() -> HookResult,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            report(node, hook, &err.to_string());
            false
        }
        Err(payload) => {
            report(node, hook, &format!("panicked: {}", panic_message(&*payload)));
            false
        }
    }
}

fn report(node: &Node, hook: &'static str, failure: &str) {
    tracing::error!(
        component = module_path!(),
        event = EVENT_HOOK_FAILED,
        path = %node.path(),
        node_type = node.type_name(),
        hook,
        failure,
        "node hook failed"
    );
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
