//! Operation boundary macros
//!
//! Every long-running operation on the tree (default bootstrap, snapshot
//! restore) brackets itself with a `start` event and exactly one of `end`
//! or `end_error`. Extra fields after the fixed ones are passed straight to
//! `tracing`, so `path = %node.path()` and friends work as usual.

/// Log the start of an operation
///
/// ```
/// # use linktree_core::log_op_start;
/// log_op_start!("snapshot_restore");
/// log_op_start!("bootstrap_default", node_type = "counter");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = linktree_core_types::schema::EVENT_START,
            $($($field)*)?
        )
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use linktree_core::log_op_end;
/// log_op_end!("snapshot_restore", duration_ms = 3);
/// log_op_end!("bootstrap_default", duration_ms = 3, children = 2);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = linktree_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)*)?
        )
    };
}

/// Log the failed end of an operation
///
/// Takes anything convertible into [`ExError`](crate::errors::ExError) and
/// records its stable code, its kind and the rendered error (which carries
/// the node path and child name when the error has them).
///
/// ```
/// # use linktree_core::{log_op_error, errors::LinkTreeError};
/// let err = LinkTreeError::UnknownNodeType { type_name: "gauge".to_string() };
/// log_op_error!("snapshot_restore", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = linktree_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            error = %ex_err,
            $($($field)*)?
        )
    }};
}
