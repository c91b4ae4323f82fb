//! Canonical schema constants for structured logging and events
//!
//! These constants keep log fields consistent between the node model,
//! hook failure reports and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Node identification
pub const FIELD_PATH: &str = "path";
pub const FIELD_NODE_TYPE: &str = "node_type";
pub const FIELD_CHILD: &str = "child";

// Hook and subscription reporting
pub const FIELD_HOOK: &str = "hook";
pub const FIELD_TOPIC: &str = "topic";
pub const FIELD_FAILURE: &str = "failure";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_HOOK_FAILED: &str = "hook_failed";
