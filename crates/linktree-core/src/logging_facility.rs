//! Structured logging facility
//!
//! - Single initialization point via `init(profile)`
//! - Operation boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! Node-level detail (lifecycle transitions, structural mutations) is logged
//! with `tracing::debug!` and the node path; hook failures are logged at
//! `error` by the hook invocation helper.
//!
//! # Usage
//!
//! ```rust
//! use linktree_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
