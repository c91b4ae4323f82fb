//! Core types shared across linktree facilities
//!
//! This crate provides the shared vocabulary used by the object
//! model, its logging facility and its protocol collaborators:
//!
//! - **Schema constants**: Canonical field keys and event names for structured logs
//! - **Paths**: Percent-escaped, slash-delimited node addresses

pub mod path;
pub mod schema;

pub use path::{decode_name, encode_name, join, split, PathError, ROOT, SEPARATOR};
