//! Node path encoding
//!
//! A node's path is the chain of child names from the root, joined with `/`.
//! Names may contain any character, so each name is percent-escaped (as
//! `%XX` over its UTF-8 bytes) before it is joined into a path.
//!
//! # Example
//!
//! ```
//! use linktree_core_types::path::{encode_name, join, split};
//!
//! assert_eq!(encode_name("a/b"), "a%2Fb");
//! let path = join(&join("/", "sensors"), "temp/1");
//! assert_eq!(path, "/sensors/temp%2F1");
//! assert_eq!(split(&path).unwrap(), vec!["sensors", "temp/1"]);
//! ```

use std::borrow::Cow;
use std::fmt;

/// Path segment separator
pub const SEPARATOR: char = '/';

/// Path of an unparented (root) node
pub const ROOT: &str = "/";

/// Failure to decode an escaped name or path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The unescaped bytes of a segment are not valid UTF-8
    InvalidUtf8 { segment: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::InvalidUtf8 { segment } => {
                write!(f, "segment {} does not unescape to UTF-8", segment)
            }
        }
    }
}

impl std::error::Error for PathError {}

/// Escape a single child name for use as a path segment
///
/// Everything outside ASCII alphanumerics and `-_.~` is escaped, so the
/// result never contains the separator. Returns the input unchanged
/// (borrowed) when nothing needs escaping.
pub fn encode_name(name: &str) -> Cow<'_, str> {
    urlencoding::encode(name)
}

/// Reverse [`encode_name`]
///
/// A `%` not followed by two hex digits is kept literally.
///
/// # Errors
///
/// Returns [`PathError::InvalidUtf8`] if the escaped bytes are not UTF-8.
pub fn decode_name(segment: &str) -> Result<String, PathError> {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .map_err(|_| PathError::InvalidUtf8 {
            segment: segment.to_string(),
        })
}

/// Append an (unescaped) child name to an already encoded parent path
pub fn join(parent: &str, name: &str) -> String {
    let encoded = encode_name(name);
    let mut out = String::with_capacity(parent.len() + encoded.len() + 1);
    out.push_str(parent);
    if !parent.ends_with(SEPARATOR) {
        out.push(SEPARATOR);
    }
    out.push_str(&encoded);
    out
}

/// Split an encoded path into its decoded child names
///
/// Leading, trailing and repeated separators are ignored, so `/`, `` and
/// `//` all address the root.
///
/// # Errors
///
/// Returns the first [`PathError`] raised by a segment.
pub fn split(path: &str) -> Result<Vec<String>, PathError> {
    path.split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(decode_name)
        .collect()
}
