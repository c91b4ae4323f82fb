use linktree_core_types::path;

use crate::errors::{LinkTreeError, Result};
use crate::node::{Node, Slot};

/// Resolve an encoded path relative to `root`
///
/// `/` and the empty path resolve to `root` itself. Segments are unescaped
/// before lookup, so `/a%2Fb` addresses the child named `a/b`.
///
/// # Errors
///
/// - `InvalidPath` if a segment does not unescape to UTF-8, or a segment
///   other than the last lands on a value
/// - `ChildNotFound` if a segment names no child
pub fn resolve_path(root: &Node, encoded: &str) -> Result<Slot> {
    let segments = path::split(encoded).map_err(|err| LinkTreeError::InvalidPath {
        path: encoded.to_string(),
        reason: err.to_string(),
    })?;

    let mut current = Slot::Node(root.clone());
    for segment in &segments {
        let node = match current {
            Slot::Node(node) => node,
            Slot::Value(_) => {
                return Err(LinkTreeError::InvalidPath {
                    path: encoded.to_string(),
                    reason: format!("cannot descend into value before {}", segment),
                })
            }
        };
        current = node.get(segment).ok_or_else(|| LinkTreeError::ChildNotFound {
            path: node.path(),
            name: segment.clone(),
        })?;
    }
    Ok(current)
}

/// Like [`resolve_path`] but the target must be a container
///
/// # Errors
///
/// - `InvalidPath` if the target is a value
/// - everything [`resolve_path`] returns
pub fn resolve_node(root: &Node, encoded: &str) -> Result<Node> {
    match resolve_path(root, encoded)? {
        Slot::Node(node) => Ok(node),
        Slot::Value(_) => Err(LinkTreeError::InvalidPath {
            path: encoded.to_string(),
            reason: "target is a value".to_string(),
        }),
    }
}

/// The chain of containers from the root down to `node`, inclusive
pub fn ancestors(node: &Node) -> Vec<Node> {
    let mut chain = Vec::new();
    let mut current = Some(node.clone());
    while let Some(n) = current {
        current = n.parent();
        chain.push(n);
    }
    chain.reverse();
    chain
}

/// Depth-first, pre-order walk over `root` and its container descendants
///
/// The visitor receives each node with its depth (root is 0) and returns
/// whether to descend into that node's children.
pub fn walk<F>(root: &Node, mut visitor: F)
where
    F: FnMut(&Node, usize) -> bool,
{
    fn visit<F>(node: &Node, depth: usize, visitor: &mut F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        if !visitor(node, depth) {
            return;
        }
        for child in node.child_nodes() {
            visit(&child, depth + 1, visitor);
        }
    }

    visit(root, 0, &mut visitor);
}
