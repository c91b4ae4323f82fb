use sha2::{Digest, Sha256};

use super::{encode, EncodeMode};
use crate::errors::Result;
use crate::node::Node;

/// SHA-256 of the canonical diff encoding, hex encoded
///
/// Two trees with the same digest decode to equal trees. Children equal to
/// their default do not contribute, so a fresh instance of a type digests
/// the same no matter how its defaults are declared.
///
/// # Errors
///
/// Returns `Serialization` if encoding fails.
pub fn compute_tree_digest(node: &Node) -> Result<String> {
    let canonical = serde_json::to_string(&encode(node, EncodeMode::Diff))?;
    Ok(hash_string(&canonical))
}

fn hash_string(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable_and_content_sensitive() {
        let a = Node::basic();
        a.add("x", 1).unwrap();
        let b = Node::basic();
        b.add("x", 1).unwrap();

        let digest = compute_tree_digest(&a).unwrap();
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, compute_tree_digest(&b).unwrap());

        b.put("x", 2).unwrap();
        assert_ne!(digest, compute_tree_digest(&b).unwrap());
    }

    #[test]
    fn test_hash_string_known_value() {
        assert_eq!(
            hash_string(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
