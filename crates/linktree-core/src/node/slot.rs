use std::any::TypeId;

use super::Node;
use crate::model::{Value, ValueKind};

/// Occupant of a child record: another container or a leaf value
#[derive(Clone, Debug)]
pub enum Slot {
    Node(Node),
    Value(Value),
}

/// Type identity of a slot, used by the type-divergence predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotType {
    Node(TypeId),
    Value(ValueKind),
}

impl Slot {
    pub fn slot_type(&self) -> SlotType {
        match self {
            Slot::Node(node) => SlotType::Node(node.type_id()),
            Slot::Value(value) => SlotType::Value(value.kind()),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Slot::Node(_))
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Slot::Value(_))
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Slot::Node(node) => Some(node),
            Slot::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Slot::Value(value) => Some(value),
            Slot::Node(_) => None,
        }
    }

    pub fn into_node(self) -> Option<Node> {
        match self {
            Slot::Node(node) => Some(node),
            Slot::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Slot::Value(value) => Some(value),
            Slot::Node(_) => None,
        }
    }

    /// Containers are never null
    pub fn is_null(&self) -> bool {
        match self {
            Slot::Node(_) => false,
            Slot::Value(value) => value.is_null(),
        }
    }

    /// Values return themselves; containers deep-copy
    pub fn copy(&self) -> Slot {
        match self {
            Slot::Node(node) => Slot::Node(node.copy()),
            Slot::Value(value) => Slot::Value(value.copy()),
        }
    }

    /// Structural equality, ignoring child order inside containers
    pub fn is_equal(&self, other: &Slot) -> bool {
        match (self, other) {
            (Slot::Value(a), Slot::Value(b)) => a == b,
            (Slot::Node(a), Slot::Node(b)) => a.is_equal(b),
            _ => false,
        }
    }

    /// Structural equality including child order inside containers
    pub fn is_identical(&self, other: &Slot) -> bool {
        match (self, other) {
            (Slot::Value(a), Slot::Value(b)) => a == b,
            (Slot::Node(a), Slot::Node(b)) => a.is_identical(b),
            _ => false,
        }
    }
}

impl From<Node> for Slot {
    fn from(node: Node) -> Self {
        Slot::Node(node)
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::Value(value)
    }
}

macro_rules! slot_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Slot {
                fn from(v: $ty) -> Self {
                    Slot::Value(Value::from(v))
                }
            }
        )*
    };
}

slot_from_value!(bool, i32, i64, u32, f64, &str, String, serde_json::Value);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_slot_type_follows_kind() {
        assert_eq!(Slot::from(3).slot_type(), SlotType::Value(ValueKind::Number));
        assert_ne!(Slot::from(3).slot_type(), Slot::from("3").slot_type());
    }

    #[test]
    fn test_value_copy_shares_payload() {
        let slot = Slot::from("shared");
        let copy = slot.copy();
        assert!(copy.as_value().unwrap().same(slot.as_value().unwrap()));
    }

    #[test]
    fn test_node_and_value_never_equal() {
        let node = Slot::from(Node::basic());
        assert!(!node.is_equal(&Slot::from(1)));
        assert!(!node.is_null());
    }
}
