use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::registry::DefaultRegistry;

/// Broad type of a value payload
///
/// Two values diverge in type when their kinds differ; a typed null keeps
/// its kind so that a declared-but-unset default still reports its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Untyped; only produced by a raw JSON null
    Any,
    Bool,
    Number,
    String,
    List,
    Map,
}

impl ValueKind {
    pub(crate) const ALL: [ValueKind; 6] = [
        ValueKind::Any,
        ValueKind::Bool,
        ValueKind::Number,
        ValueKind::String,
        ValueKind::List,
        ValueKind::Map,
    ];

    /// Infer the kind of a JSON payload
    pub fn of(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => ValueKind::Any,
            serde_json::Value::Bool(_) => ValueKind::Bool,
            serde_json::Value::Number(_) => ValueKind::Number,
            serde_json::Value::String(_) => ValueKind::String,
            serde_json::Value::Array(_) => ValueKind::List,
            serde_json::Value::Object(_) => ValueKind::Map,
        }
    }

    /// Stable lower-case name
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Any => "any",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ValueKind::Any => 0,
            ValueKind::Bool => 1,
            ValueKind::Number => 2,
            ValueKind::String => 3,
            ValueKind::List => 4,
            ValueKind::Map => 5,
        }
    }
}

/// An opaque, immutable leaf value
///
/// The payload is shared behind an `Arc`, so copying a value (and therefore
/// copying a default child into a new instance) never duplicates bytes.
#[derive(Clone, Serialize, Deserialize)]
#[serde(into = "ValueRepr", try_from = "ValueRepr")]
pub struct Value {
    kind: ValueKind,
    data: Arc<serde_json::Value>,
}

impl Value {
    /// Wrap a JSON payload, inferring its kind
    pub fn new(data: serde_json::Value) -> Self {
        if data.is_null() {
            return Value::null_of(ValueKind::Any);
        }
        Self {
            kind: ValueKind::of(&data),
            data: Arc::new(data),
        }
    }

    /// Wrap a JSON payload under an explicit kind
    ///
    /// Returns `None` when a non-null payload does not match `kind`.
    pub fn with_kind(kind: ValueKind, data: serde_json::Value) -> Option<Self> {
        if data.is_null() {
            return Some(Value::null_of(kind));
        }
        if kind != ValueKind::Any && ValueKind::of(&data) != kind {
            return None;
        }
        Some(Self {
            kind,
            data: Arc::new(data),
        })
    }

    /// The shared null of the given kind
    pub fn null_of(kind: ValueKind) -> Self {
        DefaultRegistry::global().null_value(kind)
    }

    pub(crate) fn null_singleton(kind: ValueKind) -> Self {
        Self {
            kind,
            data: Arc::new(serde_json::Value::Null),
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.data
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.data.as_i64()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.data.as_f64()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.data.as_bool()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.data.as_str()
    }

    /// Values are immutable; a copy shares the payload
    pub fn copy(&self) -> Value {
        self.clone()
    }

    /// True when both values share the same payload allocation
    pub fn same(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && (self.same(other) || self.data == other.data)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.name(), self.data)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct ValueRepr {
    kind: ValueKind,
    value: serde_json::Value,
}

impl From<Value> for ValueRepr {
    fn from(value: Value) -> Self {
        Self {
            kind: value.kind,
            value: (*value.data).clone(),
        }
    }
}

impl TryFrom<ValueRepr> for Value {
    type Error = String;

    fn try_from(repr: ValueRepr) -> Result<Self, Self::Error> {
        let kind = repr.kind;
        Value::with_kind(kind, repr.value)
            .ok_or_else(|| format!("payload does not match kind {}", kind.name()))
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        Value::new(data)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::new(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::new(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::new(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::new(v.into())
    }
}

impl From<f64> for Value {
    /// Non-finite numbers have no JSON form and become a number-typed null
    fn from(v: f64) -> Self {
        match serde_json::Number::from_f64(v) {
            Some(n) => Value::new(serde_json::Value::Number(n)),
            None => Value::null_of(ValueKind::Number),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::new(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::new(v.into())
    }
}
