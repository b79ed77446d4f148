//! Dynamic record values and the record view capability.
//!
//! A [`Record`] is one message instance: an ordered set of present fields,
//! each holding a [`Value`]. Trees are finite and acyclic by construction
//! since every nested record is owned by its parent.

use crate::schema::FieldId;
use std::collections::BTreeMap;

/// A field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Enum value by number.
    Enum(i32),
    /// Nested record.
    Record(Record),
    /// Ordered sequence of values.
    List(Vec<Value>),
    /// Key/value entries in insertion order.
    Map(Vec<MapEntry>),
    /// Preserved wire data the schema does not describe.
    Unknown(Vec<u8>),
}

/// Classification of a [`Value`] used during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Non-text scalar (number, bool, bytes, enum).
    Scalar,
    Text,
    Record,
    List,
    Map,
    Unknown,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValueKind::Scalar => "scalar",
            ValueKind::Text => "text",
            ValueKind::Record => "record",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_)
            | Value::Int(_)
            | Value::Uint(_)
            | Value::Float(_)
            | Value::Bytes(_)
            | Value::Enum(_) => ValueKind::Scalar,
            Value::String(_) => ValueKind::Text,
            Value::Record(_) => ValueKind::Record,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Unknown(_) => ValueKind::Unknown,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

/// One map entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: Value,
    pub value: Value,
}

impl MapEntry {
    pub fn new(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Capability interface over a record.
///
/// The redaction engine only needs to enumerate present fields, read and
/// write them, and clear them. Any record representation can implement this
/// and be redacted in place.
pub trait RecordView {
    /// Message type name used for policy lookup.
    fn type_name(&self) -> &str;

    /// Identifiers of the fields currently present.
    fn field_ids(&self) -> Vec<FieldId>;

    fn get(&self, field: FieldId) -> Option<&Value>;

    fn get_mut(&mut self, field: FieldId) -> Option<&mut Value>;

    /// Set a field, replacing any previous value.
    fn set(&mut self, field: FieldId, value: Value);

    /// Remove a field, returning its previous value.
    fn clear(&mut self, field: FieldId) -> Option<Value>;
}

/// A dynamically typed message instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: BTreeMap<FieldId, Value>,
}

impl Record {
    /// Create an empty record of the given type.
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, field: u32, value: impl Into<Value>) -> Self {
        self.fields.insert(FieldId(field), value.into());
        self
    }

    /// Iterate present fields in field-number order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &Value)> {
        self.fields.iter().map(|(id, v)| (*id, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl RecordView for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn field_ids(&self) -> Vec<FieldId> {
        self.fields.keys().copied().collect()
    }

    fn get(&self, field: FieldId) -> Option<&Value> {
        self.fields.get(&field)
    }

    fn get_mut(&mut self, field: FieldId) -> Option<&mut Value> {
        self.fields.get_mut(&field)
    }

    fn set(&mut self, field: FieldId, value: Value) {
        self.fields.insert(field, value);
    }

    fn clear(&mut self, field: FieldId) -> Option<Value> {
        self.fields.remove(&field)
    }
}
