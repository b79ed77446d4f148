//! Field-level schema metadata and the disclosure-policy lookup.
//!
//! A [`SchemaRegistry`] is built once at startup from message descriptors and
//! then shared read-only (typically behind an `Arc`). The redaction engine only
//! sees it through the [`FieldPolicyLookup`] trait.

use crate::error::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Schema version for schema documents.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Stable identifier of a field within its message (the wire field number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub u32);

impl From<u32> for FieldId {
    fn from(number: u32) -> Self {
        FieldId(number)
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Disclosure policy attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Disclosure {
    /// No special handling.
    #[default]
    None,
    /// Clear the field before external exposure.
    Redact,
    /// Obscure all but the last four characters of a text value.
    Mask,
}

impl Disclosure {
    /// Parse a policy name. Unrecognised names behave as [`Disclosure::None`].
    pub fn parse_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "redact" => Disclosure::Redact,
            "mask" => Disclosure::Mask,
            _ => Disclosure::None,
        }
    }

    /// Returns whether this policy changes the field.
    pub fn is_modifying(&self) -> bool {
        !matches!(self, Disclosure::None)
    }
}

impl std::fmt::Display for Disclosure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Disclosure::None => "none",
            Disclosure::Redact => "redact",
            Disclosure::Mask => "mask",
        };
        write!(f, "{}", s)
    }
}

/// The `sensitive` field option as authored in a schema.
///
/// Both flags may be set; [`Sensitive::disclosure`] resolves the conflict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensitive {
    #[serde(default)]
    pub redact: bool,
    #[serde(default)]
    pub mask: bool,
}

impl Sensitive {
    /// Option that clears the field.
    pub fn redact() -> Self {
        Self {
            redact: true,
            mask: false,
        }
    }

    /// Option that masks the field.
    pub fn mask() -> Self {
        Self {
            redact: false,
            mask: true,
        }
    }

    /// Resolve to a single policy. `redact` wins over `mask`.
    pub fn disclosure(&self) -> Disclosure {
        if self.redact {
            Disclosure::Redact
        } else if self.mask {
            Disclosure::Mask
        } else {
            Disclosure::None
        }
    }
}

/// Declared element type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Bytes,
    Enum,
    /// Nested message, by type name.
    Message(String),
}

impl FieldType {
    /// Human-readable type name for error messages.
    pub fn describe(&self) -> &str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Uint => "uint",
            FieldType::Float => "float",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Enum => "enum",
            FieldType::Message(name) => name,
        }
    }
}

/// Whether a field holds one value, a list, or a map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    Singular,
    Repeated,
    /// Map from `key` to values of the field's type.
    Map { key: FieldType },
}

fn is_singular(cardinality: &Cardinality) -> bool {
    *cardinality == Cardinality::Singular
}

/// Descriptor of one message field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field number, unique within the message.
    pub number: u32,

    /// Field name, unique within the message.
    pub name: String,

    /// Element type.
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "is_singular")]
    pub cardinality: Cardinality,

    /// Disclosure option, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<Sensitive>,
}

impl FieldDescriptor {
    /// Create a singular field with no disclosure option.
    pub fn new(number: u32, name: &str, field_type: FieldType) -> Self {
        Self {
            number,
            name: name.to_string(),
            field_type,
            cardinality: Cardinality::Singular,
            sensitive: None,
        }
    }

    /// Make this a repeated field.
    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Repeated;
        self
    }

    /// Make this a map field keyed by `key`.
    pub fn map(mut self, key: FieldType) -> Self {
        self.cardinality = Cardinality::Map { key };
        self
    }

    /// Attach a disclosure option.
    pub fn with_sensitive(mut self, sensitive: Sensitive) -> Self {
        self.sensitive = Some(sensitive);
        self
    }

    pub fn id(&self) -> FieldId {
        FieldId(self.number)
    }

    /// Resolved disclosure policy for this field.
    pub fn disclosure(&self) -> Disclosure {
        self.sensitive
            .map(|s| s.disclosure())
            .unwrap_or(Disclosure::None)
    }
}

/// Descriptor of one message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    /// Fully qualified type name.
    pub name: String,

    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Add a field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

/// On-disk schema document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaDocument {
    #[serde(default = "default_schema_version")]
    schema_version: String,

    #[serde(default)]
    messages: Vec<MessageDescriptor>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Lookup of per-field disclosure policy.
///
/// This is the only view of the schema the redaction engine needs. Unknown
/// record types and unknown fields resolve to [`Disclosure::None`].
pub trait FieldPolicyLookup {
    /// Disclosure policy of `field` on records of type `record_type`.
    fn disclosure(&self, record_type: &str, field: FieldId) -> Disclosure;

    /// Declared name of `field`, if known.
    fn field_name(&self, _record_type: &str, _field: FieldId) -> Option<&str> {
        None
    }
}

/// A message descriptor with its field indexes.
#[derive(Debug, Clone)]
struct IndexedMessage {
    descriptor: MessageDescriptor,
    by_number: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
}

impl IndexedMessage {
    fn index(descriptor: MessageDescriptor) -> Result<Self> {
        let mut by_number = HashMap::with_capacity(descriptor.fields.len());
        let mut by_name = HashMap::with_capacity(descriptor.fields.len());

        for (idx, field) in descriptor.fields.iter().enumerate() {
            if by_number.insert(field.number, idx).is_some() {
                return Err(SchemaError::DuplicateFieldNumber {
                    message: descriptor.name.clone(),
                    number: field.number,
                });
            }
            if by_name.insert(field.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateFieldName {
                    message: descriptor.name.clone(),
                    name: field.name.clone(),
                });
            }
        }

        Ok(Self {
            descriptor,
            by_number,
            by_name,
        })
    }

    fn field(&self, id: FieldId) -> Option<&FieldDescriptor> {
        self.by_number
            .get(&id.0)
            .map(|&idx| &self.descriptor.fields[idx])
    }

    fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name
            .get(name)
            .map(|&idx| &self.descriptor.fields[idx])
    }
}

/// Immutable table of message descriptors.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    messages: HashMap<String, IndexedMessage>,
}

/// Builder for [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    messages: Vec<MessageDescriptor>,
}

impl SchemaRegistryBuilder {
    /// Register a message descriptor.
    pub fn add(mut self, message: MessageDescriptor) -> Self {
        self.messages.push(message);
        self
    }

    /// Validate and index the registered descriptors.
    pub fn build(self) -> Result<SchemaRegistry> {
        let mut messages = HashMap::with_capacity(self.messages.len());
        for descriptor in self.messages {
            let name = descriptor.name.clone();
            let indexed = IndexedMessage::index(descriptor)?;
            if messages.insert(name.clone(), indexed).is_some() {
                return Err(SchemaError::DuplicateMessage(name));
            }
        }
        Ok(SchemaRegistry { messages })
    }
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Parse a schema document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let doc: SchemaDocument = serde_json::from_str(content)?;
        if doc.schema_version != SCHEMA_VERSION {
            return Err(SchemaError::VersionMismatch {
                expected: SCHEMA_VERSION.to_string(),
                actual: doc.schema_version,
            });
        }
        doc.messages
            .into_iter()
            .fold(Self::builder(), |builder, m| builder.add(m))
            .build()
    }

    /// Load a schema document from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&content)
    }

    /// Descriptor for a message type.
    pub fn message(&self, name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(name).map(|m| &m.descriptor)
    }

    /// Descriptor for a field by number.
    pub fn field(&self, message: &str, id: FieldId) -> Option<&FieldDescriptor> {
        self.messages.get(message).and_then(|m| m.field(id))
    }

    /// Descriptor for a field by name.
    pub fn field_by_name(&self, message: &str, name: &str) -> Option<&FieldDescriptor> {
        self.messages.get(message).and_then(|m| m.field_by_name(name))
    }

    /// Number of registered message types.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl FieldPolicyLookup for SchemaRegistry {
    fn disclosure(&self, record_type: &str, field: FieldId) -> Disclosure {
        self.field(record_type, field)
            .map(FieldDescriptor::disclosure)
            .unwrap_or(Disclosure::None)
    }

    fn field_name(&self, record_type: &str, field: FieldId) -> Option<&str> {
        self.field(record_type, field).map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> MessageDescriptor {
        MessageDescriptor::new("shop.v1.Customer")
            .with_field(FieldDescriptor::new(1, "name", FieldType::String))
            .with_field(
                FieldDescriptor::new(2, "email", FieldType::String)
                    .with_sensitive(Sensitive::mask()),
            )
            .with_field(
                FieldDescriptor::new(3, "password", FieldType::String)
                    .with_sensitive(Sensitive::redact()),
            )
    }

    #[test]
    fn test_sensitive_resolution() {
        assert_eq!(Sensitive::default().disclosure(), Disclosure::None);
        assert_eq!(Sensitive::mask().disclosure(), Disclosure::Mask);
        assert_eq!(Sensitive::redact().disclosure(), Disclosure::Redact);

        let both = Sensitive {
            redact: true,
            mask: true,
        };
        assert_eq!(both.disclosure(), Disclosure::Redact);
    }

    #[test]
    fn test_disclosure_parsing() {
        assert_eq!(Disclosure::parse_str("redact"), Disclosure::Redact);
        assert_eq!(Disclosure::parse_str("MASK"), Disclosure::Mask);
        assert_eq!(Disclosure::parse_str("none"), Disclosure::None);
        assert_eq!(Disclosure::parse_str("scramble"), Disclosure::None);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = SchemaRegistry::builder().add(customer()).build().unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.disclosure("shop.v1.Customer", FieldId(1)),
            Disclosure::None
        );
        assert_eq!(
            registry.disclosure("shop.v1.Customer", FieldId(2)),
            Disclosure::Mask
        );
        assert_eq!(
            registry.disclosure("shop.v1.Customer", FieldId(3)),
            Disclosure::Redact
        );
        assert_eq!(
            registry.field_name("shop.v1.Customer", FieldId(2)),
            Some("email")
        );
    }

    #[test]
    fn test_unknown_type_and_field_are_none() {
        let registry = SchemaRegistry::builder().add(customer()).build().unwrap();

        assert_eq!(
            registry.disclosure("shop.v1.Missing", FieldId(3)),
            Disclosure::None
        );
        assert_eq!(
            registry.disclosure("shop.v1.Customer", FieldId(99)),
            Disclosure::None
        );
        assert!(registry.field_name("shop.v1.Customer", FieldId(99)).is_none());
    }

    #[test]
    fn test_duplicate_field_number_rejected() {
        let message = MessageDescriptor::new("m")
            .with_field(FieldDescriptor::new(1, "a", FieldType::String))
            .with_field(FieldDescriptor::new(1, "b", FieldType::String));

        let err = SchemaRegistry::builder().add(message).build().unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateFieldNumber { number: 1, .. }));
    }

    #[test]
    fn test_duplicate_field_name_rejected() {
        let message = MessageDescriptor::new("m")
            .with_field(FieldDescriptor::new(1, "a", FieldType::String))
            .with_field(FieldDescriptor::new(2, "a", FieldType::Int));

        let err = SchemaRegistry::builder().add(message).build().unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateFieldName { .. }));
    }

    #[test]
    fn test_duplicate_message_rejected() {
        let err = SchemaRegistry::builder()
            .add(customer())
            .add(customer())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateMessage(_)));
    }

    #[test]
    fn test_schema_document_parsing() {
        let json = r#"{
            "schema_version": "1.0.0",
            "messages": [
                {
                    "name": "shop.v1.Order",
                    "fields": [
                        {"number": 1, "name": "id", "type": "string"},
                        {"number": 2, "name": "customer", "type": {"message": "shop.v1.Customer"}},
                        {"number": 3, "name": "tags", "type": "string", "cardinality": "repeated"},
                        {"number": 4, "name": "notes", "type": "string",
                         "cardinality": {"map": {"key": "string"}},
                         "sensitive": {"redact": true}}
                    ]
                }
            ]
        }"#;

        let registry = SchemaRegistry::from_json_str(json).unwrap();
        let customer = registry.field("shop.v1.Order", FieldId(2)).unwrap();
        assert_eq!(
            customer.field_type,
            FieldType::Message("shop.v1.Customer".to_string())
        );

        let tags = registry.field_by_name("shop.v1.Order", "tags").unwrap();
        assert_eq!(tags.cardinality, Cardinality::Repeated);

        let notes = registry.field_by_name("shop.v1.Order", "notes").unwrap();
        assert_eq!(
            notes.cardinality,
            Cardinality::Map {
                key: FieldType::String
            }
        );
        assert_eq!(notes.disclosure(), Disclosure::Redact);
    }

    #[test]
    fn test_schema_version_mismatch() {
        let err = SchemaRegistry::from_json_str(r#"{"schema_version": "9.9.9", "messages": []}"#)
            .unwrap_err();
        assert!(matches!(err, SchemaError::VersionMismatch { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(
            &path,
            r#"{"messages": [{"name": "m", "fields": [{"number": 1, "name": "a", "type": "bool"}]}]}"#,
        )
        .unwrap();

        let registry = SchemaRegistry::load(&path).unwrap();
        assert!(registry.message("m").is_some());

        let missing = SchemaRegistry::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, SchemaError::Io { .. }));
    }
}
