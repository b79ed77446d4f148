//! Schema-driven redaction for request and response records.
//!
//! Records are walked generically through the [`RecordView`] capability and
//! each field's disclosure policy comes from a [`FieldPolicyLookup`],
//! normally a [`SchemaRegistry`] built once at startup.
//!
//! # Key Features
//!
//! - **Depth-first traversal**: nested records, lists of records, map values
//!   and record-typed map keys are all visited.
//! - **Two policies**: `redact` clears a field, `mask` keeps only the last four
//!   characters of a text value.
//! - **Never fails**: policies that do not fit a value are reported as
//!   [`Diagnostic`]s and the rest of the record is still protected.
//!
//! # Example
//!
//! ```
//! use sg_redact::{
//!     redact, FieldDescriptor, FieldType, MessageDescriptor, Record, SchemaRegistry, Sensitive,
//! };
//!
//! let schemas = SchemaRegistry::builder()
//!     .add(
//!         MessageDescriptor::new("auth.v1.Login")
//!             .with_field(FieldDescriptor::new(1, "user", FieldType::String))
//!             .with_field(
//!                 FieldDescriptor::new(2, "password", FieldType::String)
//!                     .with_sensitive(Sensitive::redact()),
//!             ),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mut login = Record::new("auth.v1.Login")
//!     .with_field(1, "ada")
//!     .with_field(2, "hunter2");
//! let report = redact(&mut login, &schemas);
//!
//! assert_eq!(report.cleared, 1);
//! assert_eq!(login.len(), 1);
//! ```

pub mod engine;
pub mod error;
pub mod json;
pub mod mask;
pub mod record;
pub mod schema;

pub use engine::{
    redact, redacted, Diagnostic, DiagnosticKind, Redacted, RedactionEngine, RedactionReport,
};
pub use error::{RecordError, Result, SchemaError};
pub use json::{record_from_json, record_to_json};
pub use mask::{mask_text, MASK_CHAR, MASK_TOKEN, VISIBLE_SUFFIX};
pub use record::{MapEntry, Record, RecordView, Value, ValueKind};
pub use schema::{
    Cardinality, Disclosure, FieldDescriptor, FieldId, FieldPolicyLookup, FieldType,
    MessageDescriptor, SchemaRegistry, SchemaRegistryBuilder, Sensitive, SCHEMA_VERSION,
};
