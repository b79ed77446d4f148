//! Error types for schema loading and record conversion.
//!
//! Problems found while *redacting* are not errors; they are reported as
//! [`crate::Diagnostic`] values so one malformed field never stops the rest
//! of a record from being protected.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while building or loading a [`crate::SchemaRegistry`].
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Two message descriptors share a type name.
    #[error("duplicate message type: {0}")]
    DuplicateMessage(String),

    /// Two fields of one message share a field number.
    #[error("duplicate field number {number} in {message}")]
    DuplicateFieldNumber { message: String, number: u32 },

    /// Two fields of one message share a name.
    #[error("duplicate field name '{name}' in {message}")]
    DuplicateFieldName { message: String, name: String },

    /// Schema document version is not supported.
    #[error("schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    /// I/O error reading a schema file.
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Schema document is not valid JSON or has the wrong shape.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while converting between JSON and [`crate::Record`].
#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    /// No descriptor is registered for the message type.
    #[error("unknown message type: {0}")]
    UnknownMessage(String),

    /// The JSON object names a field the message does not declare.
    #[error("unknown field '{field}' in {message}")]
    UnknownField { message: String, field: String },

    /// A JSON value does not fit the declared field type.
    #[error("type mismatch at {path}: expected {expected}")]
    TypeMismatch { path: String, expected: String },

    /// A bytes field does not hold valid base64.
    #[error("invalid base64 at {path}")]
    InvalidBase64 { path: String },

    /// Map keys of this type cannot be read from a JSON object key.
    #[error("unsupported map key type at {path}")]
    UnsupportedMapKey { path: String },
}
