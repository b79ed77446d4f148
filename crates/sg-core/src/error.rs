//! Error types for sg-core.

use crate::config::ConfigError;
use crate::exit_codes::ExitCode;
use sg_redact::RecordError;
use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a service handler or middleware.
///
/// `code` follows HTTP status semantics; `reason` is a stable
/// machine-readable tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error: code = {code} reason = {reason} message = {message}")]
pub struct ServiceError {
    pub code: i32,
    pub reason: String,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: i32, reason: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            reason: reason.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(400, reason, message)
    }

    pub fn unauthorized(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(401, reason, message)
    }

    pub fn internal(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(500, reason, message)
    }
}

/// Failures of an `sg` command.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("invalid arguments: {0}")]
    Args(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid input record: {0}")]
    Record(#[from] RecordError),

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Args(_) | CliError::Record(_) | CliError::Json(_) => ExitCode::ArgsError,
            CliError::Config(_) => ExitCode::ConfigError,
            CliError::Io { .. } => ExitCode::IoError,
        }
    }
}
