//! Service Guard core library.
//!
//! Glue between services and the two protection libraries:
//! - [`middleware`]: correlation ids, security header checks, outbound
//!   signing and redacted access logging
//! - [`logging`]: subscriber setup (human or JSONL on stderr)
//! - [`config`]: TOML configuration with CLI > env > XDG > defaults resolution
//! - [`exit_codes`]: stable exit codes for the `sg` binary

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod middleware;

pub use error::{CliError, ServiceError};

pub use sg_redact;
pub use sg_sign;
