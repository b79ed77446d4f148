//! Configuration loading for sg-core.
//!
//! Resolution order (highest to lowest priority):
//! 1. Explicit path (`--config`)
//! 2. `SG_CONFIG` environment variable
//! 3. `$XDG_CONFIG_HOME/service-guard/config.toml`
//! 4. Built-in defaults
//!
//! An explicitly named file must exist; the XDG file is optional. The signing
//! secret never lives in the file, only the name of the environment variable
//! that holds it.

use crate::logging::{LogFormat, LogLevel};
use serde::{Deserialize, Serialize};
use sg_redact::SchemaRegistry;
use sg_sign::Signer;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SG_CONFIG";

/// Default environment variable holding the signing secret.
pub const DEFAULT_SECRET_ENV: &str = "SG_SIGNING_SECRET";

const CONFIG_DIR_NAME: &str = "service-guard";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Signing secret not set: environment variable {var} is empty or missing")]
    MissingSecret { var: String },

    #[error("No schema file configured")]
    MissingSchema,

    #[error("Failed to load schema: {0}")]
    Schema(#[from] sg_redact::SchemaError),
}

/// `[signing]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    pub api_name: Option<String>,
    pub api_version: Option<String>,
    pub channel: Option<String>,
    /// Environment variable holding the shared secret.
    pub secret_env: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        SigningConfig {
            api_name: None,
            api_version: None,
            channel: None,
            secret_env: DEFAULT_SECRET_ENV.to_string(),
        }
    }
}

impl SigningConfig {
    /// Build a signer from the configured environment variable.
    pub fn signer(&self) -> Result<Signer, ConfigError> {
        self.signer_from(|name| std::env::var(name).ok())
    }

    /// Like [`SigningConfig::signer`] with a custom variable lookup.
    pub fn signer_from<F>(&self, env: F) -> Result<Signer, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match env(&self.secret_env) {
            Some(secret) if !secret.is_empty() => Ok(Signer::new(secret)),
            _ => Err(ConfigError::MissingSecret {
                var: self.secret_env.clone(),
            }),
        }
    }
}

/// `[schema]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Schema document for redaction.
    pub path: Option<PathBuf>,
}

impl SchemaConfig {
    /// Load the schema registry, preferring `explicit` over the configured path.
    pub fn load(&self, explicit: Option<&Path>) -> Result<SchemaRegistry, ConfigError> {
        let path = explicit
            .or(self.path.as_deref())
            .ok_or(ConfigError::MissingSchema)?;
        Ok(SchemaRegistry::load(path)?)
    }
}

/// `[logging]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<LogLevel>,
    pub format: Option<LogFormat>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub signing: SigningConfig,
    pub schema: SchemaConfig,
    pub logging: LoggingConfig,
}

impl GuardConfig {
    /// Parse a config document.
    pub fn from_toml_str(s: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_toml_str(&content, path)
    }
}

/// Where the config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Env(PathBuf),
    Xdg(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::Env(p) | ConfigSource::Xdg(p) => {
                Some(p.as_path())
            }
            ConfigSource::Defaults => None,
        }
    }
}

/// Resolved configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: GuardConfig,
    pub source: ConfigSource,
}

/// Pick the config file to read.
///
/// `env` looks up environment variables; `home` is the fallback home
/// directory when `XDG_CONFIG_HOME` is unset.
pub fn resolve_config_path<F>(
    explicit: Option<&Path>,
    env: F,
    home: Option<PathBuf>,
) -> ConfigSource
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    if let Some(path) = env(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return ConfigSource::Env(PathBuf::from(path));
    }

    let xdg_config = env("XDG_CONFIG_HOME")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|h| h.join(".config")));

    match xdg_config {
        Some(dir) => ConfigSource::Xdg(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)),
        None => ConfigSource::Defaults,
    }
}

/// Load configuration with the standard resolution order.
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    let source = resolve_config_path(explicit, |name| std::env::var(name).ok(), dirs::home_dir());
    load_from_source(source)
}

/// Load the file named by `source`.
pub fn load_from_source(source: ConfigSource) -> Result<ResolvedConfig, ConfigError> {
    let config = match &source {
        ConfigSource::Explicit(path) | ConfigSource::Env(path) => GuardConfig::load(path)?,
        ConfigSource::Xdg(path) => {
            if !path.exists() {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(ResolvedConfig {
                    config: GuardConfig::default(),
                    source: ConfigSource::Defaults,
                });
            }
            GuardConfig::load(path)?
        }
        ConfigSource::Defaults => GuardConfig::default(),
    };

    tracing::debug!(source = ?source, "configuration loaded");
    Ok(ResolvedConfig { config, source })
}
