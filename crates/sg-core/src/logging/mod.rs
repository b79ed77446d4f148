//! Structured logging setup.
//!
//! Human-readable output for interactive use, JSONL for log shippers. All log
//! output goes to stderr; stdout is reserved for command payloads.
//!
//! ```no_run
//! use sg_core::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//! tracing::info!(target: "sg_core::startup", "ready");
//! ```

pub mod config;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Targets whose events pass the level filter (`sg` is the binary).
const LOG_TARGETS: [&str; 4] = ["sg", "sg_core", "sg_redact", "sg_sign"];

fn env_filter(level: LogLevel) -> EnvFilter {
    let directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    EnvFilter::new(directives.join(","))
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, which is expected
/// when several tests initialise logging in one process.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = env_filter(config.level);

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
                    .is_ok()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
                    .is_ok()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(JsonlLayer::stderr())
            .try_init()
            .is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_covers_all_crates() {
        let rendered = env_filter(LogLevel::Debug).to_string();
        for target in LOG_TARGETS {
            assert!(rendered.contains(&format!("{}=debug", target)), "{}", rendered);
        }
    }

    #[test]
    fn test_second_init_is_harmless() {
        let config = LogConfig::default().with_level(LogLevel::Off);
        init_logging(&config);
        assert!(!init_logging(&config));
    }
}
