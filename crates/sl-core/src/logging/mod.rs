//! Diagnostic logging for superlog.
//!
//! Compile warnings, suppressions, flush counts and retention actions go
//! through `tracing`. This module installs the subscriber:
//! - human-readable lines on stderr (ANSI only on a terminal)
//! - or JSON lines on stderr for machine consumers
//!
//! stdout stays free for command output.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events the default filter lets through.
const CRATES: &[&str] = &["sl_core", "sl_config", "sl_rules", "sl_sink", "superlog"];

fn default_filter(level: LogLevel) -> EnvFilter {
    let directives = CRATES
        .iter()
        .map(|c| format!("{c}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::new(directives)
}

/// Install the global subscriber. Call once at startup; later calls are
/// ignored.
///
/// A full `RUST_LOG` directive set takes over the filter when it parses.
pub fn init_logging(config: &LogConfig) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|v| v.contains('='))
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| default_filter(config.level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Human => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Jsonl => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// Initialize from the environment with no CLI overrides.
pub fn init_default_logging() {
    init_logging(&LogConfig::from_env(None, None));
}
