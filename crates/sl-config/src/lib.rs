//! superlog configuration loading and validation.
//!
//! This crate provides:
//! - The YAML configuration document and raw per-event rule definitions
//! - Validated settings with fallback defaults for every bad value
//! - Config path resolution (CLI → env → XDG → system → defaults)

pub mod document;
pub mod resolve;
pub mod settings;
pub mod validate;

pub use document::{ConfigDocument, RawRuleDefinition, RuleDocument, Setting};
pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use settings::{CommandAlertSettings, RetentionSettings, Settings};
pub use validate::{ConfigError, ConfigIssue, ConfigResult};

/// Load and validate a configuration file.
///
/// Invalid values are logged and replaced by defaults; only unreadable or
/// unparsable files are errors.
pub fn load_settings(path: &std::path::Path) -> ConfigResult<(Settings, RuleDocument)> {
    let doc = ConfigDocument::load(path)?;
    let (settings, issues) = Settings::from_document(&doc);
    for issue in &issues {
        tracing::warn!(
            field = %issue.field,
            fallback = %issue.fallback,
            category = %issue.category(),
            "{}",
            issue.message
        );
    }
    Ok((settings, doc.rules()))
}
