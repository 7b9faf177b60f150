//! The YAML configuration document.
//!
//! Keys are kebab-case. Scalar settings are read leniently: a value of the
//! wrong type is kept as [`Setting::Invalid`] so validation can report it
//! and substitute a default instead of rejecting the whole document.

use crate::validate::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::path::Path;

/// A single setting as found in the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting<T> {
    Missing,
    /// Present but not of the expected type; holds the raw text.
    Invalid(String),
    Set(T),
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Missing
    }
}

impl<T> Setting<T> {
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Setting::Set(v) => Some(v),
            _ => None,
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Setting<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Setting::Missing);
        }
        Ok(match serde_yaml::from_value::<T>(value.clone()) {
            Ok(v) => Setting::Set(v),
            Err(_) => Setting::Invalid(raw_text(&value)),
        })
    }
}

fn raw_text(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// `delete-logs:` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DeleteLogsSection {
    pub after: Setting<i64>,
    pub even_gzipped: Setting<bool>,
}

/// `commands-alert:` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CommandsAlertSection {
    pub list: Setting<Vec<String>>,
    pub message: Setting<String>,
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfigDocument {
    /// Seconds between flushes; 0 writes every line immediately.
    pub save_delay: Setting<i64>,
    pub date_format: Setting<String>,
    pub logs_format: Setting<String>,
    pub logs_live_format: Setting<String>,
    /// Days before a log file is compressed; 0 disables.
    pub gzip_logs_after: Setting<i64>,
    pub delete_logs: DeleteLogsSection,
    pub ignore_npcs: Setting<bool>,
    pub commands_alert: CommandsAlertSection,
    /// Per-event-type rule definitions, in document order.
    pub events: Value,
}

impl ConfigDocument {
    /// Load a configuration document from a file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse a configuration document from a YAML string.
    pub fn parse(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(format!("Invalid YAML: {}", e)))
    }

    /// Rule definitions from the `events:` section.
    pub fn rules(&self) -> RuleDocument {
        RuleDocument::from_value(&self.events)
    }
}

/// Raw rule definitions keyed by event-type name, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleDocument {
    pub rules: Vec<(String, RawRuleDefinition)>,
}

impl RuleDocument {
    /// Build from an `events:` mapping. Anything else yields no rules.
    pub fn from_value(value: &Value) -> Self {
        let Some(mapping) = value.as_mapping() else {
            return Self::default();
        };
        let rules = mapping
            .iter()
            .filter_map(|(k, v)| {
                let name = k.as_str()?;
                Some((name.to_string(), RawRuleDefinition::from_value(v)))
            })
            .collect();
        Self { rules }
    }

    /// Parse a standalone rules document (the body of an `events:` section).
    pub fn parse(yaml: &str) -> ConfigResult<Self> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::ParseError(format!("Invalid YAML: {}", e)))?;
        Ok(Self::from_value(&value))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// One event type's rule, before compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRuleDefinition {
    pub enabled: bool,
    pub message: Option<String>,
    /// Every other key with its raw value, in document order.
    pub conditions: Vec<(String, Value)>,
}

impl RawRuleDefinition {
    /// Read a definition from its YAML value.
    ///
    /// A value that is not a mapping is treated as a disabled rule, and a
    /// non-boolean `enabled` counts as false.
    pub fn from_value(value: &Value) -> Self {
        let Some(mapping) = value.as_mapping() else {
            return Self::default();
        };
        let mut def = Self::default();
        for (k, v) in mapping {
            let Some(key) = k.as_str() else { continue };
            if key.eq_ignore_ascii_case("enabled") {
                def.enabled = v.as_bool().unwrap_or(false);
            } else if key.eq_ignore_ascii_case("message") {
                def.message = v.as_str().map(str::to_string);
            } else {
                def.conditions.push((key.to_string(), v.clone()));
            }
        }
        def
    }

    pub fn enabled(message: &str) -> Self {
        Self {
            enabled: true,
            message: Some(message.to_string()),
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, key: &str, value: Value) -> Self {
        self.conditions.push((key.to_string(), value));
        self
    }
}
