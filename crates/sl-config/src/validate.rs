//! Configuration errors and recovered issues.

use sl_common::ErrorCategory;
use std::fmt;
use thiserror::Error;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that stop a configuration document from loading at all.
///
/// Bad individual values never produce these; they are replaced by
/// defaults and reported as [`ConfigIssue`]s.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::IoError(_) => 60,
            ConfigError::ParseError(_) => 61,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ConfigError::IoError(_) => ErrorCategory::Io,
            ConfigError::ParseError(_) => ErrorCategory::Configuration,
        }
    }
}

/// An invalid configuration value that was replaced by its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Config key, e.g. `logs-format`.
    pub field: String,
    pub message: String,
    /// The value used instead.
    pub fallback: String,
}

impl ConfigIssue {
    pub fn new(field: &str, message: impl Into<String>, fallback: impl fmt::Display) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            fallback: fallback.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid '{}': {}; using default ({})",
            self.field, self.message, self.fallback
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ConfigError::IoError("x".into()).code(), 60);
        assert_eq!(ConfigError::ParseError("x".into()).code(), 61);
        assert_eq!(
            ConfigError::ParseError("x".into()).category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_issue_display() {
        let issue = ConfigIssue::new("save-delay", "must not be negative", 300);
        assert_eq!(
            issue.to_string(),
            "invalid 'save-delay': must not be negative; using default (300)"
        );
    }
}
