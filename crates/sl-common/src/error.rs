//! Error categories for superlog diagnostics.
//!
//! Nothing in the logging pipeline is allowed to crash the calling
//! thread. Failures are recovered where they happen and surfaced as a
//! [`Diagnostic`] tagged with one of the categories below:
//!
//! ```text
//! configuration  bad template or threshold; a default was substituted
//! rule_compile   unknown event type or invalid field condition; rule skipped
//! extraction     attribute unreadable on one event; field skipped
//! io             file create/write/compress/delete failure
//! ```
//!
//! Suppression by a condition is not an error and has no category.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error categories for grouping related failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid configuration value, recovered with a default.
    Configuration,
    /// A single rule failed to compile and was not registered.
    RuleCompile,
    /// An attribute could not be read from an event instance.
    Extraction,
    /// File system failure.
    Io,
}

impl ErrorCategory {
    /// Whether the pipeline keeps going after an error of this category.
    ///
    /// Every category is recovered at its point of origin; only I/O
    /// failures during a flush are retried automatically.
    pub fn is_retried(&self) -> bool {
        matches!(self, ErrorCategory::Io)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::RuleCompile => write!(f, "rule_compile"),
            ErrorCategory::Extraction => write!(f, "extraction"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// A recovered failure, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: ErrorCategory,
    pub message: String,
}

impl Diagnostic {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display_matches_serde() {
        for category in [
            ErrorCategory::Configuration,
            ErrorCategory::RuleCompile,
            ErrorCategory::Extraction,
            ErrorCategory::Io,
        ] {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category));
        }
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::new(ErrorCategory::RuleCompile, "unknown event type 'Foo'");
        assert_eq!(d.to_string(), "[rule_compile] unknown event type 'Foo'");
        assert!(!ErrorCategory::RuleCompile.is_retried());
        assert!(ErrorCategory::Io.is_retried());
    }
}
