//! Error types for rule compilation and rendering.

use sl_common::ErrorCategory;
use thiserror::Error;

/// A rule that could not be compiled. The rule is skipped; other rules
/// still load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleCompileError {
    #[error("unknown event type '{event_type}'")]
    UnknownEventType { event_type: String },

    #[error("invalid condition '{key}' for '{event_type}': {reason}")]
    InvalidCondition {
        event_type: String,
        key: String,
        reason: String,
    },
}

impl RuleCompileError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::RuleCompile
    }

    pub fn event_type(&self) -> &str {
        match self {
            RuleCompileError::UnknownEventType { event_type }
            | RuleCompileError::InvalidCondition { event_type, .. } => event_type,
        }
    }
}

/// An event that could not be rendered against its rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("event '{actual}' does not match rule for '{expected}'")]
    EventTypeMismatch { expected: String, actual: String },

    #[error("event '{event_type}' has no '{attribute}' subject")]
    MissingSubject {
        event_type: String,
        attribute: String,
    },

    #[error("subject '{attribute}' of '{event_type}' is a {found}, expected {expected}")]
    SubjectShape {
        event_type: String,
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl RenderError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Extraction
    }
}
