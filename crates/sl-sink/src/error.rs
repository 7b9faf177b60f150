//! Error types for persistence, retention and export.

use sl_common::ErrorCategory;
use std::path::PathBuf;
use thiserror::Error;

/// A log file could not be written.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SinkError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Io
    }
}

/// A retention sweep could not run.
#[derive(Error, Debug)]
pub enum RetentionError {
    #[error("invalid {sweep} threshold: {days} days")]
    InvalidThreshold { sweep: &'static str, days: i64 },

    #[error("I/O error scanning {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RetentionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RetentionError::InvalidThreshold { .. } => ErrorCategory::Configuration,
            RetentionError::Io { .. } => ErrorCategory::Io,
        }
    }
}

/// A filtered export produced nothing.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("no logs found for '{subject}'")]
    NoLogs { subject: String },

    #[error("no '{event}' lines found for '{subject}'")]
    NoMatches { subject: String, event: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FilterError::Io(_) => ErrorCategory::Io,
            _ => ErrorCategory::Configuration,
        }
    }
}
