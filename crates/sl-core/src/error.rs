//! Top-level error type.

use sl_common::ErrorCategory;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] sl_config::ConfigError),

    #[error(transparent)]
    Sink(#[from] sl_sink::SinkError),

    #[error(transparent)]
    Retention(#[from] sl_sink::RetentionError),

    #[error(transparent)]
    Filter(#[from] sl_sink::FilterError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid event on line {line}: {source}")]
    EventParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid event catalog: {0}")]
    Catalog(#[from] serde_yaml::Error),
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(e) => e.category(),
            Error::Sink(e) => e.category(),
            Error::Retention(e) => e.category(),
            Error::Filter(e) => e.category(),
            Error::Io(_) => ErrorCategory::Io,
            Error::EventParse { .. } => ErrorCategory::Extraction,
            Error::Catalog(_) => ErrorCategory::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
