//! Error types shared across the crate.

use thiserror::Error;

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Errors raised by the analytics transforms and by `RecordSequence` construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyticsError {
    /// A caller-supplied parameter is out of domain (zero window, empty input, ...).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The records handed to the core violate an ordering or shape invariant.
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),
}

impl AnalyticsError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn integrity(msg: impl Into<String>) -> Self {
        Self::DataIntegrity(msg.into())
    }
}

/// Errors raised while loading or saving a record history.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("delimited file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed row at line {line}: {reason}")]
    Parse { line: u64, reason: String },

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}

/// Errors raised while paging through a remote race history.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("page source failed: {0}")]
    Source(String),

    #[error("malformed race row: {0}")]
    Row(String),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}
