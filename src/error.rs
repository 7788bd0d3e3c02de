//! Error types for the calendar service.

use thiserror::Error;

/// Main error type for calendar operations.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("duplicate event (same user, date, and title)")]
    Duplicate,

    #[error("{0}")]
    InvalidInput(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl CalendarError {
    /// Whether this error reports a missing event.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CalendarError::Store(StoreError::NotFound(_)))
    }

    /// Whether this error reports a create-time duplicate.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, CalendarError::Duplicate)
    }
}

/// Event store errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("event not found")]
    NotFound(String),

    #[error("id already exists: {0}")]
    AlreadyExists(String),

    #[error("index corrupted: {0}")]
    IndexCorrupted(String),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for calendar operations.
pub type Result<T> = std::result::Result<T, CalendarError>;
