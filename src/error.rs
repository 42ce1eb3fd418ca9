//! Error types for playstat.
//!
//! Invariant violations (ending a session before it started, ending it twice)
//! are reported to the immediate caller as values of [`PlaystatError`]. Missing
//! data is not an error: lookups for sessions that are not open return
//! `None` or `false` instead.

use thiserror::Error;
use uuid::Uuid;

/// Primary error type for playstat operations.
#[derive(Error, Debug)]
pub enum PlaystatError {
    /// A timestamp lies before a point the record has already passed.
    #[error("Invalid timestamp {timestamp}: {reason}")]
    InvalidTimestamp {
        /// The offending epoch-millisecond value.
        timestamp: i64,
        /// Why the timestamp was rejected.
        reason: String,
    },

    /// The session was already closed.
    #[error("Session of player {player} on server {server} is already closed")]
    SessionAlreadyClosed {
        /// Player the session belongs to.
        player: Uuid,
        /// Server the session was recorded on.
        server: Uuid,
    },

    /// Invalid argument.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Name of the invalid argument.
        name: String,
        /// Reason why the argument is invalid.
        reason: String,
    },

    /// Configuration could not be located or read.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Human-readable error message.
        message: String,
    },

    /// Configuration was read but holds unusable values.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {context}")]
    IoError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {context}")]
    SerializationError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// Storage backend failure.
    #[error("Storage error: {message}")]
    StorageError {
        /// Human-readable error message.
        message: String,
        /// Underlying SQLite error, if any.
        #[source]
        source: Option<rusqlite::Error>,
    },

    /// The background persistence worker is no longer receiving sessions.
    #[error("Persistence queue is closed")]
    QueueClosed,

    /// Unsupported operation or feature.
    #[error("Unsupported: {feature}")]
    Unsupported {
        /// Name of the unsupported feature.
        feature: String,
    },
}

impl PlaystatError {
    /// Create a new invalid timestamp error.
    #[must_use]
    pub fn invalid_timestamp(timestamp: i64, reason: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            timestamp,
            reason: reason.into(),
        }
    }

    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Create a new storage error wrapping a SQLite error.
    #[must_use]
    pub fn storage(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::StorageError {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a new invalid argument error.
    #[must_use]
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } => exit_codes::EXIT_USAGE_ERROR,
            Self::ConfigError { .. } | Self::InvalidConfig { .. } => exit_codes::EXIT_CONFIG_ERROR,
            Self::InvalidTimestamp { .. } | Self::SessionAlreadyClosed { .. } => {
                exit_codes::EXIT_DATA_ERROR
            }
            Self::SerializationError { .. } => exit_codes::EXIT_DATA_ERROR,
            Self::StorageError { .. } | Self::QueueClosed => exit_codes::EXIT_STORAGE_ERROR,
            Self::IoError { .. } => exit_codes::EXIT_IO_ERROR,
            Self::Unsupported { .. } => exit_codes::EXIT_GENERAL_ERROR,
        }
    }

    /// Check if the offending event can simply be dropped by the caller.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidTimestamp { .. } | Self::SessionAlreadyClosed { .. }
        )
    }
}

/// Result type alias for playstat operations.
pub type Result<T> = std::result::Result<T, PlaystatError>;

impl From<std::io::Error> for PlaystatError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for PlaystatError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            context: "JSON operation failed".to_string(),
            source: err,
        }
    }
}

impl From<rusqlite::Error> for PlaystatError {
    fn from(err: rusqlite::Error) -> Self {
        Self::StorageError {
            message: "SQLite operation failed".to_string(),
            source: Some(err),
        }
    }
}

/// Build a config error for a path that could not be read.
pub(crate) fn config_read_error(path: &std::path::Path, err: &std::io::Error) -> PlaystatError {
    PlaystatError::ConfigError {
        message: format!("Failed to read {}: {err}", path.display()),
    }
}

/// Exit codes for CLI operations.
pub mod exit_codes {
    /// Operation completed successfully.
    pub const EXIT_SUCCESS: i32 = 0;
    /// General/unspecified error.
    pub const EXIT_GENERAL_ERROR: i32 = 1;
    /// Invalid configuration.
    pub const EXIT_CONFIG_ERROR: i32 = 5;
    /// Storage backend failed.
    pub const EXIT_STORAGE_ERROR: i32 = 6;
    /// Invalid command-line usage (BSD standard).
    pub const EXIT_USAGE_ERROR: i32 = 64;
    /// Input data format error (BSD standard).
    pub const EXIT_DATA_ERROR: i32 = 65;
    /// I/O error (BSD standard).
    pub const EXIT_IO_ERROR: i32 = 74;
}
