//! Core error types for stagetimer-core.
//!
//! Nothing in the core is fatal: every error here is either returned from the
//! operation that was rejected or recorded in the sequencer's status message.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stagetimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Stage sequencing errors
    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    /// Countdown source errors
    #[error("Countdown error: {0}")]
    Countdown(#[from] CountdownError),

    /// Settings/preset persistence failed (in-memory state is kept)
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Mirror sync errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the stage sequencer.
#[derive(Error, Debug)]
pub enum SequenceError {
    /// Setup was given no stage with a positive duration
    #[error("no stage with a positive duration was configured")]
    EmptyConfiguration,

    /// Start was requested past the last stage
    #[error("all stages are complete (index {index} of {len})")]
    SequenceExhausted { index: usize, len: usize },

    /// The countdown source refused to arm; `running` has been rolled back
    #[error("countdown arm failure: {0}")]
    CountdownArmFailure(#[from] CountdownError),
}

/// Errors raised by a countdown source when arming.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CountdownError {
    /// No async runtime is available to drive the ticks
    #[error("no async runtime available to drive the countdown")]
    NoRuntime,

    /// The source is still armed from a previous start
    #[error("countdown is already running")]
    AlreadyArmed,

    /// The source rejected the request for another reason
    #[error("countdown rejected: {0}")]
    Rejected(String),
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the store file
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query or flush failed
    #[error("Store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored value could not be (de)serialized
    #[error("Store value is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem errors while locating the store
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load a configuration or plan file
    #[error("Failed to load {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Unknown dotted key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Value does not fit the key's type
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Lookup by id failed
    #[error("No {collection} with id '{id}'")]
    NotFound { collection: String, id: String },
}

/// Mirror sync errors.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The channel has been shut down
    #[error("sync channel closed")]
    Closed,

    /// A message could not be encoded or decoded
    #[error("sync message encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Transport IO failure
    #[error("sync transport IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
