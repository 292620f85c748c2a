//! Error types for the bodylog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for bodylog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed block or user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record or template lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller identity rejected by the access policy
    #[error("Access denied")]
    Forbidden,

    /// Record store is unreadable or inconsistent
    #[error("Store error: {0}")]
    Store(String),
}
