//! Error types for the telemetry pipeline.

use thiserror::Error;

/// Connection lifecycle failures. Surfaced to subscribers as a `Closed` event
/// and fed into the reconnect policy.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to connect to {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("tls setup failed: {0}")]
    Tls(String),

    #[error("timed out connecting to {endpoint}")]
    Timeout { endpoint: String },

    #[error("a connection is already open")]
    AlreadyOpen,

    #[error("connection manager is closed")]
    Closed,

    #[error("connection lost: {0}")]
    Lost(String),

    #[error("giving up after {attempts} reconnect attempts")]
    RetriesExhausted { attempts: u32 },
}

/// A single frame that could not be turned into a sample. Never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("frame is not valid JSON: {0}")]
    Malformed(String),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("frame carries no telemetry fields")]
    MissingFields,

    #[error("frame has an invalid field: {0}")]
    InvalidField(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("profile '{0}' does not exist; pass a URL to create it")]
    ProfileNotFound(String),

    #[error("window capacity must be at least 1 (got {0})")]
    InvalidWindow(usize),

    #[error(transparent)]
    Endpoint(#[from] ConnectionError),
}
