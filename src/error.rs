//! Error types for the arcade.
//!
//! None of these ever end a game: storage and audio failures degrade
//! silently, advisor failures turn into a scripted fallback line.

use thiserror::Error;

/// Failures of the device key-value store behind the leaderboards.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No storage backend (private mode, storage disabled, no window).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected a write, usually a full quota.
    #[error("storage write rejected for key {key}: {reason}")]
    WriteRejected {
        /// Storage key that was being written.
        key: String,
        /// Backend-provided reason.
        reason: String,
    },

    /// The stored board is not a JSON array of score records.
    #[error("corrupt leaderboard under key {key}: {source}")]
    Corrupt {
        /// Storage key holding the bad data.
        key: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Failures talking to the generative-text service.
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// No credential was configured.
    #[error("advisor is not configured")]
    NotConfigured,

    /// The request never produced a response (network, CORS, aborted).
    #[error("advisor transport failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("advisor returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The response contained no candidate text.
    #[error("advisor reply was empty")]
    EmptyReply,

    /// The reply text was not the JSON shape we asked for.
    #[error("advisor reply did not match the schema: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Bad runtime configuration handed over from JS.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

/// Result type for advisor calls.
pub type AdvisorResult<T> = Result<T, AdvisorError>;
