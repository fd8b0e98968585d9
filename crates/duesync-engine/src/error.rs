//! Sync engine error types.
//!
//! Only setup failures surface as [`SyncError`]. A single entry that the
//! remote calendar rejects becomes a `Failed` outcome in the report instead.

use std::io;
use std::path::Path;

use duesync_providers::ProviderError;
use thiserror::Error;

/// Result type for sync engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No authorized calendar client is available.
    #[error("no authorized calendar client ({calendar}): {reason}")]
    AuthMissing { calendar: String, reason: String },

    /// Raw events could not be obtained.
    #[error("failed to read events: {0}")]
    Source(#[source] ProviderError),

    /// The dedup ledger could not be read or written.
    #[error("ledger error at {path}: {message}")]
    Ledger { path: String, message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Creates an auth-missing error for `calendar`.
    pub fn auth_missing(calendar: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AuthMissing {
            calendar: calendar.into(),
            reason: reason.into(),
        }
    }

    /// Creates a ledger error.
    pub fn ledger(path: &Path, message: impl Into<String>) -> Self {
        Self::Ledger {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if the run stopped for lack of credentials.
    pub fn is_auth_missing(&self) -> bool {
        matches!(self, Self::AuthMissing { .. })
    }
}

impl From<ProviderError> for SyncError {
    fn from(err: ProviderError) -> Self {
        use duesync_providers::ProviderErrorCode as Code;
        match err.code() {
            Code::AuthenticationFailed | Code::AuthorizationFailed => Self::AuthMissing {
                calendar: err.provider().unwrap_or("calendar").to_string(),
                reason: err.message().to_string(),
            },
            _ => Self::Source(err),
        }
    }
}
