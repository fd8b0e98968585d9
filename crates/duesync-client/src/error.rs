//! Client error types.

use std::fmt;

use duesync_engine::SyncError;
use duesync_providers::ProviderError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Event source or calendar provider error.
    Provider(ProviderError),
    /// Sync run aborted before completion.
    Sync(SyncError),
    /// IO error.
    Io(std::io::Error),
    /// Invalid input file contents.
    Input(String),
    /// The run finished but some entries were rejected.
    ItemsFailed(usize),
    /// A shutdown signal stopped the run early.
    Cancelled,
    /// Entries were sent but the dedup ledger could not be saved.
    LedgerNotSaved(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(err) => write!(f, "{}", err),
            Self::Sync(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Input(msg) => write!(f, "invalid input: {}", msg),
            Self::ItemsFailed(1) => write!(f, "1 entry failed to sync"),
            Self::ItemsFailed(n) => write!(f, "{} entries failed to sync", n),
            Self::Cancelled => write!(f, "sync interrupted before all entries were sent"),
            Self::LedgerNotSaved(msg) => {
                write!(f, "entries were sent but the ledger was not saved: {}", msg)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<SyncError> for ClientError {
    fn from(err: SyncError) -> Self {
        Self::Sync(err)
    }
}
