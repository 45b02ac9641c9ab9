//! Error types shared across the timer, storage and cache layers

use thiserror::Error;

/// Errors raised by a durable key-value store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors raised while talking to the upstream network
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Refusing to forward cross-origin request: {0}")]
    CrossOrigin(String),
}

/// Errors raised while populating or reading cache partitions
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: NetworkError,
    },

    #[error("Request for {url} returned status {status}")]
    BadResponse { url: String, status: u16 },

    #[error("Invalid asset manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Invalid URL {0}")]
    InvalidUrl(String),
}

/// Reasons a notification could not be displayed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Notification permission denied")]
    PermissionDenied,

    #[error("Notifications are not supported on this host")]
    Unsupported,

    #[error("Notification failed: {0}")]
    Failed(String),
}

/// Top-level error for application state operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to lock {0}")]
    Lock(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A specialized `Result` type for application state operations.
pub type Result<T> = std::result::Result<T, Error>;
