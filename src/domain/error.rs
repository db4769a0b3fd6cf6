//! Error types for the material tracker.
//!
//! This module defines the centralized error type [`TrackerError`] and a type alias
//! [`Result`] for convenient error handling throughout the crate. Pure view
//! computations (filtering, sorting, statistics) never produce these; only the
//! asynchronous collaborators and configuration loading do.

use thiserror::Error;

/// The main error type for material tracker operations.
///
/// Every failure path of a remote, preference, or configuration call is
/// represented here so that callers always receive it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// The remote feed failed.
    ///
    /// Distinct from an empty collection: the last good snapshot is retained and
    /// the condition clears on the next successful notification.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// A remote delete request failed for one record.
    ///
    /// Local state is left untouched; the next feed notification reconciles.
    #[error("Delete failed for {id}: {reason}")]
    DeleteFailed {
        /// Identity of the record whose deletion failed.
        id: String,
        /// Reason reported by the remote store.
        reason: String,
    },

    /// A persisted unit value could not be recognised.
    ///
    /// Callers fall back to grams; this variant exists for logging and tests.
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    /// Preference or document storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    ///
    /// Stored as a message so the error stays `Clone` for broadcast to observers.
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The pipeline worker is gone or refused a command.
    #[error("Worker communication error: {0}")]
    Worker(String),
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// A specialized `Result` type for material tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
