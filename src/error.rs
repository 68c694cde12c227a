//! Error types for snag tracking operations.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for snag operations.
#[derive(Error, Debug)]
pub enum SnagError {
    // Blob store errors
    #[error("Failed to write blob {key}: {source}")]
    BlobWrite {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete blob {key}: {source}")]
    BlobDelete {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list blob directory {}: {source}", .path.display())]
    BlobList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Orphan sweep incomplete: removed {removed}, failed {}: {failed:?}", .failed.len())]
    SweepIncomplete {
        removed: usize,
        failed: Vec<String>,
    },

    #[error("Image file {key} for photo {photo} is missing")]
    BlobMissing { photo: String, key: String },

    #[error("Invalid blob key '{key}': must be a plain file name")]
    InvalidKey { key: String },

    // Record store errors
    #[error("Snag not found: {id}")]
    SnagNotFound { id: String },

    #[error("Photo not found: {id}")]
    PhotoNotFound { id: String },

    #[error("Id prefix '{prefix}' is ambiguous ({count} matches)")]
    AmbiguousId { prefix: String, count: usize },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Invalid {field} value '{value}'")]
    InvalidField { field: &'static str, value: String },

    // Image errors
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Image file not found: {path}")]
    ImageNotFound { path: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    // CLI errors
    #[error("Refusing to {action} without --yes")]
    ConfirmationRequired { action: &'static str },

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl SnagError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SnagNotFound { .. }
                | Self::PhotoNotFound { .. }
                | Self::BlobMissing { .. }
                | Self::AmbiguousId { .. }
                | Self::InvalidField { .. }
                | Self::InvalidKey { .. }
                | Self::ImageNotFound { .. }
                | Self::ConfigNotFound { .. }
                | Self::ConfirmationRequired { .. }
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::SnagNotFound { .. } => Some("Run: snag list"),
            Self::AmbiguousId { .. } => Some("Use a longer id prefix"),
            Self::PhotoNotFound { .. } => Some("Run: snag show <snag-id>"),
            Self::BlobMissing { .. } => Some("Remove the photo with: snag photo rm <photo-id>"),
            Self::ConfirmationRequired { .. } => Some("Re-run with --yes to confirm"),
            Self::SweepIncomplete { .. } => Some("Check directory permissions, then run: snag sweep"),
            Self::BlobWrite { .. } => Some("Check free disk space and directory permissions"),
            Self::ConfigInvalid(_) | Self::ConfigParse(_) => Some("Fix the config file or pass --config"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using SnagError.
pub type Result<T> = std::result::Result<T, SnagError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| SnagError::Other(format!("{}: {e}", f().into())))
    }
}
