//! Error types for sandboxed asset access.

use std::path::PathBuf;

/// Result type for sandboxed asset operations.
pub type Result<T> = std::result::Result<T, SandboxError>;

/// Errors that can occur while resolving or touching files under a sandbox root.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A caller supplied path segment was rejected before any join took place
    #[error("Rejected path segment {segment:?}: {reason}")]
    SegmentRejected { segment: String, reason: String },

    /// The joined path does not stay inside the sandbox root
    #[error("Path validation failed: {path:?} - {reason}")]
    PathValidation { path: PathBuf, reason: String },

    /// File not present on disk
    #[error("File not found: {path:?}")]
    NotFound { path: PathBuf },

    /// Directory creation failed
    #[error("Failed to create directory: {path:?} - {source}")]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl SandboxError {
    /// Whether this error means the request tried to leave the sandbox or used a
    /// malformed segment, as opposed to an ordinary filesystem failure.
    pub fn is_path_violation(&self) -> bool {
        matches!(
            self,
            Self::SegmentRejected { .. } | Self::PathValidation { .. }
        )
    }

    pub(crate) fn rejected(segment: &str, reason: impl Into<String>) -> Self {
        Self::SegmentRejected {
            segment: segment.to_string(),
            reason: reason.into(),
        }
    }
}
