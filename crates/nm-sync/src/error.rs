//! Error types for manuscript synchronization
//!
//! Every error maps to a stable code used in the uniform response envelope.

use nm_graph::StoreError;
use nm_manuscript::ManuscriptError;
use std::path::PathBuf;

/// Errors that abort a synchronization pass or a report
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Tag missing from the task graph store
    #[error("tag '{0}' not found")]
    TagNotFound(String),

    /// Tag exists but has no chapters
    #[error("tag '{0}' contains no chapters")]
    EmptyTag(String),

    /// Task graph store failed
    #[error("task store error: {0}")]
    Store(#[from] StoreError),

    /// Manuscript artifact could not be written or read
    #[error(transparent)]
    Manuscript(#[from] ManuscriptError),

    /// Project configuration is unreadable or malformed
    #[error("configuration error in {path}: {message}")]
    Config {
        /// Configuration file that failed
        path: PathBuf,
        /// Parser or I/O message
        message: String,
    },

    /// Requested artifact does not exist yet
    #[error("{message}")]
    FileNotFound {
        /// Expected location of the artifact
        path: PathBuf,
        /// Hint on how to produce it
        message: String,
    },

    /// Caller passed an unusable argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl SyncError {
    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::TagNotFound(_) => "TAG_NOT_FOUND",
            Self::EmptyTag(_) => "EMPTY_TAG",
            Self::Store(StoreError::FileNotFound(_)) => "FILE_NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
            Self::Manuscript(ManuscriptError::Read { .. } | ManuscriptError::Json { .. }) => {
                "READ_ERROR"
            }
            Self::Manuscript(ManuscriptError::Write { .. }) => "WRITE_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::FileNotFound { .. } => "FILE_NOT_FOUND",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
        }
    }

    /// Check if the error came from reading the pass inputs
    ///
    /// True for a missing or empty tag, bad configuration and any store
    /// failure. Store failures can also come from the final write-back, so a
    /// `true` here does not mean no chapter file was written.
    #[inline]
    #[must_use]
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::TagNotFound(_) | Self::EmptyTag(_) | Self::Store(_) | Self::Config { .. }
        )
    }
}
