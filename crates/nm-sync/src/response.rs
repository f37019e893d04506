//! Uniform result envelope for host tools
//!
//! `{ "success": true, "data": ... }` or
//! `{ "success": false, "error": { "code": ..., "message": ... } }`

use crate::error::SyncError;
use serde::Serialize;

/// Error half of the envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl From<&SyncError> for ErrorBody {
    fn from(err: &SyncError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Success or failure, as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SyncResponse<T> {
    /// `{"success": true, "data": ...}`
    Success {
        /// Always `true`
        success: bool,
        /// Operation result
        data: T,
    },
    /// `{"success": false, "error": {...}}`
    Failure {
        /// Always `false`
        success: bool,
        /// What went wrong
        error: ErrorBody,
    },
}

impl<T> SyncResponse<T> {
    /// Wrap a successful value
    pub fn ok(data: T) -> Self {
        Self::Success {
            success: true,
            data,
        }
    }

    /// Wrap an error
    pub fn err(err: &SyncError) -> Self {
        Self::Failure {
            success: false,
            error: ErrorBody::from(err),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl<T> From<Result<T, SyncError>> for SyncResponse<T> {
    fn from(result: Result<T, SyncError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => {
                tracing::warn!("Request failed with {}: {}", err.code(), err);
                Self::err(&err)
            }
        }
    }
}
