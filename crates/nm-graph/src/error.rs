//! Error types for task graph stores

use std::path::PathBuf;

/// Errors while loading or persisting a tag
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backing tasks file does not exist
    #[error("tasks file not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Backing file is not valid JSON
    #[error("malformed tasks file {path}: {source}")]
    Malformed {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Tag entry exists but does not match the chapter schema
    #[error("malformed record for tag '{tag}': {source}")]
    MalformedTag {
        /// Tag being decoded
        tag: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create malformed-file error for path
    pub fn malformed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Malformed {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = StoreError::FileNotFound(PathBuf::from("tasks.json"));
        assert_eq!(err.to_string(), "tasks file not found: tasks.json");
    }

    #[test]
    fn io_error_display() {
        let err = StoreError::io_error(
            "tasks.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("io error on tasks.json"));
    }
}
