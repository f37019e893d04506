//! Whole-file reads and writes for manuscript artifacts
//!
//! Every write is a complete overwrite of content computed in memory first.
//! Parent directories are created on demand.

use crate::error::ManuscriptError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read a file, treating a missing file as `None`
///
/// # Errors
/// Returns `ManuscriptError::Read` for any failure other than not-found.
pub async fn read_optional(path: &Path) -> Result<Option<String>, ManuscriptError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ManuscriptError::read_error(path, e)),
    }
}

/// Write `content` to `path`, creating parent directories
///
/// # Errors
/// Returns `ManuscriptError::Write` if the directory or file cannot be written.
pub async fn write_file(path: &Path, content: &str) -> Result<(), ManuscriptError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ManuscriptError::write_error(parent, e))?;
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|e| ManuscriptError::write_error(path, e))
}

/// Write `value` as two-space indented JSON
///
/// # Errors
/// Returns `ManuscriptError` if serialization or the write fails.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ManuscriptError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| ManuscriptError::json_error(path, e))?;
    write_file(path, &rendered).await
}

/// Read and parse a JSON file, treating a missing file as `None`
///
/// # Errors
/// Returns `ManuscriptError` if the file is unreadable or not valid JSON for `T`.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ManuscriptError> {
    let Some(raw) = read_optional(path).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| ManuscriptError::json_error(path, e))
}
