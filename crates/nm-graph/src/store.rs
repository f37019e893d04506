//! Tag-keyed persistence for the narrative task graph
//!
//! [`JsonTaskStore`] keeps every tag in a single JSON object:
//!
//! ```json
//! { "outline": { "tasks": [ ... ], "metadata": { ... } }, "draft-2": { ... } }
//! ```
//!
//! Saving one tag rewrites the file but leaves every other top-level key as it
//! was read.

use crate::error::StoreError;
use crate::record;
use crate::types::TagData;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Tag-keyed task graph persistence
///
/// Implementations move tag records as raw JSON so that a patch-and-save
/// cycle writes back exactly what was read apart from the patched keys.
#[async_trait::async_trait]
pub trait TaskGraphStore: Send + Sync {
    /// Load one tag record as authored
    ///
    /// Returns `Ok(None)` when the backing store exists but has no such tag.
    ///
    /// # Errors
    /// Returns `StoreError` when the backing store cannot be read or parsed.
    async fn load_record(&self, tag: &str) -> Result<Option<Value>, StoreError>;

    /// Replace one tag record, leaving all others untouched
    ///
    /// # Errors
    /// Returns `StoreError` when the backing store cannot be written.
    async fn save_record(&self, tag: &str, record: &Value) -> Result<(), StoreError>;

    /// Names of all tags present, sorted
    ///
    /// # Errors
    /// Returns `StoreError` when the backing store cannot be read or parsed.
    async fn tags(&self) -> Result<Vec<String>, StoreError>;

    /// Load and decode one tag
    ///
    /// # Errors
    /// Returns `StoreError` when the store fails or the record does not match
    /// the chapter schema.
    async fn load_tag(&self, tag: &str) -> Result<Option<TagData>, StoreError> {
        match self.load_record(tag).await? {
            Some(raw) => record::decode(tag, raw).map(Some),
            None => Ok(None),
        }
    }

    /// Encode and replace one tag
    ///
    /// # Errors
    /// Returns `StoreError` when the store cannot be written.
    async fn save_tag(&self, tag: &str, data: &TagData) -> Result<(), StoreError> {
        let raw = record::encode(tag, data)?;
        self.save_record(tag, &raw).await
    }
}

/// `tasks.json` backed store
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    /// Create store over the given tasks file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::FileNotFound(self.path.clone()));
            }
            Err(e) => return Err(StoreError::io_error(&self.path, e)),
        };

        serde_json::from_str(&raw).map_err(|e| StoreError::malformed(&self.path, e))
    }

    async fn write_document(&self, document: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io_error(parent, e))?;
        }

        let mut rendered =
            serde_json::to_string_pretty(document).map_err(|e| StoreError::malformed(&self.path, e))?;
        rendered.push('\n');

        tokio::fs::write(&self.path, rendered)
            .await
            .map_err(|e| StoreError::io_error(&self.path, e))
    }
}

#[async_trait::async_trait]
impl TaskGraphStore for JsonTaskStore {
    async fn load_record(&self, tag: &str) -> Result<Option<Value>, StoreError> {
        let mut document = self.read_document().await?;
        let entry = document.remove(tag);
        if entry.is_none() {
            tracing::debug!("Tag '{}' not present in {}", tag, self.path.display());
        }
        Ok(entry)
    }

    async fn save_record(&self, tag: &str, record: &Value) -> Result<(), StoreError> {
        let mut document = match self.read_document().await {
            Ok(document) => document,
            Err(StoreError::FileNotFound(_)) => Map::new(),
            Err(e) => return Err(e),
        };

        document.insert(tag.to_string(), record.clone());

        self.write_document(&document).await?;
        tracing::debug!("Saved tag '{}' to {}", tag, self.path.display());
        Ok(())
    }

    async fn tags(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.read_document().await?.into_iter().map(|(k, _)| k).collect();
        names.sort();
        Ok(names)
    }
}

/// In-memory store for tests and embedding
///
/// Counts saves so callers can assert how often a tag was written.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    records: RwLock<HashMap<String, Value>>,
    writes: AtomicUsize,
}

impl MemoryTaskStore {
    /// Create empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a raw tag record preloaded
    #[must_use]
    pub fn with_record(self, tag: impl Into<String>, record: Value) -> Self {
        self.records.write().insert(tag.into(), record);
        self
    }

    /// With a tag preloaded
    ///
    /// A tag that cannot be encoded is left out and logged.
    #[must_use]
    pub fn with_tag(self, tag: impl Into<String>, data: TagData) -> Self {
        let tag = tag.into();
        match record::encode(&tag, &data) {
            Ok(raw) => self.with_record(tag, raw),
            Err(e) => {
                tracing::warn!("Skipping tag '{}': {}", tag, e);
                self
            }
        }
    }

    /// Current raw record of a tag
    #[must_use]
    pub fn record(&self, tag: &str) -> Option<Value> {
        self.records.read().get(tag).cloned()
    }

    /// Current contents of a tag, decoded
    #[must_use]
    pub fn snapshot(&self, tag: &str) -> Option<TagData> {
        self.record(tag).and_then(|raw| record::decode(tag, raw).ok())
    }

    /// Number of successful saves
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TaskGraphStore for MemoryTaskStore {
    async fn load_record(&self, tag: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.record(tag))
    }

    async fn save_record(&self, tag: &str, record: &Value) -> Result<(), StoreError> {
        self.records.write().insert(tag.to_string(), record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn tags(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.records.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chapter;
    use serde_json::json;

    #[tokio::test]
    async fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::new(dir.path().join("tasks.json"));

        let err = store.load_tag("outline").await.unwrap_err();
        assert!(matches!(err, StoreError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn missing_tag_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, r#"{ "outline": { "tasks": [] } }"#).unwrap();

        let store = JsonTaskStore::new(&path);
        assert!(store.load_tag("sequel").await.unwrap().is_none());
        assert!(store.load_tag("outline").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn save_keeps_other_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(
            &path,
            r#"{ "other": { "tasks": [{ "id": 9, "title": "Keep" }], "custom": true } }"#,
        )
        .unwrap();

        let store = JsonTaskStore::new(&path);
        store
            .save_tag("outline", &TagData::new(vec![Chapter::new(1, "Arrival")]))
            .await
            .unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["other"]["custom"], json!(true));
        assert_eq!(written["other"]["tasks"][0]["title"], json!("Keep"));
        assert_eq!(written["outline"]["tasks"][0]["title"], json!("Arrival"));
        assert_eq!(store.tags().await.unwrap(), vec!["other", "outline"]);
    }

    #[tokio::test]
    async fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonTaskStore::new(&path).load_tag("outline").await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[tokio::test]
    async fn memory_store_counts_writes() {
        let store = MemoryTaskStore::new().with_tag("outline", TagData::default());
        assert_eq!(store.write_count(), 0);

        store.save_tag("outline", &TagData::default()).await.unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.tags().await.unwrap(), vec!["outline"]);
    }
}
