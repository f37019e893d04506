//! Project configuration
//!
//! Read from `.novelmaster/config.json`. Every field is optional and unknown
//! sections belonging to other tools are ignored.

use crate::error::SyncError;
use nm_graph::WordCountTarget;
use nm_manuscript::{parse_word_count_target, CompileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalConfig {
    /// Whole-manuscript target (`80000`, `"80k"`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_word_count: Option<WordCountTarget>,
}

/// Manuscript generation defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManuscriptConfig {
    /// Output root; relative paths resolve against the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Compile the manuscript after syncing
    pub compile: bool,
    /// Write the summary and rollup
    pub summary: bool,
    /// Compiled output format
    pub format: CompileFormat,
}

impl Default for ManuscriptConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            compile: true,
            summary: true,
            format: CompileFormat::Markdown,
        }
    }
}

/// Contents of `config.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Project-wide settings
    pub global: GlobalConfig,
    /// Manuscript generation defaults
    pub manuscript: ManuscriptConfig,
}

impl ProjectConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With global word-count target
    #[inline]
    #[must_use]
    pub fn with_target_word_count(mut self, target: impl Into<WordCountTarget>) -> Self {
        self.global.target_word_count = Some(target.into());
        self
    }

    /// With output directory
    #[inline]
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manuscript.output_dir = Some(dir.into());
        self
    }

    /// With compile default
    #[inline]
    #[must_use]
    pub fn with_compile(mut self, compile: bool) -> Self {
        self.manuscript.compile = compile;
        self
    }

    /// With summary default
    #[inline]
    #[must_use]
    pub fn with_summary(mut self, summary: bool) -> Self {
        self.manuscript.summary = summary;
        self
    }

    /// With compiled format default
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: CompileFormat) -> Self {
        self.manuscript.format = format;
        self
    }

    /// Parsed global target; zero and unparseable values count as unset
    #[must_use]
    pub fn global_target(&self) -> Option<u64> {
        self.global
            .target_word_count
            .as_ref()
            .and_then(parse_word_count_target)
            .filter(|t| *t > 0)
    }

    /// Load from a config file; a missing file yields defaults
    ///
    /// # Errors
    /// Returns `SyncError::Config` when the file is unreadable or malformed.
    pub async fn load(path: &Path) -> Result<Self, SyncError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SyncError::Config {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        serde_json::from_str(&raw).map_err(|e| SyncError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: ProjectConfig = serde_json::from_value(json!({
            "models": { "main": "ignored" },
            "manuscript": { "format": "txt" }
        }))
        .unwrap();

        assert_eq!(config.manuscript.format, CompileFormat::Text);
        assert!(config.manuscript.compile);
        assert!(config.manuscript.summary);
        assert_eq!(config.global_target(), None);
    }

    #[test]
    fn global_target_accepts_text() {
        let config: ProjectConfig =
            serde_json::from_value(json!({ "global": { "targetWordCount": "80k" } })).unwrap();
        assert_eq!(config.global_target(), Some(80_000));

        assert_eq!(ProjectConfig::new().with_target_word_count(0_u64).global_target(), None);
    }

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::load(&dir.path().join("config.json")).await.unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[tokio::test]
    async fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();

        let err = ProjectConfig::load(&path).await.unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
