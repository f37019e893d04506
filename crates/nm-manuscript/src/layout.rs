//! On-disk layout of one tag's manuscript artifacts
//!
//! ```text
//! <output_dir>/<tag-slug>/
//!   chapters/chapter-001.md
//!   compiled/manuscript-<tag-slug>.md
//!   manuscript-summary.json
//! ```

use crate::compile::CompileFormat;
use nm_graph::ChapterId;
use std::path::{Path, PathBuf};

/// File name of the per-tag summary
pub const SUMMARY_FILE: &str = "manuscript-summary.json";

/// Turn a tag name into a single safe path component
///
/// Lowercases, replaces anything outside `[a-z0-9_-]` with `-`, collapses
/// dash runs and trims dashes from both ends. Falls back to `default`.
#[must_use]
pub fn slugify_tag(tag: &str) -> String {
    let mut slug = String::with_capacity(tag.len());
    for ch in tag.trim().chars().flat_map(char::to_lowercase) {
        let ch = if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            ch
        } else {
            '-'
        };
        if ch == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(ch);
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "default".to_string()
    } else {
        slug.to_string()
    }
}

/// File name for a chapter, zero padded to three digits
#[must_use]
pub fn chapter_file_name(id: ChapterId) -> String {
    format!("chapter-{:03}.md", id.0)
}

/// Paths under one tag root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManuscriptLayout {
    root: PathBuf,
    slug: String,
}

impl ManuscriptLayout {
    /// Layout for `tag` under `output_dir`
    pub fn new(output_dir: impl AsRef<Path>, tag: &str) -> Self {
        let slug = slugify_tag(tag);
        Self {
            root: output_dir.as_ref().join(&slug),
            slug,
        }
    }

    /// Tag root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Slug used for directory and compiled file names
    #[inline]
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn chapters_dir(&self) -> PathBuf {
        self.root.join("chapters")
    }

    #[must_use]
    pub fn chapter_path(&self, id: ChapterId) -> PathBuf {
        self.chapters_dir().join(chapter_file_name(id))
    }

    #[must_use]
    pub fn compiled_dir(&self) -> PathBuf {
        self.root.join("compiled")
    }

    #[must_use]
    pub fn compiled_path(&self, format: CompileFormat) -> PathBuf {
        self.compiled_dir()
            .join(format!("manuscript-{}.{}", self.slug, format.extension()))
    }

    #[must_use]
    pub fn summary_path(&self) -> PathBuf {
        self.root.join(SUMMARY_FILE)
    }
}
