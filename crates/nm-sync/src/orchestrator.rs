//! Synchronization Orchestrator
//!
//! Drives one sequential pass for a tag:
//!
//! ```text
//! LOAD → VALIDATE_DEPENDENCIES → (MERGE_CHAPTER)* → WRITE_BACK_PROGRESS
//!      → (COMPILE)? → (WRITE_SUMMARY)? → DONE
//! ```
//!
//! Only LOAD and file-system writes can fail the pass. Files already written
//! when a later step fails are left in place.

use crate::clock::{Clock, SystemClock};
use crate::config::ProjectConfig;
use crate::error::SyncError;
use crate::paths::ProjectPaths;
use crate::reports::{self, ComparisonMetric, SummaryDocument, TagComparison};
use crate::state;
use nm_graph::{
    record, Chapter, DependencyFix, DependencyValidator, JsonTaskStore, TagData, TaskGraphStore,
    ValidationReport,
};
use nm_manuscript::{
    calculate_progress, count_words, extract_draft, files, merge_chapter_content,
    parse_word_count_target, render_managed_section, ChapterSummary, CompileFormat,
    ManuscriptCompiler, ManuscriptLayout, ManuscriptSummary, ProgressLedger, ProgressRollup,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-run options; unset values fall back to the project configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Tag to synchronize
    pub tag: String,
    /// Output root override
    pub output_dir: Option<PathBuf>,
    /// Compile override
    pub compile: Option<bool>,
    /// Summary override
    pub summary: Option<bool>,
    /// Compiled format override
    pub format: Option<CompileFormat>,
}

impl SyncOptions {
    /// Options for a tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            output_dir: None,
            compile: None,
            summary: None,
            format: None,
        }
    }

    /// With output directory
    #[inline]
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// With compilation on or off
    #[inline]
    #[must_use]
    pub fn with_compile(mut self, compile: bool) -> Self {
        self.compile = Some(compile);
        self
    }

    /// With summary on or off
    #[inline]
    #[must_use]
    pub fn with_summary(mut self, summary: bool) -> Self {
        self.summary = Some(summary);
        self
    }

    /// With compiled format
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: CompileFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Outcome of a successful pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Tag that was synchronized
    pub tag: String,
    /// Directory holding the chapter files
    pub chapters_dir: PathBuf,
    /// Summary file, when written
    pub summary_path: Option<PathBuf>,
    /// Compiled manuscript, when written
    pub compiled_path: Option<PathBuf>,
    /// Per-chapter results in tag order
    pub chapters: Vec<ChapterSummary>,
    /// Dependency repairs applied during validation
    pub fixes: Vec<DependencyFix>,
}

/// Synchronizes a project's task graph with its manuscript files
pub struct ManuscriptSynchronizer {
    paths: ProjectPaths,
    store: Arc<dyn TaskGraphStore>,
    config: ProjectConfig,
    clock: Arc<dyn Clock>,
    validator: DependencyValidator,
}

impl std::fmt::Debug for ManuscriptSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManuscriptSynchronizer")
            .field("paths", &self.paths)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ManuscriptSynchronizer {
    /// Create synchronizer over an explicit store with default configuration
    pub fn new(project_root: impl Into<PathBuf>, store: Arc<dyn TaskGraphStore>) -> Self {
        Self {
            paths: ProjectPaths::new(project_root),
            store,
            config: ProjectConfig::default(),
            clock: Arc::new(SystemClock),
            validator: DependencyValidator::new(),
        }
    }

    /// Open a project: JSON task store and `config.json` from its root
    ///
    /// # Errors
    /// Returns `SyncError::Config` if the configuration file is malformed.
    pub async fn open(project_root: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let paths = ProjectPaths::new(project_root);
        let config = ProjectConfig::load(&paths.config_file()).await?;
        let store = Arc::new(JsonTaskStore::new(paths.tasks_file()));
        Ok(Self::new(paths.root().to_path_buf(), store).with_config(config))
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: ProjectConfig) -> Self {
        self.config = config;
        self
    }

    /// With clock
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Project paths
    #[inline]
    #[must_use]
    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Underlying task graph store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &dyn TaskGraphStore {
        self.store.as_ref()
    }

    /// Current time from the configured clock
    #[inline]
    #[must_use]
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Run one synchronization pass for `options.tag`
    ///
    /// The progress rollup is recorded in `ledger` when a summary is written.
    ///
    /// # Errors
    /// Returns `SyncError` if the tag is missing or empty, the store fails,
    /// or an artifact cannot be written.
    pub async fn sync(
        &self,
        options: &SyncOptions,
        ledger: &mut ProgressLedger,
    ) -> Result<SyncReport, SyncError> {
        let tag = options.tag.trim();
        if tag.is_empty() {
            return Err(SyncError::InvalidArgument("tag must not be empty".to_string()));
        }

        let mut tag_data = self.load(tag).await?;
        let report = self.validator.validate(&mut tag_data);

        let output_dir = self
            .paths
            .resolve_output_dir(options.output_dir.as_deref().or(self.config.manuscript.output_dir.as_deref()));
        let layout = ManuscriptLayout::new(&output_dir, tag);
        tracing::info!(
            "Synchronizing {} chapters for tag '{}' into {}",
            tag_data.tasks.len(),
            tag,
            layout.chapters_dir().display()
        );

        let mut chapters = Vec::with_capacity(tag_data.tasks.len());
        for chapter in &tag_data.tasks {
            chapters.push(self.merge_chapter(chapter, tag, &tag_data, &layout).await?);
        }

        self.write_back_progress(tag, &chapters).await?;

        let compiled_path = if options.compile.unwrap_or(self.config.manuscript.compile) {
            let format = options.format.unwrap_or(self.config.manuscript.format);
            let path = layout.compiled_path(format);
            ManuscriptCompiler::new(format)
                .compile(tag, &chapters, &path)
                .await?;
            Some(path)
        } else {
            None
        };

        let summary_path = if options.summary.unwrap_or(self.config.manuscript.summary) {
            let summary = ManuscriptSummary::assemble(
                tag,
                self.clock.now(),
                chapters.clone(),
                self.config.global_target(),
            );
            let path = layout.summary_path();
            files::write_json(&path, &summary).await?;
            ledger.record(tag, ProgressRollup::from_summary(&summary));
            tracing::info!("Wrote manuscript summary to {}", path.display());
            Some(path)
        } else {
            None
        };

        tracing::info!(
            "Finished manuscript sync for tag '{}': {} chapters, {} dependency fixes",
            tag,
            chapters.len(),
            report.len()
        );

        Ok(SyncReport {
            tag: tag.to_string(),
            chapters_dir: layout.chapters_dir(),
            summary_path,
            compiled_path,
            chapters,
            fixes: report.into_fixes(),
        })
    }

    /// Run a pass with the ledger kept in the project's `state.json`
    ///
    /// # Errors
    /// Returns `SyncError` if the pass fails or the state file cannot be
    /// read or written.
    pub async fn sync_with_state(&self, options: &SyncOptions) -> Result<SyncReport, SyncError> {
        let state_file = self.paths.state_file();
        let mut ledger = state::load_ledger(&state_file).await?;
        let report = self.sync(options, &mut ledger).await?;
        if report.summary_path.is_some() {
            state::save_ledger(&state_file, &ledger).await?;
        }
        Ok(report)
    }

    /// Repair a tag's dependencies outside a sync pass
    ///
    /// The tag is saved only when something was repaired.
    ///
    /// # Errors
    /// Returns `SyncError` if the tag is missing or the store fails.
    pub async fn validate_dependencies(&self, tag: &str) -> Result<ValidationReport, SyncError> {
        validate_dependencies(self.store.as_ref(), tag).await
    }

    /// Compare two tags on `metric`
    ///
    /// # Errors
    /// Returns `SyncError` for blank tag names or a failing store.
    pub async fn compare_tags(
        &self,
        tag_a: &str,
        tag_b: &str,
        metric: ComparisonMetric,
    ) -> Result<TagComparison, SyncError> {
        reports::compare_tags(self.store.as_ref(), tag_a, tag_b, metric, self.clock.as_ref()).await
    }

    /// Read back the summary written by the last pass for `tag`
    ///
    /// # Errors
    /// Returns `SyncError::FileNotFound` if no summary exists yet.
    pub async fn read_summary(
        &self,
        tag: &str,
        output_dir: Option<&Path>,
    ) -> Result<SummaryDocument, SyncError> {
        let output_dir = output_dir.or(self.config.manuscript.output_dir.as_deref());
        reports::read_manuscript_summary(self.paths.root(), output_dir, tag).await
    }

    async fn load(&self, tag: &str) -> Result<TagData, SyncError> {
        let tag_data = self
            .store
            .load_tag(tag)
            .await?
            .ok_or_else(|| SyncError::TagNotFound(tag.to_string()))?;

        if tag_data.is_empty() {
            return Err(SyncError::EmptyTag(tag.to_string()));
        }
        Ok(tag_data)
    }

    async fn merge_chapter(
        &self,
        chapter: &Chapter,
        tag: &str,
        tag_data: &TagData,
        layout: &ManuscriptLayout,
    ) -> Result<ChapterSummary, SyncError> {
        let path = layout.chapter_path(chapter.id);
        let existing = files::read_optional(&path).await?;
        let section = render_managed_section(chapter, tag, tag_data);

        let merged = merge_chapter_content(existing.as_deref(), &section);
        files::write_file(&path, &merged.content).await?;

        let draft_word_count = count_words(extract_draft(&merged.content));
        let word_count_target = chapter.word_count_target().and_then(parse_word_count_target);
        if chapter.word_count_target().is_some() && word_count_target.is_none() {
            tracing::warn!(
                "Chapter {} has an unparseable word-count target, progress not tracked",
                chapter.id
            );
        }
        let progress = calculate_progress(draft_word_count, word_count_target);

        tracing::debug!(
            "Chapter {} {:?}: {} draft words, progress {:?}",
            chapter.id,
            merged.action,
            draft_word_count,
            progress
        );

        let title = if chapter.title.is_empty() {
            format!("Chapter {}", chapter.id)
        } else {
            chapter.title.clone()
        };

        Ok(ChapterSummary {
            id: chapter.id,
            title,
            status: chapter.status().to_string(),
            word_count_target,
            draft_word_count,
            progress,
            path,
        })
    }

    /// Re-read the tag and patch progress fields; the store is written once
    ///
    /// Only `draftWordCount`, `progress` and repaired dependency lists change.
    /// Everything else, including edits made to the store during the pass,
    /// is saved as read.
    async fn write_back_progress(&self, tag: &str, chapters: &[ChapterSummary]) -> Result<(), SyncError> {
        let mut raw = self
            .store
            .load_record(tag)
            .await?
            .ok_or_else(|| SyncError::TagNotFound(tag.to_string()))?;

        let mut fresh = record::decode(tag, raw.clone())?;
        if !self.validator.validate(&mut fresh).is_clean() {
            record::apply_dependency_repairs(&mut raw, &fresh);
        }

        for summary in chapters {
            let patched =
                record::set_chapter_progress(&mut raw, summary.id, summary.draft_word_count, summary.progress);
            if !patched {
                tracing::debug!("Chapter {} left tag '{}' during the pass", summary.id, tag);
            }
        }

        self.store.save_record(tag, &raw).await?;
        tracing::debug!("Persisted progress for {} chapters of tag '{}'", chapters.len(), tag);
        Ok(())
    }
}

/// Load `tag`, repair its dependencies and save it if anything changed
///
/// Only repaired dependency lists are rewritten; the rest of the record is
/// saved as authored.
///
/// # Errors
/// Returns `SyncError` if the tag is missing or the store fails.
pub async fn validate_dependencies(
    store: &dyn TaskGraphStore,
    tag: &str,
) -> Result<ValidationReport, SyncError> {
    let mut raw = store
        .load_record(tag)
        .await?
        .ok_or_else(|| SyncError::TagNotFound(tag.to_string()))?;
    let mut tag_data = record::decode(tag, raw.clone())?;

    let report = DependencyValidator::new().validate(&mut tag_data);
    if report.is_clean() {
        tracing::info!("Dependencies of tag '{}' are valid", tag);
    } else {
        record::apply_dependency_repairs(&mut raw, &tag_data);
        store.save_record(tag, &raw).await?;
        tracing::info!("Repaired {} dependencies in tag '{}'", report.len(), tag);
    }
    Ok(report)
}
