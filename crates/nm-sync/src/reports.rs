//! Read-only reports over a project
//!
//! - reading back a tag's manuscript summary
//! - comparing two tags on a chosen metric

use crate::clock::Clock;
use crate::error::SyncError;
use crate::paths::ProjectPaths;
use chrono::{DateTime, Utc};
use nm_graph::{Chapter, TaskGraphStore, TaskStatus};
use nm_manuscript::word_count::{round_half_up, round_two_decimals};
use nm_manuscript::{count_words, files, parse_word_count_target, ManuscriptLayout, ManuscriptSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A summary as found on disk
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDocument {
    /// Tag the summary covers
    pub tag: String,
    /// Where the summary was read from
    pub summary_path: PathBuf,
    /// Parsed summary
    pub summary: ManuscriptSummary,
}

/// Read `manuscript-summary.json` for a tag
///
/// # Errors
/// Returns `SyncError::FileNotFound` when no summary has been generated yet
/// and a read error when the file is unreadable or malformed.
pub async fn read_manuscript_summary(
    project_root: &Path,
    output_dir: Option<&Path>,
    tag: &str,
) -> Result<SummaryDocument, SyncError> {
    let paths = ProjectPaths::new(project_root);
    let summary_path = ManuscriptLayout::new(paths.resolve_output_dir(output_dir), tag).summary_path();

    let Some(summary) = files::read_json::<ManuscriptSummary>(&summary_path).await? else {
        return Err(SyncError::FileNotFound {
            message: format!(
                "manuscript summary not found for tag '{tag}'; run a sync first to create manuscript files"
            ),
            path: summary_path,
        });
    };

    tracing::info!("Read manuscript summary for tag '{}'", tag);
    Ok(SummaryDocument {
        tag: tag.to_string(),
        summary_path,
        summary,
    })
}

/// Axis along which two tags are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    /// Words written in chapter and beat details
    WordCount,
    /// Completion rate
    Pacing,
    /// Number of chapters tracked
    Continuity,
    /// Blend of completion rate and whether any words exist
    #[default]
    Quality,
}

impl ComparisonMetric {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WordCount => "word_count",
            Self::Pacing => "pacing",
            Self::Continuity => "continuity",
            Self::Quality => "quality",
        }
    }
}

impl fmt::Display for ComparisonMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonMetric {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "word_count" => Ok(Self::WordCount),
            "pacing" => Ok(Self::Pacing),
            "continuity" => Ok(Self::Continuity),
            "quality" => Ok(Self::Quality),
            other => Err(SyncError::InvalidArgument(format!("unknown metric '{other}'"))),
        }
    }
}

/// Per-tag figures used for comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagMetrics {
    /// Words across chapter and beat `details`
    pub word_count: u64,
    /// Chapters in the tag
    pub task_count: usize,
    /// Chapters and beats that are done or completed
    pub completed_count: usize,
    /// Words per chapter, rounded
    pub average_word_count: u64,
    /// Completed share of chapters and beats, as a rounded percentage
    pub completion_rate: u32,
    /// Sum of parsed chapter and beat targets
    pub target_word_count: u64,
}

impl TagMetrics {
    /// Compute metrics over a tag's chapters
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn from_chapters(chapters: &[Chapter]) -> Self {
        if chapters.is_empty() {
            return Self::default();
        }

        let mut metrics = Self {
            task_count: chapters.len(),
            ..Self::default()
        };
        let mut total_nodes = 0_usize;

        let mut tally = |details: &str, status: TaskStatus, target: Option<u64>| {
            total_nodes += 1;
            metrics.word_count += count_words(details);
            if status.is_complete() {
                metrics.completed_count += 1;
            }
            metrics.target_word_count += target.unwrap_or(0);
        };

        for chapter in chapters {
            tally(
                &chapter.details,
                chapter.status(),
                chapter.word_count_target().and_then(parse_word_count_target),
            );
            for beat in &chapter.subtasks {
                let target = beat
                    .metadata
                    .as_ref()
                    .and_then(|m| m.word_count_target.as_ref())
                    .and_then(parse_word_count_target);
                tally(&beat.details, beat.status(), target);
            }
        }

        metrics.completion_rate =
            round_half_up(metrics.completed_count as f64 / total_nodes as f64 * 100.0) as u32;
        metrics.average_word_count =
            round_half_up(metrics.word_count as f64 / metrics.task_count as f64) as u64;
        metrics
    }

    /// Score for `metric`; higher is better
    #[allow(clippy::cast_precision_loss)]
    fn score(&self, metric: ComparisonMetric) -> f64 {
        match metric {
            ComparisonMetric::WordCount => self.word_count as f64,
            ComparisonMetric::Pacing => f64::from(self.completion_rate),
            ComparisonMetric::Continuity => self.task_count as f64,
            ComparisonMetric::Quality => {
                let has_words = if self.word_count > 0 { 50.0 } else { 0.0 };
                (f64::from(self.completion_rate) + has_words) / 2.0
            }
        }
    }
}

/// Result of comparing two tags
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagComparison {
    /// Relative change from the first tag to the second, in percent, two decimals
    pub improvement: f64,
    /// True when the second tag scores at least as well as the first
    pub improved: bool,
    /// Metric compared
    pub metric: ComparisonMetric,
    /// Metrics of the first tag
    pub metric1: TagMetrics,
    /// Metrics of the second tag
    pub metric2: TagMetrics,
    /// First tag
    pub tag1: String,
    /// Second tag
    pub tag2: String,
    /// When the comparison ran
    pub compared_at: DateTime<Utc>,
}

/// Compare `tag_a` against `tag_b` on `metric`
///
/// A tag absent from the store compares as empty.
///
/// # Errors
/// Returns `SyncError::InvalidArgument` for blank tag names and a store error
/// when the tasks file is missing or unreadable.
pub async fn compare_tags(
    store: &dyn TaskGraphStore,
    tag_a: &str,
    tag_b: &str,
    metric: ComparisonMetric,
    clock: &dyn Clock,
) -> Result<TagComparison, SyncError> {
    if tag_a.trim().is_empty() || tag_b.trim().is_empty() {
        return Err(SyncError::InvalidArgument(
            "both tags are required for comparison".to_string(),
        ));
    }

    let metrics_a = tag_metrics(store, tag_a).await?;
    let metrics_b = tag_metrics(store, tag_b).await?;

    let (before, after) = (metrics_a.score(metric), metrics_b.score(metric));
    let improvement = if before > 0.0 {
        round_two_decimals((after - before) / before * 100.0)
    } else {
        0.0
    };

    tracing::info!(
        "Tag comparison {} vs {} on {}: {:.2}%",
        tag_a,
        tag_b,
        metric,
        improvement
    );

    Ok(TagComparison {
        improvement,
        improved: after >= before,
        metric,
        metric1: metrics_a,
        metric2: metrics_b,
        tag1: tag_a.to_string(),
        tag2: tag_b.to_string(),
        compared_at: clock.now(),
    })
}

async fn tag_metrics(store: &dyn TaskGraphStore, tag: &str) -> Result<TagMetrics, SyncError> {
    match store.load_tag(tag).await? {
        Some(data) => Ok(TagMetrics::from_chapters(&data.tasks)),
        None => {
            tracing::warn!("Tag '{}' not found, comparing as empty", tag);
            Ok(TagMetrics::default())
        }
    }
}
