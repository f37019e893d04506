//! Manuscript summary and progress rollup records

use crate::word_count::{calculate_word_count_stats, round_two_decimals};
use chrono::{DateTime, Utc};
use nm_graph::ChapterId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Timestamps as ISO-8601 UTC with millisecond precision
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Per-chapter line of the summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    /// Chapter id
    pub id: ChapterId,
    /// Chapter title
    pub title: String,
    /// Status as authored, `pending` when unset
    pub status: String,
    /// Parsed target; `None` when absent or unparseable
    pub word_count_target: Option<u64>,
    /// Words between the draft markers
    pub draft_word_count: u64,
    /// Percentage of the target drafted; `None` without a target
    pub progress: Option<u32>,
    /// Chapter file
    pub path: PathBuf,
}

/// Tag-wide totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    /// Number of chapters
    pub chapters: usize,
    /// Sum of parsed chapter targets
    pub target_words: u64,
    /// Sum of draft word counts
    pub drafted_words: u64,
    /// Mean target, rounded half up
    pub average_target: u64,
    /// Mean draft count, rounded half up
    pub average_draft: u64,
    /// Drafted share of the chapter targets, two decimals
    pub completion: Option<f64>,
    /// Project-wide target from the configuration
    pub global_target: Option<u64>,
    /// Drafted share of the project-wide target, two decimals
    pub global_progress: Option<f64>,
}

/// Aggregate report written to `manuscript-summary.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManuscriptSummary {
    /// Tag the summary covers
    pub tag: String,
    /// When the pass ran
    #[serde(with = "iso_millis")]
    pub generated_at: DateTime<Utc>,
    /// Tag-wide totals
    pub totals: SummaryTotals,
    /// Chapters per status
    pub status_counts: BTreeMap<String, usize>,
    /// One line per chapter, in tag order
    pub chapters: Vec<ChapterSummary>,
}

impl ManuscriptSummary {
    /// Build the summary from per-chapter results
    ///
    /// A zero `global_target` is treated as unset.
    #[must_use]
    pub fn assemble(
        tag: impl Into<String>,
        generated_at: DateTime<Utc>,
        chapters: Vec<ChapterSummary>,
        global_target: Option<u64>,
    ) -> Self {
        let stats = calculate_word_count_stats(&chapters);
        let global_target = global_target.filter(|t| *t > 0);

        #[allow(clippy::cast_precision_loss)]
        let global_progress =
            global_target.map(|target| round_two_decimals(stats.total_draft as f64 / target as f64));

        let mut status_counts = BTreeMap::new();
        for chapter in &chapters {
            *status_counts.entry(chapter.status.clone()).or_insert(0) += 1;
        }

        Self {
            tag: tag.into(),
            generated_at,
            totals: SummaryTotals {
                chapters: chapters.len(),
                target_words: stats.total_target,
                drafted_words: stats.total_draft,
                average_target: stats.average_target,
                average_draft: stats.average_draft,
                completion: stats.completion,
                global_target,
                global_progress,
            },
            status_counts,
            chapters,
        }
    }
}

/// Per-chapter entry of the progress rollup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterProgress {
    /// Status as authored
    pub status: String,
    /// Drafted words
    pub word_count: u64,
    /// Parsed target
    pub target_word_count: Option<u64>,
    /// Percentage of the target drafted
    pub progress: Option<u32>,
}

/// Compact per-tag progress record kept in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRollup {
    /// Number of chapters
    pub total_chapters: usize,
    /// Drafted words across chapters
    pub total_words: u64,
    /// Project-wide target when configured, else the sum of chapter targets
    pub target_words: u64,
    /// Chapters whose status is `done` or `completed`
    pub completed_chapters: usize,
    /// When the summary was generated
    #[serde(with = "iso_millis")]
    pub last_generated: DateTime<Utc>,
    /// Per-chapter entries keyed by id
    pub chapter_status: BTreeMap<ChapterId, ChapterProgress>,
}

impl ProgressRollup {
    /// Derive the rollup from a summary
    #[must_use]
    pub fn from_summary(summary: &ManuscriptSummary) -> Self {
        let completed_chapters = summary
            .chapters
            .iter()
            .filter(|c| nm_graph::TaskStatus::from(c.status.as_str()).is_complete())
            .count();

        let chapter_status = summary
            .chapters
            .iter()
            .map(|c| {
                (
                    c.id,
                    ChapterProgress {
                        status: c.status.clone(),
                        word_count: c.draft_word_count,
                        target_word_count: c.word_count_target,
                        progress: c.progress,
                    },
                )
            })
            .collect();

        Self {
            total_chapters: summary.totals.chapters,
            total_words: summary.totals.drafted_words,
            target_words: summary
                .totals
                .global_target
                .unwrap_or(summary.totals.target_words),
            completed_chapters,
            last_generated: summary.generated_at,
            chapter_status,
        }
    }
}

/// Progress rollups keyed by tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressLedger {
    tags: BTreeMap<String, ProgressRollup>,
}

impl ProgressLedger {
    /// Create empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest rollup for a tag, replacing any previous one
    pub fn record(&mut self, tag: impl Into<String>, rollup: ProgressRollup) {
        self.tags.insert(tag.into(), rollup);
    }

    /// Latest rollup for a tag
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&ProgressRollup> {
        self.tags.get(tag)
    }

    /// All tags with a rollup
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProgressRollup)> {
        self.tags.iter().map(|(tag, rollup)| (tag.as_str(), rollup))
    }

    /// Number of tags tracked
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if no tag has been recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word_count::calculate_progress;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn chapter(id: u32, status: &str, target: Option<u64>, draft: u64) -> ChapterSummary {
        ChapterSummary {
            id: ChapterId(id),
            title: format!("Chapter {id}"),
            status: status.to_string(),
            word_count_target: target,
            draft_word_count: draft,
            progress: calculate_progress(draft, target),
            path: PathBuf::from(format!("chapters/chapter-{id:03}.md")),
        }
    }

    #[test]
    fn summary_serializes_expected_shape() {
        let summary = ManuscriptSummary::assemble(
            "outline",
            at(),
            vec![chapter(1, "done", Some(2000), 1500), chapter(2, "pending", None, 0)],
            Some(80_000),
        );

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["generatedAt"], "2024-03-01T12:00:00.000Z");
        assert_eq!(
            value["totals"],
            json!({
                "chapters": 2,
                "targetWords": 2000,
                "draftedWords": 1500,
                "averageTarget": 1000,
                "averageDraft": 750,
                "completion": 0.75,
                "globalTarget": 80000,
                "globalProgress": 0.02
            })
        );
        assert_eq!(value["statusCounts"], json!({ "done": 1, "pending": 1 }));
        assert_eq!(value["chapters"][1]["wordCountTarget"], json!(null));
        assert_eq!(value["chapters"][0]["progress"], json!(75));
    }

    #[test]
    fn zero_global_target_is_unset() {
        let summary = ManuscriptSummary::assemble("outline", at(), vec![chapter(1, "draft", Some(100), 50)], Some(0));
        assert_eq!(summary.totals.global_target, None);
        assert_eq!(summary.totals.global_progress, None);
    }

    #[test]
    fn rollup_counts_done_and_completed() {
        let summary = ManuscriptSummary::assemble(
            "outline",
            at(),
            vec![
                chapter(1, "done", Some(1000), 1000),
                chapter(2, "completed", Some(1000), 900),
                chapter(10, "draft", Some(1000), 10),
            ],
            None,
        );

        let rollup = ProgressRollup::from_summary(&summary);

        assert_eq!(rollup.completed_chapters, 2);
        assert_eq!(rollup.target_words, 3000);
        assert_eq!(rollup.total_words, 1910);
        let value = serde_json::to_value(&rollup).unwrap();
        assert_eq!(value["chapterStatus"]["10"]["wordCount"], 10);
        assert_eq!(value["lastGenerated"], "2024-03-01T12:00:00.000Z");
    }

    #[test]
    fn ledger_round_trips_through_json() {
        let summary = ManuscriptSummary::assemble("outline", at(), vec![chapter(1, "done", None, 3)], Some(500));
        let mut ledger = ProgressLedger::new();
        ledger.record("outline", ProgressRollup::from_summary(&summary));

        let restored: ProgressLedger = serde_json::from_value(serde_json::to_value(&ledger).unwrap()).unwrap();

        assert_eq!(restored, ledger);
        assert_eq!(restored.get("outline").unwrap().target_words, 500);
    }
}
