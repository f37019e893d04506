//! Manuscript Files
//!
//! Everything that touches chapter text: the managed/draft region markers,
//! rendering of the managed section, the non-destructive merge, word-count
//! analysis, compilation and the summary records.
//!
//! # Core Concepts
//!
//! - **Managed block**: regenerated from the task graph on every sync
//! - **Draft block**: author prose, carried through every merge untouched
//! - [`merge_chapter_content`]: pure `(old content, section) → new content`
//! - [`ManuscriptCompiler`]: concatenates drafts into `md` or `txt`
//!
//! # Example
//!
//! ```rust
//! use nm_manuscript::{count_words, extract_draft, merge_chapter_content};
//!
//! let merged = merge_chapter_content(None, "# Chapter Overview");
//! assert_eq!(count_words(extract_draft(&merged.content)), 0);
//! ```

#![warn(unreachable_pub)]

pub mod compile;
pub mod error;
pub mod files;
pub mod layout;
pub mod markers;
pub mod merge;
pub mod render;
pub mod summary;
pub mod word_count;

pub use compile::{strip_markdown, CompileFormat, CompiledSection, ManuscriptCompiler, UnknownFormat};
pub use error::ManuscriptError;
pub use layout::{chapter_file_name, slugify_tag, ManuscriptLayout, SUMMARY_FILE};
pub use markers::{extract_draft, has_draft_block, DRAFT_END, DRAFT_START, MANAGED_END, MANAGED_START};
pub use merge::{ensure_draft_section, managed_block, merge_chapter_content, MergeAction, MergedChapter};
pub use render::render_managed_section;
pub use summary::{ChapterProgress, ChapterSummary, ManuscriptSummary, ProgressLedger, ProgressRollup, SummaryTotals};
pub use word_count::{
    calculate_progress, calculate_word_count_stats, count_words, format_word_count,
    parse_word_count_target, WordCountStats,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
