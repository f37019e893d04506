//! Chapter file merging
//!
//! Reconciles a freshly rendered managed section with whatever is already on
//! disk. Only the managed block is ever replaced. Text outside it, and the
//! draft block in particular, passes through byte for byte.

use crate::markers::{self, DRAFT_END, DRAFT_START, MANAGED_END, MANAGED_START};
use serde::Serialize;

/// How the managed block landed in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeAction {
    /// No prior content; a fresh file with an empty draft scaffold
    Created,
    /// Existing managed block replaced in place
    Replaced,
    /// No usable managed block; new block placed before the existing text
    Prepended,
}

/// Result of merging a managed section into a chapter file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedChapter {
    /// Full file content after the merge
    pub content: String,
    /// How the managed block was placed
    pub action: MergeAction,
    /// True when an empty draft scaffold had to be appended
    pub draft_appended: bool,
}

impl MergedChapter {
    /// Author draft contained in the merged content
    #[must_use]
    pub fn draft(&self) -> &str {
        markers::extract_draft(&self.content)
    }
}

/// Wrap a rendered section in managed markers
#[must_use]
pub fn managed_block(section: &str) -> String {
    format!("{MANAGED_START}\n{}\n{MANAGED_END}", section.trim())
}

fn draft_scaffold() -> String {
    format!("## Draft\n\n{DRAFT_START}\n\n{DRAFT_END}\n")
}

/// Merge `section` into `existing` and guarantee a draft block
///
/// Blank existing content is treated as no file at all.
#[must_use]
pub fn merge_chapter_content(existing: Option<&str>, section: &str) -> MergedChapter {
    let block = managed_block(section);
    let existing = existing.filter(|e| !e.trim().is_empty());

    let (content, action) = match existing {
        None => (
            format!("{block}\n\n{}", draft_scaffold()),
            MergeAction::Created,
        ),
        Some(old) => match markers::managed_span(old) {
            Some(span) => {
                let mut merged = String::with_capacity(old.len() + block.len());
                merged.push_str(&old[..span.start]);
                merged.push_str(&block);
                merged.push_str(&old[span.end..]);
                (merged, MergeAction::Replaced)
            }
            None => (
                format!("{block}\n\n{}\n", old.trim()),
                MergeAction::Prepended,
            ),
        },
    };

    let (content, draft_appended) = ensure_draft_section(content);
    MergedChapter {
        content,
        action,
        draft_appended,
    }
}

/// Append an empty draft scaffold when no well-formed draft block exists
///
/// Returns the content and whether the scaffold was added.
#[must_use]
pub fn ensure_draft_section(content: String) -> (String, bool) {
    if markers::has_draft_block(&content) {
        return (content, false);
    }
    (format!("{}\n\n{}", content.trim(), draft_scaffold()), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SECTION: &str = "---\ntitle: \"Arrival\"\n---\n\n# Chapter Overview";

    #[test]
    fn new_file_gets_block_and_scaffold() {
        let merged = merge_chapter_content(None, SECTION);

        assert_eq!(
            merged.content,
            format!(
                "{MANAGED_START}\n{SECTION}\n{MANAGED_END}\n\n## Draft\n\n{DRAFT_START}\n\n{DRAFT_END}\n"
            )
        );
        assert_eq!(merged.action, MergeAction::Created);
        assert!(!merged.draft_appended);
        assert_eq!(merged.draft(), "");
    }

    #[test]
    fn replaces_only_managed_block() {
        let old = format!(
            "Intro note\n{MANAGED_START}\nstale\n{MANAGED_END}\n\n## Draft\n\n{DRAFT_START}\nKeep   this\n{DRAFT_END}\ntrailer"
        );

        let merged = merge_chapter_content(Some(&old), "fresh");

        assert_eq!(
            merged.content,
            format!(
                "Intro note\n{MANAGED_START}\nfresh\n{MANAGED_END}\n\n## Draft\n\n{DRAFT_START}\nKeep   this\n{DRAFT_END}\ntrailer"
            )
        );
        assert_eq!(merged.action, MergeAction::Replaced);
        assert_eq!(merged.draft(), "Keep   this");
    }

    #[test]
    fn prepends_when_managed_block_is_unterminated() {
        let old = format!("{MANAGED_START}\nhalf\n\n{DRAFT_START}\nprose\n{DRAFT_END}\n");

        let merged = merge_chapter_content(Some(&old), "fresh");

        assert_eq!(merged.action, MergeAction::Prepended);
        assert!(merged.content.starts_with(&managed_block("fresh")));
        assert!(merged.content.ends_with(&format!("{}\n", old.trim())));
        assert_eq!(merged.draft(), "prose");
    }

    #[test]
    fn appends_scaffold_to_plain_notes() {
        let merged = merge_chapter_content(Some("  Loose notes  \n"), "fresh");

        assert_eq!(
            merged.content,
            format!(
                "{MANAGED_START}\nfresh\n{MANAGED_END}\n\nLoose notes\n\n## Draft\n\n{DRAFT_START}\n\n{DRAFT_END}\n"
            )
        );
        assert!(merged.draft_appended);
    }

    #[test]
    fn blank_file_is_treated_as_new() {
        let merged = merge_chapter_content(Some(" \n\n"), SECTION);
        assert_eq!(merged, merge_chapter_content(None, SECTION));
    }

    #[test]
    fn second_merge_is_identical() {
        let first = merge_chapter_content(Some("notes"), SECTION);
        let second = merge_chapter_content(Some(&first.content), SECTION);

        assert_eq!(second.content, first.content);
        assert_eq!(second.action, MergeAction::Replaced);
        assert!(!second.draft_appended);
    }
}
