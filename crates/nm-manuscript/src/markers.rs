//! Region markers inside chapter files
//!
//! A chapter file holds two regions, each bounded by a single-line HTML
//! comment. The managed region is regenerated from the task graph on every
//! sync; the draft region belongs to the author and is never rewritten.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Opens the engine-owned region
pub const MANAGED_START: &str = "<!-- novel-master:managed:start -->";
/// Closes the engine-owned region
pub const MANAGED_END: &str = "<!-- novel-master:managed:end -->";
/// Opens the author-owned region
pub const DRAFT_START: &str = "<!-- novel-master:draft:start -->";
/// Closes the author-owned region
pub const DRAFT_END: &str = "<!-- novel-master:draft:end -->";

static MANAGED_SPAN: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        "(?s){}.*?{}",
        regex::escape(MANAGED_START),
        regex::escape(MANAGED_END)
    );
    Regex::new(&pattern).expect("valid managed marker regex")
});

/// Byte range of the first managed block, markers included
///
/// The block runs from the first start marker to the nearest end marker
/// after it. `None` when no end marker follows a start marker.
#[must_use]
pub fn managed_span(content: &str) -> Option<Range<usize>> {
    MANAGED_SPAN.find(content).map(|m| m.range())
}

/// Byte range of the draft body, markers excluded
///
/// Pairs the first end marker that has a start marker before it with the
/// nearest such start marker.
#[must_use]
pub fn draft_span(content: &str) -> Option<Range<usize>> {
    let mut search_from = 0;
    while let Some(offset) = content[search_from..].find(DRAFT_END) {
        let end = search_from + offset;
        if let Some(start) = content[..end].rfind(DRAFT_START) {
            return Some(start + DRAFT_START.len()..end);
        }
        search_from = end + DRAFT_END.len();
    }
    None
}

/// True when the content has a well-formed draft block
#[inline]
#[must_use]
pub fn has_draft_block(content: &str) -> bool {
    draft_span(content).is_some()
}

/// Draft body with surrounding whitespace trimmed; empty without a block
#[must_use]
pub fn extract_draft(content: &str) -> &str {
    draft_span(content).map_or("", |span| content[span].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_trimmed_draft() {
        let content = format!("# Chapter 1\n{DRAFT_START}\n  This is the draft.\n\n{DRAFT_END}\n");
        assert_eq!(extract_draft(&content), "This is the draft.");
    }

    #[test]
    fn missing_or_reversed_markers_yield_empty_draft() {
        assert_eq!(extract_draft("no markers here"), "");
        assert_eq!(extract_draft(&format!("{DRAFT_START}\nopen only")), "");
        assert_eq!(extract_draft(&format!("{DRAFT_END}\nprose\n{DRAFT_START}")), "");
        assert!(!has_draft_block(&format!("{DRAFT_END} {DRAFT_START}")));
    }

    #[test]
    fn later_pair_is_found_after_stray_end() {
        let content = format!("{DRAFT_END}\n{DRAFT_START}\nkept\n{DRAFT_END}");
        assert_eq!(extract_draft(&content), "kept");
    }

    #[test]
    fn managed_span_is_non_greedy() {
        let content =
            format!("{MANAGED_START}\nA\n{MANAGED_END}\nmiddle\n{MANAGED_START}\nB\n{MANAGED_END}");
        let span = managed_span(&content).unwrap();
        assert_eq!(&content[span], format!("{MANAGED_START}\nA\n{MANAGED_END}"));
    }

    #[test]
    fn managed_span_needs_end_after_start() {
        assert!(managed_span(&format!("{MANAGED_START}\nunterminated")).is_none());
        assert!(managed_span(&format!("{MANAGED_END}\n{MANAGED_START}")).is_none());
    }
}
