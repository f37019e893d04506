//! Word-count analysis
//!
//! Pure functions over draft text and authored targets. Rounding matches
//! half-up integer rounding throughout, so `2.5` becomes `3`.

use crate::summary::ChapterSummary;
use nm_graph::WordCountTarget;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Round half up to the nearest integer
#[inline]
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round half up to two decimal places
#[inline]
#[must_use]
pub fn round_two_decimals(value: f64) -> f64 {
    round_half_up(value * 100.0) / 100.0
}

/// Count whitespace-separated words
#[must_use]
pub fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Parse an authored target into a word count
///
/// Accepts plain numbers, comma-grouped numerals (`"5,000"`) and a `k`
/// suffix (`"2.5k"`). Text is parsed leniently from its leading numeral, so
/// `"5000 words"` yields 5000. Negative or unparseable values yield `None`.
#[must_use]
pub fn parse_word_count_target(target: &WordCountTarget) -> Option<u64> {
    match target {
        WordCountTarget::Count(count) => Some(*count),
        WordCountTarget::Fractional(value) => from_float(*value),
        WordCountTarget::Text(text) => parse_target_text(text),
    }
}

fn parse_target_text(text: &str) -> Option<u64> {
    let cleaned: String = text.trim().to_lowercase().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }

    if let Some(base) = cleaned.strip_suffix('k') {
        return leading_float(base).and_then(|b| from_float(b * 1000.0));
    }

    leading_integer(&cleaned).and_then(|n| u64::try_from(n).ok())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn from_float(value: f64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(round_half_up(value) as u64)
}

/// Optional sign followed by at least one digit
static LEADING_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[+-]?\d+").expect("valid leading integer regex"));

/// Optional sign, digits, optional fraction; at least one digit overall
static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)").expect("valid leading float regex")
});

fn leading_integer(text: &str) -> Option<i64> {
    LEADING_INTEGER.find(text)?.as_str().trim_start().parse().ok()
}

fn leading_float(text: &str) -> Option<f64> {
    LEADING_FLOAT
        .find(text)?
        .as_str()
        .trim_start()
        .trim_end_matches('.')
        .parse()
        .ok()
}

/// Percentage of `target` reached by `draft`, capped at 100
///
/// `None` when the target is absent or zero.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn calculate_progress(draft: u64, target: Option<u64>) -> Option<u32> {
    let target = target.filter(|t| *t > 0)?;
    let percent = round_half_up(draft as f64 / target as f64 * 100.0);
    Some(percent.min(100.0) as u32)
}

/// Aggregate word counts across chapters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCountStats {
    /// Sum of parsed targets
    pub total_target: u64,
    /// Sum of draft counts
    pub total_draft: u64,
    /// Mean target, rounded half up
    pub average_target: u64,
    /// Mean draft count, rounded half up
    pub average_draft: u64,
    /// Drafted share of the total target, two decimals; `None` without targets
    pub completion: Option<f64>,
}

/// Totals, rounded means and completion ratio for a set of chapters
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn calculate_word_count_stats(chapters: &[ChapterSummary]) -> WordCountStats {
    if chapters.is_empty() {
        return WordCountStats {
            total_target: 0,
            total_draft: 0,
            average_target: 0,
            average_draft: 0,
            completion: None,
        };
    }

    let total_target: u64 = chapters.iter().filter_map(|c| c.word_count_target).sum();
    let total_draft: u64 = chapters.iter().map(|c| c.draft_word_count).sum();

    let (len, target_f, draft_f) = (chapters.len() as f64, total_target as f64, total_draft as f64);

    let completion = (total_target > 0).then(|| round_two_decimals(draft_f / target_f));

    WordCountStats {
        total_target,
        total_draft,
        average_target: round_half_up(target_f / len) as u64,
        average_draft: round_half_up(draft_f / len) as u64,
        completion,
    }
}

/// Format a count with thousands separators, e.g. `1,234 words`
#[must_use]
pub fn format_word_count(count: u64, include_label: bool) -> String {
    let digits = count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if include_label {
        format!("{grouped} words")
    } else {
        grouped
    }
}
