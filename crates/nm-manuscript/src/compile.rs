//! Manuscript compilation
//!
//! Concatenates the draft block of every chapter, in graph order, into one
//! document. Markdown keeps the prose as written; plain text strips headings,
//! emphasis and link syntax.

use crate::error::ManuscriptError;
use crate::files;
use crate::markers;
use crate::summary::ChapterSummary;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const MARKDOWN_PLACEHOLDER: &str = "_Draft not started._";
const TEXT_PLACEHOLDER: &str = "Draft not started.";
const TEXT_RULE_WIDTH: usize = 60;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#+\s+").expect("valid heading regex"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic regex"));
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid link regex"));

/// Output format of the compiled manuscript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompileFormat {
    /// Markdown with chapter headings, `md`
    #[default]
    #[serde(rename = "md")]
    Markdown,
    /// Plain text with markdown stripped, `txt`
    #[serde(rename = "txt")]
    Text,
}

impl CompileFormat {
    /// File extension without the dot
    #[inline]
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Text => "txt",
        }
    }
}

impl fmt::Display for CompileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Unrecognised format name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown manuscript format '{0}' (expected md or txt)")]
pub struct UnknownFormat(pub String);

impl FromStr for CompileFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "txt" | "text" => Ok(Self::Text),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Strip heading markers, bold, italics and link syntax
#[must_use]
pub fn strip_markdown(text: &str) -> String {
    let text = HEADING.replace_all(text, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    text.trim().to_string()
}

/// One chapter's contribution to the compiled document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSection {
    /// Chapter title
    pub title: String,
    /// Trimmed draft; empty when not started
    pub draft: String,
}

/// Builds the compiled manuscript for one tag
#[derive(Debug, Clone, Copy, Default)]
pub struct ManuscriptCompiler {
    format: CompileFormat,
}

impl ManuscriptCompiler {
    /// Create compiler for a format
    #[inline]
    #[must_use]
    pub fn new(format: CompileFormat) -> Self {
        Self { format }
    }

    /// Configured format
    #[inline]
    #[must_use]
    pub fn format(&self) -> CompileFormat {
        self.format
    }

    /// Render the document text for `sections`
    #[must_use]
    pub fn render(&self, tag: &str, sections: &[CompiledSection]) -> String {
        let (header, separator) = match self.format {
            CompileFormat::Markdown => (format!("# Manuscript ({tag})"), "\n\n---\n\n".to_string()),
            CompileFormat::Text => (
                format!("MANUSCRIPT: {}", tag.to_uppercase()),
                format!("\n\n{}\n\n", "=".repeat(TEXT_RULE_WIDTH)),
            ),
        };

        let body = sections
            .iter()
            .enumerate()
            .map(|(index, section)| self.render_section(index + 1, section))
            .collect::<Vec<_>>()
            .join(separator.as_str());

        let document = if body.is_empty() {
            header
        } else {
            format!("{header}\n\n{body}")
        };
        format!("{}\n", document.trim())
    }

    fn render_section(&self, number: usize, section: &CompiledSection) -> String {
        let draft = section.draft.trim();
        match self.format {
            CompileFormat::Markdown => {
                let draft = if draft.is_empty() { MARKDOWN_PLACEHOLDER } else { draft };
                format!("## Chapter {number}: {}\n\n{draft}", section.title)
            }
            CompileFormat::Text => {
                let plain = if draft.is_empty() {
                    TEXT_PLACEHOLDER.to_string()
                } else {
                    strip_markdown(draft)
                };
                format!("CHAPTER {number}\n{}\n\n{plain}", section.title)
            }
        }
    }

    /// Read each chapter file's draft and write the compiled document
    ///
    /// # Errors
    /// Returns `ManuscriptError` if a chapter cannot be read or the output
    /// cannot be written. Missing chapter files contribute an empty draft.
    pub async fn compile(
        &self,
        tag: &str,
        chapters: &[ChapterSummary],
        destination: &Path,
    ) -> Result<(), ManuscriptError> {
        let mut sections = Vec::with_capacity(chapters.len());
        for chapter in chapters {
            let content = files::read_optional(&chapter.path).await?.unwrap_or_default();
            sections.push(CompiledSection {
                title: chapter.title.clone(),
                draft: markers::extract_draft(&content).to_string(),
            });
        }

        let document = self.render(tag, &sections);
        files::write_file(destination, &document).await?;
        tracing::info!(
            "Compiled {} chapters for tag '{}' into {}",
            sections.len(),
            tag,
            destination.display()
        );
        Ok(())
    }
}
