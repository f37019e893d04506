//! Managed section rendering
//!
//! The managed section is derived entirely from one chapter and the tag it
//! lives in, so rendering the same graph twice yields the same text.

use nm_graph::{Beat, Chapter, DependencyRef, TagData};
use serde_json::Value;

const EMPTY_CELL: &str = "—";
const NO_BEATS: &str = "_No beats generated yet. Use `expand` to add scenes._";
const NO_BEAT_DETAILS: &str = "- No additional details provided.";

/// Render the managed section body for `chapter` (markers not included)
#[must_use]
pub fn render_managed_section(chapter: &Chapter, tag: &str, tag_data: &TagData) -> String {
    let sections = [
        front_matter(chapter, tag),
        "# Chapter Overview".to_string(),
        summary_table(chapter, tag_data),
        annotations(chapter),
        "## Scenes".to_string(),
        scenes(chapter),
    ];

    sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn front_matter(chapter: &Chapter, tag: &str) -> String {
    let target = chapter
        .word_count_target()
        .map(ToString::to_string)
        .unwrap_or_default();

    [
        "---".to_string(),
        format!("title: \"{}\"", chapter.title.replace('"', "\\\"")),
        format!("taskId: {}", chapter.id),
        format!("tag: {tag}"),
        format!("status: {}", chapter.status()),
        format!("wordCountTarget: {target}"),
        "---".to_string(),
    ]
    .join("\n")
}

fn summary_table(chapter: &Chapter, tag_data: &TagData) -> String {
    let meta = chapter.metadata.as_ref();

    let priority = chapter
        .priority
        .as_ref()
        .map_or_else(|| "medium".to_string(), ToString::to_string);
    let target = chapter.word_count_target().map(ToString::to_string);

    [
        "| Field | Value |".to_string(),
        "| --- | --- |".to_string(),
        row("Status", Some(chapter.status().to_string())),
        row("Priority", Some(priority)),
        row("Dependencies", Some(dependency_summary(chapter, tag_data))),
        row("POV", meta_cell(meta.and_then(|m| m.pov.as_ref()))),
        row("Timeline", meta_cell(meta.and_then(|m| m.timeline.as_ref()))),
        row("Emotional Beat", meta_cell(meta.and_then(|m| m.emotional_beat.as_ref()))),
        row("Tension Level", meta_cell(meta.and_then(|m| m.tension_level.as_ref()))),
        row("Word Count Target", target),
    ]
    .join("\n")
}

fn meta_cell(value: Option<&Value>) -> Option<String> {
    value.and_then(render_value)
}

fn row(label: &str, value: Option<String>) -> String {
    let cell = value
        .filter(|v| !v.is_empty())
        .map_or_else(|| EMPTY_CELL.to_string(), |v| table_cell(&v));
    format!("| {label} | {cell} |")
}

/// Keep a value on one table row
fn table_cell(value: &str) -> String {
    value.replace("\r\n", " ").replace('\n', " ").replace('|', "\\|")
}

/// Chapter prerequisites with their current status, e.g. `2 (done), 3.1 (pending)`
fn dependency_summary(chapter: &Chapter, tag_data: &TagData) -> String {
    if chapter.dependencies.is_empty() {
        return "None".to_string();
    }

    chapter
        .dependencies
        .iter()
        .map(|dep| {
            let status = match dep {
                DependencyRef::Id(id) => tag_data
                    .chapter(nm_graph::ChapterId(*id))
                    .map(|c| c.status().to_string()),
                DependencyRef::Beat { chapter, beat } => {
                    tag_data.beat(*chapter, *beat).map(|b| b.status().to_string())
                }
                DependencyRef::Unresolvable(_) => None,
            };
            format!("{dep} ({})", status.as_deref().unwrap_or("not found"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn annotations(chapter: &Chapter) -> String {
    let Some(meta) = chapter.metadata.as_ref() else {
        return String::new();
    };

    [
        ("Sensory Notes", meta.sensory_notes.as_ref()),
        ("Research Hooks", meta.research_hook.as_ref()),
        ("Continuity Check", meta.continuity_check.as_ref()),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        let text = render_value(value?)?;
        Some(format!("- **{label}:** {text}"))
    })
    .collect::<Vec<_>>()
    .join("\n")
}

fn scenes(chapter: &Chapter) -> String {
    if chapter.subtasks.is_empty() {
        return NO_BEATS.to_string();
    }

    chapter
        .subtasks
        .iter()
        .enumerate()
        .map(|(index, beat)| scene(chapter, index, beat))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn scene(chapter: &Chapter, index: usize, beat: &Beat) -> String {
    let title = if beat.title.is_empty() {
        "Untitled"
    } else {
        beat.title.as_str()
    };
    let heading = format!("### Scene {}: {title} [{}]", index + 1, beat.status());

    let mut lines = Vec::new();
    if !beat.description.is_empty() {
        lines.push(format!("- **Description:** {}", beat.description));
    }
    if !beat.details.is_empty() {
        lines.push(format!("- **Details:** {}", beat.details));
    }
    if !beat.dependencies.is_empty() {
        let deps: Vec<String> = beat
            .dependencies
            .iter()
            .map(|d| d.display_for_beat(chapter.id))
            .collect();
        lines.push(format!("- **Dependencies:** {}", deps.join(", ")));
    }

    if lines.is_empty() {
        format!("{heading}\n{NO_BEAT_DETAILS}")
    } else {
        format!("{heading}\n{}", lines.join("\n"))
    }
}

/// Render a free-form annotation; blank, null, false and zero count as unset
fn render_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null | Value::Bool(false) => return None,
        Value::Bool(true) => "true".to_string(),
        Value::Number(n) if n.as_f64() == Some(0.0) => return None,
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nm_graph::{NarrativeMetadata, Priority, TaskStatus};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tag_with(chapter: Chapter) -> TagData {
        TagData::new(vec![
            Chapter::new(1, "Arrival").with_status(TaskStatus::Done),
            chapter,
        ])
    }

    #[test]
    fn renders_full_section() {
        let metadata = NarrativeMetadata {
            pov: Some(json!("Mara")),
            timeline: Some(json!("Day 2")),
            sensory_notes: Some(json!(["salt", "smoke"])),
            ..NarrativeMetadata::default()
        };
        let chapter = Chapter::new(2, "The \"Storm\"")
            .with_status(TaskStatus::Draft)
            .with_priority(Priority::High)
            .with_dependencies(vec![DependencyRef::Id(1)])
            .with_metadata(metadata)
            .with_target("3k")
            .with_beat(
                Beat::new(1, "Squall")
                    .with_description("Wind rises")
                    .with_dependencies(vec![DependencyRef::Id(2)]),
            )
            .with_beat(Beat::new(2, "").with_status(TaskStatus::Done));
        let tag = tag_with(chapter.clone());

        let rendered = render_managed_section(&chapter, "outline", &tag);

        let expected = "\
---
title: \"The \\\"Storm\\\"\"
taskId: 2
tag: outline
status: draft
wordCountTarget: 3k
---

# Chapter Overview

| Field | Value |
| --- | --- |
| Status | draft |
| Priority | high |
| Dependencies | 1 (done) |
| POV | Mara |
| Timeline | Day 2 |
| Emotional Beat | — |
| Tension Level | — |
| Word Count Target | 3k |

- **Sensory Notes:** salt, smoke

## Scenes

### Scene 1: Squall [pending]
- **Description:** Wind rises
- **Dependencies:** 2.2

### Scene 2: Untitled [done]
- No additional details provided.";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn placeholder_without_beats() {
        let chapter = Chapter::new(2, "Empty");
        let rendered = render_managed_section(&chapter, "outline", &tag_with(chapter.clone()));

        assert!(rendered.contains("| Priority | medium |"));
        assert!(rendered.contains("| Dependencies | None |"));
        assert!(rendered.contains("| POV | — |"));
        assert!(rendered.contains("wordCountTarget: \n"));
        assert!(rendered.ends_with(NO_BEATS));
        assert!(!rendered.contains("**Sensory Notes:**"));
    }

    #[test]
    fn table_cells_stay_on_one_row() {
        let metadata = NarrativeMetadata {
            pov: Some(json!("Mara\nand | Jun")),
            ..NarrativeMetadata::default()
        };
        let chapter = Chapter::new(2, "Split").with_metadata(metadata);
        let rendered = render_managed_section(&chapter, "outline", &tag_with(chapter.clone()));

        assert!(rendered.contains("| POV | Mara and \\| Jun |"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let chapter = Chapter::new(2, "Same").with_target(2000_u64);
        let tag = tag_with(chapter.clone());
        assert_eq!(
            render_managed_section(&chapter, "outline", &tag),
            render_managed_section(&chapter, "outline", &tag)
        );
    }
}
