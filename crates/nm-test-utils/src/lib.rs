//! Testing utilities for the manuscript workspace
//!
//! Shared fixtures, project scaffolding and draft helpers.

#![allow(missing_docs)]

use nm_graph::{Beat, Chapter, DependencyRef, NarrativeMetadata, Priority, TagData, TaskStatus};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const DRAFT_START: &str = "<!-- novel-master:draft:start -->";
pub const DRAFT_END: &str = "<!-- novel-master:draft:end -->";

/// Three chapters with beats, mixed targets and one prerequisite
pub fn sample_tag() -> TagData {
    let metadata = NarrativeMetadata {
        pov: Some(json!("Mara")),
        timeline: Some(json!("Winter, year one")),
        emotional_beat: Some(json!("dread")),
        ..NarrativeMetadata::default()
    };

    TagData::new(vec![
        Chapter::new(1, "Arrival")
            .with_status(TaskStatus::Done)
            .with_priority(Priority::High)
            .with_metadata(metadata)
            .with_target("2k")
            .with_beat(Beat::new(1, "The dock").with_description("Mara lands at dusk"))
            .with_beat(
                Beat::new(2, "The market")
                    .with_details("First sight of the guild")
                    .with_dependencies(vec![DependencyRef::Id(1)]),
            ),
        Chapter::new(2, "Storm")
            .with_status(TaskStatus::Draft)
            .with_dependencies(vec![DependencyRef::Id(1)])
            .with_target(3000_u64),
        Chapter::new(3, "Harbor").with_dependencies(vec![DependencyRef::beat(1, 2)]),
    ])
}

/// One chapter with the given target and no beats
pub fn single_chapter_tag(target: u64) -> TagData {
    TagData::new(vec![Chapter::new(1, "Opening").with_target(target)])
}

/// Chapters with a dangling reference (3 → 99) and a cycle (4 ↔ 5)
pub fn broken_tag() -> TagData {
    TagData::new(vec![
        Chapter::new(1, "One"),
        Chapter::new(2, "Two"),
        Chapter::new(3, "Three").with_dependencies(vec![DependencyRef::Id(1), DependencyRef::Id(99)]),
        Chapter::new(4, "Four").with_dependencies(vec![DependencyRef::Id(5)]),
        Chapter::new(5, "Five").with_dependencies(vec![DependencyRef::Id(4)]),
    ])
}

/// Replace the body of the first draft block, markers kept
///
/// # Panics
/// Panics when `content` has no draft block.
pub fn replace_draft(content: &str, draft: &str) -> String {
    let start = content.find(DRAFT_START).expect("draft start marker") + DRAFT_START.len();
    let end = content[start..].find(DRAFT_END).expect("draft end marker") + start;
    format!("{}\n{draft}\n{}", &content[..start], &content[end..])
}

/// Temporary project root with a `.novelmaster` directory
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join(".novelmaster/tasks")).expect("create tasks dir");
        Self { dir }
    }

    /// Project with `tag` written to the tasks file
    pub fn with_tag(tag: &str, data: &TagData) -> Self {
        let project = Self::new();
        project.write_tag(tag, data);
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.root().join(".novelmaster/tasks/tasks.json")
    }

    pub fn manuscript_dir(&self) -> PathBuf {
        self.root().join(".novelmaster/manuscript")
    }

    /// Insert or replace one tag in the tasks file
    pub fn write_tag(&self, tag: &str, data: &TagData) {
        let mut document = self.read_tasks();
        let entry = serde_json::to_value(data).expect("serialize tag");
        document
            .as_object_mut()
            .expect("tasks file is an object")
            .insert(tag.to_string(), entry);
        self.write_tasks(&document);
    }

    /// Write the raw tasks document
    pub fn write_tasks(&self, document: &Value) {
        std::fs::write(
            self.tasks_path(),
            serde_json::to_string_pretty(document).expect("serialize tasks"),
        )
        .expect("write tasks file");
    }

    /// Raw tasks document; an empty object when absent
    pub fn read_tasks(&self) -> Value {
        match std::fs::read_to_string(self.tasks_path()) {
            Ok(raw) => serde_json::from_str(&raw).expect("tasks file is JSON"),
            Err(_) => Value::Object(Map::new()),
        }
    }

    /// Write `.novelmaster/config.json`
    pub fn write_config(&self, config: &Value) {
        std::fs::write(
            self.root().join(".novelmaster/config.json"),
            serde_json::to_string_pretty(config).expect("serialize config"),
        )
        .expect("write config file");
    }

    /// Read a file relative to the project root
    pub fn read(&self, relative: impl AsRef<Path>) -> String {
        std::fs::read_to_string(self.root().join(relative)).expect("read project file")
    }

    /// Write a file relative to the project root, creating parents
    pub fn write(&self, relative: impl AsRef<Path>, content: &str) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(path, content).expect("write project file");
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
