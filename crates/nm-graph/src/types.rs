//! Core types for the narrative task graph
//!
//! Defines the records persisted per tag:
//! - Chapter and beat identifiers
//! - Status and priority vocabularies
//! - Narrative metadata, including the engine-written progress fields
//! - Chapters, beats and the tag container
//!
//! Records use camelCase keys. Unknown keys are captured in `extra` maps so a
//! load/save cycle never drops data written by other tools.

use crate::dependency::DependencyRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Chapter identifier, unique within a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(pub u32);

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Beat identifier, unique within its parent chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeatId(pub u32);

impl fmt::Display for BeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Workflow status of a chapter or beat
///
/// Only the exact lowercase wire names map to known variants. Anything else,
/// including other spellings such as `"Done"`, is kept verbatim in
/// [`TaskStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// `pending`, also the status of a chapter without one
    #[default]
    Pending,
    /// `in-progress`
    InProgress,
    /// `draft`
    Draft,
    /// `revision`
    Revision,
    /// `done`
    Done,
    /// `completed`
    Completed,
    /// `deferred`
    Deferred,
    /// `cancelled`
    Cancelled,
    /// `blocked`
    Blocked,
    /// Any other spelling, kept as written
    Other(String),
}

impl TaskStatus {
    /// Wire name of the status
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Draft => "draft",
            Self::Revision => "revision",
            Self::Done => "done",
            Self::Completed => "completed",
            Self::Deferred => "deferred",
            Self::Cancelled => "cancelled",
            Self::Blocked => "blocked",
            Self::Other(raw) => raw,
        }
    }

    /// `done` and `completed` both count as finished work
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Done | Self::Completed)
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => Self::Pending,
            "in-progress" => Self::InProgress,
            "draft" => Self::Draft,
            "revision" => Self::Revision,
            "done" => Self::Done,
            "completed" => Self::Completed,
            "deferred" => Self::Deferred,
            "cancelled" => Self::Cancelled,
            "blocked" => Self::Blocked,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chapter priority
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    /// `low`
    Low,
    /// `medium`
    Medium,
    /// `high`
    High,
    /// `critical`
    Critical,
    /// Any other spelling, kept as written
    Other(String),
}

impl Priority {
    /// Wire name of the priority
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Other(raw),
        }
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw word-count target as authored: a number or free text like `"25k"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WordCountTarget {
    /// Whole number of words
    Count(u64),
    /// Non-integer number, rounded when parsed
    Fractional(f64),
    /// Free text such as `"5,000"` or `"2.5k"`
    Text(String),
}

impl From<u64> for WordCountTarget {
    fn from(count: u64) -> Self {
        Self::Count(count)
    }
}

impl From<&str> for WordCountTarget {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl fmt::Display for WordCountTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Fractional(x) => write!(f, "{x}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Narrative annotations attached to a chapter or beat
///
/// Free-text annotations are stored as raw JSON values because authoring tools
/// write strings, numbers and lists interchangeably.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeMetadata {
    /// Point-of-view character
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pov: Option<Value>,
    /// Intended emotional effect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_beat: Option<Value>,
    /// Where the chapter sits in story time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Value>,
    /// Authored tension rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tension_level: Option<Value>,
    /// Authored word-count goal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count_target: Option<WordCountTarget>,
    /// Author-maintained count; never written by the synchronizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_word_count: Option<Value>,
    /// Sensory detail notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensory_notes: Option<Value>,
    /// Research still to do
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_hook: Option<Value>,
    /// Continuity points to verify
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuity_check: Option<Value>,
    /// Words between the draft markers, written by the synchronizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_word_count: Option<u64>,
    /// Percentage of the target drafted, written by the synchronizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    /// Unrecognized keys, kept as authored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A scene nested under exactly one chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beat {
    /// Id, unique within the chapter
    pub id: BeatId,
    /// Beat title
    #[serde(default)]
    pub title: String,
    /// Short summary
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Authored status, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Bare ids name sibling beats; dotted ids name `chapter.beat`
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
    /// Longer scene notes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,
    /// Narrative annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NarrativeMetadata>,
    /// Unrecognized keys, kept as authored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Beat {
    /// Create a pending beat with no dependencies
    #[must_use]
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        Self {
            id: BeatId(id),
            title: title.into(),
            description: String::new(),
            status: None,
            dependencies: Vec::new(),
            details: String::new(),
            metadata: None,
            extra: Map::new(),
        }
    }

    /// With status
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With details
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// With dependencies
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<DependencyRef>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Effective status (`pending` when unset)
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status.clone().unwrap_or_default()
    }
}

/// Top-level narrative unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Id, unique within the tag
    pub id: ChapterId,
    /// Chapter title
    #[serde(default)]
    pub title: String,
    /// Short summary
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Authored status, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Authored priority, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Ids of prerequisite chapters
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
    /// Longer chapter notes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,
    /// Narrative annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NarrativeMetadata>,
    /// Beats in authored order
    #[serde(default)]
    pub subtasks: Vec<Beat>,
    /// Unrecognized keys, kept as authored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chapter {
    /// Create a pending chapter with no beats
    #[must_use]
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        Self {
            id: ChapterId(id),
            title: title.into(),
            description: String::new(),
            status: None,
            priority: None,
            dependencies: Vec::new(),
            details: String::new(),
            metadata: None,
            subtasks: Vec::new(),
            extra: Map::new(),
        }
    }

    /// With status
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// With priority
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With details
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// With dependencies
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<DependencyRef>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// With word-count target
    #[must_use]
    pub fn with_target(mut self, target: impl Into<WordCountTarget>) -> Self {
        self.metadata_mut().word_count_target = Some(target.into());
        self
    }

    /// With metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: NarrativeMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Append a beat
    #[must_use]
    pub fn with_beat(mut self, beat: Beat) -> Self {
        self.subtasks.push(beat);
        self
    }

    /// Effective status (`pending` when unset)
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status.clone().unwrap_or_default()
    }

    /// Metadata, created empty on first mutable access
    pub fn metadata_mut(&mut self) -> &mut NarrativeMetadata {
        self.metadata.get_or_insert_with(NarrativeMetadata::default)
    }

    /// Authored word-count target, if any
    #[must_use]
    pub fn word_count_target(&self) -> Option<&WordCountTarget> {
        self.metadata.as_ref()?.word_count_target.as_ref()
    }

    /// Find a beat by id
    #[must_use]
    pub fn beat(&self, id: BeatId) -> Option<&Beat> {
        self.subtasks.iter().find(|b| b.id == id)
    }
}

/// All chapters of one tag plus tag-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagData {
    /// Chapters in authored order
    #[serde(default)]
    pub tasks: Vec<Chapter>,
    /// Tag-level metadata
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Unrecognized keys, kept as authored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TagData {
    /// Create tag data from chapters in graph order
    #[must_use]
    pub fn new(tasks: Vec<Chapter>) -> Self {
        Self {
            tasks,
            metadata: Map::new(),
            extra: Map::new(),
        }
    }

    /// Find a chapter by id
    #[must_use]
    pub fn chapter(&self, id: ChapterId) -> Option<&Chapter> {
        self.tasks.iter().find(|c| c.id == id)
    }

    /// Find a chapter by id for mutation
    pub fn chapter_mut(&mut self, id: ChapterId) -> Option<&mut Chapter> {
        self.tasks.iter_mut().find(|c| c.id == id)
    }

    /// Find a beat by its parent chapter and local id
    #[must_use]
    pub fn beat(&self, chapter: ChapterId, beat: BeatId) -> Option<&Beat> {
        self.chapter(chapter)?.beat(beat)
    }

    /// Check if the tag has no chapters
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
