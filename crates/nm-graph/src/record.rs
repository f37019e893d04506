//! Raw tag records as stored on disk
//!
//! [`TagData`] is a normalized view: statuses, dependency spellings and empty
//! fields are not guaranteed to serialize back the way they were authored.
//! Writers that only own a few keys patch the raw record instead, so every
//! other byte of the author's record survives a save.

use crate::dependency::DependencyRef;
use crate::error::StoreError;
use crate::types::{ChapterId, TagData};
use serde_json::{Map, Value};

/// Key holding the engine-written draft word count
pub const DRAFT_WORD_COUNT_KEY: &str = "draftWordCount";

/// Key holding the engine-written progress percentage
pub const PROGRESS_KEY: &str = "progress";

/// Decode a raw tag record
///
/// # Errors
/// Returns `StoreError::MalformedTag` when the record does not match the
/// chapter schema.
pub fn decode(tag: &str, record: Value) -> Result<TagData, StoreError> {
    serde_json::from_value(record).map_err(|source| StoreError::MalformedTag {
        tag: tag.to_string(),
        source,
    })
}

/// Encode a tag into a fresh raw record
///
/// # Errors
/// Returns `StoreError::MalformedTag` if the tag cannot be represented as JSON.
pub fn encode(tag: &str, data: &TagData) -> Result<Value, StoreError> {
    serde_json::to_value(data).map_err(|source| StoreError::MalformedTag {
        tag: tag.to_string(),
        source,
    })
}

/// Copy dependency repairs from `repaired` into the authored record
///
/// Lists that decode to the repaired list are left as written. Repaired lists
/// keep the authored spelling of every surviving entry (`"1"` stays a string).
/// Returns the number of lists rewritten.
pub fn apply_dependency_repairs(record: &mut Value, repaired: &TagData) -> usize {
    let mut rewritten = 0;
    for chapter in &repaired.tasks {
        let Some(chapter_node) = node_mut(record.get_mut("tasks"), chapter.id.0) else {
            continue;
        };
        rewritten += usize::from(retain_repaired(chapter_node, &chapter.dependencies));

        for beat in &chapter.subtasks {
            if let Some(beat_node) = node_mut(chapter_node.get_mut("subtasks"), beat.id.0) {
                rewritten += usize::from(retain_repaired(beat_node, &beat.dependencies));
            }
        }
    }
    rewritten
}

/// Set the engine-written progress keys on one chapter's metadata
///
/// `draftWordCount` is always written. `progress` is written only when known,
/// so an existing value is kept for chapters without a parseable target.
/// Returns `false` when the chapter is not in the record.
pub fn set_chapter_progress(
    record: &mut Value,
    chapter: ChapterId,
    draft_word_count: u64,
    progress: Option<u32>,
) -> bool {
    let Some(node) = node_mut(record.get_mut("tasks"), chapter.0) else {
        return false;
    };

    let metadata = node
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if !metadata.is_object() {
        *metadata = Value::Object(Map::new());
    }
    if let Some(metadata) = metadata.as_object_mut() {
        metadata.insert(DRAFT_WORD_COUNT_KEY.to_string(), Value::from(draft_word_count));
        if let Some(progress) = progress {
            metadata.insert(PROGRESS_KEY.to_string(), Value::from(progress));
        }
    }
    true
}

/// First object in `list` whose `id` is `id`
fn node_mut(list: Option<&mut Value>, id: u32) -> Option<&mut Map<String, Value>> {
    list?
        .as_array_mut()?
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find(|node| node.get("id").and_then(Value::as_u64) == Some(u64::from(id)))
}

/// Drop authored entries that are not in `repaired`
///
/// Repairs only remove entries, so `repaired` is matched as an ordered
/// subsequence of the authored list.
fn retain_repaired(node: &mut Map<String, Value>, repaired: &[DependencyRef]) -> bool {
    let Some(Value::Array(entries)) = node.get_mut("dependencies") else {
        return false;
    };

    let authored: Vec<DependencyRef> = entries.iter().cloned().map(DependencyRef::from).collect();
    if authored == repaired {
        return false;
    }

    let mut pending = repaired.iter().peekable();
    entries.retain(|entry| {
        let keep = pending
            .peek()
            .is_some_and(|next| **next == DependencyRef::from(entry.clone()));
        if keep {
            pending.next();
        }
        keep
    });
    true
}
