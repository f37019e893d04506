//! Dependency references between narrative nodes
//!
//! A reference is written either as a bare integer or as a dotted
//! `"chapter.beat"` string. The meaning of a bare integer depends on who holds
//! it: on a chapter it names another chapter, on a beat it names a sibling
//! beat in the same chapter.

use crate::types::{BeatId, ChapterId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One prerequisite reference as authored
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum DependencyRef {
    /// Bare id: a chapter (held by a chapter) or a sibling beat (held by a beat)
    Id(u32),
    /// Dotted `chapter.beat` reference
    Beat {
        /// Chapter holding the beat
        chapter: ChapterId,
        /// Beat within that chapter
        beat: BeatId,
    },
    /// Anything that is not a positive id or a dotted pair
    Unresolvable(String),
}

impl DependencyRef {
    /// Dotted reference constructor
    #[inline]
    #[must_use]
    pub fn beat(chapter: u32, beat: u32) -> Self {
        Self::Beat {
            chapter: ChapterId(chapter),
            beat: BeatId(beat),
        }
    }

    /// Resolve the reference as held by a beat of `parent`
    ///
    /// Bare ids stay inside the parent chapter.
    #[must_use]
    pub fn resolve_for_beat(&self, parent: ChapterId) -> Option<(ChapterId, BeatId)> {
        match self {
            Self::Id(id) => Some((parent, BeatId(*id))),
            Self::Beat { chapter, beat } => Some((*chapter, *beat)),
            Self::Unresolvable(_) => None,
        }
    }

    /// Render the reference as held by a beat of `parent` (`parent.beat`)
    #[must_use]
    pub fn display_for_beat(&self, parent: ChapterId) -> String {
        match self.resolve_for_beat(parent) {
            Some((chapter, beat)) => format!("{chapter}.{beat}"),
            None => self.to_string(),
        }
    }
}

impl FromStr for DependencyRef {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let positive = |s: &str| s.parse::<u32>().ok().filter(|n| *n > 0);

        let parsed = match trimmed.split_once('.') {
            Some((chapter, beat)) => positive(chapter)
                .zip(positive(beat))
                .map(|(c, b)| Self::beat(c, b)),
            None => positive(trimmed).map(Self::Id),
        };

        Ok(parsed.unwrap_or_else(|| Self::Unresolvable(raw.to_string())))
    }
}

impl From<Value> for DependencyRef {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(ref n) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0)
                .map_or_else(|| Self::Unresolvable(n.to_string()), Self::Id),
            Value::String(s) => s.parse().unwrap_or(Self::Unresolvable(s)),
            other => Self::Unresolvable(other.to_string()),
        }
    }
}

impl From<DependencyRef> for Value {
    fn from(reference: DependencyRef) -> Self {
        match reference {
            DependencyRef::Id(id) => Value::from(id),
            DependencyRef::Beat { chapter, beat } => Value::String(format!("{chapter}.{beat}")),
            DependencyRef::Unresolvable(raw) => Value::String(raw),
        }
    }
}

impl From<u32> for DependencyRef {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Beat { chapter, beat } => write!(f, "{chapter}.{beat}"),
            Self::Unresolvable(raw) => f.write_str(raw),
        }
    }
}

/// Address of a node in a tag: a chapter or one of its beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub enum NodeRef {
    /// A chapter
    Chapter(ChapterId),
    /// A beat inside the given chapter
    Beat(ChapterId, BeatId),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chapter(id) => write!(f, "{id}"),
            Self::Beat(chapter, beat) => write!(f, "{chapter}.{beat}"),
        }
    }
}

impl From<NodeRef> for String {
    fn from(node: NodeRef) -> Self {
        node.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_and_dotted_forms() {
        assert_eq!("3".parse::<DependencyRef>().unwrap(), DependencyRef::Id(3));
        assert_eq!(" 2.4 ".parse::<DependencyRef>().unwrap(), DependencyRef::beat(2, 4));
        assert_eq!(
            "chapter-one".parse::<DependencyRef>().unwrap(),
            DependencyRef::Unresolvable("chapter-one".to_string())
        );
        assert!(matches!(
            "0".parse::<DependencyRef>().unwrap(),
            DependencyRef::Unresolvable(_)
        ));
        assert!(matches!(
            "1.2.3".parse::<DependencyRef>().unwrap(),
            DependencyRef::Unresolvable(_)
        ));
    }

    #[test]
    fn deserializes_mixed_json_list() {
        let deps: Vec<DependencyRef> =
            serde_json::from_value(json!([1, "2.3", "4", -1, null])).unwrap();

        assert_eq!(deps[0], DependencyRef::Id(1));
        assert_eq!(deps[1], DependencyRef::beat(2, 3));
        assert_eq!(deps[2], DependencyRef::Id(4));
        assert!(matches!(deps[3], DependencyRef::Unresolvable(_)));
        assert!(matches!(deps[4], DependencyRef::Unresolvable(_)));
    }

    #[test]
    fn serializes_ids_as_numbers_and_dotted_as_strings() {
        let deps = vec![DependencyRef::Id(5), DependencyRef::beat(1, 2)];
        assert_eq!(serde_json::to_value(&deps).unwrap(), json!([5, "1.2"]));
    }

    #[test]
    fn beat_references_resolve_against_parent() {
        let parent = ChapterId(4);
        assert_eq!(
            DependencyRef::Id(2).resolve_for_beat(parent),
            Some((ChapterId(4), BeatId(2)))
        );
        assert_eq!(DependencyRef::Id(2).display_for_beat(parent), "4.2");
        assert_eq!(DependencyRef::beat(1, 3).display_for_beat(parent), "1.3");
    }

    #[test]
    fn node_ref_display() {
        assert_eq!(NodeRef::Chapter(ChapterId(3)).to_string(), "3");
        assert_eq!(NodeRef::Beat(ChapterId(3), BeatId(1)).to_string(), "3.1");
    }
}
