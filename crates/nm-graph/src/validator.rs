//! Dependency repair for a tag
//!
//! Validation never fails. Every reference that cannot be honoured is removed
//! and reported as a [`DependencyFix`]:
//! - unparseable, self, duplicate and dangling references are dropped
//! - cycles in the chapter-level graph are broken by removing the back edge
//!   that closes each loop during a depth-first walk in chapter order
//!
//! Beat-level edges and dotted references never take part in cycle detection.

use crate::dependency::{DependencyRef, NodeRef};
use crate::types::{Beat, BeatId, Chapter, ChapterId, TagData};
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// One repair applied by the validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DependencyFix {
    /// Referenced chapter or beat does not exist in the tag
    Dangling {
        owner: NodeRef,
        reference: DependencyRef,
    },
    /// Node depended on itself
    SelfReference {
        owner: NodeRef,
        reference: DependencyRef,
    },
    /// Same target listed more than once
    Duplicate {
        owner: NodeRef,
        reference: DependencyRef,
    },
    /// Reference could not be parsed as an id
    Unresolvable {
        owner: NodeRef,
        reference: DependencyRef,
    },
    /// Back edge removed to break a chapter cycle
    CycleBroken { owner: ChapterId, reference: ChapterId },
}

impl DependencyFix {
    /// Node whose dependency list was edited
    #[must_use]
    pub fn owner(&self) -> NodeRef {
        match self {
            Self::Dangling { owner, .. }
            | Self::SelfReference { owner, .. }
            | Self::Duplicate { owner, .. }
            | Self::Unresolvable { owner, .. } => *owner,
            Self::CycleBroken { owner, .. } => NodeRef::Chapter(*owner),
        }
    }
}

impl fmt::Display for DependencyFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dangling { owner, reference } => {
                write!(f, "{owner}: removed missing dependency {reference}")
            }
            Self::SelfReference { owner, reference } => {
                write!(f, "{owner}: removed self dependency {reference}")
            }
            Self::Duplicate { owner, reference } => {
                write!(f, "{owner}: removed duplicate dependency {reference}")
            }
            Self::Unresolvable { owner, reference } => {
                write!(f, "{owner}: removed unresolvable dependency '{reference}'")
            }
            Self::CycleBroken { owner, reference } => {
                write!(f, "{owner}: removed dependency {reference} closing a cycle")
            }
        }
    }
}

/// Repairs applied during one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    fixes: Vec<DependencyFix>,
}

impl ValidationReport {
    /// All repairs, in the order they were applied
    #[inline]
    #[must_use]
    pub fn fixes(&self) -> &[DependencyFix] {
        &self.fixes
    }

    /// Consume the report
    #[inline]
    #[must_use]
    pub fn into_fixes(self) -> Vec<DependencyFix> {
        self.fixes
    }

    /// True when nothing needed repair
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.fixes.is_empty()
    }

    /// Number of repairs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    /// Check if the report is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// Existence index of a tag's chapters and beats
struct TagIndex {
    beats: HashMap<ChapterId, HashSet<BeatId>>,
}

impl TagIndex {
    fn build(tag: &TagData) -> Self {
        let beats = tag
            .tasks
            .iter()
            .map(|c| (c.id, c.subtasks.iter().map(|b| b.id).collect()))
            .collect();
        Self { beats }
    }

    fn has_chapter(&self, id: ChapterId) -> bool {
        self.beats.contains_key(&id)
    }

    fn has_beat(&self, chapter: ChapterId, beat: BeatId) -> bool {
        self.beats.get(&chapter).is_some_and(|b| b.contains(&beat))
    }
}

/// DFS colouring
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

/// Deterministic dependency repairer
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyValidator;

impl DependencyValidator {
    /// Create new validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Repair every dependency list of `tag` in place
    pub fn validate(&self, tag: &mut TagData) -> ValidationReport {
        let index = TagIndex::build(tag);
        let mut fixes = Vec::new();

        for chapter in &mut tag.tasks {
            Self::repair_chapter(chapter, &index, &mut fixes);
            let parent = chapter.id;
            for beat in &mut chapter.subtasks {
                Self::repair_beat(parent, beat, &index, &mut fixes);
            }
        }

        Self::break_cycles(tag, &mut fixes);

        for fix in &fixes {
            tracing::warn!("Dependency repaired: {}", fix);
        }

        ValidationReport { fixes }
    }

    fn repair_chapter(chapter: &mut Chapter, index: &TagIndex, fixes: &mut Vec<DependencyFix>) {
        let own = chapter.id;
        let owner = NodeRef::Chapter(own);
        let mut seen = HashSet::new();

        chapter.dependencies.retain(|dep| {
            let verdict = match dep {
                DependencyRef::Unresolvable(_) => Some(FixKind::Unresolvable),
                DependencyRef::Id(id) if ChapterId(*id) == own => Some(FixKind::SelfReference),
                DependencyRef::Id(id) if !index.has_chapter(ChapterId(*id)) => {
                    Some(FixKind::Dangling)
                }
                DependencyRef::Beat { chapter, beat } if !index.has_beat(*chapter, *beat) => {
                    Some(FixKind::Dangling)
                }
                _ if !seen.insert(dep.clone()) => Some(FixKind::Duplicate),
                _ => None,
            };
            record(verdict, owner, dep, fixes)
        });
    }

    fn repair_beat(
        parent: ChapterId,
        beat: &mut Beat,
        index: &TagIndex,
        fixes: &mut Vec<DependencyFix>,
    ) {
        let own = (parent, beat.id);
        let owner = NodeRef::Beat(parent, beat.id);
        let mut seen = HashSet::new();

        beat.dependencies.retain(|dep| {
            let verdict = match dep.resolve_for_beat(parent) {
                None => Some(FixKind::Unresolvable),
                Some(target) if target == own => Some(FixKind::SelfReference),
                Some((chapter, beat)) if !index.has_beat(chapter, beat) => Some(FixKind::Dangling),
                Some(target) if !seen.insert(target) => Some(FixKind::Duplicate),
                Some(_) => None,
            };
            record(verdict, owner, dep, fixes)
        });
    }

    /// Remove back edges found by a DFS over chapter→chapter edges
    fn break_cycles(tag: &mut TagData, fixes: &mut Vec<DependencyFix>) {
        let mut graph: DiGraphMap<ChapterId, ()> = DiGraphMap::new();
        for chapter in &tag.tasks {
            graph.add_node(chapter.id);
            for dep in &chapter.dependencies {
                if let DependencyRef::Id(id) = dep {
                    graph.add_edge(chapter.id, ChapterId(*id), ());
                }
            }
        }

        let mut marks: HashMap<ChapterId, Mark> = HashMap::new();
        let mut removed = Vec::new();
        let roots: Vec<ChapterId> = tag.tasks.iter().map(|c| c.id).collect();
        for root in roots {
            if !marks.contains_key(&root) {
                visit(&mut graph, root, &mut marks, &mut removed);
            }
        }
        debug_assert!(!petgraph::algo::is_cyclic_directed(&graph));

        for (owner, target) in removed {
            if let Some(chapter) = tag.chapter_mut(owner) {
                chapter
                    .dependencies
                    .retain(|d| *d != DependencyRef::Id(target.0));
            }
            fixes.push(DependencyFix::CycleBroken {
                owner,
                reference: target,
            });
        }
    }
}

fn visit(
    graph: &mut DiGraphMap<ChapterId, ()>,
    node: ChapterId,
    marks: &mut HashMap<ChapterId, Mark>,
    removed: &mut Vec<(ChapterId, ChapterId)>,
) {
    marks.insert(node, Mark::OnStack);
    let successors: Vec<ChapterId> = graph.neighbors(node).collect();
    for next in successors {
        match marks.get(&next) {
            Some(Mark::OnStack) => {
                graph.remove_edge(node, next);
                removed.push((node, next));
            }
            Some(Mark::Done) => {}
            None => visit(graph, next, marks, removed),
        }
    }
    marks.insert(node, Mark::Done);
}

#[derive(Clone, Copy)]
enum FixKind {
    Dangling,
    SelfReference,
    Duplicate,
    Unresolvable,
}

/// Push the fix for a rejected reference; returns whether to keep it
fn record(
    verdict: Option<FixKind>,
    owner: NodeRef,
    dep: &DependencyRef,
    fixes: &mut Vec<DependencyFix>,
) -> bool {
    let Some(kind) = verdict else {
        return true;
    };
    let reference = dep.clone();
    fixes.push(match kind {
        FixKind::Dangling => DependencyFix::Dangling { owner, reference },
        FixKind::SelfReference => DependencyFix::SelfReference { owner, reference },
        FixKind::Duplicate => DependencyFix::Duplicate { owner, reference },
        FixKind::Unresolvable => DependencyFix::Unresolvable { owner, reference },
    });
    false
}
