//! Narrative Task Graph
//!
//! The structured side of a manuscript: tags own ordered chapters, chapters own
//! ordered beats, and both carry prerequisite references to other nodes in the
//! same tag.
//!
//! # Core Concepts
//!
//! - [`Chapter`] / [`Beat`]: narrative units with status, metadata and
//!   dependencies
//! - [`DependencyRef`]: a bare id or a dotted `chapter.beat` reference
//! - [`DependencyValidator`]: drops dangling references and breaks cycles
//! - [`TaskGraphStore`]: tag-keyed persistence (JSON file or in-memory)
//!
//! # Example
//!
//! ```rust,ignore
//! use nm_graph::{DependencyValidator, JsonTaskStore, TaskGraphStore};
//!
//! let store = JsonTaskStore::new(".novelmaster/tasks/tasks.json");
//! let mut tag = store.load_tag("outline").await?.expect("tag exists");
//!
//! let report = DependencyValidator::new().validate(&mut tag);
//! for fix in report.fixes() {
//!     println!("repaired: {fix}");
//! }
//! ```

#![warn(unreachable_pub)]

pub mod dependency;
pub mod error;
pub mod record;
pub mod store;
pub mod types;
pub mod validator;

pub use dependency::{DependencyRef, NodeRef};
pub use error::StoreError;
pub use store::{JsonTaskStore, MemoryTaskStore, TaskGraphStore};
pub use types::{
    Beat, BeatId, Chapter, ChapterId, NarrativeMetadata, Priority, TagData, TaskStatus,
    WordCountTarget,
};
pub use validator::{DependencyFix, DependencyValidator, ValidationReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
