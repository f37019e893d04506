//! Manuscript Synchronization
//!
//! Keeps a project's per-chapter Markdown files in step with its narrative
//! task graph.
//!
//! # Core Concepts
//!
//! - [`ManuscriptSynchronizer`]: one sequential pass per tag
//! - [`ProjectConfig`]: `.novelmaster/config.json` defaults
//! - [`SyncResponse`]: `{ success, data | error }` envelope for host tools
//! - [`compare_tags`]: metric comparison between two tags
//!
//! # Example
//!
//! ```rust,ignore
//! use nm_sync::{ManuscriptSynchronizer, SyncOptions};
//!
//! let sync = ManuscriptSynchronizer::open(".").await?;
//! let report = sync.sync_with_state(&SyncOptions::new("outline")).await?;
//!
//! for chapter in &report.chapters {
//!     println!("{}: {} words", chapter.title, chapter.draft_word_count);
//! }
//! ```

#![warn(unreachable_pub)]

pub mod clock;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod paths;
pub mod reports;
pub mod response;
pub mod state;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{GlobalConfig, ManuscriptConfig, ProjectConfig};
pub use error::SyncError;
pub use orchestrator::{validate_dependencies, ManuscriptSynchronizer, SyncOptions, SyncReport};
pub use paths::{ProjectPaths, PROJECT_DIR};
pub use reports::{
    compare_tags, read_manuscript_summary, ComparisonMetric, SummaryDocument, TagComparison,
    TagMetrics,
};
pub use response::{ErrorBody, SyncResponse};
pub use state::{load_ledger, save_ledger, LEDGER_KEY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
