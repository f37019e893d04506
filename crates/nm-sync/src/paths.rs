//! Well-known locations under a project root

use std::path::{Path, PathBuf};

/// Project metadata directory
pub const PROJECT_DIR: &str = ".novelmaster";

/// Resolves the `.novelmaster` files of one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    /// Paths for the project at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `.novelmaster/tasks/tasks.json`
    #[must_use]
    pub fn tasks_file(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join("tasks").join("tasks.json")
    }

    /// `.novelmaster/config.json`
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join("config.json")
    }

    /// `.novelmaster/state.json`
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join("state.json")
    }

    /// Default manuscript output directory
    #[must_use]
    pub fn default_output_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join("manuscript")
    }

    /// Resolve an output directory; relative paths hang off the project root
    #[must_use]
    pub fn resolve_output_dir(&self, output_dir: Option<&Path>) -> PathBuf {
        match output_dir {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => self.root.join(dir),
            None => self.default_output_dir(),
        }
    }
}
