//! Backlog persistence
//!
//! Reads and writes .ralph/prd.json. The file is shared state: the external
//! worker rewrites it between iterations, so every read goes back to disk.

use crate::context::ProjectContext;
use crate::prd::Prd;
use std::path::{Path, PathBuf};

/// Backlog file manager
pub struct PrdStore {
    prd_path: PathBuf,
}

impl PrdStore {
    /// Create a store bound to a project's backlog file
    pub fn new(context: &ProjectContext) -> Self {
        Self {
            prd_path: context.prd_path(),
        }
    }

    /// Check if the backlog file exists
    pub fn exists(&self) -> bool {
        self.prd_path.exists()
    }

    /// Load the backlog from disk.
    ///
    /// Fails if the file is missing, unparseable, or has duplicate story
    /// ids. Dangling dependency references are allowed through - the
    /// selection policy treats them as unmet rather than as corruption.
    pub fn load(&self) -> Result<Prd, String> {
        if !self.prd_path.exists() {
            return Err(format!(
                "No backlog found at {} - run `ralph init` first",
                self.prd_path.display()
            ));
        }

        let content = std::fs::read_to_string(&self.prd_path)
            .map_err(|e| format!("Failed to read backlog file: {}", e))?;

        let prd: Prd = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse backlog file: {}", e))?;

        prd.validate_unique()?;
        Ok(prd)
    }

    /// Write the backlog to disk as pretty-printed JSON.
    pub fn save(&self, prd: &Prd) -> Result<(), String> {
        prd.validate_unique()?;

        if let Some(parent) = self.prd_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create backlog directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(prd)
            .map_err(|e| format!("Failed to serialize backlog: {}", e))?;

        std::fs::write(&self.prd_path, content)
            .map_err(|e| format!("Failed to write backlog file: {}", e))
    }

    /// Load, apply a mutation, and save.
    pub fn update<F>(&self, updater: F) -> Result<Prd, String>
    where
        F: FnOnce(&mut Prd) -> Result<(), String>,
    {
        let mut prd = self.load()?;
        updater(&mut prd)?;
        self.save(&prd)?;
        Ok(prd)
    }

    /// Get the backlog file path
    pub fn path(&self) -> &Path {
        &self.prd_path
    }
}
