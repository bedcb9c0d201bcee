//! Configuration file handling
//!
//! Reads and writes .ralph/config.json for project-specific settings.

pub mod secrets;

use crate::context::ProjectContext;
use crate::models::RalphConfig;
use std::path::{Path, PathBuf};

/// Configuration file manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager for a project
    pub fn new(ctx: &ProjectContext) -> Self {
        Self {
            config_path: ctx.config_path(),
        }
    }

    /// Check if config file exists
    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Read config from file.
    ///
    /// A missing file is an error here: commands that tolerate an
    /// uninitialized project check [`exists`](Self::exists) first.
    pub fn read(&self) -> Result<RalphConfig, String> {
        if !self.config_path.exists() {
            return Err(format!(
                "No config found at {} - run `ralph init` first",
                self.config_path.display()
            ));
        }

        let content = std::fs::read_to_string(&self.config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: RalphConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Write config to file
    pub fn write(&self, config: &RalphConfig) -> Result<(), String> {
        config.validate()?;

        // Ensure parent directory exists
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(&self.config_path, content)
            .map_err(|e| format!("Failed to write config file: {}", e))
    }

    /// Update specific fields in the config
    pub fn update<F>(&self, updater: F) -> Result<RalphConfig, String>
    where
        F: FnOnce(&mut RalphConfig),
    {
        let mut config = self.read()?;
        updater(&mut config);
        self.write(&config)?;
        Ok(config)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
