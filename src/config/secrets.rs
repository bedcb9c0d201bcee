// Secure storage for the GitHub API token
//
// The token lives in ~/.ralph/secrets.toml (global only, never
// project-level) so it cannot end up committed inside a project repository.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Secrets stored in ~/.ralph/secrets.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretsConfig {
    /// GitHub API token used when GITHUB_TOKEN and `gh auth token` are
    /// both unavailable
    #[serde(default)]
    pub github_token: Option<String>,
}

impl SecretsConfig {
    /// Get the secrets file path (~/.ralph/secrets.toml)
    pub fn secrets_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".ralph").join("secrets.toml"))
    }

    /// Load secrets from disk, defaulting when the file does not exist
    pub fn load() -> Result<Self> {
        let path =
            Self::secrets_path().ok_or_else(|| anyhow!("Could not determine home directory"))?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow!("Failed to read secrets file '{}': {}", path.display(), e))?;

        let config: SecretsConfig = toml::from_str(&contents)
            .map_err(|e| anyhow!("Failed to parse secrets file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save secrets to disk with owner-only permissions
    pub fn save(&self) -> Result<()> {
        let path =
            Self::secrets_path().ok_or_else(|| anyhow!("Could not determine home directory"))?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    anyhow!(
                        "Failed to create secrets directory '{}': {}",
                        parent.display(),
                        e
                    )
                })?;
            }
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| anyhow!("Failed to serialize secrets: {}", e))?;

        fs::write(&path, contents)
            .map_err(|e| anyhow!("Failed to write secrets file '{}': {}", path.display(), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, permissions).map_err(|e| {
                anyhow!(
                    "Failed to set permissions on secrets file '{}': {}",
                    path.display(),
                    e
                )
            })?;
        }

        log::info!("[Secrets] Saved secrets to {}", path.display());
        Ok(())
    }
}
