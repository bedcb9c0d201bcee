//! Project context and `.ralph/` path layout.
//!
//! Every command operates on an explicit [`ProjectContext`] constructed once
//! at startup instead of reaching for the current working directory. Paths
//! under `.ralph/` are derived here and nowhere else.

use std::path::{Path, PathBuf};

/// The name of the per-project state directory.
pub const RALPH_DIR: &str = ".ralph";

/// Explicit handle on a project and its `.ralph/` state directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    root: PathBuf,
}

impl ProjectContext {
    /// Create a context rooted at the given project directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a context from the process working directory.
    ///
    /// This is the only place the ambient CWD is consulted; callers hold on
    /// to the returned value from then on.
    pub fn from_current_dir() -> Result<Self, String> {
        let cwd = std::env::current_dir()
            .map_err(|e| format!("Failed to determine current directory: {}", e))?;
        Ok(Self::new(cwd))
    }

    /// The project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `.ralph/` state directory.
    pub fn ralph_dir(&self) -> PathBuf {
        self.root.join(RALPH_DIR)
    }

    /// `.ralph/config.json`
    pub fn config_path(&self) -> PathBuf {
        self.ralph_dir().join("config.json")
    }

    /// `.ralph/prd.json`
    pub fn prd_path(&self) -> PathBuf {
        self.ralph_dir().join("prd.json")
    }

    /// `.ralph/prompt.md`
    pub fn prompt_path(&self) -> PathBuf {
        self.ralph_dir().join("prompt.md")
    }

    /// `AGENT.md` at the project root (read by the external worker).
    pub fn agent_guide_path(&self) -> PathBuf {
        self.root.join("AGENT.md")
    }

    /// `.ralph/skills/` directory.
    pub fn skills_dir(&self) -> PathBuf {
        self.ralph_dir().join("skills")
    }

    /// `.ralph/progress.txt`
    pub fn progress_path(&self) -> PathBuf {
        self.ralph_dir().join("progress.txt")
    }

    /// `.ralph/ralph.lock`
    pub fn lock_path(&self) -> PathBuf {
        self.ralph_dir().join("ralph.lock")
    }

    /// `.ralph/templates/` directory for project-level template overrides.
    pub fn templates_dir(&self) -> PathBuf {
        self.ralph_dir().join("templates")
    }

    /// Whether this project has been initialized (a config file exists).
    pub fn is_initialized(&self) -> bool {
        self.config_path().exists()
    }

    /// A human-readable project name derived from the root directory.
    pub fn default_project_name(&self) -> String {
        self.root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("project")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_root() {
        let ctx = ProjectContext::new("/home/user/project");
        assert_eq!(ctx.ralph_dir(), PathBuf::from("/home/user/project/.ralph"));
        assert_eq!(
            ctx.config_path(),
            PathBuf::from("/home/user/project/.ralph/config.json")
        );
        assert_eq!(
            ctx.prd_path(),
            PathBuf::from("/home/user/project/.ralph/prd.json")
        );
        assert_eq!(
            ctx.lock_path(),
            PathBuf::from("/home/user/project/.ralph/ralph.lock")
        );
        assert_eq!(
            ctx.agent_guide_path(),
            PathBuf::from("/home/user/project/AGENT.md")
        );
    }

    #[test]
    fn test_default_project_name() {
        let ctx = ProjectContext::new("/home/user/my-app");
        assert_eq!(ctx.default_project_name(), "my-app");
    }

    #[test]
    fn test_is_initialized() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let ctx = ProjectContext::new(temp_dir.path());
        assert!(!ctx.is_initialized());

        std::fs::create_dir_all(ctx.ralph_dir()).unwrap();
        std::fs::write(ctx.config_path(), "{}").unwrap();
        assert!(ctx.is_initialized());
    }
}
