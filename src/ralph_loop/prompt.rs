//! Builds the prompt handed to the agent at the start of every iteration.

use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::context::{ProjectContext, RALPH_DIR};
use crate::models::RalphConfig;
use crate::templates::{self, builtin, TemplateResolver};

/// Assembles the per-iteration prompt from the scaffolded `.ralph/prompt.md`,
/// falling back to the built-in instructions when the file is missing.
///
/// The base text runs through the template engine each iteration, so a
/// hand-edited prompt may use `{{ project }}`, `{{ ticket_prefix }}` or
/// `{{ iteration }}` placeholders. Plain text renders unchanged.
pub struct PromptBuilder {
    prompt_path: PathBuf,
    project_root: PathBuf,
    project: String,
    config: RalphConfig,
}

impl PromptBuilder {
    pub fn new(context: &ProjectContext, project: &str, config: &RalphConfig) -> Self {
        Self {
            prompt_path: context.prompt_path(),
            project_root: context.root().to_path_buf(),
            project: project.to_string(),
            config: config.clone(),
        }
    }

    /// Returns the full prompt for one iteration: the rendered base
    /// instructions plus a trailing section naming the current iteration.
    pub fn build_iteration_prompt(&self, iteration: u32) -> Result<String, String> {
        let base = self.base_template()?;

        let mut context = templates::scaffold_context(&self.project, "", &self.config);
        context.insert("iteration", &iteration);

        let rendered = match templates::render_str(&base, &context) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "[Prompt] {} did not render as a template ({}), using it verbatim",
                    self.prompt_path.display(),
                    e
                );
                base
            }
        };

        Ok(format!(
            "{}\n\n---\n\n## Current Iteration: {}\n\nThis is iteration {} of the loop. Remember: your context is fresh. Read `{}/progress.txt` for learnings from previous iterations before you start.\n",
            rendered.trim_end(),
            iteration,
            iteration,
            RALPH_DIR
        ))
    }

    /// The unrendered base text: `.ralph/prompt.md` when present, otherwise
    /// the built-in prompt template (project template overrides still apply).
    fn base_template(&self) -> Result<String, String> {
        if self.prompt_path.exists() {
            return fs::read_to_string(&self.prompt_path)
                .map_err(|e| format!("Failed to read {}: {}", self.prompt_path.display(), e));
        }

        warn!(
            "[Prompt] {} not found, using built-in instructions",
            self.prompt_path.display()
        );
        let mut resolver = TemplateResolver::new().with_project_path(&self.project_root);
        let resolved = resolver
            .resolve(builtin::PROMPT_MD)
            .map_err(|e| e.to_string())?;
        Ok(resolved.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_builder(dir: &TempDir) -> PromptBuilder {
        let context = ProjectContext::new(dir.path());
        let config = RalphConfig::new("US");
        PromptBuilder::new(&context, "test-project", &config)
    }

    #[test]
    fn test_uses_scaffolded_prompt_file() {
        let dir = TempDir::new().unwrap();
        let context = ProjectContext::new(dir.path());
        std::fs::create_dir_all(context.ralph_dir()).unwrap();
        std::fs::write(context.prompt_path(), "Custom instructions here.").unwrap();

        let builder = make_builder(&dir);
        let prompt = builder.build_iteration_prompt(3).unwrap();

        assert!(prompt.starts_with("Custom instructions here."));
        assert!(prompt.contains("## Current Iteration: 3"));
    }

    #[test]
    fn test_falls_back_to_builtin_instructions() {
        let dir = TempDir::new().unwrap();
        let builder = make_builder(&dir);

        let prompt = builder.build_iteration_prompt(1).unwrap();

        assert!(prompt.contains("Iteration Instructions"));
        assert!(prompt.contains("test-project"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_placeholders_in_prompt_file_are_rendered() {
        let dir = TempDir::new().unwrap();
        let context = ProjectContext::new(dir.path());
        std::fs::create_dir_all(context.ralph_dir()).unwrap();
        std::fs::write(
            context.prompt_path(),
            "Work on {{ project }}, iteration {{ iteration }}.",
        )
        .unwrap();

        let builder = make_builder(&dir);
        let prompt = builder.build_iteration_prompt(7).unwrap();

        assert!(prompt.contains("Work on test-project, iteration 7."));
    }

    #[test]
    fn test_iteration_number_advances() {
        let dir = TempDir::new().unwrap();
        let builder = make_builder(&dir);

        let first = builder.build_iteration_prompt(1).unwrap();
        let second = builder.build_iteration_prompt(2).unwrap();

        assert!(first.contains("## Current Iteration: 1"));
        assert!(second.contains("## Current Iteration: 2"));
    }
}
