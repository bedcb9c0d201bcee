//! Template system for scaffolded files and prompts.
//!
//! Templates are tera files resolved with a cascading lookup (project
//! `.ralph/templates/` → global `~/.ralph/templates/` → builtin) and
//! rendered with a per-call context. Everything ralph writes from a
//! template goes through here: `.ralph/prompt.md`, `AGENT.md`, the seed
//! skill file, and schedule artifacts.

pub mod builtin;
pub mod resolver;

pub use resolver::{ResolvedTemplate, TemplateResolver, TemplateSource};

use crate::context::RALPH_DIR;
use crate::models::RalphConfig;
use crate::ralph_loop::completion::COMPLETION_PROMISE;
use anyhow::{anyhow, Result};
use chrono::Utc;
use tera::{Context, Tera};

/// Resolve a template by name and render it with the given context.
pub fn render(resolver: &mut TemplateResolver, name: &str, context: &Context) -> Result<String> {
    let template = resolver.resolve(name)?;
    Tera::one_off(&template.content, context, false)
        .map_err(|e| anyhow!("Failed to render template '{}': {}", name, e))
}

/// Render raw template content with a context.
///
/// Autoescaping is off: output is markdown, plist XML, or cron text,
/// never HTML.
pub fn render_str(content: &str, context: &Context) -> Result<String> {
    Tera::one_off(content, context, false).map_err(|e| anyhow!("Failed to render template: {}", e))
}

/// Build the variable set shared by the scaffolded-file templates.
///
/// Paths are repo-relative because the worker agent runs with the project
/// root as its working directory.
pub fn scaffold_context(project: &str, description: &str, config: &RalphConfig) -> Context {
    let mut context = Context::new();
    context.insert("project", project);
    context.insert("description", description);
    context.insert("ticket_prefix", &config.ticket_prefix);
    context.insert("prd_path", &format!("{}/prd.json", RALPH_DIR));
    context.insert("progress_path", &format!("{}/progress.txt", RALPH_DIR));
    context.insert("skills_dir", &format!("{}/skills/", RALPH_DIR));
    context.insert("promise", COMPLETION_PROMISE);
    context.insert("create_prs", &config.git.create_prs);
    context.insert("branch_prefix", &config.git.branch_prefix);
    context.insert("use_pr_template", &config.git.use_pr_template);
    context.insert("wait_for_merge", &config.git.wait_for_merge);
    context.insert("use_xgit", &config.git.use_xgit);
    context.insert("date", &Utc::now().format("%Y-%m-%d").to_string());
    context
}
