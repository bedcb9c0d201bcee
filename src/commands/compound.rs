//! `ralph compound` - distill journal learnings into a skill file.
//!
//! One-shot agent invocation outside the loop: the journal's learning
//! entries go into the compounding prompt, the agent's answer lands in
//! `.ralph/skills/learned-<date>.md` with YAML frontmatter. When the
//! invocation fails nothing is written.

use std::fs;

use chrono::Utc;
use log::info;
use serde::Serialize;

use crate::config::ConfigManager;
use crate::context::ProjectContext;
use crate::prd::PrdStore;
use crate::ralph_loop::{AgentWorker, ProgressJournal, Worker};
use crate::templates::{self, builtin, TemplateResolver};

#[derive(Serialize)]
struct SkillFrontmatter<'a> {
    name: &'a str,
    description: &'a str,
    date: &'a str,
}

pub async fn execute(context: &ProjectContext) -> Result<i32, String> {
    if !context.is_initialized() {
        return Err(format!(
            "No {} found - run `ralph init` first.",
            context.config_path().display()
        ));
    }

    let config = ConfigManager::new(context).read()?;
    let prd = PrdStore::new(context).load()?;

    let journal = ProgressJournal::new(context);
    let learnings = journal.learnings()?;
    if learnings.is_empty() {
        println!(
            "No learnings in {} yet - nothing to compound.",
            journal.path().display()
        );
        return Ok(0);
    }

    let listed: String = learnings
        .iter()
        .map(|entry| format!("- {}\n", entry.content))
        .collect();

    let mut resolver = TemplateResolver::new().with_project_path(context.root());
    let mut vars = templates::scaffold_context(&prd.project, &prd.description, &config);
    vars.insert("learnings", &listed);
    let prompt = templates::render(&mut resolver, builtin::COMPOUND_PROMPT, &vars)
        .map_err(|e| e.to_string())?;

    println!(
        "Distilling {} learnings with {}...",
        learnings.len(),
        config.agent
    );
    let mut worker = AgentWorker::new(config.agent, context.root());
    let result = worker
        .run_iteration(&prompt)
        .await
        .map_err(|e| format!("Agent invocation failed, no skill written: {}", e))?;

    let body = result.output.trim();
    if body.is_empty() {
        return Err("Agent produced no output, no skill written".to_string());
    }

    let date = Utc::now().format("%Y-%m-%d").to_string();
    let name = format!("learned-{}", date);
    let content = skill_document(&name, &date, body)?;

    fs::create_dir_all(context.skills_dir())
        .map_err(|e| format!("Failed to create {}: {}", context.skills_dir().display(), e))?;
    let mut path = context.skills_dir().join(format!("{}.md", name));
    if path.exists() {
        // A second compound on the same day gets a timestamped name
        // instead of clobbering the first.
        path = context.skills_dir().join(format!(
            "learned-{}.md",
            Utc::now().format("%Y-%m-%d-%H%M%S")
        ));
    }
    fs::write(&path, content)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

    info!("[Compound] Wrote {}", path.display());
    println!(
        "Wrote {} ({} learnings distilled).",
        path.display(),
        learnings.len()
    );
    Ok(0)
}

fn skill_document(name: &str, date: &str, body: &str) -> Result<String, String> {
    let front = SkillFrontmatter {
        name,
        description: "Skills distilled from loop progress learnings",
        date,
    };
    let yaml = serde_yaml::to_string(&front)
        .map_err(|e| format!("Failed to serialize skill frontmatter: {}", e))?;
    Ok(format!("---\n{}---\n\n{}\n", yaml, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_document_has_frontmatter() {
        let doc = skill_document("learned-2025-06-01", "2025-06-01", "## Use the journal").unwrap();

        assert!(doc.starts_with("---\n"));
        assert!(doc.contains("name: learned-2025-06-01"));
        assert!(doc.contains("date:"));
        assert!(doc.ends_with("## Use the journal\n"));
        assert_eq!(doc.matches("---").count(), 2);
    }
}
