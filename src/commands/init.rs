//! `ralph init` - interactive project setup.
//!
//! Walks through backlog source, project metadata, agent choice, and git
//! workflow options, then writes the `.ralph/` directory: config, backlog,
//! prompt, agent guide, and the skill seed. The wizard half gathers
//! answers; [`scaffold_project`] does all the writing so the file layout
//! is testable without stdin.

use std::fs;

use log::info;
use which::which;

use crate::commands::{confirm, prompt_line, read_multiline};
use crate::config::ConfigManager;
use crate::context::ProjectContext;
use crate::git;
use crate::models::{AgentType, GitProvider, GitSettings, is_valid_ticket_prefix, RalphConfig};
use crate::prd::{markdown, Prd, PrdStore};
use crate::ralph_loop::ProgressJournal;
use crate::templates::{self, builtin, TemplateResolver};

/// Example document offered when the user has no backlog of their own yet.
const SAMPLE_DOCUMENT: &str = "\
# Todo App

A small command-line task tracker used to try out the loop.

1. Add a task model
   - A task has a title and a done flag
   - Tasks are stored as JSON on disk
2. List tasks
   - Prints every task with its id and state
3. Complete a task
   - Marks a task done by id
";

pub fn execute(context: &ProjectContext) -> Result<i32, String> {
    if context.is_initialized() {
        println!(
            "This project is already initialized ({} exists).",
            context.config_path().display()
        );
        if !confirm("Re-run setup and overwrite the config?", false)? {
            println!("Nothing changed.");
            return Ok(0);
        }
    }

    println!("Welcome to Ralph. A few questions and the loop is ready.\n");

    // Backlog source comes first: a supplied document pre-fills the
    // project name and description prompts.
    let document = ask_document()?;
    let meta = markdown::extract_document_meta(&document);

    let default_name = meta
        .title
        .clone()
        .unwrap_or_else(|| context.default_project_name());
    let project = prompt_line("Project name", Some(&default_name))?;
    let description = prompt_line("Short description", meta.description.as_deref())?;

    let ticket_prefix = ask_ticket_prefix()?;
    let agent = ask_agent()?;
    let max_iterations = ask_max_iterations()?;
    let git_settings = ask_git_settings(context)?;

    let mut config = RalphConfig::new(&ticket_prefix);
    config.agent = agent;
    config.max_iterations = max_iterations;
    config.git = git_settings;

    let mut prd = Prd::new(project.clone(), git::default_branch(context.root()));
    prd.description = description;
    prd.user_stories = markdown::import_stories(&document, &ticket_prefix);
    prd.validate()?;

    scaffold_project(context, &config, &prd)?;

    println!();
    println!(
        "Initialized {} with {} stories.",
        project,
        prd.user_stories.len()
    );
    println!("  config:  {}", context.config_path().display());
    println!("  backlog: {}", context.prd_path().display());
    println!("  prompt:  {}", context.prompt_path().display());
    println!();
    println!("Run `ralph run` to start the loop.");
    Ok(0)
}

fn ask_document() -> Result<String, String> {
    println!("Where should the initial backlog come from?");
    println!("  1. Paste a PRD or feature list");
    println!("  2. Read a file");
    println!("  3. Use a small example backlog");
    println!("  4. Start empty");
    loop {
        let choice = prompt_line("Choice", Some("1"))?;
        match choice.trim() {
            "1" => {
                println!("Paste your document below. Finish with a single '.' on its own line:");
                return read_multiline();
            }
            "2" => {
                let path = prompt_line("File path", None)?;
                if path.is_empty() {
                    println!("A path is required.");
                    continue;
                }
                match fs::read_to_string(&path) {
                    Ok(content) => return Ok(content),
                    Err(e) => {
                        println!("Could not read {}: {}", path, e);
                        continue;
                    }
                }
            }
            "3" => return Ok(SAMPLE_DOCUMENT.to_string()),
            "4" => return Ok(String::new()),
            other => println!("Please answer 1-4, not '{}'.", other),
        }
    }
}

fn ask_ticket_prefix() -> Result<String, String> {
    loop {
        let prefix = prompt_line("Ticket prefix (2-5 letters, e.g. US or PROJ)", Some("US"))?;
        let prefix = prefix.to_uppercase();
        if is_valid_ticket_prefix(&prefix) {
            return Ok(prefix);
        }
        println!("'{}' is not a valid prefix: 2-5 ASCII letters only.", prefix);
    }
}

fn ask_agent() -> Result<AgentType, String> {
    println!("Which agent CLI should run iterations?");
    for (i, agent) in AgentType::all().iter().enumerate() {
        let found = if which(agent.binary_name()).is_ok() {
            " (found on PATH)"
        } else {
            ""
        };
        println!("  {}. {}{}", i + 1, agent, found);
    }
    loop {
        let choice = prompt_line("Choice", Some("1"))?;
        if let Ok(index) = choice.trim().parse::<usize>() {
            if (1..=AgentType::all().len()).contains(&index) {
                return Ok(AgentType::all()[index - 1]);
            }
        }
        println!("Please answer 1-{}.", AgentType::all().len());
    }
}

fn ask_max_iterations() -> Result<u32, String> {
    loop {
        let answer = prompt_line("Max iterations per run", Some("30"))?;
        match answer.trim().parse::<u32>() {
            Ok(n) if n > 0 => return Ok(n),
            _ => println!("Please enter a positive number."),
        }
    }
}

fn ask_git_settings(context: &ProjectContext) -> Result<GitSettings, String> {
    let mut settings = GitSettings::default();

    let provider_default = if git::origin_slug(context.root()).is_some() {
        "github"
    } else {
        "none"
    };
    loop {
        let answer = prompt_line("Git provider (github/none)", Some(provider_default))?;
        match answer.trim().parse::<GitProvider>() {
            Ok(provider) => {
                settings.provider = provider;
                break;
            }
            Err(e) => println!("{}", e),
        }
    }

    if settings.provider == GitProvider::Github {
        settings.create_prs = confirm("Open a pull request per story?", true)?;
        if settings.create_prs {
            settings.use_pr_template =
                confirm("Use the repo's PR template when available?", true)?;
            settings.wait_for_merge = confirm(
                "Wait for dependency PRs to merge before starting dependents?",
                false,
            )?;
            let prefix = prompt_line("Branch prefix ('none' for bare story ids)", Some("ralph/"))?;
            settings.branch_prefix = if prefix == "none" { String::new() } else { prefix };
        }
    }

    settings.use_xgit = which("xgit").is_ok();
    if settings.use_xgit {
        println!("Found xgit - the prompt will tell the agent to use it instead of git.");
    }

    Ok(settings)
}

/// Write every artifact of an initialized project: `.ralph/` with config,
/// backlog, prompt, and skill seed, plus the repo-root agent guide and the
/// progress journal header.
///
/// `AGENT.md` and the skill seed may predate this project; existing copies
/// are left untouched.
pub fn scaffold_project(
    context: &ProjectContext,
    config: &RalphConfig,
    prd: &Prd,
) -> Result<(), String> {
    fs::create_dir_all(context.ralph_dir())
        .map_err(|e| format!("Failed to create {}: {}", context.ralph_dir().display(), e))?;
    fs::create_dir_all(context.skills_dir())
        .map_err(|e| format!("Failed to create {}: {}", context.skills_dir().display(), e))?;

    ConfigManager::new(context).write(config)?;
    PrdStore::new(context).save(prd)?;

    let mut resolver = TemplateResolver::new().with_project_path(context.root());
    let vars = templates::scaffold_context(&prd.project, &prd.description, config);

    let prompt =
        templates::render(&mut resolver, builtin::PROMPT_MD, &vars).map_err(|e| e.to_string())?;
    fs::write(context.prompt_path(), prompt)
        .map_err(|e| format!("Failed to write {}: {}", context.prompt_path().display(), e))?;

    if context.agent_guide_path().exists() {
        info!(
            "[Init] {} already exists, leaving it alone",
            context.agent_guide_path().display()
        );
    } else {
        let guide = templates::render(&mut resolver, builtin::AGENT_MD, &vars)
            .map_err(|e| e.to_string())?;
        fs::write(context.agent_guide_path(), guide).map_err(|e| {
            format!(
                "Failed to write {}: {}",
                context.agent_guide_path().display(),
                e
            )
        })?;
    }

    let seed_path = context.skills_dir().join("using-skills.md");
    if !seed_path.exists() {
        let seed = templates::render(&mut resolver, builtin::SKILL_SEED, &vars)
            .map_err(|e| e.to_string())?;
        fs::write(&seed_path, seed)
            .map_err(|e| format!("Failed to write {}: {}", seed_path.display(), e))?;
    }

    ProgressJournal::new(context).initialize()?;
    Ok(())
}
