//! `ralph status` - backlog and journal overview.

use crate::config::ConfigManager;
use crate::context::ProjectContext;
use crate::git;
use crate::lock;
use crate::prd::{BacklogStatus, PrdStore, Story};
use crate::ralph_loop::ProgressJournal;

pub fn execute(context: &ProjectContext) -> Result<i32, String> {
    if !context.is_initialized() {
        return Err(format!(
            "No {} found - run `ralph init` first.",
            context.config_path().display()
        ));
    }

    let config = ConfigManager::new(context).read()?;
    let prd = PrdStore::new(context).load()?;

    println!("{}", prd.project);
    if !prd.description.is_empty() {
        println!("{}", prd.description);
    }
    println!();
    println!(
        "  agent: {}   max iterations: {}   prefix: {}",
        config.agent, config.max_iterations, config.ticket_prefix
    );
    if let Some(info) = lock::active_run(context) {
        println!("  a run is active: pid {} since {}", info.pid, info.timestamp);
    }
    println!();

    if prd.user_stories.is_empty() {
        println!(
            "The backlog is empty. `ralph init` can import stories, or edit {} by hand.",
            context.prd_path().display()
        );
        return Ok(0);
    }

    for story in &prd.user_stories {
        println!("{}", format_story_row(story));
    }

    println!();
    println!(
        "{}/{} passing, {} blocked.",
        prd.passed_count(),
        prd.user_stories.len(),
        prd.blocked_count()
    );

    match prd.status() {
        BacklogStatus::InProgress => {
            if let Some(next) = prd.next_story() {
                let plan = git::plan_for(next, &prd, &git::default_branch(context.root()));
                println!(
                    "Next up: {} - {} (branch {}{} from {})",
                    next.id, next.title, config.git.branch_prefix, plan.branch, plan.base
                );
            }
        }
        BacklogStatus::Complete => println!("Every non-blocked story passes."),
        BacklogStatus::Stalled => {
            println!("Stalled: remaining stories are blocked or waiting on dependencies.")
        }
    }

    let journal = ProgressJournal::new(context);
    if journal.exists() {
        let recent = journal.tail(5)?;
        if !recent.is_empty() {
            println!();
            println!("Recent progress:");
            for entry in recent {
                println!(
                    "  [{}] iteration {}: {}",
                    entry.entry_type, entry.iteration, entry.content
                );
            }
        }
    }

    Ok(0)
}

/// One backlog line: `[x]` passing, `[!]` blocked, `[ ]` open, then id,
/// priority, title, and the branch/PR once the worker has recorded them.
fn format_story_row(story: &Story) -> String {
    let marker = if story.passes {
        "x"
    } else if story.blocked {
        "!"
    } else {
        " "
    };
    let mut row = format!(
        "  [{}] {}  p{}  {}",
        marker, story.id, story.priority, story.title
    );
    if let Some(branch) = &story.branch {
        row.push_str(&format!("  ({})", branch));
    }
    if let Some(pr) = story.pull_request {
        row.push_str(&format!("  PR #{}", pr));
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_story_row() {
        let story = Story::new("US-001", 1, "Add login", "desc", 2);

        assert_eq!(format_story_row(&story), "  [ ] US-001  p2  Add login");
    }

    #[test]
    fn test_passing_story_row_shows_branch_and_pr() {
        let mut story = Story::new("US-002", 2, "Add logout", "desc", 3);
        story.passes = true;
        story.branch = Some("US-002-add-logout".to_string());
        story.pull_request = Some(17);

        let row = format_story_row(&story);
        assert!(row.starts_with("  [x] US-002"));
        assert!(row.contains("(US-002-add-logout)"));
        assert!(row.contains("PR #17"));
    }

    #[test]
    fn test_blocked_story_row() {
        let mut story = Story::new("US-003", 3, "Flaky deploy", "desc", 1);
        story.blocked = true;

        assert!(format_story_row(&story).starts_with("  [!] US-003"));
    }
}
