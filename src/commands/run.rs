//! `ralph run [N]` - drive the iteration loop.
//!
//! Order matters here: terminal backlog states are reported before the
//! lock is taken so `run` on a finished project is a cheap no-op, and the
//! agent binary is probed before anything is written.

use log::info;
use which::which;

use crate::config::ConfigManager;
use crate::context::ProjectContext;
use crate::lock::RunLock;
use crate::prd::{BacklogStatus, Prd, PrdStore};
use crate::ralph_loop::{AgentWorker, LoopOutcome, ProgressJournal, PromptBuilder, RalphLoop};
use crate::shutdown;

pub async fn execute(context: &ProjectContext, iterations: Option<u32>) -> Result<i32, String> {
    if !context.is_initialized() {
        return Err(format!(
            "No {} found - run `ralph init` first.",
            context.config_path().display()
        ));
    }

    let config = ConfigManager::new(context).read()?;
    config.validate()?;
    let prd = PrdStore::new(context).load()?;

    match prd.status() {
        BacklogStatus::Complete => {
            println!(
                "All stories pass ({}/{}). Nothing to do.",
                prd.passed_count(),
                prd.user_stories.len()
            );
            return Ok(0);
        }
        BacklogStatus::Stalled => {
            println!("The backlog is stalled: no story is eligible.");
            print_stall_reasons(&prd);
            return Ok(1);
        }
        BacklogStatus::InProgress => {}
    }

    let binary = config.agent.binary_name();
    if which(binary).is_err() {
        return Err(format!(
            "Agent CLI '{}' not found on PATH. Install it or re-run `ralph init` to pick another agent.",
            binary
        ));
    }

    let max_iterations = iterations.unwrap_or(config.max_iterations);

    let mut lock = RunLock::acquire(context).map_err(|e| e.to_string())?;
    shutdown::install_signal_cleanup(context).map_err(|e| e.to_string())?;
    ProgressJournal::new(context).initialize()?;

    info!(
        "[Run] Starting loop: agent={}, max_iterations={}",
        config.agent, max_iterations
    );
    println!(
        "Running {} with {} (max {} iterations)...",
        prd.project, config.agent, max_iterations
    );

    let worker = AgentWorker::new(config.agent, context.root());
    let prompt_builder = PromptBuilder::new(context, &prd.project, &config);
    let mut ralph_loop = RalphLoop::new(context, worker, prompt_builder, max_iterations);
    let outcome = ralph_loop.run().await?;

    lock.release();
    report_outcome(context, outcome)
}

fn print_stall_reasons(prd: &Prd) {
    for story in prd.user_stories.iter().filter(|s| !s.passes) {
        if story.blocked {
            let note = if story.notes.is_empty() {
                String::new()
            } else {
                format!(" - {}", story.notes)
            };
            println!("  {} is blocked{}", story.id, note);
        } else if !story.dependencies_satisfied(&prd.user_stories) {
            let unmet: Vec<&str> = story
                .depends_on
                .iter()
                .filter(|dep| prd.find_story(dep).map(|d| !d.passes).unwrap_or(true))
                .map(|dep| dep.as_str())
                .collect();
            println!("  {} waits on {}", story.id, unmet.join(", "));
        }
    }
    println!("Unblock a story or fix its dependencies, then run again.");
}

fn report_outcome(context: &ProjectContext, outcome: LoopOutcome) -> Result<i32, String> {
    let prd = PrdStore::new(context).load()?;
    let total = prd.user_stories.len();
    match outcome {
        LoopOutcome::Completed { iterations } => {
            println!();
            println!(
                "Complete: {}/{} stories pass after {} iteration{}.",
                prd.passed_count(),
                total,
                iterations,
                plural(iterations)
            );
            Ok(0)
        }
        LoopOutcome::Exhausted { iterations } => {
            println!();
            println!(
                "Stopped after {} iteration{} without completion: {}/{} stories pass, {} blocked.",
                iterations,
                plural(iterations),
                prd.passed_count(),
                total,
                prd.blocked_count()
            );
            println!("Run `ralph status` for details, or `ralph run` to continue.");
            Ok(1)
        }
    }
}

fn plural(n: u32) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prd::Story;

    #[test]
    fn test_plural_suffix() {
        assert_eq!(plural(1), "");
        assert_eq!(plural(2), "s");
    }

    #[test]
    fn test_stalled_backlog_is_detected_before_running() {
        let mut prd = Prd::new("demo", "main");
        let mut story = Story::new("US-001", 1, "Blocked story", "desc", 1);
        story.blocked = true;
        prd.user_stories.push(story);

        assert_eq!(prd.status(), BacklogStatus::Stalled);
    }
}
