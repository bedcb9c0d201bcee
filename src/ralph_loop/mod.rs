//! The ralph loop - external orchestration of a coding agent.
//!
//! The loop runs OUTSIDE the agent:
//! - each iteration spawns a FRESH agent instance (clean context),
//! - progress persists in FILES (`.ralph/prd.json`, `.ralph/progress.txt`)
//!   and in git history,
//! - the loop repeats until the agent prints the completion promise or
//!   iterations run out.

pub mod completion;
pub mod progress;
pub mod prompt;
pub mod worker;

pub use completion::{COMPLETION_PROMISE, CompletionDetector};
pub use progress::{ProgressEntry, ProgressEntryType, ProgressJournal};
pub use prompt::PromptBuilder;
pub use worker::{AGENT_TIMEOUT_SECS, AgentWorker, Worker, WorkerOutput};

use crate::context::ProjectContext;
use crate::prd::PrdStore;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Pause between iterations, long enough for a Ctrl-C to land cleanly.
pub const ITERATION_PAUSE_SECS: u64 = 3;

/// Observable state of the loop state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LoopState {
    /// Loop is on iteration N (1-indexed).
    Running { iteration: u32 },
    /// The completion promise was detected.
    Completed,
    /// maxIterations elapsed without the promise appearing.
    Exhausted,
}

/// Terminal result of a run, with the number of iterations spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    Completed { iterations: u32 },
    Exhausted { iterations: u32 },
}

/// Drives the iteration loop against a [`Worker`].
///
/// Worker failures (spawn errors, timeouts) never abort the loop: a failed
/// iteration is journaled and counts against `max_iterations` like any
/// other iteration without the promise. Journal writes are best-effort -
/// a failed append is logged and the loop keeps going.
pub struct RalphLoop<W: Worker> {
    worker: W,
    prompt_builder: PromptBuilder,
    journal: ProgressJournal,
    store: PrdStore,
    detector: CompletionDetector,
    max_iterations: u32,
    pause: Duration,
    state: LoopState,
}

impl<W: Worker> RalphLoop<W> {
    pub fn new(
        context: &ProjectContext,
        worker: W,
        prompt_builder: PromptBuilder,
        max_iterations: u32,
    ) -> Self {
        Self {
            worker,
            prompt_builder,
            journal: ProgressJournal::new(context),
            store: PrdStore::new(context),
            detector: CompletionDetector::default(),
            max_iterations,
            pause: Duration::from_secs(ITERATION_PAUSE_SECS),
            state: LoopState::Running { iteration: 1 },
        }
    }

    /// Override the inter-iteration pause (tests use zero).
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Run iterations until the promise appears or `max_iterations` elapse.
    pub async fn run(&mut self) -> Result<LoopOutcome, String> {
        let mut passing = self.passing_ids();

        for iteration in 1..=self.max_iterations {
            self.state = LoopState::Running { iteration };
            info!(
                "[RalphLoop] ======== Iteration {} of {} ========",
                iteration, self.max_iterations
            );
            if let Err(e) = self.journal.start_iteration(iteration) {
                warn!("[RalphLoop] Could not journal iteration start: {}", e);
            }

            let prompt = self.prompt_builder.build_iteration_prompt(iteration)?;
            let completed = match self.worker.run_iteration(&prompt).await {
                Ok(result) => {
                    if let Some(code) = result.exit_code.filter(|c| *c != 0) {
                        info!(
                            "[RalphLoop] Worker exited with code {} on iteration {}",
                            code, iteration
                        );
                    }
                    self.detector.check(&result.output)
                }
                Err(e) => {
                    warn!("[RalphLoop] Iteration {} failed: {}", iteration, e);
                    if let Err(journal_err) = self.journal.add_error(iteration, &e) {
                        warn!("[RalphLoop] Could not journal the error: {}", journal_err);
                    }
                    false
                }
            };

            self.record_newly_passing(iteration, &mut passing);
            if let Err(e) = self.journal.end_iteration(iteration, completed) {
                warn!("[RalphLoop] Could not journal iteration end: {}", e);
            }

            if completed {
                info!(
                    "[RalphLoop] EXIT REASON: completion promise detected on iteration {}",
                    iteration
                );
                self.state = LoopState::Completed;
                return Ok(LoopOutcome::Completed {
                    iterations: iteration,
                });
            }

            if iteration < self.max_iterations {
                tokio::time::sleep(self.pause).await;
            }
        }

        warn!(
            "[RalphLoop] EXIT REASON: max iterations ({}) reached without completion",
            self.max_iterations
        );
        self.state = LoopState::Exhausted;
        Ok(LoopOutcome::Exhausted {
            iterations: self.max_iterations,
        })
    }

    /// Ids of stories currently passing; empty when the backlog is unreadable.
    fn passing_ids(&self) -> HashSet<String> {
        match self.store.load() {
            Ok(prd) => prd
                .user_stories
                .iter()
                .filter(|s| s.passes)
                .map(|s| s.id.clone())
                .collect(),
            Err(_) => HashSet::new(),
        }
    }

    /// Reload the backlog and journal stories the worker flipped to passing.
    ///
    /// The worker edits `.ralph/prd.json` directly, so a reload failure here
    /// means it left the file unreadable - logged, not fatal.
    fn record_newly_passing(&self, iteration: u32, passing: &mut HashSet<String>) {
        let prd = match self.store.load() {
            Ok(prd) => prd,
            Err(e) => {
                warn!(
                    "[RalphLoop] Could not reload backlog after iteration {}: {}",
                    iteration, e
                );
                return;
            }
        };
        for story in &prd.user_stories {
            if story.passes && passing.insert(story.id.clone()) {
                info!("[RalphLoop] Story {} marked passing", story.id);
                if let Err(e) = self
                    .journal
                    .add_story_completed(iteration, &story.id, &story.title)
                {
                    warn!("[RalphLoop] Could not journal story completion: {}", e);
                }
            }
        }
    }
}
