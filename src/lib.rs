//! Ralph: a CLI that points an AI coding agent at a story backlog and
//! loops it until every story passes.
//!
//! The flow is deliberately simple. `init` scaffolds a `.ralph/` directory
//! with a config, a JSON backlog, and an iteration prompt. `run` invokes
//! the configured agent CLI over and over with that prompt; the agent
//! edits the backlog and journal directly, and the loop stops when the
//! agent prints the completion promise or the iteration budget runs out.

#![allow(async_fn_in_trait)]

pub mod commands;
pub mod config;
pub mod context;
pub mod git;
pub mod github;
pub mod lock;
pub mod models;
pub mod prd;
pub mod ralph_loop;
pub mod shutdown;
pub mod templates;

pub use context::ProjectContext;
pub use models::{AgentType, GitProvider, GitSettings, RalphConfig};
pub use prd::{BacklogStatus, Prd, PrdStore, Story};
