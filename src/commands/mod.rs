//! CLI subcommand handlers.
//!
//! Each module owns one subcommand and returns the process exit code on
//! success. User-facing output goes to stdout via `println!`; diagnostics
//! go through `log` and stay out of the user's way unless RUST_LOG asks
//! for them.

pub mod compound;
pub mod gh;
pub mod init;
pub mod run;
pub mod schedule;
pub mod status;

mod prompts;

pub use prompts::{confirm, prompt_line, read_multiline};
