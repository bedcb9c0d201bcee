//! Worker abstraction over the external agent process
//!
//! The iteration driver is generic over [`Worker`] so its control flow can
//! be exercised with scripted outputs in tests. [`AgentWorker`] is the real
//! implementation: it shells out to the configured agent CLI, streams the
//! process output to the terminal, and hands the combined text back for
//! completion detection.

use crate::models::AgentType;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{Duration, timeout};

/// Default timeout for a single agent invocation (25 minutes)
pub const AGENT_TIMEOUT_SECS: u64 = 1500;

/// One iteration's worth of agent output
#[derive(Debug, Clone, Default)]
pub struct WorkerOutput {
    /// Combined stdout and stderr text
    pub output: String,
    /// Exit code, when the process reported one
    pub exit_code: Option<i32>,
}

/// Transport the iteration driver drives.
///
/// A failed invocation is an `Err`; the driver logs it and moves on to the
/// next iteration rather than aborting the loop.
pub trait Worker {
    /// Run one iteration with the given prompt.
    async fn run_iteration(&mut self, prompt: &str) -> Result<WorkerOutput, String>;
}

/// Build command line arguments for the specified agent type
pub fn build_agent_command(agent_type: AgentType, prompt: &str) -> (&'static str, Vec<String>) {
    match agent_type {
        AgentType::Claude => (
            "claude",
            vec![
                "-p".to_string(),
                "--dangerously-skip-permissions".to_string(),
                prompt.to_string(),
            ],
        ),
        AgentType::Opencode => ("opencode", vec!["run".to_string(), prompt.to_string()]),
        AgentType::Cursor => (
            "cursor-agent",
            vec!["--prompt".to_string(), prompt.to_string()],
        ),
        AgentType::Codex => ("codex", vec!["--prompt".to_string(), prompt.to_string()]),
        AgentType::Qwen => ("qwen", vec!["--prompt".to_string(), prompt.to_string()]),
        AgentType::Droid => (
            "droid",
            vec![
                "chat".to_string(),
                "--prompt".to_string(),
                prompt.to_string(),
            ],
        ),
    }
}

/// Run a command to completion, streaming its output to the terminal.
///
/// Stdout and stderr are read concurrently, echoed as they arrive, and
/// returned combined (stdout first). A non-zero exit is NOT an error here:
/// the caller still gets the output, because a crashed agent may have
/// produced the completion marker before dying. Spawn failures, read
/// failures, timeouts, and interrupt signals are errors.
pub async fn run_command(
    program: &str,
    args: &[String],
    working_dir: &Path,
    timeout_secs: u64,
) -> Result<WorkerOutput, String> {
    let mut child = Command::new(program)
        .args(args)
        .current_dir(working_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn {}: {}", program, e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "Failed to capture stdout".to_string())?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| "Failed to capture stderr".to_string())?;

    // Stream both pipes with an overall timeout
    let stream_result = timeout(Duration::from_secs(timeout_secs), async {
        let stdout_task = async {
            let mut reader = BufReader::new(stdout).lines();
            let mut text = String::new();
            while let Some(line) = reader
                .next_line()
                .await
                .map_err(|e| format!("Read error: {}", e))?
            {
                println!("{}", line);
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&line);
            }
            Ok::<String, String>(text)
        };

        let stderr_task = async {
            let mut reader = BufReader::new(stderr).lines();
            let mut text = String::new();
            while let Some(line) = reader
                .next_line()
                .await
                .map_err(|e| format!("Read error: {}", e))?
            {
                eprintln!("{}", line);
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&line);
            }
            Ok::<String, String>(text)
        };

        tokio::try_join!(stdout_task, stderr_task)
    })
    .await;

    let (stdout_text, stderr_text) = match stream_result {
        Err(_) => {
            let _ = child.kill().await;
            return Err(format!(
                "Agent timed out after {} seconds. The process may have hung or be unresponsive.",
                timeout_secs
            ));
        }
        Ok(Err(e)) => {
            let _ = child.kill().await;
            return Err(e);
        }
        Ok(Ok(texts)) => texts,
    };

    let status = child
        .wait()
        .await
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    // Check for common interrupt signals
    if let Some(code) = status.code() {
        if code == 130 || code == 137 || code == 143 {
            return Err("Agent process was interrupted (SIGINT/SIGTERM)".to_string());
        }
    }

    if !status.success() {
        log::warn!(
            "[AgentWorker] {} exited with code {:?}",
            program,
            status.code()
        );
    }

    let mut output = stdout_text;
    if !stderr_text.is_empty() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&stderr_text);
    }

    Ok(WorkerOutput {
        output: output.trim().to_string(),
        exit_code: status.code(),
    })
}

/// Worker that invokes the configured agent CLI as a subprocess
pub struct AgentWorker {
    agent: AgentType,
    working_dir: PathBuf,
    timeout_secs: u64,
}

impl AgentWorker {
    /// Create a worker for an agent CLI, run from the project root
    pub fn new(agent: AgentType, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            agent,
            working_dir: working_dir.into(),
            timeout_secs: AGENT_TIMEOUT_SECS,
        }
    }

    /// Override the per-invocation timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Worker for AgentWorker {
    async fn run_iteration(&mut self, prompt: &str) -> Result<WorkerOutput, String> {
        let (program, args) = build_agent_command(self.agent, prompt);
        log::debug!("[AgentWorker] Invoking {} in {}", program, self.working_dir.display());
        run_command(program, &args, &self.working_dir, self.timeout_secs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_agent_command_claude() {
        let (program, args) = build_agent_command(AgentType::Claude, "test prompt");
        assert_eq!(program, "claude");
        assert_eq!(args[0], "-p");
        assert_eq!(args[1], "--dangerously-skip-permissions");
        assert_eq!(args[2], "test prompt");
    }

    #[test]
    fn test_build_agent_command_opencode() {
        let (program, args) = build_agent_command(AgentType::Opencode, "test prompt");
        assert_eq!(program, "opencode");
        assert_eq!(args[0], "run");
        assert_eq!(args[1], "test prompt");
    }

    #[test]
    fn test_build_agent_command_cursor_binary_name() {
        let (program, _) = build_agent_command(AgentType::Cursor, "p");
        assert_eq!(program, "cursor-agent");
    }

    #[test]
    fn test_build_agent_command_droid() {
        let (program, args) = build_agent_command(AgentType::Droid, "test prompt");
        assert_eq!(program, "droid");
        assert_eq!(args[0], "chat");
        assert_eq!(args[1], "--prompt");
        assert_eq!(args[2], "test prompt");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_captures_output() {
        let dir = std::env::temp_dir();
        let result = run_command("echo", &["hello".to_string()], &dir, 30)
            .await
            .unwrap();

        assert_eq!(result.output, "hello");
        assert_eq!(result.exit_code, Some(0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_swallows_nonzero_exit() {
        let dir = std::env::temp_dir();
        let result = run_command("false", &[], &dir, 30).await.unwrap();

        assert_eq!(result.exit_code, Some(1));
        assert_eq!(result.output, "");
    }

    #[tokio::test]
    async fn test_run_command_spawn_failure_is_error() {
        let dir = std::env::temp_dir();
        let err = run_command("definitely-not-a-real-binary-xyz", &[], &dir, 30)
            .await
            .unwrap_err();

        assert!(err.contains("Failed to spawn"));
    }
}
