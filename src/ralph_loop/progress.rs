//! Progress journal - learnings and events across iterations
//!
//! The journal at .ralph/progress.txt accumulates what happened on each
//! iteration. Fresh agent instances read it to catch up on context, the
//! status command tails it, and compounding distills its learnings into
//! skill files.

use crate::context::ProjectContext;
use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Kind of journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEntryType {
    IterationStart,
    IterationEnd,
    Learning,
    Error,
    StoryCompleted,
    Note,
}

impl fmt::Display for ProgressEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ProgressEntryType::IterationStart => "START",
            ProgressEntryType::IterationEnd => "END",
            ProgressEntryType::Learning => "LEARNING",
            ProgressEntryType::Error => "ERROR",
            ProgressEntryType::StoryCompleted => "COMPLETED",
            ProgressEntryType::Note => "NOTE",
        };
        write!(f, "{}", tag)
    }
}

/// One journal line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    pub iteration: u32,
    pub timestamp: String,
    pub entry_type: ProgressEntryType,
    pub content: String,
}

/// Append-only journal over .ralph/progress.txt
pub struct ProgressJournal {
    progress_path: PathBuf,
}

impl ProgressJournal {
    /// Create a journal bound to a project's progress file
    pub fn new(context: &ProjectContext) -> Self {
        Self {
            progress_path: context.progress_path(),
        }
    }

    /// Get the journal file path
    pub fn path(&self) -> &Path {
        &self.progress_path
    }

    /// Check if the journal file exists
    pub fn exists(&self) -> bool {
        self.progress_path.exists()
    }

    /// Create the journal with its header, unless it already exists.
    pub fn initialize(&self) -> Result<(), String> {
        if let Some(parent) = self.progress_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }

        if self.progress_path.exists() {
            return Ok(());
        }

        let header = format!(
            "# Ralph progress journal\n\
             # Learnings accumulate here across agent iterations.\n\
             # Each fresh agent instance reads this file to catch up on context.\n\
             # Initialized: {}\n\n",
            chrono::Utc::now().to_rfc3339()
        );

        std::fs::write(&self.progress_path, header)
            .map_err(|e| format!("Failed to write progress journal: {}", e))
    }

    /// Append an entry
    pub fn append_entry(&self, entry: &ProgressEntry) -> Result<(), String> {
        if !self.progress_path.exists() {
            self.initialize()?;
        }

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.progress_path)
            .map_err(|e| format!("Failed to open progress journal: {}", e))?;

        let line = format!(
            "[{}] [Iter {}] [{}] {}\n",
            entry.timestamp, entry.iteration, entry.entry_type, entry.content
        );

        file.write_all(line.as_bytes())
            .map_err(|e| format!("Failed to write to progress journal: {}", e))
    }

    fn append_now(
        &self,
        iteration: u32,
        entry_type: ProgressEntryType,
        content: String,
    ) -> Result<(), String> {
        self.append_entry(&ProgressEntry {
            iteration,
            timestamp: chrono::Utc::now().to_rfc3339(),
            entry_type,
            content,
        })
    }

    /// Record the start of an iteration
    pub fn start_iteration(&self, iteration: u32) -> Result<(), String> {
        self.append_now(
            iteration,
            ProgressEntryType::IterationStart,
            format!("Starting iteration {}", iteration),
        )
    }

    /// Record the end of an iteration
    pub fn end_iteration(&self, iteration: u32, completed: bool) -> Result<(), String> {
        let status = if completed {
            "completion promise detected"
        } else {
            "no completion promise"
        };
        self.append_now(
            iteration,
            ProgressEntryType::IterationEnd,
            format!("Iteration {} finished: {}", iteration, status),
        )
    }

    /// Record a learning/insight
    pub fn add_learning(&self, iteration: u32, learning: &str) -> Result<(), String> {
        self.append_now(iteration, ProgressEntryType::Learning, learning.to_string())
    }

    /// Record an error
    pub fn add_error(&self, iteration: u32, error: &str) -> Result<(), String> {
        self.append_now(iteration, ProgressEntryType::Error, error.to_string())
    }

    /// Record a story newly marked passing
    pub fn add_story_completed(
        &self,
        iteration: u32,
        story_id: &str,
        story_title: &str,
    ) -> Result<(), String> {
        self.append_now(
            iteration,
            ProgressEntryType::StoryCompleted,
            format!("Story '{}' ({}) marked as passing", story_title, story_id),
        )
    }

    /// Add a manual note
    pub fn add_note(&self, iteration: u32, note: &str) -> Result<(), String> {
        self.append_now(iteration, ProgressEntryType::Note, note.to_string())
    }

    /// Read all structured entries, skipping comments and free-form lines
    /// the agent may have written.
    pub fn read_entries(&self) -> Result<Vec<ProgressEntry>, String> {
        if !self.progress_path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.progress_path)
            .map_err(|e| format!("Failed to open progress journal: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(|e| format!("Failed to read line: {}", e))?;

            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }

            if let Some(entry) = parse_entry_line(&line) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// The most recent `count` entries, oldest first.
    pub fn tail(&self, count: usize) -> Result<Vec<ProgressEntry>, String> {
        let entries = self.read_entries()?;
        let start = entries.len().saturating_sub(count);
        Ok(entries[start..].to_vec())
    }

    /// All learning entries, for compounding.
    pub fn learnings(&self) -> Result<Vec<ProgressEntry>, String> {
        let entries = self.read_entries()?;
        Ok(entries
            .into_iter()
            .filter(|e| e.entry_type == ProgressEntryType::Learning)
            .collect())
    }

    /// Read the raw file content
    pub fn read_raw(&self) -> Result<String, String> {
        if !self.progress_path.exists() {
            return Ok(String::new());
        }
        std::fs::read_to_string(&self.progress_path)
            .map_err(|e| format!("Failed to read progress journal: {}", e))
    }
}

/// Parse a `[timestamp] [Iter N] [TYPE] content` line
fn parse_entry_line(line: &str) -> Option<ProgressEntry> {
    let re = regex::Regex::new(r"^\[([^\]]+)\] \[Iter (\d+)\] \[([^\]]+)\] (.*)$").ok()?;

    let caps = re.captures(line)?;
    let timestamp = caps.get(1)?.as_str().to_string();
    let iteration: u32 = caps.get(2)?.as_str().parse().ok()?;
    let entry_type = match caps.get(3)?.as_str() {
        "START" => ProgressEntryType::IterationStart,
        "END" => ProgressEntryType::IterationEnd,
        "LEARNING" => ProgressEntryType::Learning,
        "ERROR" => ProgressEntryType::Error,
        "COMPLETED" => ProgressEntryType::StoryCompleted,
        "NOTE" => ProgressEntryType::Note,
        _ => return None,
    };
    let content = caps.get(4)?.as_str().to_string();

    Some(ProgressEntry {
        iteration,
        timestamp,
        entry_type,
        content,
    })
}
