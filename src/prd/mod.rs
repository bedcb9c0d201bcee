//! Backlog (PRD) types and the story selection policy
//!
//! These types define the file-based state the external worker and the CLI
//! share across iterations:
//! - .ralph/prd.json: User story list with pass/blocked status
//! - .ralph/progress.txt: Journal accumulated across iterations
//! - .ralph/prompt.md: Prompt template for agent iterations

pub mod dependency;
pub mod markdown;
pub mod storage;

pub use storage::PrdStore;

use serde::{Deserialize, Serialize};

fn default_priority() -> u32 {
    100
}

fn default_notes() -> String {
    String::new()
}

/// A user story in the backlog
///
/// This represents a single unit of work that the agent should complete.
/// The `passes` field is updated by the agent when the story is implemented
/// and verified; `blocked` is set when work could not proceed (for example an
/// unresolved merge conflict) and a human needs to intervene.
///
/// Optional fields stay present as explicit `null` in the JSON document so
/// external workers can patch them in place without changing the shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Display identifier, `{ticketPrefix}-{ticketId zero-padded to 3}`
    pub id: String,

    /// Integer sequence number, unique within the backlog
    pub ticket_id: u32,

    /// Short title describing the story
    pub title: String,

    /// Detailed description of what needs to be done
    pub description: String,

    /// Acceptance criteria that must be met
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,

    /// Priority level (lower = higher priority)
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Whether this story passes all acceptance criteria
    #[serde(default)]
    pub passes: bool,

    /// Whether this story is blocked and must be skipped until unblocked
    #[serde(default)]
    pub blocked: bool,

    /// Free-form scratch notes, mutable by the worker
    #[serde(default = "default_notes")]
    pub notes: String,

    /// Linked external issue number, if imported from one
    #[serde(default)]
    pub github_issue: Option<u32>,

    /// Story ids that must pass before this one is eligible
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Working branch, set once work begins
    #[serde(default)]
    pub branch: Option<String>,

    /// Pull request number, set once one exists
    #[serde(default)]
    pub pull_request: Option<u32>,
}

impl Story {
    /// Create a new story with required fields; everything else defaulted.
    pub fn new(
        id: impl Into<String>,
        ticket_id: u32,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: u32,
    ) -> Self {
        Self {
            id: id.into(),
            ticket_id,
            title: title.into(),
            description: description.into(),
            acceptance_criteria: Vec::new(),
            priority,
            passes: false,
            blocked: false,
            notes: String::new(),
            github_issue: None,
            depends_on: Vec::new(),
            branch: None,
            pull_request: None,
        }
    }

    /// Check if all dependencies are satisfied (all pass).
    ///
    /// A dependency id that resolves to no story counts as unmet.
    pub fn dependencies_satisfied(&self, stories: &[Story]) -> bool {
        self.depends_on.iter().all(|dep_id| {
            stories
                .iter()
                .find(|s| &s.id == dep_id)
                .map(|s| s.passes)
                .unwrap_or(false)
        })
    }
}

/// Build a story display id from prefix and ticket number, e.g. `US-001`.
pub fn make_story_id(ticket_prefix: &str, ticket_id: u32) -> String {
    format!("{}-{:03}", ticket_prefix, ticket_id)
}

/// Terminal condition of a backlog once no story is selectable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklogStatus {
    /// A story is eligible for selection right now
    InProgress,
    /// Every non-blocked story passes
    Complete,
    /// Incomplete stories remain but none are eligible (blocked or waiting
    /// on unmet dependencies)
    Stalled,
}

/// The backlog document persisted to .ralph/prd.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prd {
    /// Project name
    pub project: String,

    /// Suggested feature branch for the overall effort
    #[serde(default)]
    pub branch_name: String,

    /// Project description
    #[serde(default)]
    pub description: String,

    /// Stories in import/creation order (not priority order)
    #[serde(default)]
    pub user_stories: Vec<Story>,
}

impl Prd {
    /// Create an empty backlog for a project.
    pub fn new(project: impl Into<String>, branch_name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            branch_name: branch_name.into(),
            description: String::new(),
            user_stories: Vec::new(),
        }
    }

    /// Get the next story the worker should pick up.
    ///
    /// Eligible stories are not blocked, not passing, and have every
    /// dependency passing. Among those the lowest priority value wins;
    /// ties go to the earliest story in backlog order.
    pub fn next_story(&self) -> Option<&Story> {
        self.user_stories
            .iter()
            .filter(|s| !s.blocked && !s.passes && s.dependencies_satisfied(&self.user_stories))
            .min_by_key(|s| s.priority)
    }

    /// Classify the backlog for callers that need to tell "done" apart
    /// from "stuck" when nothing is selectable.
    pub fn status(&self) -> BacklogStatus {
        if self.next_story().is_some() {
            return BacklogStatus::InProgress;
        }
        let all_non_blocked_pass = self
            .user_stories
            .iter()
            .filter(|s| !s.blocked)
            .all(|s| s.passes);
        if all_non_blocked_pass {
            BacklogStatus::Complete
        } else {
            BacklogStatus::Stalled
        }
    }

    /// Count of stories with `passes = true`.
    pub fn passed_count(&self) -> usize {
        self.user_stories.iter().filter(|s| s.passes).count()
    }

    /// Count of stories with `blocked = true`.
    pub fn blocked_count(&self) -> usize {
        self.user_stories.iter().filter(|s| s.blocked).count()
    }

    /// Highest ticketId currently in the backlog, or 0 when empty.
    pub fn max_ticket_id(&self) -> u32 {
        self.user_stories
            .iter()
            .map(|s| s.ticket_id)
            .max()
            .unwrap_or(0)
    }

    /// Find a story by display id.
    pub fn find_story(&self, id: &str) -> Option<&Story> {
        self.user_stories.iter().find(|s| s.id == id)
    }

    /// Check id and ticketId uniqueness.
    ///
    /// This is the invariant enforced on every load and save: a backlog
    /// with duplicate ids makes selection ill-defined. Dangling dependency
    /// references are deliberately NOT rejected here - selection treats
    /// them as unmet, which is a legal (stalled) state, not corruption.
    pub fn validate_unique(&self) -> Result<(), String> {
        let mut seen_ids = std::collections::HashSet::new();
        let mut seen_tickets = std::collections::HashSet::new();
        for story in &self.user_stories {
            if !seen_ids.insert(story.id.as_str()) {
                return Err(format!("Duplicate story id: {}", story.id));
            }
            if !seen_tickets.insert(story.ticket_id) {
                return Err(format!(
                    "Duplicate ticketId {} (story {})",
                    story.ticket_id, story.id
                ));
            }
        }
        Ok(())
    }

    /// Full validation: uniqueness plus a well-formed dependency graph
    /// (no dangling references, no self-dependencies, no cycles).
    ///
    /// Applied when this tool itself creates or appends stories; loaded
    /// backlogs only go through [`Prd::validate_unique`] so that files the
    /// worker has edited out-of-band still load.
    pub fn validate(&self) -> Result<(), String> {
        self.validate_unique()?;

        dependency::DependencyGraph::from_stories(&self.user_stories)
            .validate()
            .map_err(|e| e.to_string())
    }

    /// Append a story, enforcing uniqueness and graph validity.
    ///
    /// On error the backlog is left unchanged.
    pub fn append_story(&mut self, story: Story) -> Result<(), String> {
        self.user_stories.push(story);
        if let Err(e) = self.validate() {
            self.user_stories.pop();
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_story(id: &str, ticket_id: u32, priority: u32) -> Story {
        Story::new(id, ticket_id, format!("Story {}", id), "desc", priority)
    }

    #[test]
    fn test_make_story_id_pads_to_three_digits() {
        assert_eq!(make_story_id("US", 1), "US-001");
        assert_eq!(make_story_id("PROJ", 42), "PROJ-042");
        assert_eq!(make_story_id("AB", 1234), "AB-1234");
    }

    #[test]
    fn test_next_story_picks_lowest_priority() {
        let mut prd = Prd::new("test", "main");
        prd.user_stories.push(make_story("US-001", 1, 2));
        prd.user_stories.push(make_story("US-002", 2, 1));

        assert_eq!(prd.next_story().unwrap().id, "US-002");
    }

    #[test]
    fn test_next_story_breaks_ties_by_backlog_order() {
        let mut prd = Prd::new("test", "main");
        prd.user_stories.push(make_story("US-001", 1, 1));
        prd.user_stories.push(make_story("US-002", 2, 1));

        assert_eq!(prd.next_story().unwrap().id, "US-001");
    }

    #[test]
    fn test_next_story_skips_passing_and_blocked() {
        let mut prd = Prd::new("test", "main");
        let mut passing = make_story("US-001", 1, 1);
        passing.passes = true;
        let mut blocked = make_story("US-002", 2, 1);
        blocked.blocked = true;
        prd.user_stories.push(passing);
        prd.user_stories.push(blocked);
        prd.user_stories.push(make_story("US-003", 3, 5));

        assert_eq!(prd.next_story().unwrap().id, "US-003");
    }

    #[test]
    fn test_next_story_respects_dependencies() {
        let mut prd = Prd::new("test", "main");
        prd.user_stories.push(make_story("A", 1, 1));
        let mut b = make_story("B", 2, 2);
        b.depends_on = vec!["A".to_string()];
        prd.user_stories.push(b);

        assert_eq!(prd.next_story().unwrap().id, "A");

        prd.user_stories[0].passes = true;
        assert_eq!(prd.next_story().unwrap().id, "B");
    }

    #[test]
    fn test_dangling_dependency_is_unmet() {
        let mut prd = Prd::new("test", "main");
        let mut story = make_story("US-001", 1, 1);
        story.depends_on = vec!["US-999".to_string()];
        prd.user_stories.push(story);

        assert!(prd.next_story().is_none());
        assert_eq!(prd.status(), BacklogStatus::Stalled);
    }

    #[test]
    fn test_status_complete_ignores_blocked() {
        let mut prd = Prd::new("test", "main");
        let mut done = make_story("US-001", 1, 1);
        done.passes = true;
        let mut blocked = make_story("US-002", 2, 2);
        blocked.blocked = true;
        prd.user_stories.push(done);
        prd.user_stories.push(blocked);

        assert!(prd.next_story().is_none());
        assert_eq!(prd.status(), BacklogStatus::Complete);
    }

    #[test]
    fn test_status_stalled_when_dependency_blocked() {
        let mut prd = Prd::new("test", "main");
        let mut blocked = make_story("A", 1, 1);
        blocked.blocked = true;
        let mut waiting = make_story("B", 2, 2);
        waiting.depends_on = vec!["A".to_string()];
        prd.user_stories.push(blocked);
        prd.user_stories.push(waiting);

        assert!(prd.next_story().is_none());
        assert_eq!(prd.status(), BacklogStatus::Stalled);
    }

    #[test]
    fn test_status_in_progress() {
        let mut prd = Prd::new("test", "main");
        prd.user_stories.push(make_story("US-001", 1, 1));
        assert_eq!(prd.status(), BacklogStatus::InProgress);
    }

    #[test]
    fn test_empty_backlog_is_complete() {
        let prd = Prd::new("test", "main");
        assert!(prd.next_story().is_none());
        assert_eq!(prd.status(), BacklogStatus::Complete);
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut prd = Prd::new("test", "main");
        prd.user_stories.push(make_story("US-001", 1, 1));
        prd.user_stories.push(make_story("US-001", 2, 2));

        let err = prd.validate().unwrap_err();
        assert!(err.contains("Duplicate story id"));
    }

    #[test]
    fn test_validate_rejects_duplicate_ticket_ids() {
        let mut prd = Prd::new("test", "main");
        prd.user_stories.push(make_story("US-001", 1, 1));
        prd.user_stories.push(make_story("US-002", 1, 2));

        let err = prd.validate().unwrap_err();
        assert!(err.contains("Duplicate ticketId"));
    }

    #[test]
    fn test_append_story_rolls_back_on_dangling_reference() {
        let mut prd = Prd::new("test", "main");
        let mut a = make_story("A", 1, 1);
        a.depends_on = vec!["B".to_string()];

        assert!(prd.append_story(a).is_err());
        assert!(prd.user_stories.is_empty());
    }

    #[test]
    fn test_validate_rejects_cycles() {
        let mut prd = Prd::new("test", "main");
        let mut a = make_story("A", 1, 1);
        a.depends_on = vec!["B".to_string()];
        let mut b = make_story("B", 2, 2);
        b.depends_on = vec!["A".to_string()];
        prd.user_stories.push(a);
        prd.user_stories.push(b);

        let err = prd.validate().unwrap_err();
        assert!(err.to_lowercase().contains("cycle"));
    }

    #[test]
    fn test_max_ticket_id() {
        let mut prd = Prd::new("test", "main");
        assert_eq!(prd.max_ticket_id(), 0);
        prd.user_stories.push(make_story("US-001", 1, 1));
        prd.user_stories.push(make_story("US-007", 7, 2));
        assert_eq!(prd.max_ticket_id(), 7);
    }

    #[test]
    fn test_story_serializes_optional_fields_as_null() {
        let story = make_story("US-001", 1, 1);
        let json = serde_json::to_string(&story).unwrap();
        assert!(json.contains("\"githubIssue\":null"));
        assert!(json.contains("\"branch\":null"));
        assert!(json.contains("\"pullRequest\":null"));
        assert!(json.contains("\"ticketId\":1"));
        assert!(json.contains("\"acceptanceCriteria\":[]"));
        assert!(json.contains("\"dependsOn\":[]"));
    }

    #[test]
    fn test_story_deserializes_with_defaults() {
        let json = r#"{
            "id": "US-001",
            "ticketId": 1,
            "title": "T",
            "description": "D"
        }"#;
        let story: Story = serde_json::from_str(json).unwrap();
        assert!(!story.passes);
        assert!(!story.blocked);
        assert_eq!(story.priority, 100);
        assert_eq!(story.notes, "");
        assert!(story.depends_on.is_empty());
        assert!(story.branch.is_none());
    }
}
