//! GitHub issue to backlog story conversion
//!
//! Imported stories are appended to the backlog, never inserted by
//! priority; ticket ids continue from the highest one already present.

use crate::github::Issue;
use crate::prd::{make_story_id, Prd, Story};
use std::collections::HashSet;

/// Map issue labels to a priority tier.
///
/// Exactly three tiers: a label named `priority:high` means 1, a label
/// named `priority:low` means 3, anything else (including no priority
/// label at all) means 2. Matching is exact, not substring-based.
pub fn priority_from_labels(labels: &[String]) -> u32 {
    if labels.iter().any(|l| l == "priority:high") {
        1
    } else if labels.iter().any(|l| l == "priority:low") {
        3
    } else {
        2
    }
}

/// Convert an issue into a story with the given ticket id.
///
/// The description falls back to the title when the issue body is empty.
pub fn issue_to_story(issue: &Issue, ticket_id: u32, ticket_prefix: &str) -> Story {
    let description = issue
        .body
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&issue.title);

    let mut story = Story::new(
        make_story_id(ticket_prefix, ticket_id),
        ticket_id,
        &issue.title,
        description,
        priority_from_labels(&issue.labels),
    );
    story.github_issue = Some(issue.number);
    story
}

/// Append an issue to the backlog as a new story.
///
/// Re-importing an issue already present is an error; the backlog is left
/// unmodified on any failure. Returns the new story's id.
pub fn import_issue(prd: &mut Prd, issue: &Issue, ticket_prefix: &str) -> Result<String, String> {
    if let Some(existing) = prd
        .user_stories
        .iter()
        .find(|s| s.github_issue == Some(issue.number))
    {
        return Err(format!(
            "Issue #{} is already imported as {}",
            issue.number, existing.id
        ));
    }

    let ticket_id = prd.max_ticket_id() + 1;
    let story = issue_to_story(issue, ticket_id, ticket_prefix);
    let id = story.id.clone();
    prd.append_story(story)?;

    log::info!("[GitHub] Imported issue #{} as {}", issue.number, id);
    Ok(id)
}

/// Mark stories whose linked issue has been closed as passing.
///
/// Returns the ids of the stories that changed.
pub fn sync_closed_issues(prd: &mut Prd, closed: &HashSet<u32>) -> Vec<String> {
    let mut updated = Vec::new();
    for story in &mut prd.user_stories {
        if let Some(number) = story.github_issue {
            if closed.contains(&number) && !story.passes {
                story.passes = true;
                updated.push(story.id.clone());
            }
        }
    }
    updated
}
