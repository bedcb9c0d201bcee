//! Git workflow helpers using git2-rs
//!
//! Branch and PR naming is pure derivation over backlog data; the actual
//! branch creation happens in the external worker, steered by the
//! instructions the prompt template renders from a [`BranchPlan`]. The only
//! repository access here is read-only probing: the default branch and the
//! origin remote's owner/repo slug.

use crate::prd::{Prd, Story};
use git2::{BranchType, Repository};
use regex::Regex;
use std::path::Path;

/// Branch assumed when no repository or no recognizable default exists
pub const FALLBACK_DEFAULT_BRANCH: &str = "main";

/// Maximum length of the slug portion of a branch name
const SLUG_MAX_LEN: usize = 30;

/// Owner/repo pair parsed from the origin remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Branch names derived for one story
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPlan {
    /// Branch the story's work happens on
    pub branch: String,
    /// Branch that work starts from
    pub base: String,
    /// Branch its pull request targets (same as `base`, so stacked
    /// stories target their dependency's branch rather than the default)
    pub pr_target: String,
}

/// Kebab-case a title for use in a branch name.
///
/// Lowercases, collapses every run of non-alphanumeric characters to a
/// single hyphen, strips leading/trailing hyphens, then truncates with no
/// word-boundary awareness.
pub fn kebab_slug(text: &str, max_len: usize) -> String {
    let collapse = Regex::new(r"[^a-z0-9]+").unwrap();
    let lowered = text.to_lowercase();
    let slug = collapse.replace_all(&lowered, "-");
    slug.trim_matches('-').chars().take(max_len).collect()
}

/// Derive the branch name for a story: `{id}-{slug(title)}`.
pub fn branch_name_for(story: &Story) -> String {
    let slug = kebab_slug(&story.title, SLUG_MAX_LEN);
    if slug.is_empty() {
        story.id.clone()
    } else {
        format!("{}-{}", story.id, slug)
    }
}

/// Derive the full branch plan for a story.
///
/// Base branch is the default branch when the story has no dependencies;
/// otherwise the branch recorded on its first dependency, falling back to
/// the default branch when that dependency has no branch yet (or does not
/// resolve). The PR targets the base.
pub fn plan_for(story: &Story, prd: &Prd, default_branch: &str) -> BranchPlan {
    let base = story
        .depends_on
        .first()
        .and_then(|dep_id| prd.find_story(dep_id))
        .and_then(|dep| dep.branch.clone())
        .unwrap_or_else(|| default_branch.to_string());

    BranchPlan {
        branch: branch_name_for(story),
        pr_target: base.clone(),
        base,
    }
}

/// Detect the repository's default branch.
///
/// Prefers the origin remote's HEAD, then a local `main` or `master`
/// branch, then falls back to `main`. Never fails - a missing repository
/// just means the fallback.
pub fn default_branch(repo_path: &Path) -> String {
    match Repository::open(repo_path) {
        Ok(repo) => detect_default_branch(&repo),
        Err(e) => {
            log::debug!("[Git] No repository at {}: {}", repo_path.display(), e);
            FALLBACK_DEFAULT_BRANCH.to_string()
        }
    }
}

fn detect_default_branch(repo: &Repository) -> String {
    // The remote HEAD names the default branch when a remote exists
    if let Ok(reference) = repo.find_reference("refs/remotes/origin/HEAD") {
        if let Some(target) = reference.symbolic_target() {
            if let Some(name) = target.strip_prefix("refs/remotes/origin/") {
                return name.to_string();
            }
        }
    }

    for candidate in ["main", "master"] {
        if repo.find_branch(candidate, BranchType::Local).is_ok() {
            return candidate.to_string();
        }
    }

    FALLBACK_DEFAULT_BRANCH.to_string()
}

/// Parse the origin remote into an owner/repo slug, if the repository has
/// one and it points at github.com.
pub fn origin_slug(repo_path: &Path) -> Option<RepoSlug> {
    let repo = Repository::open(repo_path).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    let url = remote.url()?;
    parse_remote_url(url)
}

/// Parse a github.com remote URL (SSH or HTTPS) into owner and repo.
fn parse_remote_url(url: &str) -> Option<RepoSlug> {
    let re = Regex::new(r"github\.com[:/]([^/]+)/([^/]+?)(?:\.git)?/?$").unwrap();
    let cap = re.captures(url)?;
    Some(RepoSlug {
        owner: cap[1].to_string(),
        repo: cap[2].to_string(),
    })
}
