// GitHub API integration for issue import and sync

pub mod import;

use crate::context::ProjectContext;
use crate::git::RepoSlug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// GitHub Issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u32,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub html_url: String,
    pub labels: Vec<String>,
}

/// Where the API token was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// GITHUB_TOKEN environment variable
    Environment,
    /// `gh auth token` from an authenticated gh CLI
    GhCli,
    /// ~/.ralph/secrets.toml
    SecretsFile,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Environment => write!(f, "GITHUB_TOKEN environment variable"),
            TokenSource::GhCli => write!(f, "gh CLI session"),
            TokenSource::SecretsFile => write!(f, "~/.ralph/secrets.toml"),
        }
    }
}

/// GitHub API client
pub struct GitHubClient {
    token: String,
    slug: RepoSlug,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(token: String, slug: RepoSlug) -> Self {
        Self { token, slug }
    }

    /// The repository this client talks to
    pub fn slug(&self) -> &RepoSlug {
        &self.slug
    }

    /// Get an issue by number
    pub async fn get_issue(&self, number: u32) -> Result<Issue, String> {
        let client = reqwest::Client::new();
        let url = format!(
            "https://api.github.com/repos/{}/{}/issues/{}",
            self.slug.owner, self.slug.repo, number
        );

        let response = client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "ralph")
            .send()
            .await
            .map_err(|e| format!("Failed to get issue: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(format!("GitHub API error ({}): {}", status, text));
        }

        let issue_data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))?;

        // The issues endpoint serves pull requests under the same numbers.
        if issue_data.get("pull_request").is_some() {
            return Err(format!(
                "#{} is a pull request, not an issue - only issues can be imported",
                number
            ));
        }

        Ok(issue_from_value(&issue_data))
    }

    /// List issues in the given state ("open", "closed", or "all").
    ///
    /// Walks the paginated endpoint until a short page comes back, so
    /// issues beyond the first hundred are still seen. Pull requests share
    /// the endpoint and are filtered out.
    pub async fn list_issues(&self, state: &str) -> Result<Vec<Issue>, String> {
        let client = reqwest::Client::new();
        let mut issues = Vec::new();
        let mut page: u32 = 1;

        loop {
            let url = issues_page_url(&self.slug, state, page);
            let response = client
                .get(&url)
                .header("Authorization", format!("Bearer {}", self.token))
                .header("Accept", "application/vnd.github.v3+json")
                .header("User-Agent", "ralph")
                .send()
                .await
                .map_err(|e| format!("Failed to list issues: {}", e))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(format!("GitHub API error ({}): {}", status, text));
            }

            let batch: Vec<serde_json::Value> = response
                .json()
                .await
                .map_err(|e| format!("Failed to parse response: {}", e))?;
            let full_page = batch.len() == ISSUES_PER_PAGE;

            issues.extend(
                batch
                    .iter()
                    .filter(|issue_data| issue_data.get("pull_request").is_none())
                    .map(issue_from_value),
            );

            if !full_page {
                return Ok(issues);
            }
            page += 1;
        }
    }
}

/// GitHub caps issue listings at 100 per page.
const ISSUES_PER_PAGE: usize = 100;

fn issues_page_url(slug: &RepoSlug, state: &str, page: u32) -> String {
    format!(
        "https://api.github.com/repos/{}/{}/issues?state={}&per_page={}&page={}",
        slug.owner, slug.repo, state, ISSUES_PER_PAGE, page
    )
}

/// Convert a raw API value into an Issue
fn issue_from_value(issue_data: &serde_json::Value) -> Issue {
    let labels = issue_data["labels"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|l| l["name"].as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    Issue {
        number: issue_data["number"].as_u64().unwrap_or(0) as u32,
        title: issue_data["title"].as_str().unwrap_or("").to_string(),
        body: issue_data["body"].as_str().map(|s| s.to_string()),
        state: issue_data["state"].as_str().unwrap_or("").to_string(),
        html_url: issue_data["html_url"].as_str().unwrap_or("").to_string(),
        labels,
    }
}

/// Find a usable API token.
///
/// Checks GITHUB_TOKEN, then an authenticated gh CLI, then the secrets
/// file. Errors only when all three come up empty.
pub async fn discover_token() -> Result<(String, TokenSource), String> {
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok((token, TokenSource::Environment));
        }
    }

    if which::which("gh").is_ok() {
        let output = tokio::process::Command::new("gh")
            .args(["auth", "token"])
            .output()
            .await;
        if let Ok(output) = output {
            if output.status.success() {
                let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !token.is_empty() {
                    return Ok((token, TokenSource::GhCli));
                }
            }
        }
    }

    if let Ok(secrets) = crate::config::secrets::SecretsConfig::load() {
        if let Some(token) = secrets.github_token {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Ok((token, TokenSource::SecretsFile));
            }
        }
    }

    Err(
        "No GitHub token found. Set GITHUB_TOKEN, run `gh auth login`, or add \
         github_token to ~/.ralph/secrets.toml"
            .to_string(),
    )
}

/// Build a client for the project's origin remote.
pub async fn client_for(context: &ProjectContext) -> Result<GitHubClient, String> {
    let slug = crate::git::origin_slug(context.root()).ok_or_else(|| {
        "No github.com origin remote found - gh commands need a GitHub repository".to_string()
    })?;

    let (token, source) = discover_token().await?;
    log::debug!("[GitHub] Using token from {} for {}", source, slug);

    Ok(GitHubClient::new(token, slug))
}
