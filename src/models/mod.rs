// Configuration data model persisted to .ralph/config.json

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Supported external worker CLIs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Claude,
    Opencode,
    Cursor,
    Codex,
    Qwen,
    Droid,
}

impl AgentType {
    /// Returns all available agent types
    pub fn all() -> &'static [AgentType] {
        &[
            AgentType::Claude,
            AgentType::Opencode,
            AgentType::Cursor,
            AgentType::Codex,
            AgentType::Qwen,
            AgentType::Droid,
        ]
    }

    /// Returns the string representation of this agent type
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Claude => "claude",
            AgentType::Opencode => "opencode",
            AgentType::Cursor => "cursor",
            AgentType::Codex => "codex",
            AgentType::Qwen => "qwen",
            AgentType::Droid => "droid",
        }
    }

    /// Name of the executable to look for on PATH.
    pub fn binary_name(&self) -> &'static str {
        match self {
            AgentType::Cursor => "cursor-agent",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(AgentType::Claude),
            "opencode" => Ok(AgentType::Opencode),
            "cursor" => Ok(AgentType::Cursor),
            "codex" => Ok(AgentType::Codex),
            "qwen" => Ok(AgentType::Qwen),
            "droid" => Ok(AgentType::Droid),
            _ => Err(format!(
                "Unknown agent type: '{}'. Expected one of: claude, opencode, cursor, codex, qwen, droid",
                s
            )),
        }
    }
}

impl Default for AgentType {
    fn default() -> Self {
        AgentType::Claude
    }
}

/// Git hosting provider for branch/PR workflows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GitProvider {
    Github,
    None,
}

impl GitProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            GitProvider::Github => "github",
            GitProvider::None => "none",
        }
    }
}

impl std::fmt::Display for GitProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GitProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(GitProvider::Github),
            "none" => Ok(GitProvider::None),
            _ => Err(format!(
                "Unknown git provider: '{}'. Expected one of: github, none",
                s
            )),
        }
    }
}

impl Default for GitProvider {
    fn default() -> Self {
        GitProvider::None
    }
}

/// Git workflow settings inside the project config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GitSettings {
    #[serde(default)]
    pub provider: GitProvider,
    #[serde(default, rename = "createPRs")]
    pub create_prs: bool,
    #[serde(default, rename = "usePRTemplate")]
    pub use_pr_template: bool,
    #[serde(default)]
    pub wait_for_merge: bool,
    #[serde(default)]
    pub branch_prefix: String,
    /// Whether the xgit safe-git wrapper was found on PATH at init time.
    #[serde(default)]
    pub use_xgit: bool,
}

fn default_max_iterations() -> u32 {
    30
}

fn default_created_at() -> String {
    Utc::now().to_rfc3339()
}

/// Project configuration persisted to .ralph/config.json.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RalphConfig {
    #[serde(default)]
    pub agent: AgentType,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_created_at")]
    pub created_at: String,
    pub ticket_prefix: String,
    #[serde(default)]
    pub git: GitSettings,
}

impl RalphConfig {
    /// Create a config with the given ticket prefix and everything else
    /// defaulted.
    pub fn new(ticket_prefix: &str) -> Self {
        Self {
            agent: AgentType::default(),
            max_iterations: default_max_iterations(),
            created_at: default_created_at(),
            ticket_prefix: ticket_prefix.to_string(),
            git: GitSettings::default(),
        }
    }

    /// Validate the configuration values
    /// Returns Ok(()) if valid, or Err with a descriptive error message
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_ticket_prefix(&self.ticket_prefix) {
            return Err(format!(
                "Invalid ticket prefix '{}': must be 2-5 ASCII letters",
                self.ticket_prefix
            ));
        }
        if self.max_iterations == 0 {
            return Err("maxIterations must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for RalphConfig {
    fn default() -> Self {
        Self::new("US")
    }
}

/// Ticket prefixes are 2-5 ASCII letters, e.g. "US" or "PROJ".
pub fn is_valid_ticket_prefix(prefix: &str) -> bool {
    (2..=5).contains(&prefix.len()) && prefix.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_type_round_trip() {
        for agent in AgentType::all() {
            let parsed: AgentType = agent.as_str().parse().unwrap();
            assert_eq!(parsed, *agent);
        }
    }

    #[test]
    fn test_agent_type_rejects_unknown() {
        let result: Result<AgentType, _> = "copilot".parse();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Unknown agent type"));
    }

    #[test]
    fn test_agent_binary_name() {
        assert_eq!(AgentType::Claude.binary_name(), "claude");
        assert_eq!(AgentType::Cursor.binary_name(), "cursor-agent");
    }

    #[test]
    fn test_ticket_prefix_validation() {
        assert!(is_valid_ticket_prefix("US"));
        assert!(is_valid_ticket_prefix("PROJ"));
        assert!(is_valid_ticket_prefix("ABCDE"));
        assert!(!is_valid_ticket_prefix("A"));
        assert!(!is_valid_ticket_prefix("ABCDEF"));
        assert!(!is_valid_ticket_prefix("US1"));
        assert!(!is_valid_ticket_prefix(""));
        assert!(!is_valid_ticket_prefix("U-S"));
    }

    #[test]
    fn test_config_validate() {
        let mut config = RalphConfig::new("US");
        assert!(config.validate().is_ok());

        config.max_iterations = 0;
        assert!(config.validate().is_err());

        config.max_iterations = 30;
        config.ticket_prefix = "X".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serializes_camel_case() {
        let config = RalphConfig::new("US");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"maxIterations\""));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"ticketPrefix\""));
        assert!(json.contains("\"createPRs\""));
        assert!(json.contains("\"usePRTemplate\""));
        assert!(json.contains("\"useXgit\""));
    }

    #[test]
    fn test_config_defaults_on_missing_fields() {
        let json = r#"{"ticketPrefix": "AB"}"#;
        let config: RalphConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.agent, AgentType::Claude);
        assert_eq!(config.max_iterations, 30);
        assert_eq!(config.git.provider, GitProvider::None);
        assert!(!config.git.use_xgit);
    }

    #[test]
    fn test_git_provider_serialized_lowercase() {
        let json = serde_json::to_string(&GitProvider::Github).unwrap();
        assert_eq!(json, "\"github\"");
        assert_eq!("NONE".parse::<GitProvider>().unwrap(), GitProvider::None);
        assert!("gitlab".parse::<GitProvider>().is_err());
    }
}
