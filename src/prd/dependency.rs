//! Dependency graph validation for story backlogs
//!
//! A backlog whose `dependsOn` edges contain a cycle can never finish: no
//! story on the cycle ever becomes eligible, so selection stalls forever.
//! Imports and inserts run the graph through [`DependencyGraph::validate`]
//! and refuse to persist anything that fails.

use crate::prd::Story;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Error types for dependency validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    /// A cycle was detected in the dependency graph
    #[error("Dependency cycle detected: {}", .0.join(" → "))]
    CycleDetected(Vec<String>),
    /// A dependency references a non-existent story
    #[error("Story '{from}' depends on non-existent story '{to}'")]
    MissingDependency { from: String, to: String },
    /// Self-referential dependency
    #[error("Story '{0}' cannot depend on itself")]
    SelfDependency(String),
}

/// Dependency graph over story ids
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Every story id present in the backlog, in backlog order
    nodes: Vec<String>,
    /// Maps story id to the ids it depends on
    depends_on: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build the graph from a backlog's story list.
    pub fn from_stories(stories: &[Story]) -> Self {
        let nodes = stories.iter().map(|s| s.id.clone()).collect();
        let depends_on = stories
            .iter()
            .filter(|s| !s.depends_on.is_empty())
            .map(|s| (s.id.clone(), s.depends_on.clone()))
            .collect();
        Self { nodes, depends_on }
    }

    /// Validate the graph: self-dependencies, dangling references, cycles.
    pub fn validate(&self) -> Result<(), DependencyError> {
        let known: HashSet<&String> = self.nodes.iter().collect();

        for (from, deps) in &self.depends_on {
            for to in deps {
                if to == from {
                    return Err(DependencyError::SelfDependency(from.clone()));
                }
                if !known.contains(to) {
                    return Err(DependencyError::MissingDependency {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
            }
        }

        // Track visited nodes and nodes in the current path
        let mut visited: HashSet<&String> = HashSet::new();
        let mut in_path: HashSet<&String> = HashSet::new();
        let mut path: Vec<&String> = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node) {
                if let Some(cycle) = self.dfs_cycle_detect(node, &mut visited, &mut in_path, &mut path)
                {
                    return Err(DependencyError::CycleDetected(
                        cycle.into_iter().map(|s| s.to_string()).collect(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// DFS helper for cycle detection
    fn dfs_cycle_detect<'a>(
        &'a self,
        node: &'a String,
        visited: &mut HashSet<&'a String>,
        in_path: &mut HashSet<&'a String>,
        path: &mut Vec<&'a String>,
    ) -> Option<Vec<&'a String>> {
        visited.insert(node);
        in_path.insert(node);
        path.push(node);

        if let Some(deps) = self.depends_on.get(node) {
            for dep in deps {
                if in_path.contains(dep) {
                    // Found a cycle - extract it from the path
                    let cycle_start = path.iter().position(|&n| n == dep)?;
                    let mut cycle: Vec<&String> = path[cycle_start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }

                if !visited.contains(dep) {
                    if let Some(cycle) = self.dfs_cycle_detect(dep, visited, in_path, path) {
                        return Some(cycle);
                    }
                }
            }
        }

        in_path.remove(node);
        path.pop();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_with_deps(id: &str, ticket_id: u32, deps: &[&str]) -> Story {
        let mut story = Story::new(id, ticket_id, id, "desc", ticket_id);
        story.depends_on = deps.iter().map(|d| d.to_string()).collect();
        story
    }

    #[test]
    fn test_empty_graph_is_valid() {
        let graph = DependencyGraph::from_stories(&[]);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_linear_chain_is_valid() {
        let stories = vec![
            story_with_deps("A", 1, &[]),
            story_with_deps("B", 2, &["A"]),
            story_with_deps("C", 3, &["B"]),
        ];
        let graph = DependencyGraph::from_stories(&stories);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_diamond_is_valid() {
        let stories = vec![
            story_with_deps("A", 1, &[]),
            story_with_deps("B", 2, &["A"]),
            story_with_deps("C", 3, &["A"]),
            story_with_deps("D", 4, &["B", "C"]),
        ];
        let graph = DependencyGraph::from_stories(&stories);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_self_dependency_rejected() {
        let stories = vec![story_with_deps("A", 1, &["A"])];
        let graph = DependencyGraph::from_stories(&stories);
        assert_eq!(
            graph.validate().unwrap_err(),
            DependencyError::SelfDependency("A".to_string())
        );
    }

    #[test]
    fn test_missing_dependency_rejected() {
        let stories = vec![story_with_deps("A", 1, &["Z"])];
        let graph = DependencyGraph::from_stories(&stories);
        match graph.validate().unwrap_err() {
            DependencyError::MissingDependency { from, to } => {
                assert_eq!(from, "A");
                assert_eq!(to, "Z");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_two_node_cycle_detected() {
        let stories = vec![
            story_with_deps("A", 1, &["B"]),
            story_with_deps("B", 2, &["A"]),
        ];
        let graph = DependencyGraph::from_stories(&stories);
        match graph.validate().unwrap_err() {
            DependencyError::CycleDetected(cycle) => {
                // The cycle path closes on its starting node
                assert_eq!(cycle.first(), cycle.last());
                assert!(cycle.len() >= 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_longer_cycle_detected() {
        let stories = vec![
            story_with_deps("A", 1, &["C"]),
            story_with_deps("B", 2, &["A"]),
            story_with_deps("C", 3, &["B"]),
        ];
        let graph = DependencyGraph::from_stories(&stories);
        assert!(matches!(
            graph.validate().unwrap_err(),
            DependencyError::CycleDetected(_)
        ));
    }

    #[test]
    fn test_cycle_error_message_names_the_path() {
        let stories = vec![
            story_with_deps("A", 1, &["B"]),
            story_with_deps("B", 2, &["A"]),
        ];
        let graph = DependencyGraph::from_stories(&stories);
        let message = graph.validate().unwrap_err().to_string();
        assert!(message.contains("cycle"));
        assert!(message.contains("A"));
        assert!(message.contains("B"));
    }
}
