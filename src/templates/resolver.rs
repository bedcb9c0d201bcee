// Template resolution with cascading lookup
//
// Resolution order:
// 1. Project (.ralph/templates/) - project-specific overrides
// 2. Global (~/.ralph/templates/) - user's global overrides
// 3. Builtin - compiled-in defaults

use crate::templates::builtin;
use anyhow::{anyhow, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a template was resolved from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Project-level template in .ralph/templates/
    Project,
    /// Global template in ~/.ralph/templates/
    Global,
    /// Built-in template (compiled into the binary)
    Builtin,
}

/// Resolved template info
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    pub name: String,
    pub content: String,
    pub source: TemplateSource,
    /// Path to the template file (if file-based)
    pub path: Option<PathBuf>,
}

/// Template resolver with cascading lookup
pub struct TemplateResolver {
    /// Project root for project-level templates
    project_path: Option<PathBuf>,
    cache: HashMap<String, ResolvedTemplate>,
    use_cache: bool,
}

impl TemplateResolver {
    pub fn new() -> Self {
        Self {
            project_path: None,
            cache: HashMap::new(),
            use_cache: true,
        }
    }

    /// Set the project root for project-level templates
    pub fn with_project_path(mut self, path: &Path) -> Self {
        self.project_path = Some(path.to_path_buf());
        self
    }

    /// Enable or disable caching
    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Resolve a template by name, first match wins.
    pub fn resolve(&mut self, name: &str) -> Result<ResolvedTemplate> {
        if self.use_cache {
            if let Some(cached) = self.cache.get(name) {
                debug!(
                    "[Templates] '{}' resolved from cache (source: {:?})",
                    name, cached.source
                );
                return Ok(cached.clone());
            }
        }

        if let Some(template) = self.try_project_template(name)? {
            info!(
                "[Templates] '{}' resolved from project override: {:?}",
                name, template.path
            );
            if self.use_cache {
                self.cache.insert(name.to_string(), template.clone());
            }
            return Ok(template);
        }

        if let Some(template) = self.try_global_template(name)? {
            info!(
                "[Templates] '{}' resolved from global override: {:?}",
                name, template.path
            );
            if self.use_cache {
                self.cache.insert(name.to_string(), template.clone());
            }
            return Ok(template);
        }

        if let Some(content) = builtin::get_builtin_template(name) {
            debug!("[Templates] '{}' resolved from builtin", name);
            let template = ResolvedTemplate {
                name: name.to_string(),
                content: content.to_string(),
                source: TemplateSource::Builtin,
                path: None,
            };
            if self.use_cache {
                self.cache.insert(name.to_string(), template.clone());
            }
            return Ok(template);
        }

        Err(anyhow!("Template '{}' not found in any location", name))
    }

    /// Clear the cache
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Project templates directory: {project}/.ralph/templates/
    fn project_templates_dir(&self) -> Option<PathBuf> {
        self.project_path
            .as_ref()
            .map(|p| p.join(".ralph").join("templates"))
    }

    /// Global templates directory: ~/.ralph/templates/
    fn global_templates_dir(&self) -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".ralph").join("templates"))
    }

    fn try_project_template(&self, name: &str) -> Result<Option<ResolvedTemplate>> {
        let path = match self.project_templates_dir() {
            Some(dir) => dir.join(format!("{}.tera", name)),
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(ResolvedTemplate {
            name: name.to_string(),
            content,
            source: TemplateSource::Project,
            path: Some(path),
        }))
    }

    fn try_global_template(&self, name: &str) -> Result<Option<ResolvedTemplate>> {
        let path = match self.global_templates_dir() {
            Some(dir) => dir.join(format!("{}.tera", name)),
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(ResolvedTemplate {
            name: name.to_string(),
            content,
            source: TemplateSource::Global,
            path: Some(path),
        }))
    }
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new()
    }
}
