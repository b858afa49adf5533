//! Tool catalog loading from YAML
//!
//! The built-in catalog is embedded in the binary; an alternative file can
//! be loaded in its place. Descriptors are validated at load time so a bad
//! table never reaches the dispatcher.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{CalendarError, Result};
use crate::models::Resource;

use super::definition::{BodyField, ToolDescriptor};

const BUILTIN_CATALOG: &str = include_str!("calendar.yml");

/// YAML file structure
#[derive(Debug, Deserialize)]
struct YamlCatalog {
    #[serde(default)]
    resources: HashMap<Resource, Vec<BodyField>>,
    tools: Vec<ToolDescriptor>,
}

/// Catalog of tool descriptors, kept in registry order
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The Google Calendar catalog shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Load catalog from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::Catalog(format!("Failed to read catalog file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Load catalog from YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: YamlCatalog = serde_yaml::from_str(content)?;

        let mut catalog = Self::new();
        for mut tool in raw.tools {
            if let Some(body) = tool.body {
                let fields = raw.resources.get(&body).ok_or_else(|| {
                    CalendarError::Catalog(format!(
                        "Tool '{}' sends body {} but no fields are declared for it",
                        tool.name, body
                    ))
                })?;
                tool.body_fields = fields.clone();
            }
            catalog.add(tool)?;
        }

        tracing::debug!(tools = catalog.len(), "Loaded tool catalog");
        Ok(catalog)
    }

    /// Validate and append a descriptor
    pub fn add(&mut self, tool: ToolDescriptor) -> Result<()> {
        if self.index.contains_key(&tool.name) {
            return Err(CalendarError::Catalog(format!("Duplicate tool name '{}'", tool.name)));
        }
        validate(&tool)?;
        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// List all tool names in registry order
    pub fn list(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    /// Get all tools
    pub fn all(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    /// Get number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

fn validate(tool: &ToolDescriptor) -> Result<()> {
    if !tool.path.starts_with('/') {
        return Err(CalendarError::Catalog(format!(
            "Tool '{}': path must start with '/': {}",
            tool.name, tool.path
        )));
    }

    let placeholders = tool.placeholders();
    let declared: Vec<&str> = tool.path_params.iter().map(|p| p.name.as_str()).collect();
    if placeholders != declared {
        return Err(CalendarError::Catalog(format!(
            "Tool '{}': path placeholders {:?} do not match path params {:?}",
            tool.name, placeholders, declared
        )));
    }

    let mut seen = HashSet::new();
    for param in &tool.query_params {
        if !seen.insert(param.name.as_str()) || declared.contains(&param.name.as_str()) {
            return Err(CalendarError::Catalog(format!(
                "Tool '{}': query param '{}' declared twice",
                tool.name, param.name
            )));
        }
    }

    Ok(())
}
