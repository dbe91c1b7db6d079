//! Site navigation loaded from YAML.
//!
//! The navigation file is an ordered list of single-key maps. A string value
//! is a link target; a list value is a nested section:
//!
//! ```yaml
//! - Getting Started: getting_started/index.md
//! - Systems:
//!     - Kernels: systems/Kernels.md
//!     - Materials: systems/Materials.md
//! - Forum: https://example.org/forum
//! ```
//!
//! Markdown targets are resolved through the site tree when a page is
//! rendered, so every page gets URLs relative to itself.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use serde_yaml::Value as Yaml;

use crate::node::NodeRef;

/// Error returned when the navigation file cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    /// I/O error reading the file.
    #[error("Failed to read navigation file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid YAML.
    #[error("Invalid navigation YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The YAML does not have the expected shape.
    #[error("Invalid navigation entry: {0}")]
    Invalid(String),
}

/// Navigation entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavEntry {
    /// Link to a markdown page or an external URL.
    Link { label: String, target: String },
    /// Labelled group of entries.
    Section {
        label: String,
        children: Vec<NavEntry>,
    },
}

/// Ordered navigation entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Navigation {
    entries: Vec<NavEntry>,
}

impl Navigation {
    /// Load navigation from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError`] if the file can't be read or parsed.
    pub fn load(path: &Path) -> Result<Self, NavigationError> {
        let text = fs::read_to_string(path).map_err(|e| NavigationError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&text)
    }

    /// Parse navigation from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError`] if the text isn't a list of single-key maps.
    pub fn from_yaml(text: &str) -> Result<Self, NavigationError> {
        let value: Yaml = serde_yaml::from_str(text)?;
        let entries = match value {
            Yaml::Null => Vec::new(),
            other => parse_entries(&other)?,
        };
        Ok(Self { entries })
    }

    /// Top-level entries.
    #[must_use]
    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    /// Template value for rendering `page`.
    ///
    /// Each link becomes `{label, target, url}`; markdown targets get the URL
    /// of the matching page relative to `page`. Sections become
    /// `{label, children}`.
    pub(crate) fn to_context(&self, page: NodeRef<'_>) -> Value {
        Value::Array(
            self.entries
                .iter()
                .map(|entry| entry_context(entry, page))
                .collect(),
        )
    }
}

fn parse_entries(value: &Yaml) -> Result<Vec<NavEntry>, NavigationError> {
    let Yaml::Sequence(items) = value else {
        return Err(NavigationError::Invalid(
            "expected a list of entries".to_owned(),
        ));
    };

    items
        .iter()
        .map(|item| {
            let Yaml::Mapping(map) = item else {
                return Err(NavigationError::Invalid(
                    "each entry must be a single-key map".to_owned(),
                ));
            };
            let mut pairs = map.iter();
            let (Some((key, value)), None) = (pairs.next(), pairs.next()) else {
                return Err(NavigationError::Invalid(
                    "each entry must be a single-key map".to_owned(),
                ));
            };
            let label = scalar_string(key)
                .ok_or_else(|| NavigationError::Invalid("entry label must be a string".to_owned()))?;
            match value {
                Yaml::Sequence(_) => Ok(NavEntry::Section {
                    children: parse_entries(value)?,
                    label,
                }),
                other => scalar_string(other)
                    .map(|target| NavEntry::Link {
                        label: label.clone(),
                        target,
                    })
                    .ok_or_else(|| {
                        NavigationError::Invalid(format!("entry '{label}' has no target"))
                    }),
            }
        })
        .collect()
}

fn scalar_string(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn entry_context(entry: &NavEntry, page: NodeRef<'_>) -> Value {
    match entry {
        NavEntry::Link { label, target } => {
            let url = if target.ends_with(".md") && !target.starts_with("http") {
                match page.root().find_by_source_suffix(target).first() {
                    Some(found) => found.url(Some(page)),
                    None => {
                        tracing::warn!(target, "Navigation target not found");
                        target.clone()
                    }
                }
            } else {
                target.clone()
            };
            json!({"label": label, "target": target, "url": url})
        }
        NavEntry::Section { label, children } => {
            let mut section = Map::new();
            section.insert("label".to_owned(), Value::String(label.clone()));
            section.insert(
                "children".to_owned(),
                Value::Array(children.iter().map(|c| entry_context(c, page)).collect()),
            );
            Value::Object(section)
        }
    }
}
