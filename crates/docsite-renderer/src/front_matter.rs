//! YAML front matter splitting and parsing.
//!
//! A document may start with a metadata block delimited by `---` lines:
//!
//! ```text
//! ---
//! title: Diffusion
//! stylesheets: [css/diffusion.css]
//! ---
//! # Diffusion
//! ```
//!
//! Metadata keys are merged into the page's template arguments.

use serde_json::{Map, Value};

/// Error returned when a front matter block cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    /// The block is not valid YAML.
    #[error("Invalid YAML front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The block is valid YAML but not a key/value mapping.
    #[error("Front matter must be a mapping of keys to values")]
    NotAMapping,
}

/// Markdown body with its parsed front matter.
#[derive(Debug, Default, PartialEq)]
pub struct Document<'a> {
    /// Metadata from the front matter block (empty if there is none).
    pub meta: Map<String, Value>,
    /// Markdown text following the front matter block.
    pub body: &'a str,
}

/// Split a markdown document into its front matter block and body.
///
/// Returns `None` for the block if the document doesn't start with a `---`
/// line or the block is never closed.
#[must_use]
pub fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(block), body);
        }
        offset += line.len();
    }

    (None, text)
}

/// Parse a markdown document into metadata and body.
///
/// # Errors
///
/// Returns [`FrontMatterError`] if the front matter block is malformed.
pub fn parse_document(text: &str) -> Result<Document<'_>, FrontMatterError> {
    let (block, body) = split_front_matter(text);
    let meta = match block {
        Some(yaml) if !yaml.trim().is_empty() => match serde_yaml::from_str::<Value>(yaml)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return Err(FrontMatterError::NotAMapping),
        },
        _ => Map::new(),
    };
    Ok(Document { meta, body })
}
