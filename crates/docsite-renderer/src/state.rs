//! Heading id bookkeeping and HTML escaping shared by the engine.

use std::collections::HashMap;

use serde::Serialize;

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Generates unique heading ids within one document.
///
/// The first heading with a given slug keeps it unchanged, later duplicates
/// get a numeric suffix (`intro`, `intro-1`, `intro-2`).
#[derive(Debug, Default)]
pub(crate) struct HeadingIds {
    id_counts: HashMap<String, usize>,
}

impl HeadingIds {
    /// Generate a unique ID for a heading.
    pub(crate) fn generate(&mut self, text: &str) -> String {
        let base_id = slugify(text);
        let base_id = if base_id.is_empty() {
            "section".to_owned()
        } else {
            base_id
        };
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }

    /// Record an explicit id (`{#id}`) so generated ids don't collide with it.
    pub(crate) fn reserve(&mut self, id: &str) {
        *self.id_counts.entry(id.to_owned()).or_default() += 1;
    }
}

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
