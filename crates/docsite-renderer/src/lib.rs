//! Markdown conversion for docsite pages.
//!
//! This crate provides the [`MarkdownEngine`] trait used by page builds and
//! its `pulldown-cmark` implementation, [`PulldownEngine`]. Engines are
//! shared across build threads, so they are `Send + Sync` and stateless per
//! conversion.
//!
//! Besides the engine it hosts the small text helpers the site crate needs:
//! front matter parsing, heading slugs, HTML escaping and relative paths.
//!
//! # Example
//!
//! ```
//! use docsite_renderer::{MarkdownEngine, PulldownEngine};
//!
//! let engine = PulldownEngine::new();
//! let html = engine.convert("## Overview\n\n**Bold** text");
//! assert!(html.contains(r#"<h2 id="overview">Overview</h2>"#));
//! ```

mod engine;
mod front_matter;
mod image;
mod state;
mod util;

pub use engine::{MarkdownEngine, PulldownEngine};
pub use front_matter::{Document, FrontMatterError, parse_document, split_front_matter};
pub use state::{TocEntry, escape_html, slugify};
pub use util::relative_path;
