//! Site tree and page builds for docsite.
//!
//! This crate provides:
//! - [`SiteTree`]: the immutable node hierarchy of the generated site
//! - [`TreeBuilder`]: constructs the tree from a content directory
//! - [`PageRef::build`]: converts, renders, finalizes and writes one page
//! - [`TemplateEngine`], [`Navigation`] and [`ObjectIndex`]: collaborators
//!   shared by all pages through [`PageSettings`]
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use docsite_renderer::PulldownEngine;
//! use docsite_site::{PageSettings, TemplateEngine, TreeBuilder};
//!
//! let engine = Arc::new(PulldownEngine::new());
//! let settings = PageSettings::new(engine, TemplateEngine::new(vec!["templates".into()]));
//! let tree = TreeBuilder::new("content", "site", Arc::new(settings)).build()?;
//!
//! for page in tree.pages() {
//!     page.build()?;
//! }
//! # Ok(())
//! # }
//! ```

mod dom;
mod finalize;
mod index;
mod loader;
mod navigation;
mod node;
mod page;
mod template;

pub use dom::Headings;
pub use finalize::{BAD_LINK_CLASS, CODE_DIV_CLASS, CONTENT_ID};
pub use index::{IndexError, MapObjectIndex, NoObjects, ObjectEntry, ObjectIndex};
pub use loader::{TreeBuilder, TreeError};
pub use navigation::{NavEntry, Navigation, NavigationError};
pub use node::{NodeId, NodeKind, NodeRef, SiteTree, SiteTreeBuilder};
pub use page::{PageData, PageError, PageRef, PageSettings};
pub use template::{DEFAULT_TEMPLATE, TemplateEngine, TemplateError};

// Re-export TocEntry from docsite-renderer for convenience
pub use docsite_renderer::TocEntry;
