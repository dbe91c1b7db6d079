//! Markdown engine used by every page build.

use std::path::PathBuf;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};

use crate::image::ImageExtension;
use crate::state::HeadingIds;

/// Converts a markdown body into an HTML fragment.
///
/// One engine instance is shared by all page builds, possibly from several
/// threads at once, so implementations must not keep per-conversion state in
/// `self`.
pub trait MarkdownEngine: Send + Sync {
    /// Convert markdown text (without front matter) to HTML.
    fn convert(&self, body: &str) -> String;
}

/// [`MarkdownEngine`] backed by `pulldown-cmark`.
///
/// Enables tables, footnotes, strikethrough, task lists and `{#id}` heading
/// attributes. Headings without an explicit id get a slug id, unique within
/// the document. `!image` lines are expanded into image cards.
#[derive(Debug)]
pub struct PulldownEngine {
    options: Options,
    images: ImageExtension,
}

impl PulldownEngine {
    /// Create an engine resolving `!image` paths against the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_media_root(PathBuf::new())
    }

    /// Create an engine resolving `!image` paths against `root`.
    #[must_use]
    pub fn with_media_root(root: impl Into<PathBuf>) -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_HEADING_ATTRIBUTES,
            images: ImageExtension::new(root.into()),
        }
    }
}

impl Default for PulldownEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownEngine for PulldownEngine {
    fn convert(&self, body: &str) -> String {
        let body = self.images.expand(body);
        let mut events: Vec<Event<'_>> = Parser::new_ext(&body, self.options).collect();
        assign_heading_ids(&mut events);

        let mut output = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut output, events.into_iter());
        output
    }
}

/// Give every heading without an explicit id a unique slug id.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut ids = HeadingIds::default();
    for event in &*events {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            ids.reserve(id);
        }
    }

    let mut i = 0;
    while i < events.len() {
        if matches!(&events[i], Event::Start(Tag::Heading { id: None, .. })) {
            let mut text = String::new();
            let mut end = i + 1;
            while end < events.len() && !matches!(events[end], Event::End(TagEnd::Heading(_))) {
                if let Event::Text(t) | Event::Code(t) = &events[end] {
                    text.push_str(t);
                }
                end += 1;
            }
            let generated = ids.generate(&text);
            if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
                *id = Some(CowStr::from(generated));
            }
            i = end;
        }
        i += 1;
    }
}
