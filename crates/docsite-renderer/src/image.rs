//! `!image` block extension.
//!
//! A line of the form
//!
//! ```text
//! !image media/diffusion.png caption="Diffusion of a scalar" float=right
//! ```
//!
//! is replaced by an HTML image card before markdown conversion. The image
//! path is relative to the site root so that page finalization can rewrite it
//! relative to each page. `caption` becomes a paragraph below the image; any
//! other key is emitted as an inline style declaration on the outer `div`.
//! A missing image file produces an error box instead of the card.

use std::fmt::Write as _;
use std::path::PathBuf;

use regex::Regex;

use crate::state::escape_html;

/// Expands `!image` lines into raw HTML blocks.
#[derive(Debug)]
pub(crate) struct ImageExtension {
    line_regex: Regex,
    setting_regex: Regex,
    media_root: PathBuf,
}

impl ImageExtension {
    /// Create the extension. Image paths are checked for existence below
    /// `media_root`.
    pub(crate) fn new(media_root: PathBuf) -> Self {
        Self {
            line_regex: Regex::new(r"^!image\s+(\S+)\s*(.*)$").unwrap(),
            setting_regex: Regex::new(r#"(\w+)=(?:"([^"]*)"|(\S+))"#).unwrap(),
            media_root,
        }
    }

    /// Replace every `!image` line in `body`.
    ///
    /// Lines inside fenced code blocks are left alone.
    pub(crate) fn expand(&self, body: &str) -> String {
        let mut out = String::with_capacity(body.len());
        let mut fence: Option<&str> = None;

        for line in body.split_inclusive('\n') {
            let trimmed = line.trim_start();
            if let Some(marker) = fence {
                if trimmed.starts_with(marker) {
                    fence = None;
                }
                out.push_str(line);
                continue;
            }
            if trimmed.starts_with("```") {
                fence = Some("```");
            } else if trimmed.starts_with("~~~") {
                fence = Some("~~~");
            }

            match self.line_regex.captures(line.trim_end()) {
                Some(caps) if fence.is_none() => {
                    let path = &caps[1];
                    let settings = caps.get(2).map_or("", |m| m.as_str());
                    out.push('\n');
                    out.push_str(&self.render(path, settings));
                    out.push_str("\n\n");
                }
                _ => out.push_str(line),
            }
        }

        out
    }

    fn render(&self, path: &str, settings: &str) -> String {
        if !self.media_root.join(path).exists() {
            tracing::error!(path, "Image file not found");
            return format!(
                r#"<div class="moose-error">File not found: {}</div>"#,
                escape_html(path)
            );
        }

        let mut caption = None;
        let mut style = String::new();
        for caps in self.setting_regex.captures_iter(settings) {
            let key = &caps[1];
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            if key == "caption" {
                caption = Some(value);
            } else {
                let _ = write!(style, "{key}:{value};");
            }
        }

        let mut html = String::from(r#"<div class="moose-image-div""#);
        if !style.is_empty() {
            let _ = write!(html, r#" style="{}""#, escape_html(&style));
        }
        html.push_str(r#"><div class="card"><div class="card-image">"#);
        let _ = write!(
            html,
            r#"<img src="{}" class="materialboxed">"#,
            escape_html(path)
        );
        html.push_str("</div>");
        if let Some(text) = caption {
            let _ = write!(
                html,
                r#"<div><p class="moose-caption" align="justify">{}</p></div>"#,
                escape_html(text)
            );
        }
        html.push_str("</div></div>");
        html
    }
}
