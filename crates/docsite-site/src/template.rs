//! Page templates rendered with minijinja.
//!
//! Templates are looked up by name in an ordered list of directories; the
//! first directory containing the file wins. A built-in `default.html` is
//! used when no directory provides one.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Component, Path, PathBuf};

use minijinja::{Environment, ErrorKind};
use serde::Serialize;

pub use docsite_config::DEFAULT_TEMPLATE;

const DEFAULT_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title | default(current.name) }}</title>
{%- for sheet in stylesheets | default([]) %}
<link rel="stylesheet" href="{{ current.root }}{{ sheet }}">
{%- endfor %}
</head>
<body>
{%- if navigation %}
<nav class="moose-navigation">
<ul>
{%- for item in navigation recursive %}
<li>{% if item.children %}{{ item.label }}<ul>{{ loop(item.children) }}</ul>{% else %}<a href="{{ item.url }}">{{ item.label }}</a>{% endif %}</li>
{%- endfor %}
</ul>
</nav>
{%- endif %}
<ol class="breadcrumbs">
{%- for crumb in current.breadcrumbs %}
<li><a href="{{ crumb.url }}">{% if crumb.name %}{{ crumb.name }}{% else %}Home{% endif %}</a></li>
{%- endfor %}
</ol>
<div id="moose-markdown-content">
{{ content | safe }}
</div>
{%- if current.toc %}
<ul class="table-of-contents">
{%- for entry in current.toc %}
<li><a href="#{{ entry.id }}">{{ entry.title }}</a></li>
{%- endfor %}
</ul>
{%- endif %}
{%- if current.links %}
<div class="moose-page-links">
{%- for link in current.links %}
<a href="{{ link.url }}">{{ link.label }}</a>
{%- endfor %}
</div>
{%- endif %}
</body>
</html>
"##;

/// Error returned when a template cannot be rendered.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// No search directory contains the template and it isn't built in.
    #[error("Template not found: {0}")]
    NotFound(String),
    /// The template failed to load, parse or render.
    #[error("Failed to render template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Template environment over an ordered search path.
///
/// Compiled templates are cached by the environment, so one engine is shared
/// by all pages.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create an engine searching `dirs` in order.
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_loader(move |name| load_template(&dirs, name));
        Self { env }
    }

    /// Render template `name` with `context`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] if the template doesn't exist and
    /// [`TemplateError::Render`] if it fails to compile or render.
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, TemplateError> {
        let template = self.env.get_template(name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => TemplateError::NotFound(name.to_owned()),
            _ => TemplateError::Render {
                name: name.to_owned(),
                source: e,
            },
        })?;
        template.render(context).map_err(|e| TemplateError::Render {
            name: name.to_owned(),
            source: e,
        })
    }
}

fn load_template(dirs: &[PathBuf], name: &str) -> Result<Option<String>, minijinja::Error> {
    let relative = Path::new(name);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Ok(None);
    }

    for dir in dirs {
        let path = dir.join(relative);
        match fs::read_to_string(&path) {
            Ok(source) => {
                tracing::debug!(path = %path.display(), "Loaded template");
                return Ok(Some(source));
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => {
                return Err(minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    format!("could not read template {}", path.display()),
                )
                .with_source(e));
            }
        }
    }

    Ok((name == DEFAULT_TEMPLATE).then(|| DEFAULT_HTML.to_owned()))
}
