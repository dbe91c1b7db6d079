//! Markdown pages and the per-page build.
//!
//! A page build reads its markdown, converts it with the shared
//! [`MarkdownEngine`], renders the page template, finalizes the resulting
//! document against the site tree and writes `<output>/index.html`.
//!
//! Link resolution reads only the immutable tree (source paths and names),
//! never another page's output, so pages can be built in any order and on any
//! thread.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use docsite_renderer::{FrontMatterError, MarkdownEngine, TocEntry, parse_document};
use serde_json::{Map, Value, json};

use crate::dom::Headings;
use crate::finalize::finalize;
use crate::index::{NoObjects, ObjectIndex};
use crate::navigation::Navigation;
use crate::node::NodeRef;
use crate::template::{DEFAULT_TEMPLATE, TemplateEngine, TemplateError};

/// Error returned by page construction, accessors and builds.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// Markdown source doesn't exist.
    #[error("Markdown file not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    /// Content was requested before the page was built.
    #[error("Page must be built before its content is read: {}", .0.display())]
    NotBuilt(PathBuf),
    /// The page was built before.
    #[error("Page was already built: {}", .0.display())]
    AlreadyBuilt(PathBuf),
    /// I/O error reading the source or writing the output.
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Front matter block is malformed.
    #[error("Invalid front matter in {}: {source}", .path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
    /// Template failed to render.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Settings shared by every page of a site.
pub struct PageSettings {
    /// Markdown engine, shared across build threads.
    pub engine: Arc<dyn MarkdownEngine>,
    /// Template environment.
    pub templates: TemplateEngine,
    /// Template rendered for every page.
    pub template: String,
    /// Base template arguments.
    pub template_args: Map<String, Value>,
    /// Site navigation, exposed to templates as `navigation`.
    pub navigation: Option<Navigation>,
    /// Documented objects for [`PageRef::links`].
    pub objects: Box<dyn ObjectIndex>,
    /// Repository checkout that source paths are made relative to.
    pub repo_root: PathBuf,
    /// Branch used for "Edit Markdown" links.
    pub edit_branch: String,
    /// Branch used for header and source links.
    pub blob_branch: String,
}

impl PageSettings {
    /// Create settings with the default template and no extras.
    #[must_use]
    pub fn new(engine: Arc<dyn MarkdownEngine>, templates: TemplateEngine) -> Self {
        Self {
            engine,
            templates,
            template: DEFAULT_TEMPLATE.to_owned(),
            template_args: Map::new(),
            navigation: None,
            objects: Box::new(NoObjects),
            repo_root: PathBuf::new(),
            edit_branch: "devel".to_owned(),
            blob_branch: "master".to_owned(),
        }
    }
}

/// Per-page data stored in a page node.
pub struct PageData {
    source: PathBuf,
    settings: Arc<PageSettings>,
    html: OnceLock<String>,
}

impl PageData {
    /// Create page data for an existing markdown file.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::SourceNotFound`] if `source` is not a file.
    pub fn new(source: impl Into<PathBuf>, settings: Arc<PageSettings>) -> Result<Self, PageError> {
        let source = source.into();
        if !source.is_file() {
            return Err(PageError::SourceNotFound(source));
        }
        Ok(Self {
            source,
            settings,
            html: OnceLock::new(),
        })
    }

    /// Markdown source file.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Borrowed handle to a page node.
#[derive(Clone, Copy)]
pub struct PageRef<'a> {
    node: NodeRef<'a>,
    data: &'a PageData,
}

impl fmt::Debug for PageRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRef")
            .field("node", &self.node)
            .field("source", &self.data.source)
            .field("built", &self.is_built())
            .finish()
    }
}

impl<'a> PageRef<'a> {
    pub(crate) fn new(node: NodeRef<'a>, data: &'a PageData) -> Self {
        Self { node, data }
    }

    /// Tree node of this page.
    #[must_use]
    pub fn node(&self) -> NodeRef<'a> {
        self.node
    }

    /// Markdown source file.
    #[must_use]
    pub fn source(&self) -> &'a Path {
        &self.data.source
    }

    /// Whether [`build`](Self::build) has completed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.data.html.get().is_some()
    }

    /// HTML converted from the markdown, without the template.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NotBuilt`] until the page has been built.
    pub fn content(&self) -> Result<&'a str, PageError> {
        self.data
            .html
            .get()
            .map(String::as_str)
            .ok_or_else(|| PageError::NotBuilt(self.data.source.clone()))
    }

    /// Headings of the given level (2 for `<h2>`) that carry an id, as
    /// `(text, id)` pairs in document order.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NotBuilt`] until the page has been built.
    pub fn contents(&self, level: u8) -> Result<Headings, PageError> {
        Ok(Headings::new(self.content()?, level))
    }

    /// External links for this page as `(label, url)` pairs.
    ///
    /// Always starts with the "Edit Markdown" link. When the page is named
    /// after a documented object, "Header", "Source" (if the source file
    /// exists) and "Doxygen" links follow.
    #[must_use]
    pub fn links(&self, repo_url: &str) -> Vec<(String, String)> {
        let settings = &self.data.settings;
        let repo_url = repo_url.trim_end_matches('/');
        let mut output = vec![(
            "Edit Markdown".to_owned(),
            format!(
                "{repo_url}/edit/{}/{}",
                settings.edit_branch,
                self.repo_relative(&self.data.source)
            ),
        )];

        let name = self.node.name();
        if !settings.objects.has_object(name) {
            return output;
        }

        if let Some(include) = settings.objects.filenames(name).first() {
            output.push((
                "Header".to_owned(),
                format!(
                    "{repo_url}/blob/{}/{}",
                    settings.blob_branch,
                    self.repo_relative(include)
                ),
            ));

            let source = source_for_header(include);
            if source.exists() {
                output.push((
                    "Source".to_owned(),
                    format!(
                        "{repo_url}/blob/{}/{}",
                        settings.blob_branch,
                        self.repo_relative(&source)
                    ),
                ));
            }
        }

        if let Some(url) = settings.objects.doxygen(name) {
            output.push(("Doxygen".to_owned(), url));
        }
        output
    }

    fn repo_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.data.settings.repo_root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    /// Convert, render, finalize and write the page.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::AlreadyBuilt`] on a second build, and
    /// [`PageError`] for I/O, front matter or template failures.
    pub fn build(&self) -> Result<(), PageError> {
        let source = self.data.source.as_path();
        if self.is_built() {
            return Err(PageError::AlreadyBuilt(source.to_path_buf()));
        }
        let settings = &self.data.settings;

        let text = fs::read_to_string(source).map_err(|e| PageError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        let document = parse_document(&text).map_err(|e| PageError::FrontMatter {
            path: source.to_path_buf(),
            source: e,
        })?;
        let content = settings.engine.convert(document.body);

        let mut args = settings.template_args.clone();
        args.insert(
            "navigation".to_owned(),
            settings
                .navigation
                .as_ref()
                .map_or(Value::Null, |nav| nav.to_context(self.node)),
        );
        args.extend(document.meta);
        let current = self.current_context(&content, &args);
        args.insert("current".to_owned(), current);
        args.insert("content".to_owned(), Value::String(content.clone()));

        let rendered = settings.templates.render(&settings.template, &args)?;

        let output_dir = self.node.path();
        fs::create_dir_all(&output_dir).map_err(|e| PageError::Io {
            path: output_dir.clone(),
            source: e,
        })?;

        let output_file = output_dir.join("index.html");
        let html = finalize(*self, &rendered).map_err(|e| PageError::Io {
            path: output_file.clone(),
            source: e,
        })?;
        fs::write(&output_file, html).map_err(|e| PageError::Io {
            path: output_file.clone(),
            source: e,
        })?;
        tracing::debug!(path = %output_file.display(), source = %source.display(), "Wrote page");

        self.data
            .html
            .set(content)
            .map_err(|_| PageError::AlreadyBuilt(source.to_path_buf()))
    }

    /// Template value describing this page.
    fn current_context(&self, content: &str, args: &Map<String, Value>) -> Value {
        let breadcrumbs: Vec<Value> = self
            .node
            .breadcrumbs()
            .iter()
            .map(|crumb| json!({"name": crumb.name(), "url": crumb.url(Some(self.node))}))
            .collect();
        let toc: Vec<TocEntry> = Headings::new(content, 2)
            .map(|(title, id)| TocEntry {
                level: 2,
                title,
                id,
            })
            .collect();
        let links: Vec<Value> = match args.get("repo_url") {
            Some(Value::String(repo_url)) => self
                .links(repo_url)
                .into_iter()
                .map(|(label, url)| json!({"label": label, "url": url}))
                .collect(),
            _ => Vec::new(),
        };

        json!({
            "name": self.node.name(),
            "path": self.node.rel_dir(),
            "url": self.node.url(Some(self.node)),
            "root": self.node.relpath(""),
            "source": self.data.source.to_string_lossy(),
            "breadcrumbs": breadcrumbs,
            "toc": toc,
            "links": links,
        })
    }
}

/// Implementation file matching a header: `/include/` becomes `/src/` and a
/// `.h` extension becomes `.C`.
fn source_for_header(include: &Path) -> PathBuf {
    let mut source = PathBuf::from(include.to_string_lossy().replace("/include/", "/src/"));
    if source.extension().is_some_and(|ext| ext == "h") {
        source.set_extension("C");
    }
    source
}

#[cfg(test)]
pub(crate) fn test_settings() -> Arc<PageSettings> {
    Arc::new(PageSettings::new(
        Arc::new(docsite_renderer::PulldownEngine::new()),
        TemplateEngine::new(Vec::new()),
    ))
}
