//! Site tree construction from a content directory.
//!
//! Layout rules:
//! - `<content>/index.md` is the root page
//! - other `.md` files become pages named by their file stem
//! - a directory with `index.md` becomes a page bound to that file
//! - a directory without `index.md` becomes a group
//!
//! Hidden entries are skipped and directory listings are sorted by name, so
//! the tree is the same on every platform.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::node::{NodeId, NodeKind, SiteTree, SiteTreeBuilder};
use crate::page::{PageData, PageError, PageSettings};

/// Error returned when the site tree cannot be constructed.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// `<content>/index.md` is missing.
    #[error("Root page not found: {}", .0.display())]
    MissingRoot(PathBuf),
    /// A content directory could not be listed.
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Two entries of one directory map to the same node name.
    #[error("Duplicate entry '{name}' in '{parent}'")]
    DuplicateName { name: String, parent: String },
    /// A page could not be created.
    #[error(transparent)]
    Page(#[from] PageError),
}

/// Reserved file names that never become child pages.
const RESERVED: [&str; 2] = ["index.md", "index.html"];

/// Builds a [`SiteTree`] from a content directory.
pub struct TreeBuilder {
    content_dir: PathBuf,
    site_dir: PathBuf,
    settings: Arc<PageSettings>,
}

impl TreeBuilder {
    /// Create a builder.
    ///
    /// # Arguments
    ///
    /// * `content_dir` - Directory with the markdown sources
    /// * `site_dir` - Output directory of the generated site
    /// * `settings` - Settings shared by every page
    #[must_use]
    pub fn new(
        content_dir: impl Into<PathBuf>,
        site_dir: impl Into<PathBuf>,
        settings: Arc<PageSettings>,
    ) -> Self {
        Self {
            content_dir: content_dir.into(),
            site_dir: site_dir.into(),
            settings,
        }
    }

    /// Walk the content directory and build the tree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] if the root page is missing, a directory can't be
    /// read or two entries map to the same name.
    pub fn build(&self) -> Result<SiteTree, TreeError> {
        let root_source = self.content_dir.join("index.md");
        if !root_source.is_file() {
            return Err(TreeError::MissingRoot(root_source));
        }
        let root = PageData::new(root_source, Arc::clone(&self.settings))?;
        let mut builder = SiteTreeBuilder::new(&self.site_dir, NodeKind::Page(root));

        let mut pending: Vec<(PathBuf, NodeId)> = vec![(self.content_dir.clone(), builder.root())];
        while let Some((dir, parent)) = pending.pop() {
            for (path, name, is_dir) in list_dir(&dir)? {
                if is_dir {
                    let index = path.join("index.md");
                    let child = if index.is_file() {
                        let page = PageData::new(index, Arc::clone(&self.settings))?;
                        builder.add_page(parent, &name, page)?
                    } else {
                        builder.add_group(parent, &name)?
                    };
                    tracing::debug!(path = %path.display(), "Added directory");
                    pending.push((path, child));
                } else if let Some(stem) = markdown_stem(&name) {
                    let page = PageData::new(&path, Arc::clone(&self.settings))?;
                    builder.add_page(parent, stem, page)?;
                    tracing::debug!(path = %path.display(), "Added page");
                }
            }
        }

        let tree = builder.build();
        tracing::info!(
            content = %self.content_dir.display(),
            nodes = tree.len(),
            "Built site tree"
        );
        Ok(tree)
    }
}

/// Visible entries of `dir` as `(path, name, is_dir)`, sorted by name.
fn list_dir(dir: &Path) -> Result<Vec<(PathBuf, String, bool)>, TreeError> {
    let read_error = |e| TreeError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || RESERVED.contains(&name.as_str()) {
            continue;
        }
        let path = entry.path();
        let is_dir = path.is_dir();
        entries.push((path, name, is_dir));
    }
    entries.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(entries)
}

fn markdown_stem(name: &str) -> Option<&str> {
    name.strip_suffix(".md").filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::node::NodeRef;
    use crate::page::test_settings;

    fn write(root: &Path, files: &[&str]) {
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "# Page\n").unwrap();
        }
    }

    fn build(root: &Path) -> Result<SiteTree, TreeError> {
        TreeBuilder::new(root.join("content"), root.join("site"), test_settings()).build()
    }

    #[test]
    fn test_missing_root_page() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("content")).unwrap();

        let result = build(temp_dir.path());

        assert!(matches!(result, Err(TreeError::MissingRoot(_))));
    }

    #[test]
    fn test_missing_content_dir() {
        let temp_dir = TempDir::new().unwrap();

        let result = build(temp_dir.path());

        assert!(matches!(result, Err(TreeError::MissingRoot(_))));
    }

    #[test]
    fn test_layout_rules() {
        let temp_dir = TempDir::new().unwrap();
        let content = temp_dir.path().join("content");
        write(
            &content,
            &[
                "index.md",
                "getting_started.md",
                "systems/index.md",
                "systems/Kernels.md",
                "systems/kernels/Diffusion.md",
                "media/notes.md",
            ],
        );
        fs::write(content.join("index.html"), "<p>reserved</p>").unwrap();
        fs::write(content.join("systems/image.png"), b"png").unwrap();

        let tree = build(temp_dir.path()).unwrap();

        let nodes: Vec<(String, bool)> = tree
            .root()
            .descendants()
            .iter()
            .map(|n| (n.rel_dir(), n.as_page().is_some()))
            .collect();
        assert_eq!(
            nodes,
            vec![
                (String::new(), true),
                ("getting_started".to_owned(), true),
                ("media".to_owned(), false),
                ("media/notes".to_owned(), true),
                ("systems".to_owned(), true),
                ("systems/Kernels".to_owned(), true),
                ("systems/kernels".to_owned(), false),
                ("systems/kernels/Diffusion".to_owned(), true),
            ]
        );
        assert_eq!(
            tree.root().source().unwrap(),
            content.join("index.md").as_path()
        );
        let systems = tree
            .root()
            .children()
            .find(|n| n.name() == "systems")
            .unwrap();
        assert_eq!(
            systems.source().unwrap(),
            content.join("systems/index.md").as_path()
        );
    }

    #[test]
    fn test_children_sorted_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let content = temp_dir.path().join("content");
        write(&content, &["index.md", "c.md", "a.md", "b/x.md"]);

        let tree = build(temp_dir.path()).unwrap();

        let names: Vec<&str> = tree.root().children().map(|n| n.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_hidden_entries_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let content = temp_dir.path().join("content");
        write(&content, &["index.md", ".hidden.md", ".git/config.md", "page.md"]);

        let tree = build(temp_dir.path()).unwrap();

        let names: Vec<&str> = tree.root().children().map(|n| n.name()).collect();
        assert_eq!(names, vec!["page"]);
    }

    #[test]
    fn test_duplicate_page_and_group_name() {
        let temp_dir = TempDir::new().unwrap();
        let content = temp_dir.path().join("content");
        write(&content, &["index.md", "guide.md", "guide/install.md"]);

        let result = build(temp_dir.path());

        assert!(matches!(
            result,
            Err(TreeError::DuplicateName { ref name, .. }) if name == "guide"
        ));
    }

    #[test]
    fn test_pages_flatten_pre_order() {
        let temp_dir = TempDir::new().unwrap();
        let content = temp_dir.path().join("content");
        write(
            &content,
            &["index.md", "a/index.md", "a/one.md", "b/two.md", "c.md"],
        );

        let tree = build(temp_dir.path()).unwrap();

        let pages: Vec<String> = tree.pages().iter().map(|p| p.node().rel_dir()).collect();
        assert_eq!(pages, vec!["", "a", "a/one", "b/two", "c"]);
        let dirs: Vec<String> = tree
            .root()
            .descendants()
            .iter()
            .map(NodeRef::rel_dir)
            .collect();
        assert_eq!(dirs, vec!["", "a", "a/one", "b", "b/two", "c"]);
    }
}
