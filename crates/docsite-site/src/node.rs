//! Site tree for the output hierarchy.
//!
//! Nodes are stored in a flat `Vec<Node>` with parent/children relationships
//! tracked by [`NodeId`] indices. The root is always the first node and has an
//! empty name, so its output path is the site directory itself. Once built
//! the structure never changes; the only mutable state is each page's
//! rendered HTML, which is set once per build.
//!
//! Output paths are derived from names only, so [`NodeRef::path`] and
//! [`NodeRef::url`] never touch the filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use docsite_renderer::relative_path;

use crate::loader::TreeError;
use crate::page::{PageData, PageRef};

/// Index of a node within its [`SiteTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// What a node represents.
pub enum NodeKind {
    /// Directory without its own page. Only groups other nodes.
    Group,
    /// Markdown page rendered to `<path>/index.html`.
    Page(PageData),
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => f.write_str("Group"),
            Self::Page(data) => f.debug_tuple("Page").field(&data.source()).finish(),
        }
    }
}

#[derive(Debug)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Immutable site hierarchy.
///
/// `SiteTree` is `Send + Sync`; page builds running on different threads
/// share one `&SiteTree` for link resolution.
#[derive(Debug)]
pub struct SiteTree {
    nodes: Vec<Node>,
    site_dir: PathBuf,
}

impl SiteTree {
    /// Root node.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: NodeId(0),
        }
    }

    /// Number of nodes, pages and groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes. Always `false` for a built tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Site output directory.
    #[must_use]
    pub fn site_dir(&self) -> &Path {
        &self.site_dir
    }

    /// All pages in pre-order, root first.
    ///
    /// This is the flattened build unit used by the build scheduler.
    #[must_use]
    pub fn pages(&self) -> Vec<PageRef<'_>> {
        self.root()
            .descendants()
            .into_iter()
            .filter_map(NodeRef::as_page)
            .collect()
    }
}

/// Builder for constructing a [`SiteTree`].
pub struct SiteTreeBuilder {
    nodes: Vec<Node>,
    site_dir: PathBuf,
}

impl SiteTreeBuilder {
    /// Create a builder whose root node has the given kind.
    #[must_use]
    pub fn new(site_dir: impl Into<PathBuf>, root: NodeKind) -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                parent: None,
                children: Vec::new(),
                kind: root,
            }],
            site_dir: site_dir.into(),
        }
    }

    /// Root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a group node under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateName`] if `parent` already has a child
    /// named `name`.
    pub fn add_group(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        self.add(parent, name, NodeKind::Group)
    }

    /// Add a page node under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateName`] if `parent` already has a child
    /// named `name`.
    pub fn add_page(
        &mut self,
        parent: NodeId,
        name: &str,
        page: PageData,
    ) -> Result<NodeId, TreeError> {
        self.add(parent, name, NodeKind::Page(page))
    }

    fn add(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> Result<NodeId, TreeError> {
        if self.nodes[parent.0]
            .children
            .iter()
            .any(|&c| self.nodes[c.0].name == name)
        {
            return Err(TreeError::DuplicateName {
                name: name.to_owned(),
                parent: self.nodes[parent.0].name.clone(),
            });
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_owned(),
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Finish construction.
    #[must_use]
    pub fn build(self) -> SiteTree {
        SiteTree {
            nodes: self.nodes,
            site_dir: self.site_dir,
        }
    }
}

/// Borrowed handle to a node, giving uniform traversal over the tree.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a SiteTree,
    id: NodeId,
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("path", &self.rel_dir())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a Node {
        &self.tree.nodes[self.id.0]
    }

    /// Node name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    /// Page view of this node, if it is a page.
    #[must_use]
    pub fn as_page(self) -> Option<PageRef<'a>> {
        match &self.node().kind {
            NodeKind::Page(data) => Some(PageRef::new(self, data)),
            NodeKind::Group => None,
        }
    }

    /// Source markdown file, if this node is a page.
    #[must_use]
    pub fn source(&self) -> Option<&'a Path> {
        match &self.node().kind {
            NodeKind::Page(data) => Some(data.source()),
            NodeKind::Group => None,
        }
    }

    /// Parent node (`None` for the root).
    #[must_use]
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| NodeRef {
            tree: self.tree,
            id,
        })
    }

    /// Children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Root of the tree.
    #[must_use]
    pub fn root(&self) -> NodeRef<'a> {
        self.tree.root()
    }

    /// Ancestors from the root down to this node, inclusive.
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<NodeRef<'a>> {
        let mut crumbs = vec![*self];
        let mut current = self.parent();
        while let Some(node) = current {
            crumbs.push(node);
            current = node.parent();
        }
        crumbs.reverse();
        crumbs
    }

    /// Output directory relative to the site root, `/`-separated.
    ///
    /// Empty for the root.
    #[must_use]
    pub fn rel_dir(&self) -> String {
        self.breadcrumbs()
            .iter()
            .map(NodeRef::name)
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Output directory: the site directory joined with the ancestor names.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        let rel = self.rel_dir();
        if rel.is_empty() {
            self.tree.site_dir.clone()
        } else {
            self.tree.site_dir.join(rel)
        }
    }

    /// Output file written by a page build.
    #[must_use]
    pub fn output_file(&self) -> PathBuf {
        self.path().join("index.html")
    }

    /// URL of this node's `index.html`.
    ///
    /// Without `relative_to` the URL is relative to the site root. With
    /// `relative_to` it is relative to that node's output directory.
    #[must_use]
    pub fn url(&self, relative_to: Option<NodeRef<'_>>) -> String {
        let rel = self.rel_dir();
        let target = if rel.is_empty() {
            "index.html".to_owned()
        } else {
            format!("{rel}/index.html")
        };
        match relative_to {
            Some(from) => from.relpath(&target),
            None => target,
        }
    }

    /// Relative path from this node's output directory to `target`, given
    /// relative to the site root.
    #[must_use]
    pub fn relpath(&self, target: &str) -> String {
        relative_path(&self.rel_dir(), target)
    }

    /// All nodes of this subtree in pre-order, starting with this node.
    #[must_use]
    pub fn descendants(&self) -> Vec<NodeRef<'a>> {
        let mut result = Vec::new();
        let mut stack = vec![*self];
        while let Some(node) = stack.pop() {
            result.push(node);
            let children = &node.node().children;
            stack.extend(children.iter().rev().map(|&id| NodeRef {
                tree: self.tree,
                id,
            }));
        }
        result
    }

    /// Pages in this subtree whose source path ends with `suffix`.
    ///
    /// Results are in pre-order, so the first entry is the first match found
    /// by a depth-first search from this node.
    #[must_use]
    pub fn find_by_source_suffix(&self, suffix: &str) -> Vec<NodeRef<'a>> {
        self.descendants()
            .into_iter()
            .filter(|node| {
                node.source()
                    .is_some_and(|source| source.to_string_lossy().ends_with(suffix))
            })
            .collect()
    }
}
