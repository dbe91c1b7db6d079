//! Static site builder.
//!
//! A build constructs the site tree, flattens it in pre-order and builds every
//! page. Pages only read the immutable tree and write to their own output
//! directory, so they can run in any order. Asset mirroring starts after all
//! page builds have finished.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docsite_config::Config;
use docsite_renderer::PulldownEngine;
use docsite_site::{
    IndexError, MapObjectIndex, Navigation, NavigationError, NoObjects, ObjectIndex, PageError,
    PageRef, PageSettings, TemplateEngine, TreeBuilder, TreeError,
};
use rayon::prelude::*;

use crate::assets::{AssetError, copy_assets};

/// How page builds are scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// Build pages one after another on the calling thread.
    Sequential,
    /// Build pages on a thread pool with `jobs` workers (0 uses available
    /// parallelism).
    Parallel { jobs: usize },
}

impl Default for BuildMode {
    fn default() -> Self {
        Self::Parallel { jobs: 0 }
    }
}

/// Error returned by the static site builder.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Index(#[from] IndexError),
    /// First failure of a sequential build.
    #[error(transparent)]
    Page(#[from] PageError),
    /// Every failure of a parallel build.
    #[error("{} page(s) failed to build", .0.len())]
    Pages(Vec<PageError>),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Summary of a successful build.
#[derive(Clone, Copy, Debug)]
pub struct BuildReport {
    /// Pages written.
    pub pages: usize,
    /// Asset files copied.
    pub assets: usize,
    /// Wall time of the whole build.
    pub elapsed: Duration,
}

/// Builds a static documentation site from a content directory.
pub struct StaticSiteBuilder {
    content_dir: PathBuf,
    site_dir: PathBuf,
    asset_roots: Vec<PathBuf>,
    settings: Arc<PageSettings>,
}

impl StaticSiteBuilder {
    /// Create a builder from loaded configuration.
    ///
    /// Loads the navigation and object index files named by the config.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the navigation or object index file can't be
    /// loaded.
    pub fn new(config: &Config) -> Result<Self, BuildError> {
        let site = &config.site_resolved;

        let engine = Arc::new(PulldownEngine::with_media_root(site.project_dir.clone()));
        let mut settings = PageSettings::new(engine, TemplateEngine::new(site.template_dirs()));
        settings.template.clone_from(&site.template);
        settings.template_args.clone_from(&config.template_arguments);
        settings.navigation = site.navigation.as_deref().map(Navigation::load).transpose()?;
        settings.objects = match &site.object_index {
            Some(path) => Box::new(MapObjectIndex::load(path)?) as Box<dyn ObjectIndex>,
            None => Box::new(NoObjects),
        };
        settings.repo_root.clone_from(&site.repo_root);
        settings.edit_branch.clone_from(&site.edit_branch);
        settings.blob_branch.clone_from(&site.blob_branch);

        Ok(Self {
            content_dir: site.content_dir.clone(),
            site_dir: site.site_dir.clone(),
            asset_roots: site.asset_roots(),
            settings: Arc::new(settings),
        })
    }

    /// Build every page, then mirror the assets.
    ///
    /// Each call constructs a fresh site tree, so a builder can be reused.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Tree`] before any page is built if the tree
    /// can't be constructed. A sequential build returns the first
    /// [`BuildError::Page`]; a parallel build attempts every page and returns
    /// all failures as [`BuildError::Pages`]. Assets are not copied when any
    /// page fails.
    pub fn build(&self, mode: BuildMode) -> Result<BuildReport, BuildError> {
        let start = Instant::now();
        let tree = TreeBuilder::new(
            self.content_dir.clone(),
            self.site_dir.clone(),
            Arc::clone(&self.settings),
        )
        .build()?;
        let pages = tree.pages();

        tracing::info!(pages = pages.len(), ?mode, "Building pages");
        match mode {
            BuildMode::Sequential => build_sequential(&pages)?,
            BuildMode::Parallel { jobs } => build_parallel(&pages, jobs)?,
        }

        let assets = copy_assets(&self.asset_roots, &self.site_dir)?;
        let report = BuildReport {
            pages: pages.len(),
            assets,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            pages = report.pages,
            assets = report.assets,
            elapsed = ?report.elapsed,
            site = %self.site_dir.display(),
            "Built site"
        );
        Ok(report)
    }
}

fn build_sequential(pages: &[PageRef<'_>]) -> Result<(), BuildError> {
    for page in pages {
        page.build()?;
    }
    Ok(())
}

fn build_parallel(pages: &[PageRef<'_>], jobs: usize) -> Result<(), BuildError> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let results: Vec<Result<(), PageError>> =
        pool.install(|| pages.par_iter().map(PageRef::build).collect());

    let failures: Vec<PageError> = results.into_iter().filter_map(Result::err).collect();
    if failures.is_empty() {
        return Ok(());
    }
    for error in &failures {
        tracing::error!(%error, "Page build failed");
    }
    Err(BuildError::Pages(failures))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use docsite_config::CliSettings;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    struct Project {
        temp_dir: TempDir,
    }

    impl Project {
        fn new(config: &str) -> Self {
            let temp_dir = TempDir::new().unwrap();
            let root = temp_dir.path();
            fs::write(root.join("docsite.toml"), config).unwrap();
            for (path, content) in [
                (
                    "content/index.md",
                    "# Home\n\nRead the [install guide](guide/install.md).\n",
                ),
                (
                    "content/guide/install.md",
                    "# Install\n\n## Steps\n\n```bash\nmake\n```\n\nBack [home](index.md).\n",
                ),
                ("css/site.css", "body {}"),
            ] {
                let path = root.join(path);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, content).unwrap();
            }
            Self { temp_dir }
        }

        fn root(&self) -> &Path {
            self.temp_dir.path()
        }

        fn builder(&self, site_dir: &str) -> StaticSiteBuilder {
            let settings = CliSettings {
                site_dir: Some(self.root().join(site_dir)),
                ..CliSettings::default()
            };
            let path = self.root().join("docsite.toml");
            let config = Config::load(Some(path.as_path()), Some(&settings)).unwrap();
            StaticSiteBuilder::new(&config).unwrap()
        }

        fn read(&self, path: &str) -> String {
            fs::read_to_string(self.root().join(path)).unwrap()
        }
    }

    const CONFIG: &str = "[template_arguments]\ntitle = \"Docs\"\n";

    #[test]
    fn test_sequential_build() {
        let project = Project::new(CONFIG);

        let report = project.builder("site").build(BuildMode::Sequential).unwrap();

        assert_eq!(report.pages, 2);
        assert_eq!(report.assets, 1);
        let home = project.read("site/index.html");
        assert!(home.contains(r#"href="guide/install/index.html""#));
        assert!(home.contains("<title>Docs</title>"));
        let install = project.read("site/guide/install/index.html");
        assert!(install.contains(r#"href="../../index.html""#));
        assert!(install.contains(r#"<div class="section scrollspy" id="steps">"#));
        assert!(install.contains(r#"<pre class="language-bash"><button class="moose-copy-button btn""#));
        assert_eq!(project.read("site/css/site.css"), "body {}");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let project = Project::new(CONFIG);

        project.builder("sequential").build(BuildMode::Sequential).unwrap();
        let report = project
            .builder("parallel")
            .build(BuildMode::Parallel { jobs: 2 })
            .unwrap();

        assert_eq!(report.pages, 2);
        for page in ["index.html", "guide/install/index.html", "css/site.css"] {
            assert_eq!(
                project.read(&format!("parallel/{page}")),
                project.read(&format!("sequential/{page}"))
            );
        }
    }

    #[test]
    fn test_builder_is_reusable() {
        let project = Project::new(CONFIG);
        let builder = project.builder("site");

        builder.build(BuildMode::default()).unwrap();
        let report = builder.build(BuildMode::default()).unwrap();

        assert_eq!(report.pages, 2);
    }

    #[test]
    fn test_sequential_stops_at_first_failure() {
        let project = Project::new("[site]\ntemplate = \"missing.html\"\n");

        let result = project.builder("site").build(BuildMode::Sequential);

        assert!(matches!(
            result,
            Err(BuildError::Page(PageError::Template(_)))
        ));
        assert!(!project.root().join("site/css").exists());
    }

    #[test]
    fn test_parallel_collects_all_failures() {
        let project = Project::new("[site]\ntemplate = \"missing.html\"\n");

        let result = project
            .builder("site")
            .build(BuildMode::Parallel { jobs: 2 });

        let Err(BuildError::Pages(errors)) = result else {
            panic!("expected page failures");
        };
        assert_eq!(errors.len(), 2);
        assert!(!project.root().join("site/css").exists());
    }

    #[test]
    fn test_parallel_failure_does_not_cancel_other_pages() {
        let project = Project::new(CONFIG);
        fs::write(
            project.root().join("content/broken.md"),
            "---\n- not\n- a mapping\n---\n# Broken\n",
        )
        .unwrap();

        let result = project
            .builder("site")
            .build(BuildMode::Parallel { jobs: 2 });

        let Err(BuildError::Pages(errors)) = result else {
            panic!("expected page failures");
        };
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], PageError::FrontMatter { .. }));
        assert!(project.root().join("site/index.html").is_file());
        assert!(project.root().join("site/guide/install/index.html").is_file());
        assert!(!project.root().join("site/broken/index.html").exists());
    }

    #[test]
    fn test_missing_root_page() {
        let project = Project::new(CONFIG);
        fs::remove_file(project.root().join("content/index.md")).unwrap();

        let result = project.builder("site").build(BuildMode::Sequential);

        assert!(matches!(
            result,
            Err(BuildError::Tree(TreeError::MissingRoot(_)))
        ));
    }

    #[test]
    fn test_navigation_loaded() {
        let project = Project::new(
            "[site]\nnavigation = \"navigation.yml\"\n[template_arguments]\ntitle = \"Docs\"\n",
        );
        fs::write(
            project.root().join("navigation.yml"),
            "- Home: index.md\n- Guide:\n  - Install: guide/install.md\n",
        )
        .unwrap();

        project.builder("site").build(BuildMode::Sequential).unwrap();

        let install = project.read("site/guide/install/index.html");
        assert!(install.contains("moose-navigation"));
        assert!(install.contains(">Install</a>"));
    }
}
