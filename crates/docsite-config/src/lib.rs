//! Configuration management for docsite.
//!
//! Parses `docsite.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.framework_dir`
//! - `site.repo_root`
//! - every string inside `[template_arguments]`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override markdown content directory.
    pub content_dir: Option<PathBuf>,
    /// Override site output directory.
    pub site_dir: Option<PathBuf>,
    /// Override number of parallel build workers.
    pub jobs: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docsite.toml";

/// Template used when the config does not name one. A built-in copy is
/// always available to the page renderer.
pub const DEFAULT_TEMPLATE: &str = "default.html";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site configuration (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Base arguments passed to every template render.
    pub template_arguments: Map<String, Value>,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw site configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    content_dir: Option<String>,
    site_dir: Option<String>,
    template: Option<String>,
    navigation: Option<String>,
    framework_dir: Option<String>,
    object_index: Option<String>,
    repo_root: Option<String>,
    edit_branch: Option<String>,
    blob_branch: Option<String>,
    jobs: Option<usize>,
}

/// Resolved site configuration with absolute paths.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Directory containing the markdown sources (`index.md` at its root).
    pub content_dir: PathBuf,
    /// Output root of the generated site.
    pub site_dir: PathBuf,
    /// Project directory (the directory holding `docsite.toml`).
    pub project_dir: PathBuf,
    /// Template name rendered for every page.
    pub template: String,
    /// YAML navigation file, if configured.
    pub navigation: Option<PathBuf>,
    /// Framework directory providing shared `templates`, `js`, `css` and `media`.
    pub framework_dir: Option<PathBuf>,
    /// YAML documentation-object index, if configured.
    pub object_index: Option<PathBuf>,
    /// Repository root used to compute edit and source links.
    pub repo_root: PathBuf,
    /// Branch used in "Edit Markdown" links.
    pub edit_branch: String,
    /// Branch used in header and source links.
    pub blob_branch: String,
    /// Parallel build workers (0 uses available parallelism).
    pub jobs: usize,
}

impl SiteConfig {
    /// Template search path: framework templates first, then project templates.
    #[must_use]
    pub fn template_dirs(&self) -> Vec<PathBuf> {
        self.framework_dir
            .iter()
            .map(|dir| dir.join("templates"))
            .chain(std::iter::once(self.project_dir.join("templates")))
            .collect()
    }

    /// Asset roots in copy order: framework assets first, then project assets.
    #[must_use]
    pub fn asset_roots(&self) -> Vec<PathBuf> {
        self.framework_dir
            .iter()
            .cloned()
            .chain(std::iter::once(self.project_dir.clone()))
            .collect()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.framework_dir`").
        field: String,
        /// Error message (e.g., "${`FRAMEWORK_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docsite.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(content_dir) = &settings.content_dir {
            self.site_resolved.content_dir.clone_from(content_dir);
        }
        if let Some(site_dir) = &settings.site_dir {
            self.site_resolved.site_dir.clone_from(site_dir);
        }
        if let Some(jobs) = settings.jobs {
            self.site_resolved.jobs = jobs;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfigRaw::default(),
            template_arguments: Map::new(),
            site_resolved: SiteConfig {
                content_dir: base.join("content"),
                site_dir: base.join("site"),
                project_dir: base.to_path_buf(),
                template: DEFAULT_TEMPLATE.to_owned(),
                navigation: None,
                framework_dir: None,
                object_index: None,
                repo_root: base.to_path_buf(),
                edit_branch: "devel".to_owned(),
                blob_branch: "master".to_owned(),
                jobs: 0,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.site_resolved.template, "site.template")?;
        require_non_empty(&self.site_resolved.edit_branch, "site.edit_branch")?;
        require_non_empty(&self.site_resolved.blob_branch, "site.blob_branch")?;

        if let Some(repo_url) = self.template_arguments.get("repo_url") {
            let Some(url) = repo_url.as_str() else {
                return Err(ConfigError::Validation(
                    "template_arguments.repo_url must be a string".to_owned(),
                ));
            };
            require_http_url(url, "template_arguments.repo_url")?;
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.site.framework_dir {
            self.site.framework_dir = Some(expand::expand_env(dir, "site.framework_dir")?);
        }
        if let Some(ref dir) = self.site.repo_root {
            self.site.repo_root = Some(expand::expand_env(dir, "site.repo_root")?);
        }
        for (key, value) in &mut self.template_arguments {
            expand::expand_value(value, &format!("template_arguments.{key}"))?;
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));
        let resolve_opt = |path: Option<&str>| path.map(|p| config_dir.join(p));

        let site = &self.site;
        self.site_resolved = SiteConfig {
            content_dir: resolve(site.content_dir.as_deref(), "content"),
            site_dir: resolve(site.site_dir.as_deref(), "site"),
            project_dir: config_dir.to_path_buf(),
            template: site
                .template
                .clone()
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_owned()),
            navigation: resolve_opt(site.navigation.as_deref()),
            framework_dir: resolve_opt(site.framework_dir.as_deref()),
            object_index: resolve_opt(site.object_index.as_deref()),
            repo_root: site
                .repo_root
                .as_deref()
                .map_or_else(|| config_dir.to_path_buf(), |p| config_dir.join(p)),
            edit_branch: site
                .edit_branch
                .clone()
                .unwrap_or_else(|| "devel".to_owned()),
            blob_branch: site
                .blob_branch
                .clone()
                .unwrap_or_else(|| "master".to_owned()),
            jobs: site.jobs.unwrap_or(0),
        };
    }
}
