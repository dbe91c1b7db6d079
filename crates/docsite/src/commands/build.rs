//! `docsite build` command implementation.

use std::path::PathBuf;

use clap::Args;
use docsite_build::{BuildError, BuildMode, StaticSiteBuilder};
use docsite_config::{CliSettings, Config};

use crate::LogSettings;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover docsite.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown content directory (overrides config).
    #[arg(long)]
    content_dir: Option<PathBuf>,

    /// Output directory for the generated site (overrides config).
    #[arg(long)]
    site_dir: Option<PathBuf>,

    /// Build pages one at a time on the main thread.
    #[arg(long)]
    disable_threads: bool,

    /// Number of parallel build workers (overrides config, 0 = all cores).
    #[arg(short, long, conflicts_with = "disable_threads")]
    jobs: Option<usize>,

    /// Enable verbose output (log progress).
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output (log every link and written page).
    #[arg(long)]
    debug: bool,
}

impl BuildArgs {
    pub(crate) fn log_settings(&self) -> LogSettings {
        LogSettings {
            verbose: self.verbose,
            debug: self.debug,
        }
    }

    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or the build fails.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            content_dir: self.content_dir,
            site_dir: self.site_dir,
            jobs: self.jobs,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let site = &config.site_resolved;

        output.info(&format!("Content: {}", site.content_dir.display()));
        output.info(&format!("Output: {}", site.site_dir.display()));

        let mode = if self.disable_threads {
            BuildMode::Sequential
        } else {
            BuildMode::Parallel { jobs: site.jobs }
        };
        let builder = StaticSiteBuilder::new(&config)?;
        let report = match builder.build(mode) {
            Ok(report) => report,
            Err(BuildError::Pages(errors)) => {
                for error in &errors {
                    output.error(&error.to_string());
                }
                return Err(BuildError::Pages(errors).into());
            }
            Err(err) => return Err(err.into()),
        };

        output.success(&format!(
            "Built {} pages and {} assets to {} in {:.2?}",
            report.pages,
            report.assets,
            site.site_dir.display(),
            report.elapsed
        ));
        Ok(())
    }
}
