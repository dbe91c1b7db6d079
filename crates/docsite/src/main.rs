//! docsite CLI - static documentation site generator.
//!
//! Provides commands for:
//! - `build`: Build the site from the configured content directory

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::BuildArgs;
use output::Output;

/// docsite - static documentation site generator.
#[derive(Parser)]
#[command(name = "docsite", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the documentation site.
    Build(BuildArgs),
}

impl Commands {
    fn log_settings(&self) -> LogSettings {
        match self {
            Self::Build(args) => args.log_settings(),
        }
    }
}

/// Log verbosity requested on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct LogSettings {
    /// Log progress at INFO level.
    pub verbose: bool,
    /// Log details at DEBUG level.
    pub debug: bool,
}

impl LogSettings {
    /// Filter for the tracing subscriber.
    ///
    /// `--debug` wins over `--verbose`; without either, `RUST_LOG` is used
    /// and falls back to WARN.
    fn filter(self) -> EnvFilter {
        if self.debug {
            EnvFilter::new("debug")
        } else if self.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let filter = cli.command.log_settings().filter();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
