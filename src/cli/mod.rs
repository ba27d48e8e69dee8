//! CLI module for Dossier
//!
//! Provides command-line interface parsing for the dossier-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dossier - research-report orchestration server
#[derive(Parser, Debug)]
#[command(
    name = "dossier-server",
    version,
    about = "Dossier - research reports from a validated graph of agent tasks",
    long_about = "Dossier builds structured research reports from a single query: search,\n\
                  extract, write report sections in parallel, attach images, then validate and\n\
                  publish the report under a slug.\n\n\
                  Run without arguments to start the HTTP server.",
    after_help = "EXAMPLES:\n    \
                  dossier-server                            # Start the server (reads dossier.toml)\n    \
                  dossier-server --config my.toml serve     # Use a custom config file\n    \
                  dossier-server research \"flood in Texas\"  # Produce one report and print it\n    \
                  dossier-server check-config               # Validate the configuration"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(
        short,
        long,
        env = "DOSSIER_CONFIG",
        default_value = crate::utils::toml_config::DEFAULT_CONFIG_FILE,
        global = true
    )]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Run the pipeline once and print the report as JSON
    Research {
        /// Research topic, e.g. "flood in Texas"
        query: String,
    },

    /// Validate the configuration file and print a summary
    CheckConfig,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run, defaulting to `serve`
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}
