//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Repository Triage - Recommend which repositories to keep or delete
#[derive(Parser, Debug)]
#[command(name = "repo-triage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Triage an inventory snapshot and report keep/delete recommendations
    Run(commands::run::RunArgs),

    /// Validate a .repo-triage.yaml configuration file
    Validate(commands::validate::ValidateArgs),

    /// Show which rules fired for one repository and how it was resolved
    Explain(commands::explain::ExplainArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Run(args) => commands::run::execute(args, &self.color),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
            Commands::Explain(args) => commands::explain::execute(args, &self.color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Logs go to stderr. `RUST_LOG`, when set, overrides `--log-level`.
fn init_logging(level: &str) {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    // A logger may already be installed when running under a test harness
    let _ = env_logger::Builder::new()
        .parse_filters(&filters)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
