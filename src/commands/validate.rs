//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks a
//! `.repo-triage.yaml` configuration (and optionally an inventory snapshot)
//! without triaging anything.
//!
//! ## Functionality
//!
//! - **Configuration Validation**: Parses the file and runs every check a triage
//!   run would: allowlist uniqueness, thresholds, keywords and name patterns.
//! - **Snapshot Validation**: With `--inventory`, also loads the snapshot and
//!   reports how many entries are usable and which ones are malformed.
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use repo_triage::config::TriageConfig;
use repo_triage::inventory;
use repo_triage::output::{emoji, OutputConfig};
use super::{ConfigArgs, InventoryArgs};

/// Validate a .repo-triage.yaml configuration file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Also check that this inventory snapshot loads (`-` for stdin).
    #[arg(short, long, value_name = "FILE")]
    pub inventory: Option<PathBuf>,

    /// The entry limit the snapshot was fetched with.
    #[arg(long, value_name = "N", requires = "inventory")]
    pub fetch_limit: Option<usize>,

    /// Use strict validation (fail when snapshot entries are malformed).
    #[arg(long)]
    pub strict: bool,
}

/// Execute the `validate` command.
///
/// `color_flag` is the value of the global `--color` flag.
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let config = match args.config.load() {
        Ok(config) => {
            println!(
                "{} Configuration is valid",
                emoji(&out, "✅", "[OK]")
            );
            config
        }
        Err(e) => {
            println!(
                "{} Configuration is invalid",
                emoji(&out, "❌", "[ERR]")
            );
            return Err(e);
        }
    };
    print_summary(&config);

    let Some(path) = args.inventory else {
        return Ok(());
    };

    let inventory_args = InventoryArgs {
        inventory: path,
        fetch_limit: args.fetch_limit,
        now: None,
    };
    let source = inventory_args.source()?;
    let snapshot = source.fetch()?;
    let loaded = inventory::load(&snapshot)?;
    println!(
        "\n{} Snapshot {} loads: {} repositories",
        emoji(&out, "✅", "[OK]"),
        source.describe(),
        loaded.len()
    );

    let unclassifiable = loaded.unclassifiable();
    if unclassifiable.is_empty() {
        return Ok(());
    }
    println!(
        "{} {} entries cannot be classified:",
        emoji(&out, "⚠️", "[WARN]"),
        unclassifiable.len()
    );
    for entry in unclassifiable {
        println!("   #{} {}: {}", entry.index, entry.name.as_deref().unwrap_or("<unnamed>"), entry.reason);
    }
    if args.strict {
        anyhow::bail!(
            "{} malformed snapshot entries (strict mode)",
            unclassifiable.len()
        );
    }
    Ok(())
}

fn print_summary(config: &TriageConfig) {
    println!("   Allowlisted repositories: {}", config.allowlist().len());
    println!(
        "   Inactivity threshold: {} days",
        config.inactivity_threshold_days()
    );
    println!(
        "   Minimum description length: {} characters",
        config.min_description_length()
    );
    println!(
        "   Template keywords: {}",
        config.template_keywords().join(", ")
    );
    if !config.template_name_patterns().is_empty() {
        println!(
            "   Template name patterns: {}",
            config
                .template_name_patterns()
                .iter()
                .map(|pattern| pattern.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}
