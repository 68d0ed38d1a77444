//! # Explain Command Implementation
//!
//! This module implements the `explain` subcommand. It runs the same triage as
//! `run` and then shows, for the requested repositories, every rule that
//! fired, the tag it produced and the disposition the tags resolved to.

use anyhow::{bail, Result};
use clap::Args;

use repo_triage::output::{emoji, OutputConfig};
use repo_triage::pipeline::{self, Explanation};
use repo_triage::rules::RuleEngine;

use super::{ConfigArgs, InventoryArgs};

/// Show why repositories were kept or recommended for deletion
#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Repository names to explain.
    #[arg(required = true, value_name = "NAME")]
    pub names: Vec<String>,

    #[command(flatten)]
    pub inventory: InventoryArgs,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the explanations as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the `explain` command.
pub fn execute(args: ExplainArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let config = args.config.load()?;
    let engine = RuleEngine::with_builtin_rules();
    let source = args.inventory.source()?;
    let outcome = pipeline::run(source.as_ref(), &config, &engine, args.inventory.now)?;

    let mut explanations = Vec::with_capacity(args.names.len());
    for name in &args.names {
        match outcome.explain(&engine, &config, name) {
            Some(explanation) => explanations.push(explanation),
            None => {
                if let Some(entry) = outcome
                    .inventory
                    .unclassifiable()
                    .iter()
                    .find(|entry| entry.name.as_deref() == Some(name.as_str()))
                {
                    bail!("'{}' could not be classified: {}", name, entry.reason);
                }
                bail!("'{}' is not in the inventory", name);
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&explanations)?);
        return Ok(());
    }

    for explanation in &explanations {
        print_explanation(&out, explanation);
    }
    Ok(())
}

fn print_explanation(out: &OutputConfig, explanation: &Explanation) {
    println!(
        "{} {}: {}",
        emoji(out, "📦", "-"),
        explanation.name,
        out.disposition(explanation.disposition)
    );
    if explanation.hits.is_empty() {
        println!("    no rule fired");
    }
    for hit in &explanation.hits {
        println!("    {:<20} -> {}", hit.rule, hit.tag);
    }
}
