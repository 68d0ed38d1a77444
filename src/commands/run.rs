//! # Run Command Implementation
//!
//! This module implements the `run` subcommand, which performs a complete
//! triage of an inventory snapshot and delivers the report.
//!
//! ## Process
//!
//! 1. **Load Configuration**: Read and validate the allowlist and thresholds.
//!    Nothing else happens if this fails.
//! 2. **Triage**: Fetch, load, classify and reconcile the snapshot.
//! 3. **Deliver**: Print the report (text or JSON), and optionally write it to a
//!    file and write the per-tier delete lists.
//!
//! The command is read-only with respect to the repositories themselves: it
//! only produces recommendations.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use log::debug;

use repo_triage::output::{emoji, OutputConfig};
use repo_triage::pipeline;
use repo_triage::report::RenderOptions;
use repo_triage::rules::RuleEngine;
use repo_triage::sink::{DeleteListSink, FileSink, ReportFormat, ReportSink, WriterSink};

use super::{ConfigArgs, InventoryArgs};

/// Report rendering selectable on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Human-readable text report
    #[default]
    Text,
    /// Machine-readable JSON report
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

/// Triage an inventory snapshot
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub inventory: InventoryArgs,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Report format.
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    pub format: FormatArg,

    /// Also write the report to this file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write keep.txt and delete_<tier>.txt name lists into this directory.
    #[arg(long, value_name = "DIR")]
    pub delete_lists: Option<PathBuf>,

    /// List at most this many repositories per section in the text report.
    #[arg(long, value_name = "N")]
    pub max_listed: Option<usize>,

    /// Do not print the report to stdout.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the `run` command.
pub fn execute(args: RunArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let config = args.config.load()?;
    let engine = RuleEngine::with_builtin_rules();
    debug!("Rules: {}", engine.rule_names().join(", "));

    let source = args.inventory.source()?;
    let outcome = pipeline::run(source.as_ref(), &config, &engine, args.inventory.now)?;

    let format = ReportFormat::from(args.format);
    let options = RenderOptions {
        max_listed: args.max_listed,
    };

    let mut sinks: Vec<Box<dyn ReportSink>> = Vec::new();
    if !args.quiet {
        sinks.push(Box::new(WriterSink::new(
            std::io::stdout().lock(),
            format,
            options.clone(),
        )));
    }
    if let Some(path) = &args.output {
        sinks.push(Box::new(FileSink::new(path, format, options.clone())));
    }
    if let Some(dir) = &args.delete_lists {
        sinks.push(Box::new(DeleteListSink::new(dir)));
    }

    for sink in &mut sinks {
        sink.deliver(&outcome.report)?;
    }

    if !outcome.report.unclassifiable.is_empty() {
        eprintln!(
            "{} {} snapshot entries could not be classified",
            emoji(&out, "⚠️", "[WARN]"),
            outcome.report.unclassifiable.len()
        );
    }
    if let Some(dir) = &args.delete_lists {
        eprintln!(
            "{} Delete lists written to {}",
            emoji(&out, "✅", "[OK]"),
            dir.display()
        );
    }

    Ok(())
}
