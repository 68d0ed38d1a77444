//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `repo-triage` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `repo_triage` library.
//!
//! Arguments shared by several commands (configuration lookup, inventory
//! source) live here.

pub mod completions;
pub mod explain;
pub mod run;
pub mod validate;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use log::info;

use repo_triage::config::TriageConfig;
use repo_triage::defaults::DEFAULT_CONFIG_FILE;
use repo_triage::error::Error;
use repo_triage::inventory::parse_timestamp;
use repo_triage::source::{check_fetch_limit, parse_snapshot, FileSource, InventorySource, StaticSource};

/// Where the configuration comes from.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to the configuration file.
    ///
    /// When omitted, `.repo-triage.yaml` in the current directory is used if it
    /// exists, and the built-in defaults otherwise.
    #[arg(short, long, value_name = "FILE", env = "REPO_TRIAGE_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<TriageConfig> {
        if let Some(path) = &self.config {
            return Ok(TriageConfig::from_file(path)?);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Ok(TriageConfig::from_file(default_path)?);
        }
        info!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
        Ok(TriageConfig::default())
    }
}

/// Where the inventory snapshot comes from.
#[derive(Args, Debug)]
pub struct InventoryArgs {
    /// Inventory snapshot (JSON or YAML) produced by the fetch step, or `-` for stdin.
    #[arg(short, long, value_name = "FILE")]
    pub inventory: PathBuf,

    /// The entry limit the snapshot was fetched with.
    ///
    /// A snapshot that reaches this many entries is treated as truncated and
    /// rejected.
    #[arg(long, value_name = "N")]
    pub fetch_limit: Option<usize>,

    /// Reference time for activity checks (RFC 3339).
    ///
    /// Defaults to the snapshot's `capturedAt`, then to the current time.
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_timestamp)]
    pub now: Option<DateTime<Utc>>,
}

impl InventoryArgs {
    pub fn source(&self) -> Result<Box<dyn InventorySource>> {
        if self.inventory.as_os_str() == "-" {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .map_err(|e| Error::fetch(format!("cannot read stdin: {}", e)))?;
            let snapshot = parse_snapshot(&content)?;
            check_fetch_limit(&snapshot, self.fetch_limit)?;
            return Ok(Box::new(StaticSource::new(snapshot).with_origin("stdin")));
        }

        let mut source = FileSource::new(&self.inventory);
        if let Some(limit) = self.fetch_limit {
            source = source.with_fetch_limit(limit);
        }
        Ok(Box::new(source))
    }
}
