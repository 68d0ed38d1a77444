//! Inventory sources: the boundary with the fetch collaborator.
//!
//! The engine never talks to a hosting provider. Something else produces a
//! snapshot (for example `gh repo list --json name,description,isFork,pushedAt`
//! redirected to a file) and an [`InventorySource`] hands it over. Every source
//! is all-or-nothing: anything short of a complete snapshot is an
//! [`Error::Fetch`].

use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::inventory::{RawEntry, RawSnapshot};

/// Supplies one complete snapshot per call.
pub trait InventorySource {
    fn fetch(&self) -> Result<RawSnapshot>;

    /// Human-readable origin, for log lines and reports.
    fn describe(&self) -> String;
}

/// The wrapped form of a snapshot document.
///
/// Entries stay generic here so that one badly typed entry cannot fail the
/// whole document; [`RawEntry::from_value`] decodes them one by one.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WrappedSnapshot {
    #[serde(default = "default_complete")]
    complete: bool,
    #[serde(default)]
    captured_at: Option<String>,
    repositories: Vec<Value>,
}

fn default_complete() -> bool {
    true
}

/// Parse a snapshot document. JSON is tried first, then YAML.
///
/// Accepts a bare array of entries or an object with a `repositories` array.
/// Only a document that is unreadable or has the wrong top-level shape is an
/// [`Error::Fetch`]; entry-level problems surface later as unclassifiable
/// entries.
pub fn parse_snapshot(content: &str) -> Result<RawSnapshot> {
    let document = match serde_json::from_str::<Value>(content) {
        Ok(document) => document,
        Err(json_error) => serde_yaml::from_str::<Value>(content).map_err(|yaml_error| {
            Error::fetch(format!(
                "snapshot is neither JSON ({}) nor YAML ({})",
                json_error, yaml_error
            ))
        })?,
    };

    match document {
        Value::Array(entries) => Ok(RawSnapshot::new(decode_entries(entries))),
        Value::Object(_) => {
            let wrapped: WrappedSnapshot = serde_json::from_value(document).map_err(|e| {
                Error::fetch(format!("snapshot is not a valid inventory document: {}", e))
            })?;
            Ok(RawSnapshot {
                complete: wrapped.complete,
                captured_at: wrapped.captured_at,
                repositories: decode_entries(wrapped.repositories),
            })
        }
        other => Err(Error::fetch(format!(
            "snapshot must be an array of repositories or an object with 'repositories', found {}",
            kind_of(&other)
        ))),
    }
}

fn decode_entries(entries: Vec<Value>) -> Vec<RawEntry> {
    entries.into_iter().map(RawEntry::from_value).collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads a snapshot file written by the fetch collaborator.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    fetch_limit: Option<usize>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fetch_limit: None,
        }
    }

    /// The `--limit` the snapshot was fetched with.
    ///
    /// A snapshot holding exactly that many entries was most likely cut off,
    /// so it is rejected rather than triaged.
    pub fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = Some(limit);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InventorySource for FileSource {
    fn fetch(&self) -> Result<RawSnapshot> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::fetch(format!("cannot read {}: {}", self.path.display(), e)))?;
        let snapshot = parse_snapshot(&content)?;
        debug!(
            "Read {} entries from {}",
            snapshot.repositories.len(),
            self.path.display()
        );
        check_fetch_limit(&snapshot, self.fetch_limit)?;
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Serves a snapshot that is already in memory.
#[derive(Debug, Clone)]
pub struct StaticSource {
    snapshot: RawSnapshot,
    origin: String,
}

impl StaticSource {
    pub fn new(snapshot: RawSnapshot) -> Self {
        Self {
            snapshot,
            origin: "in-memory snapshot".to_string(),
        }
    }

    /// Name the snapshot's origin, such as `stdin`.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}

impl InventorySource for StaticSource {
    fn fetch(&self) -> Result<RawSnapshot> {
        Ok(self.snapshot.clone())
    }

    fn describe(&self) -> String {
        self.origin.clone()
    }
}

/// Reject a snapshot that reached the limit it was fetched with.
pub fn check_fetch_limit(snapshot: &RawSnapshot, limit: Option<usize>) -> Result<()> {
    match limit {
        Some(limit) if snapshot.repositories.len() >= limit => Err(Error::fetch(format!(
            "snapshot holds {} entries, reaching the fetch limit of {}; it is probably truncated",
            snapshot.repositories.len(),
            limit
        ))),
        _ => Ok(()),
    }
}
