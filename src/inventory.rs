//! # Inventory Loader
//!
//! Turns the raw snapshot supplied by the fetch collaborator into immutable
//! [`RepositoryRecord`]s.
//!
//! The loader only normalizes structure. It does not classify anything:
//!
//! - names are trimmed, and a missing or blank name makes the entry
//!   unclassifiable (a record-scoped [`Error::MalformedRecord`]);
//! - duplicate names abort the load with [`Error::Config`], even when one of
//!   the copies is itself malformed;
//! - an entry whose fields have the wrong types is unclassifiable, and the
//!   rest of the snapshot still loads;
//! - commit-history fields that were not retrieved stay `None`;
//! - a missing `pushedAt` falls back to `createdAt`, and an entry with
//!   neither (or with an unparsable timestamp) is unclassifiable;
//! - a snapshot marked incomplete aborts with [`Error::Fetch`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A repository topic as emitted by the fetch tool.
///
/// Older and newer `gh` releases disagree on the shape, so all three are
/// accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTopic {
    Name(String),
    Named { name: String },
    Nested { topic: TopicName },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicName {
    pub name: String,
}

impl RawTopic {
    pub fn name(&self) -> &str {
        match self {
            RawTopic::Name(name) => name,
            RawTopic::Named { name } => name,
            RawTopic::Nested { topic } => &topic.name,
        }
    }
}

/// One entry of the raw snapshot, with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEntry {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_fork: Option<bool>,
    pub pushed_at: Option<String>,
    pub created_at: Option<String>,
    pub is_private: Option<bool>,
    pub stargazer_count: Option<u64>,
    pub repository_topics: Option<Vec<RawTopic>>,
    pub commit_count: Option<u64>,
    pub first_commit_date: Option<String>,
    pub last_commit_date: Option<String>,
    /// Decode error for an entry that did not match this shape.
    #[serde(skip)]
    pub rejected: Option<String>,
}

impl RawEntry {
    /// Decode one snapshot entry from a generic document value.
    ///
    /// A badly typed entry does not fail the document: it comes back with
    /// `rejected` set, and with its name when the name itself is readable.
    pub fn from_value(value: serde_json::Value) -> Self {
        let name = value
            .get("name")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        match serde_json::from_value::<RawEntry>(value) {
            Ok(entry) => entry,
            Err(e) => RawEntry {
                name,
                rejected: Some(e.to_string()),
                ..RawEntry::default()
            },
        }
    }

    /// The trimmed name, if the entry carries a non-blank one.
    pub fn trimmed_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// The document produced by the fetch collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    /// `false` when the fetch stopped early (pagination, rate limit, auth).
    #[serde(default = "default_complete")]
    pub complete: bool,
    /// When the snapshot was taken; used as the reference time if none is given.
    #[serde(default)]
    pub captured_at: Option<String>,
    pub repositories: Vec<RawEntry>,
}

fn default_complete() -> bool {
    true
}

impl RawSnapshot {
    /// A complete snapshot without a capture time.
    pub fn new(repositories: Vec<RawEntry>) -> Self {
        Self {
            complete: true,
            captured_at: None,
            repositories,
        }
    }

    /// Parse the capture time, if one was recorded.
    pub fn captured_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.captured_at
            .as_deref()
            .map(|text| {
                parse_timestamp(text)
                    .map_err(|reason| Error::fetch(format!("invalid capturedAt: {}", reason)))
            })
            .transpose()
    }
}

/// A normalized, immutable repository record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub description: String,
    pub is_fork: bool,
    pub pushed_at: DateTime<Utc>,
    pub commit_count: Option<u64>,
    pub first_commit_date: Option<DateTime<Utc>>,
    pub last_commit_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub is_private: Option<bool>,
    pub stargazer_count: Option<u64>,
    pub topics: Vec<String>,
}

impl RepositoryRecord {
    /// A record with only the required fields set; everything optional is absent.
    pub fn new(name: impl Into<String>, description: impl Into<String>, pushed_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            is_fork: false,
            pushed_at,
            commit_count: None,
            first_commit_date: None,
            last_commit_date: None,
            created_at: None,
            is_private: None,
            stargazer_count: None,
            topics: Vec::new(),
        }
    }

    pub fn with_fork(mut self, is_fork: bool) -> Self {
        self.is_fork = is_fork;
        self
    }

    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }
}

/// An entry the loader could not turn into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unclassifiable {
    /// Position in the raw snapshot
    pub index: usize,
    pub name: Option<String>,
    pub reason: String,
}

impl From<Unclassifiable> for Error {
    fn from(entry: Unclassifiable) -> Self {
        Error::MalformedRecord {
            index: entry.index,
            name: entry.name,
            reason: entry.reason,
        }
    }
}

/// The loaded inventory: name-ordered records plus the entries set aside.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    records: BTreeMap<String, RepositoryRecord>,
    unclassifiable: Vec<Unclassifiable>,
}

impl Inventory {
    /// Records in name order.
    pub fn records(&self) -> impl ExactSizeIterator<Item = &RepositoryRecord> {
        self.records.values()
    }

    pub fn get(&self, name: &str) -> Option<&RepositoryRecord> {
        self.records.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Entries excluded from classification, in snapshot order.
    pub fn unclassifiable(&self) -> &[Unclassifiable] {
        &self.unclassifiable
    }
}

/// Load a raw snapshot into an [`Inventory`].
///
/// All-or-nothing with respect to the snapshot: an incomplete snapshot or a
/// duplicate name fails the whole load. Individual malformed entries are
/// collected instead.
pub fn load(snapshot: &RawSnapshot) -> Result<Inventory> {
    if !snapshot.complete {
        return Err(Error::fetch(format!(
            "snapshot is marked incomplete after {} entries; refusing to triage a partial inventory",
            snapshot.repositories.len()
        )));
    }

    let mut inventory = Inventory::default();
    let mut seen = BTreeSet::new();

    for (index, entry) in snapshot.repositories.iter().enumerate() {
        if let Some(name) = entry.trimmed_name() {
            if !seen.insert(name) {
                return Err(Error::Config {
                    message: format!("duplicate repository name '{}' in snapshot", name),
                    hint: Some("the snapshot must list each repository exactly once".to_string()),
                });
            }
        }

        let record = match normalize(index, entry) {
            Ok(record) => record,
            Err(unclassifiable) => {
                warn!(
                    "Skipping malformed snapshot entry #{}: {}",
                    index, unclassifiable.reason
                );
                inventory.unclassifiable.push(unclassifiable);
                continue;
            }
        };
        inventory.records.insert(record.name.clone(), record);
    }

    debug!(
        "Loaded {} records ({} unclassifiable)",
        inventory.records.len(),
        inventory.unclassifiable.len()
    );
    Ok(inventory)
}

fn normalize(index: usize, entry: &RawEntry) -> std::result::Result<RepositoryRecord, Unclassifiable> {
    if let Some(reason) = &entry.rejected {
        return Err(Unclassifiable {
            index,
            name: entry.trimmed_name().map(str::to_string),
            reason: format!("entry does not match the inventory schema: {}", reason),
        });
    }

    let name = entry
        .trimmed_name()
        .ok_or_else(|| Unclassifiable {
            index,
            name: None,
            reason: "missing required field 'name'".to_string(),
        })?
        .to_string();

    let malformed = |reason: String| Unclassifiable {
        index,
        name: Some(name.clone()),
        reason,
    };
    let timestamp = |field: &str, value: &Option<String>| {
        value
            .as_deref()
            .map(|text| parse_timestamp(text).map_err(|reason| malformed(format!("invalid {}: {}", field, reason))))
            .transpose()
    };

    let created_at = timestamp("createdAt", &entry.created_at)?;
    let pushed_at = match timestamp("pushedAt", &entry.pushed_at)? {
        Some(pushed_at) => pushed_at,
        None => created_at.ok_or_else(|| malformed("missing both 'pushedAt' and 'createdAt'".to_string()))?,
    };
    let first_commit_date = timestamp("firstCommitDate", &entry.first_commit_date)?;
    let last_commit_date = timestamp("lastCommitDate", &entry.last_commit_date)?;

    Ok(RepositoryRecord {
        description: entry.description.clone().unwrap_or_default(),
        is_fork: entry.is_fork.unwrap_or(false),
        pushed_at,
        commit_count: entry.commit_count,
        first_commit_date,
        last_commit_date,
        created_at,
        is_private: entry.is_private,
        stargazer_count: entry.stargazer_count,
        topics: entry
            .repository_topics
            .iter()
            .flatten()
            .map(|topic| topic.name().to_string())
            .collect(),
        name,
    })
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(text: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("'{}' is not an RFC 3339 timestamp ({})", text, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> RawEntry {
        RawEntry {
            name: Some(name.to_string()),
            description: Some("A service with a real description".to_string()),
            pushed_at: Some("2024-01-15T10:00:00Z".to_string()),
            ..RawEntry::default()
        }
    }

    #[test]
    fn test_load_normalizes_entries() {
        let mut raw = entry("  svc  ");
        raw.description = None;
        let inventory = load(&RawSnapshot::new(vec![raw])).unwrap();

        let record = inventory.get("svc").unwrap();
        assert_eq!(record.name, "svc");
        assert_eq!(record.description, "");
        assert!(!record.is_fork);
        assert_eq!(record.pushed_at, parse_timestamp("2024-01-15T10:00:00Z").unwrap());
        assert!(inventory.unclassifiable().is_empty());
    }

    #[test]
    fn test_commit_history_stays_absent() {
        let inventory = load(&RawSnapshot::new(vec![entry("svc")])).unwrap();
        let record = inventory.get("svc").unwrap();
        assert_eq!(record.commit_count, None);
        assert_eq!(record.first_commit_date, None);
        assert_eq!(record.last_commit_date, None);
    }

    #[test]
    fn test_commit_history_is_parsed_when_present() {
        let mut raw = entry("svc");
        raw.commit_count = Some(0);
        raw.first_commit_date = Some("2023-01-01T00:00:00Z".to_string());
        raw.last_commit_date = Some("2024-01-01T00:00:00+02:00".to_string());
        let inventory = load(&RawSnapshot::new(vec![raw])).unwrap();

        let record = inventory.get("svc").unwrap();
        assert_eq!(record.commit_count, Some(0));
        assert_eq!(
            record.last_commit_date,
            Some(parse_timestamp("2023-12-31T22:00:00Z").unwrap())
        );
    }

    #[test]
    fn test_missing_name_is_unclassifiable() {
        let mut nameless = entry("x");
        nameless.name = None;
        let mut blank = entry("y");
        blank.name = Some("   ".to_string());

        let inventory = load(&RawSnapshot::new(vec![nameless, entry("ok"), blank])).unwrap();

        assert_eq!(inventory.len(), 1);
        let skipped = inventory.unclassifiable();
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].index, 0);
        assert_eq!(skipped[1].index, 2);
        assert!(skipped[0].reason.contains("name"));
    }

    #[test]
    fn test_pushed_at_falls_back_to_created_at() {
        let mut raw = entry("fresh");
        raw.pushed_at = None;
        raw.created_at = Some("2024-01-20T00:00:00Z".to_string());
        let inventory = load(&RawSnapshot::new(vec![raw])).unwrap();

        let record = inventory.get("fresh").unwrap();
        assert_eq!(record.pushed_at, parse_timestamp("2024-01-20T00:00:00Z").unwrap());
    }

    #[test]
    fn test_missing_timestamps_are_unclassifiable() {
        let mut raw = entry("ghost");
        raw.pushed_at = None;
        let inventory = load(&RawSnapshot::new(vec![raw])).unwrap();

        assert!(inventory.is_empty());
        let skipped = &inventory.unclassifiable()[0];
        assert_eq!(skipped.name.as_deref(), Some("ghost"));
    }

    #[test]
    fn test_invalid_timestamp_is_unclassifiable() {
        let mut raw = entry("odd");
        raw.pushed_at = Some("last tuesday".to_string());
        let inventory = load(&RawSnapshot::new(vec![raw])).unwrap();

        assert!(inventory.is_empty());
        assert!(inventory.unclassifiable()[0].reason.contains("pushedAt"));
    }

    #[test]
    fn test_duplicate_names_are_fatal() {
        let result = load(&RawSnapshot::new(vec![entry("svc"), entry(" svc")]));
        match result {
            Err(Error::Config { message, .. }) => assert!(message.contains("'svc'")),
            other => panic!("expected config error, got {:?}", other.map(|i| i.len())),
        }
    }

    #[test]
    fn test_duplicate_of_malformed_entry_is_fatal() {
        let mut odd = entry("svc");
        odd.pushed_at = Some("last tuesday".to_string());

        let result = load(&RawSnapshot::new(vec![odd.clone(), entry("svc")]));
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = load(&RawSnapshot::new(vec![entry("svc"), odd.clone()]));
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = load(&RawSnapshot::new(vec![odd.clone(), odd]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_badly_typed_entry_is_unclassifiable() {
        let good = serde_json::json!({"name": "svc", "pushedAt": "2024-01-15T10:00:00Z"});
        let numeric_name = serde_json::json!({"name": 42, "pushedAt": "2024-01-15T10:00:00Z"});
        let stringly_fork = serde_json::json!({"name": "fork", "isFork": "yes"});

        let snapshot = RawSnapshot::new(vec![
            RawEntry::from_value(good),
            RawEntry::from_value(numeric_name),
            RawEntry::from_value(stringly_fork),
        ]);
        let inventory = load(&snapshot).unwrap();

        assert_eq!(inventory.names().collect::<Vec<_>>(), vec!["svc"]);
        let skipped = inventory.unclassifiable();
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].index, 1);
        assert_eq!(skipped[0].name, None);
        assert!(skipped[0].reason.contains("invalid type"));
        assert_eq!(skipped[1].index, 2);
        assert_eq!(skipped[1].name.as_deref(), Some("fork"));
    }

    #[test]
    fn test_badly_typed_duplicate_is_fatal() {
        let snapshot = RawSnapshot::new(vec![
            RawEntry::from_value(serde_json::json!({"name": "svc", "isFork": "yes"})),
            entry("svc"),
        ]);
        assert!(matches!(load(&snapshot), Err(Error::Config { .. })));
    }

    #[test]
    fn test_incomplete_snapshot_fails_closed() {
        let mut snapshot = RawSnapshot::new(vec![entry("a"), entry("b")]);
        snapshot.complete = false;
        assert!(matches!(load(&snapshot), Err(Error::Fetch { .. })));
    }

    #[test]
    fn test_records_iterate_in_name_order() {
        let inventory = load(&RawSnapshot::new(vec![entry("zeta"), entry("alpha"), entry("mid")])).unwrap();
        let names: Vec<&str> = inventory.names().collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_deserialize_gh_style_entry() {
        let json = r#"{
            "name": "demo-app",
            "description": null,
            "isFork": true,
            "isPrivate": false,
            "pushedAt": "2024-01-10T08:00:00Z",
            "createdAt": "2023-06-01T00:00:00Z",
            "stargazerCount": 3,
            "repositoryTopics": [{"name": "demo"}, {"topic": {"name": "rust"}}, "cli"],
            "url": "https://example.invalid/demo-app"
        }"#;
        let raw: RawEntry = serde_json::from_str(json).unwrap();
        let inventory = load(&RawSnapshot::new(vec![raw])).unwrap();

        let record = inventory.get("demo-app").unwrap();
        assert!(record.is_fork);
        assert_eq!(record.is_private, Some(false));
        assert_eq!(record.stargazer_count, Some(3));
        assert_eq!(record.topics, vec!["demo", "rust", "cli"]);
    }

    #[test]
    fn test_captured_at() {
        let mut snapshot = RawSnapshot::new(vec![]);
        assert_eq!(snapshot.captured_at().unwrap(), None);

        snapshot.captured_at = Some("2024-02-01T00:00:00Z".to_string());
        assert_eq!(
            snapshot.captured_at().unwrap(),
            Some(parse_timestamp("2024-02-01T00:00:00Z").unwrap())
        );

        snapshot.captured_at = Some("yesterday".to_string());
        assert!(matches!(snapshot.captured_at(), Err(Error::Fetch { .. })));
    }

    #[test]
    fn test_unclassifiable_converts_to_malformed_record_error() {
        let error: Error = Unclassifiable {
            index: 7,
            name: None,
            reason: "missing required field 'name'".to_string(),
        }
        .into();
        assert!(!error.is_fatal());
        assert!(error.to_string().contains("#7"));
    }
}
