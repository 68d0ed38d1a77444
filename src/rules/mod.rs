//! # Rule Engine
//!
//! Evaluates a registry of independent, pure rules against every record of an
//! [`Inventory`] and accumulates the tags they produce into a
//! [`ClassificationResult`].
//!
//! ## Rules
//!
//! A rule looks at one record and the immutable [`RuleContext`] and either
//! emits a [`Tag`] or stays silent. Rules never see other records and never
//! see each other's output, so the order in which they run cannot change the
//! resulting tag sets.
//!
//! The engine is a plain list. Adding a rule means pushing another [`Rule`]
//! implementation (or an [`FnRule`] closure) with [`RuleEngine::register`];
//! existing rules are never touched. The built-in table lives in
//! [`builtin`].
//!
//! ## Parallelism
//!
//! Records are tagged on rayon's pool. Results are keyed by repository name in
//! an ordered map, so completion order never shows up in the output.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TriageConfig;
use crate::inventory::{Inventory, RepositoryRecord};

pub mod builtin;

pub use builtin::{
    builtin_rules, ActivityRule, DescriptionQualityRule, ExplicitKeepRule, ForkRule, PatternRule,
};

/// A label produced by a rule.
///
/// Every tag except `ExplicitKeep` is a reason to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    ExplicitKeep,
    TemplateOrDemo,
    Fork,
    Inactive,
    PoorDescription,
}

impl Tag {
    pub const ALL: [Tag; 5] = [
        Tag::ExplicitKeep,
        Tag::TemplateOrDemo,
        Tag::Fork,
        Tag::Inactive,
        Tag::PoorDescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::ExplicitKeep => "explicit-keep",
            Tag::TemplateOrDemo => "template-or-demo",
            Tag::Fork => "fork",
            Tag::Inactive => "inactive",
            Tag::PoorDescription => "poor-description",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tags carried by one repository.
pub type TagSet = BTreeSet<Tag>;

/// Everything a rule may look at besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub config: &'a TriageConfig,
    /// Reference time that activity is measured against.
    pub now: DateTime<Utc>,
}

impl<'a> RuleContext<'a> {
    pub fn new(config: &'a TriageConfig, now: DateTime<Utc>) -> Self {
        Self { config, now }
    }
}

/// A pure predicate over a single record.
pub trait Rule: Send + Sync {
    /// Stable identifier, shown by `explain`.
    fn name(&self) -> &str;

    /// Returns the tag this rule assigns to `record`, if any.
    fn evaluate(&self, record: &RepositoryRecord, ctx: &RuleContext<'_>) -> Option<Tag>;
}

/// A rule backed by a closure.
pub struct FnRule<F> {
    name: String,
    predicate: F,
}

impl<F> FnRule<F>
where
    F: Fn(&RepositoryRecord, &RuleContext<'_>) -> Option<Tag> + Send + Sync,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&RepositoryRecord, &RuleContext<'_>) -> Option<Tag> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, record: &RepositoryRecord, ctx: &RuleContext<'_>) -> Option<Tag> {
        (self.predicate)(record, ctx)
    }
}

/// One rule firing on one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleHit {
    pub rule: String,
    pub tag: Tag,
}

/// Repository name to tag set, computed once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    tags: BTreeMap<String, TagSet>,
}

impl ClassificationResult {
    pub fn get(&self, name: &str) -> Option<&TagSet> {
        self.tags.get(name)
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagSet)> {
        self.tags.iter().map(|(name, tags)| (name.as_str(), tags))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<S, I> FromIterator<(S, I)> for ClassificationResult
where
    S: Into<String>,
    I: IntoIterator<Item = Tag>,
{
    fn from_iter<T: IntoIterator<Item = (S, I)>>(iter: T) -> Self {
        Self {
            tags: iter
                .into_iter()
                .map(|(name, tags)| (name.into(), tags.into_iter().collect()))
                .collect(),
        }
    }
}

/// Registry of rules evaluated against every record.
#[derive(Default)]
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    /// An engine with no rules; every repository ends up untagged.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine loaded with the built-in rule table.
    pub fn with_builtin_rules() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    pub fn register<R: Rule + 'static>(&mut self, rule: R) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Every rule that fires on `record`, in registration order.
    pub fn evaluate(&self, record: &RepositoryRecord, ctx: &RuleContext<'_>) -> Vec<RuleHit> {
        self.rules
            .iter()
            .filter_map(|rule| {
                rule.evaluate(record, ctx).map(|tag| RuleHit {
                    rule: rule.name().to_string(),
                    tag,
                })
            })
            .collect()
    }

    /// Tag every record of the inventory.
    pub fn classify(&self, inventory: &Inventory, ctx: &RuleContext<'_>) -> ClassificationResult {
        let records: Vec<&RepositoryRecord> = inventory.records().collect();

        let tags: BTreeMap<String, TagSet> = records
            .par_iter()
            .map(|record| {
                let tags = self
                    .evaluate(record, ctx)
                    .into_iter()
                    .map(|hit| hit.tag)
                    .collect::<TagSet>();
                (record.name.clone(), tags)
            })
            .collect();

        debug!(
            "Classified {} records with {} rules",
            tags.len(),
            self.rules.len()
        );
        ClassificationResult { tags }
    }
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rule_names())
            .finish()
    }
}
