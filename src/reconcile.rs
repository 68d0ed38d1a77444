//! # Reconciler
//!
//! Resolves every repository's tag set to exactly one [`Disposition`] and
//! groups the results into a [`Partition`].
//!
//! ## Precedence
//!
//! The first tag found in [`PRECEDENCE`] decides, regardless of the order in
//! which rules produced the tags:
//!
//! ```text
//! ExplicitKeep > Fork > TemplateOrDemo > Inactive > PoorDescription > (none => Keep)
//! ```
//!
//! The allowlist wins over every heuristic. Structural signals (fork,
//! template) outrank timing and wording heuristics. A repository with no tag
//! is kept.
//!
//! ## Invariants
//!
//! Before a partition is returned, [`verify_partition`] checks that it is
//! total (covers exactly the classified names) and disjoint (no name twice).
//! A failure is [`Error::ReconciliationInvariant`] and aborts the run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rules::{ClassificationResult, Tag, TagSet};

/// Why a repository is recommended for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteTier {
    Fork,
    TemplateOrDemo,
    Inactive,
    PoorDescription,
}

impl DeleteTier {
    /// Delete tiers in precedence order.
    pub const ALL: [DeleteTier; 4] = [
        DeleteTier::Fork,
        DeleteTier::TemplateOrDemo,
        DeleteTier::Inactive,
        DeleteTier::PoorDescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteTier::Fork => "fork",
            DeleteTier::TemplateOrDemo => "template-or-demo",
            DeleteTier::Inactive => "inactive",
            DeleteTier::PoorDescription => "poor-description",
        }
    }
}

impl fmt::Display for DeleteTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single resolved outcome for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    Keep,
    Delete(DeleteTier),
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Keep => f.write_str("keep"),
            Disposition::Delete(tier) => write!(f, "delete ({})", tier),
        }
    }
}

/// Tag precedence, highest first, with the disposition each tag resolves to.
pub const PRECEDENCE: [(Tag, Disposition); 5] = [
    (Tag::ExplicitKeep, Disposition::Keep),
    (Tag::Fork, Disposition::Delete(DeleteTier::Fork)),
    (Tag::TemplateOrDemo, Disposition::Delete(DeleteTier::TemplateOrDemo)),
    (Tag::Inactive, Disposition::Delete(DeleteTier::Inactive)),
    (Tag::PoorDescription, Disposition::Delete(DeleteTier::PoorDescription)),
];

/// Resolve one tag set. No tag means `Keep`.
pub fn resolve(tags: &TagSet) -> Disposition {
    PRECEDENCE
        .iter()
        .find(|(tag, _)| tags.contains(tag))
        .map(|(_, disposition)| *disposition)
        .unwrap_or(Disposition::Keep)
}

/// The repositories that ended up in one delete tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierGroup {
    pub tier: DeleteTier,
    pub repositories: BTreeSet<String>,
}

/// Total, disjoint split of an inventory into keep and delete tiers.
///
/// Delete tiers are always all present, in precedence order, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    keep: BTreeSet<String>,
    delete: Vec<TierGroup>,
}

impl Partition {
    /// Assemble a partition from raw parts without checking it.
    ///
    /// Use [`verify_partition`] before trusting the result.
    pub fn from_parts(keep: BTreeSet<String>, delete: Vec<TierGroup>) -> Self {
        Self { keep, delete }
    }

    pub fn keep(&self) -> &BTreeSet<String> {
        &self.keep
    }

    /// Delete tiers in precedence order.
    pub fn tiers(&self) -> &[TierGroup] {
        &self.delete
    }

    /// Members of one delete tier.
    pub fn tier(&self, tier: DeleteTier) -> Option<&BTreeSet<String>> {
        self.delete
            .iter()
            .find(|group| group.tier == tier)
            .map(|group| &group.repositories)
    }

    pub fn disposition_of(&self, name: &str) -> Option<Disposition> {
        if self.keep.contains(name) {
            return Some(Disposition::Keep);
        }
        self.delete
            .iter()
            .find(|group| group.repositories.contains(name))
            .map(|group| Disposition::Delete(group.tier))
    }

    /// Every name recommended for deletion, sorted.
    ///
    /// This is all the deletion step ever needs from a run.
    pub fn delete_names(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .delete
            .iter()
            .flat_map(|group| group.repositories.iter().map(String::as_str))
            .collect();
        names.into_iter().collect()
    }

    pub fn delete_count(&self) -> usize {
        self.delete.iter().map(|group| group.repositories.len()).sum()
    }

    /// Number of repositories covered.
    pub fn len(&self) -> usize {
        self.keep.len() + self.delete_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve a classification into a verified partition.
pub fn reconcile(classification: &ClassificationResult) -> Result<Partition> {
    let mut keep = BTreeSet::new();
    let mut grouped: BTreeMap<DeleteTier, BTreeSet<String>> =
        DeleteTier::ALL.iter().map(|tier| (*tier, BTreeSet::new())).collect();

    for (name, tags) in classification.iter() {
        match resolve(tags) {
            Disposition::Keep => {
                keep.insert(name.to_string());
            }
            Disposition::Delete(tier) => {
                grouped.entry(tier).or_default().insert(name.to_string());
            }
        }
    }

    let delete = DeleteTier::ALL
        .iter()
        .map(|tier| TierGroup {
            tier: *tier,
            repositories: grouped.remove(tier).unwrap_or_default(),
        })
        .collect();

    let partition = Partition { keep, delete };
    verify_partition(&partition, classification.names())?;

    debug!(
        "Reconciled {} repositories: {} keep, {} delete",
        partition.len(),
        partition.keep.len(),
        partition.delete_count()
    );
    Ok(partition)
}

/// Check totality and disjointness of `partition` against the expected names.
///
/// Also checks that every delete tier appears exactly once and in precedence
/// order, which the report relies on.
pub fn verify_partition<'a, I>(partition: &Partition, expected: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let tiers: Vec<DeleteTier> = partition.delete.iter().map(|group| group.tier).collect();
    if tiers != DeleteTier::ALL {
        return Err(violation(format!(
            "delete tiers are {:?}, expected {:?}",
            tiers,
            DeleteTier::ALL
        )));
    }

    let mut seen: BTreeMap<&str, &'static str> = BTreeMap::new();
    let sections = std::iter::once(("keep", &partition.keep)).chain(
        partition
            .delete
            .iter()
            .map(|group| (group.tier.as_str(), &group.repositories)),
    );
    for (section, names) in sections {
        for name in names {
            if let Some(previous) = seen.insert(name.as_str(), section) {
                return Err(violation(format!(
                    "'{}' appears in both {} and {}",
                    name, previous, section
                )));
            }
        }
    }

    let expected: BTreeSet<&str> = expected.into_iter().collect();
    let missing: Vec<&str> = expected
        .iter()
        .filter(|name| !seen.contains_key(*name))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(violation(format!(
            "{} repositories have no disposition: {}",
            missing.len(),
            missing.join(", ")
        )));
    }

    let unexpected: Vec<&str> = seen
        .keys()
        .filter(|name| !expected.contains(*name))
        .copied()
        .collect();
    if !unexpected.is_empty() {
        return Err(violation(format!(
            "{} repositories were never classified: {}",
            unexpected.len(),
            unexpected.join(", ")
        )));
    }

    Ok(())
}

fn violation(message: String) -> Error {
    Error::ReconciliationInvariant { message }
}
