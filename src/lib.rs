//! # Repository Triage Library
//!
//! This library decides, for every repository in an account's inventory,
//! whether it should be kept or recommended for deletion, and why. It is the
//! engine behind the `repo-triage` command-line tool and never deletes
//! anything itself: its output is a partition and a report that a separate
//! deletion step may act on.
//!
//! ## Quick Example
//!
//! ```
//! use repo_triage::config::TriageConfig;
//! use repo_triage::inventory::{RawEntry, RawSnapshot};
//! use repo_triage::pipeline;
//! use repo_triage::reconcile::{DeleteTier, Disposition};
//! use repo_triage::rules::RuleEngine;
//! use repo_triage::source::StaticSource;
//!
//! let snapshot = RawSnapshot::new(vec![
//!     RawEntry {
//!         name: Some("demo-app".to_string()),
//!         description: Some("a demo".to_string()),
//!         pushed_at: Some("2024-01-30T00:00:00Z".to_string()),
//!         ..RawEntry::default()
//!     },
//!     RawEntry {
//!         name: Some("billing".to_string()),
//!         description: Some("Invoices and payments for the shop".to_string()),
//!         pushed_at: Some("2024-01-30T00:00:00Z".to_string()),
//!         ..RawEntry::default()
//!     },
//! ]);
//!
//! let config = TriageConfig::default();
//! let engine = RuleEngine::with_builtin_rules();
//! let now = "2024-02-01T00:00:00Z".parse().unwrap();
//!
//! let outcome = pipeline::run(&StaticSource::new(snapshot), &config, &engine, Some(now)).unwrap();
//! assert_eq!(
//!     outcome.partition.disposition_of("demo-app"),
//!     Some(Disposition::Delete(DeleteTier::TemplateOrDemo))
//! );
//! assert_eq!(outcome.partition.disposition_of("billing"), Some(Disposition::Keep));
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: The allowlist and rule thresholds, parsed
//!   from `.repo-triage.yaml` and validated before any rule runs.
//! - **Inventory (`inventory`, `source`)**: The raw snapshot handed over by the
//!   fetch collaborator and its normalization into immutable records.
//! - **Rules (`rules`)**: Independent predicates that attach tags to records.
//! - **Reconciliation (`reconcile`)**: Fixed tag precedence that turns tag sets
//!   into one disposition each, verified to be total and disjoint.
//! - **Reporting (`report`, `sink`)**: Counts, percentages and sorted listings,
//!   rendered as text or JSON and written to stdout, files or delete lists.
//!
//! ## Execution Flow
//!
//! [`pipeline::run`] executes the stages in order: fetch, load, classify,
//! reconcile, report. Each stage only reads the previous stage's output, and
//! any fatal error stops the run before a report exists.

pub mod config;
pub mod defaults;
pub mod error;
pub mod inventory;
pub mod output;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod rules;
pub mod sink;
pub mod source;

pub use error::exit_codes;

#[cfg(test)]
mod triage_proptest;
