//! Pipeline for a complete triage run
//!
//! This module wires the stages together in a fixed, linear order. Each stage
//! consumes only the output of the one before it:
//!
//! 1. Fetch the raw snapshot from an [`InventorySource`]
//! 2. Load it into an [`Inventory`]
//! 3. Tag every record with the [`RuleEngine`]
//! 4. Reconcile the tags into a verified [`Partition`]
//! 5. Build the [`Report`]
//!
//! Configuration is validated before a run starts (a [`TriageConfig`] only
//! exists once validation passed), and the first fatal error stops the run
//! with nothing emitted.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;

use crate::config::TriageConfig;
use crate::error::Result;
use crate::inventory::{self, Inventory, RawSnapshot};
use crate::reconcile::{self, Disposition, Partition};
use crate::report::Report;
use crate::rules::{ClassificationResult, RuleContext, RuleEngine, RuleHit};
use crate::source::InventorySource;

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct TriageOutcome {
    /// Reference time rules measured against.
    pub now: DateTime<Utc>,
    pub inventory: Inventory,
    pub classification: ClassificationResult,
    pub partition: Partition,
    pub report: Report,
}

/// Why one repository ended up where it did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub name: String,
    /// Rules that fired, in registration order.
    pub hits: Vec<RuleHit>,
    pub disposition: Disposition,
}

impl TriageOutcome {
    /// Re-evaluate the rules for one repository of this run.
    ///
    /// Returns `None` when the name is not part of the classified inventory.
    pub fn explain(&self, engine: &RuleEngine, config: &TriageConfig, name: &str) -> Option<Explanation> {
        let record = self.inventory.get(name)?;
        let ctx = RuleContext::new(config, self.now);
        Some(Explanation {
            name: record.name.clone(),
            hits: engine.evaluate(record, &ctx),
            disposition: self.partition.disposition_of(name)?,
        })
    }
}

/// Pick the reference time for a run.
///
/// An explicit time wins, then the snapshot's capture time, then the clock.
pub fn reference_time(explicit: Option<DateTime<Utc>>, snapshot: &RawSnapshot) -> Result<DateTime<Utc>> {
    if let Some(now) = explicit {
        return Ok(now);
    }
    Ok(snapshot.captured_at()?.unwrap_or_else(Utc::now))
}

/// Execute a complete triage run.
pub fn run(
    source: &dyn InventorySource,
    config: &TriageConfig,
    engine: &RuleEngine,
    now: Option<DateTime<Utc>>,
) -> Result<TriageOutcome> {
    // Stage 1: Fetch
    info!("Fetching inventory from {}", source.describe());
    let snapshot = source.fetch()?;

    // Stage 2: Load
    let inventory = inventory::load(&snapshot)?;
    let now = reference_time(now, &snapshot)?;
    debug!("Reference time is {}", now);

    // Stage 3: Classify
    let ctx = RuleContext::new(config, now);
    let classification = engine.classify(&inventory, &ctx);

    // Stage 4: Reconcile
    let partition = reconcile::reconcile(&classification)?;

    // Stage 5: Report
    let report = Report::new(&partition, inventory.unclassifiable()).with_reference_time(now);

    info!(
        "Triaged {} repositories: {} keep, {} recommended for deletion",
        partition.len(),
        partition.keep().len(),
        partition.delete_count()
    );

    Ok(TriageOutcome {
        now,
        inventory,
        classification,
        partition,
        report,
    })
}
