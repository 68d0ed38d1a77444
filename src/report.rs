//! # Report Generator
//!
//! Presentation layer over a finalized [`Partition`]. Builds a structured
//! [`Report`] (counts, percentages, name-sorted listings) and renders it as
//! canonical text or JSON. No classification happens here.
//!
//! Every listing comes from the partition's ordered sets, so the output never
//! depends on the order records were loaded or tagged in.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::inventory::Unclassifiable;
use crate::reconcile::{Disposition, Partition};

/// One disposition's share of the inventory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub disposition: Disposition,
    pub count: usize,
    /// Share of classified repositories, in percent.
    pub percentage: f64,
    /// Sorted by name.
    pub repositories: Vec<String>,
}

impl ReportSection {
    fn title(&self) -> String {
        match self.disposition {
            Disposition::Keep => "KEEP".to_string(),
            Disposition::Delete(tier) => format!("DELETE: {}", tier.as_str().to_uppercase()),
        }
    }
}

/// Structured report for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Reference time the run measured activity against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_time: Option<DateTime<Utc>>,
    /// Number of classified repositories.
    pub total: usize,
    pub delete_total: usize,
    /// Keep first, then delete tiers in precedence order.
    pub sections: Vec<ReportSection>,
    pub unclassifiable: Vec<Unclassifiable>,
}

/// Options for the canonical text rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// List at most this many names per section, then `... and N more`.
    pub max_listed: Option<usize>,
}

impl Report {
    pub fn new(partition: &Partition, unclassifiable: &[Unclassifiable]) -> Self {
        let total = partition.len();

        let keep = ReportSection {
            disposition: Disposition::Keep,
            count: partition.keep().len(),
            percentage: percentage(partition.keep().len(), total),
            repositories: partition.keep().iter().cloned().collect(),
        };
        let tiers = partition.tiers().iter().map(|group| ReportSection {
            disposition: Disposition::Delete(group.tier),
            count: group.repositories.len(),
            percentage: percentage(group.repositories.len(), total),
            repositories: group.repositories.iter().cloned().collect(),
        });

        let mut unclassifiable = unclassifiable.to_vec();
        unclassifiable.sort_by_key(|entry| entry.index);

        Self {
            reference_time: None,
            total,
            delete_total: partition.delete_count(),
            sections: std::iter::once(keep).chain(tiers).collect(),
            unclassifiable,
        }
    }

    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    pub fn section(&self, disposition: Disposition) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.disposition == disposition)
    }

    /// Canonical, colour-free text rendering.
    pub fn render_text(&self, options: &RenderOptions) -> String {
        let mut lines = vec![
            "Repository Triage Report".to_string(),
            "========================".to_string(),
        ];
        if let Some(now) = self.reference_time {
            lines.push(format!(
                "Reference time: {}",
                now.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        lines.push(format!("Total repositories: {}", self.total));
        lines.push(format!(
            "Delete recommended: {} ({:.1}%)",
            self.delete_total,
            percentage(self.delete_total, self.total)
        ));
        if !self.unclassifiable.is_empty() {
            lines.push(format!("Unclassifiable: {}", self.unclassifiable.len()));
        }

        for section in &self.sections {
            lines.push(String::new());
            lines.push(format!(
                "{} ({}, {:.1}%)",
                section.title(),
                section.count,
                section.percentage
            ));
            if section.repositories.is_empty() {
                lines.push("  (none)".to_string());
                continue;
            }
            let shown = options
                .max_listed
                .unwrap_or(usize::MAX)
                .min(section.repositories.len());
            lines.extend(
                section.repositories[..shown]
                    .iter()
                    .map(|name| format!("  - {}", name)),
            );
            if shown < section.repositories.len() {
                lines.push(format!(
                    "  ... and {} more",
                    section.repositories.len() - shown
                ));
            }
        }

        if !self.unclassifiable.is_empty() {
            lines.push(String::new());
            lines.push(format!("UNCLASSIFIABLE ({})", self.unclassifiable.len()));
            lines.extend(self.unclassifiable.iter().map(|entry| match &entry.name {
                Some(name) => format!("  - #{} {}: {}", entry.index, name, entry.reason),
                None => format!("  - #{}: {}", entry.index, entry.reason),
            }));
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Pretty-printed JSON rendering.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Report {
            message: format!("cannot serialize report: {}", e),
        })
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}
