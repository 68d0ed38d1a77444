//! # Configuration Schema and Parsing
//!
//! This module defines the `.repo-triage.yaml` configuration file and turns it
//! into the immutable [`TriageConfig`] value that the rule engine receives for
//! a run.
//!
//! ## Key Components
//!
//! - **`ConfigFile`**: The serde representation of the file. Every key is
//!   optional and falls back to the defaults in [`crate::defaults`]. Unknown
//!   keys are rejected so a typo never silently disables a rule.
//!
//! - **`TriageConfig`**: The validated form. Keywords are lowercased, the
//!   allowlist is an ordered set, thresholds are typed, and name patterns are
//!   compiled.
//!
//! ## Example
//!
//! ```yaml
//! allowlist:
//!   - ddsp-piano
//! inactivityThresholdDays: 45
//! minDescriptionLength: 20
//! descriptionPlaceholders: ["public", "private"]
//! templateKeywords: ["template", "starter", "demo"]
//! templateNamePatterns: ["^devcontainer-", "^test-"]
//! ```
//!
//! Validation failures are [`Error::Config`] and surface before any rule is
//! evaluated.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::Duration;
use log::warn;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// On-disk configuration, exactly as written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ConfigFile {
    /// Repository names that are always kept (case-sensitive, exact match).
    pub allowlist: Vec<String>,
    /// A repository not pushed for strictly more than this many days is inactive.
    pub inactivity_threshold_days: i64,
    /// Descriptions shorter than this many characters are poor.
    pub min_description_length: i64,
    /// Descriptions equal to one of these are poor.
    pub description_placeholders: Vec<String>,
    /// Substrings of name or description that mark templates and demos.
    pub template_keywords: Vec<String>,
    /// Regular expressions over the name that also mark templates and demos.
    pub template_name_patterns: Vec<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            allowlist: Vec::new(),
            inactivity_threshold_days: defaults::INACTIVITY_THRESHOLD_DAYS,
            min_description_length: defaults::MIN_DESCRIPTION_LENGTH,
            description_placeholders: defaults::description_placeholders(),
            template_keywords: defaults::template_keywords(),
            template_name_patterns: Vec::new(),
        }
    }
}

/// Validated, immutable rule configuration for one run.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    allowlist: BTreeSet<String>,
    inactivity_threshold: Duration,
    inactivity_threshold_days: i64,
    min_description_length: usize,
    description_placeholders: BTreeSet<String>,
    template_keywords: Vec<String>,
    template_name_patterns: Vec<Regex>,
}

impl TriageConfig {
    /// Parse and validate a YAML document.
    ///
    /// An empty document (or one holding only comments) yields the defaults.
    pub fn from_yaml(yaml_content: &str) -> Result<Self> {
        ConfigFile::parse(yaml_content)?.validate()
    }

    /// Read, parse and validate a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        ConfigFile::from_file(path)?.validate()
    }

    pub fn allowlist(&self) -> &BTreeSet<String> {
        &self.allowlist
    }

    pub fn is_allowlisted(&self, name: &str) -> bool {
        self.allowlist.contains(name)
    }

    pub fn inactivity_threshold(&self) -> Duration {
        self.inactivity_threshold
    }

    pub fn inactivity_threshold_days(&self) -> i64 {
        self.inactivity_threshold_days
    }

    pub fn min_description_length(&self) -> usize {
        self.min_description_length
    }

    /// Placeholders, lowercased.
    pub fn description_placeholders(&self) -> &BTreeSet<String> {
        &self.description_placeholders
    }

    /// Keywords, lowercased and deduplicated, in first-seen order.
    pub fn template_keywords(&self) -> &[String] {
        &self.template_keywords
    }

    pub fn template_name_patterns(&self) -> &[Regex] {
        &self.template_name_patterns
    }
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            allowlist: BTreeSet::new(),
            inactivity_threshold: Duration::days(defaults::INACTIVITY_THRESHOLD_DAYS),
            inactivity_threshold_days: defaults::INACTIVITY_THRESHOLD_DAYS,
            min_description_length: defaults::MIN_DESCRIPTION_LENGTH as usize,
            description_placeholders: defaults::DESCRIPTION_PLACEHOLDERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            template_keywords: defaults::template_keywords(),
            template_name_patterns: Vec::new(),
        }
    }
}

impl ConfigFile {
    /// Parse a YAML string without validating it.
    pub fn parse(yaml_content: &str) -> Result<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(yaml_content).map_err(|e| Error::Config {
                message: format!("invalid YAML: {}", e),
                hint: None,
            })?;

        if value.is_null() {
            return Ok(Self::default());
        }

        serde_yaml::from_value(value).map_err(|e| Error::Config {
            message: e.to_string(),
            hint: Some(
                "recognized keys: allowlist, inactivityThresholdDays, minDescriptionLength, \
                 descriptionPlaceholders, templateKeywords, templateNamePatterns"
                    .to_string(),
            ),
        })
    }

    /// Read a configuration file from disk without validating it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            hint: None,
        })?;
        Self::parse(&content)
    }

    /// Check every option and build the immutable [`TriageConfig`].
    pub fn validate(self) -> Result<TriageConfig> {
        let mut allowlist = BTreeSet::new();
        for name in self.allowlist {
            if name.trim().is_empty() {
                return Err(Error::config("allowlist contains an empty name"));
            }
            if !allowlist.insert(name.clone()) {
                return Err(Error::Config {
                    message: format!("duplicate allowlist entry '{}'", name),
                    hint: Some("each repository name may appear only once".to_string()),
                });
            }
        }

        if self.inactivity_threshold_days < 0 {
            return Err(Error::Config {
                message: format!(
                    "inactivityThresholdDays must not be negative (got {})",
                    self.inactivity_threshold_days
                ),
                hint: Some("use 0 to flag every repository not pushed right now".to_string()),
            });
        }
        let inactivity_threshold = Duration::try_days(self.inactivity_threshold_days)
            .ok_or_else(|| {
                Error::config(format!(
                    "inactivityThresholdDays is too large ({})",
                    self.inactivity_threshold_days
                ))
            })?;

        if self.min_description_length < 0 {
            return Err(Error::config(format!(
                "minDescriptionLength must not be negative (got {})",
                self.min_description_length
            )));
        }
        let min_description_length = usize::try_from(self.min_description_length)
            .map_err(|_| Error::config("minDescriptionLength does not fit this platform"))?;

        let description_placeholders = self
            .description_placeholders
            .iter()
            .map(|p| p.trim().to_lowercase())
            .collect();

        let mut template_keywords: Vec<String> = Vec::new();
        for keyword in &self.template_keywords {
            let normalized = keyword.trim().to_lowercase();
            if normalized.is_empty() {
                return Err(Error::Config {
                    message: "templateKeywords contains an empty keyword".to_string(),
                    hint: Some("an empty keyword would mark every repository".to_string()),
                });
            }
            if template_keywords.contains(&normalized) {
                warn!("Ignoring duplicate template keyword '{}'", keyword);
                continue;
            }
            template_keywords.push(normalized);
        }

        let template_name_patterns = self
            .template_name_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| Error::Config {
                        message: format!("invalid templateNamePatterns entry '{}': {}", pattern, e),
                        hint: None,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TriageConfig {
            allowlist,
            inactivity_threshold,
            inactivity_threshold_days: self.inactivity_threshold_days,
            min_description_length,
            description_placeholders,
            template_keywords,
            template_name_patterns,
        })
    }
}
