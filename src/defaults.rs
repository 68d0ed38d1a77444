//! Default values for repo-triage configuration.
//!
//! This module provides centralized default values used by the configuration
//! layer and the built-in rules, so the CLI and library agree on them.

/// Default configuration file looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = ".repo-triage.yaml";

/// Days without a push after which a repository counts as inactive.
pub const INACTIVITY_THRESHOLD_DAYS: i64 = 30;

/// Descriptions shorter than this (in characters) are considered poor.
pub const MIN_DESCRIPTION_LENGTH: i64 = 20;

/// Descriptions that carry no information beyond the visibility.
pub const DESCRIPTION_PLACEHOLDERS: &[&str] = &["public", "private"];

/// Keywords marking template, demo and scaffolding repositories.
pub const TEMPLATE_KEYWORDS: &[&str] = &[
    "template",
    "starter",
    "boilerplate",
    "example",
    "demo",
    "sample",
];

pub fn description_placeholders() -> Vec<String> {
    DESCRIPTION_PLACEHOLDERS.iter().map(|s| s.to_string()).collect()
}

pub fn template_keywords() -> Vec<String> {
    TEMPLATE_KEYWORDS.iter().map(|s| s.to_string()).collect()
}
