//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for
//! `repo-triage`. It uses `thiserror` to describe every failure mode of a
//! triage run, with enough context for the caller to tell which stage failed
//! and why.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Fatal variants abort the run; the
//!   `MalformedRecord` variant is record-scoped and is collected by the loader
//!   instead of being propagated.
//!
//! - **`Stage`**: The pipeline stage an error belongs to (`config`, `load`,
//!   `reconcile`, `report`). Fatal errors always name their stage.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! - **`exit_codes`**: The process exit status used by the CLI for each class
//!   of fatal error.

use std::fmt;

use thiserror::Error;

/// The stage of a triage run in which an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Configuration parsing and validation, before any rule runs.
    Config,
    /// Fetching and normalizing the inventory snapshot.
    Load,
    /// Resolving tag sets into a partition.
    Reconcile,
    /// Rendering or writing the report.
    Report,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Config => "config",
            Stage::Load => "load",
            Stage::Reconcile => "reconcile",
            Stage::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for repo-triage operations
#[derive(Error, Debug)]
pub enum Error {
    /// The inventory collaborator could not supply a complete snapshot.
    ///
    /// Raised before any classification happens. A partial snapshot is never
    /// triaged, since repositories missing from it could never be protected.
    #[error("[load] Inventory fetch error: {message}")]
    Fetch { message: String },

    /// Malformed configuration, or a snapshot that violates a structural
    /// invariant such as name uniqueness.
    #[error("[config] Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A single raw entry could not be turned into a record.
    ///
    /// Record-scoped: the loader collects these and keeps going.
    #[error("Malformed record #{index}{}: {reason}", name.as_ref().map(|n| format!(" ({})", n)).unwrap_or_default())]
    MalformedRecord {
        /// Position of the entry in the raw snapshot
        index: usize,
        /// Repository name, when one could be read
        name: Option<String>,
        reason: String,
    },

    /// Totality or disjointness failed after reconciliation.
    ///
    /// This is an engine bug, not a data problem.
    #[error("[reconcile] Reconciliation invariant violated: {message}")]
    ReconciliationInvariant { message: String },

    /// The report could not be rendered or delivered to its sink.
    #[error("[report] Report output error: {message}")]
    Report { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("[load] I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("[load] YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("[load] JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a `Config` error without a hint.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            hint: None,
        }
    }

    /// Shorthand for a `Fetch` error.
    pub fn fetch(message: impl Into<String>) -> Self {
        Error::Fetch {
            message: message.into(),
        }
    }

    /// The stage this error belongs to.
    ///
    /// Wrapped I/O and parse errors are attributed to the load stage, which is
    /// where the library reads external documents.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Config { .. } => Stage::Config,
            Error::Fetch { .. } | Error::MalformedRecord { .. } => Stage::Load,
            Error::ReconciliationInvariant { .. } => Stage::Reconcile,
            Error::Report { .. } => Stage::Report,
            Error::Io(_) | Error::Yaml(_) | Error::Json(_) => Stage::Load,
        }
    }

    /// Whether the error aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::MalformedRecord { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes used by the `repo-triage` binary.
///
/// - `0`: success
/// - `1`: general error
/// - `2`: invalid command-line usage (emitted by clap)
/// - `3`: the inventory snapshot could not be fetched completely
/// - `4`: invalid configuration or snapshot structure
/// - `5`: internal reconciliation fault
pub mod exit_codes {
    use super::Error;

    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const USAGE: u8 = 2;
    pub const FETCH_ERROR: u8 = 3;
    pub const CONFIG_ERROR: u8 = 4;
    pub const INTERNAL_ERROR: u8 = 5;

    /// Map a library error to its exit code.
    pub fn for_error(error: &Error) -> u8 {
        match error {
            Error::Fetch { .. } => FETCH_ERROR,
            Error::Config { .. } => CONFIG_ERROR,
            Error::ReconciliationInvariant { .. } => INTERNAL_ERROR,
            _ => GENERAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let error = Error::config("duplicate allowlist entry 'a'");
        let display = format!("{}", error);
        assert!(display.contains("[config]"));
        assert!(display.contains("Configuration error"));
        assert!(display.contains("duplicate allowlist entry 'a'"));
        assert!(!display.contains("hint:"));
    }

    #[test]
    fn test_error_display_config_with_hint() {
        let error = Error::Config {
            message: "inactivityThresholdDays must not be negative".to_string(),
            hint: Some("use 0 to flag every repository not pushed right now".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("hint:"));
        assert!(display.contains("use 0"));
    }

    #[test]
    fn test_error_display_fetch() {
        let error = Error::fetch("snapshot marked incomplete");
        let display = format!("{}", error);
        assert!(display.contains("[load]"));
        assert!(display.contains("Inventory fetch error"));
        assert!(display.contains("snapshot marked incomplete"));
    }

    #[test]
    fn test_error_display_malformed_record() {
        let error = Error::MalformedRecord {
            index: 3,
            name: None,
            reason: "missing name".to_string(),
        };
        assert_eq!(format!("{}", error), "Malformed record #3: missing name");

        let named = Error::MalformedRecord {
            index: 4,
            name: Some("svc".to_string()),
            reason: "invalid pushedAt".to_string(),
        };
        assert_eq!(format!("{}", named), "Malformed record #4 (svc): invalid pushedAt");
    }

    #[test]
    fn test_error_display_reconciliation() {
        let error = Error::ReconciliationInvariant {
            message: "'a' appears in keep and fork".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("[reconcile]"));
        assert!(display.contains("'a' appears in keep and fork"));
    }

    #[test]
    fn test_error_stages() {
        assert_eq!(Error::config("x").stage(), Stage::Config);
        assert_eq!(Error::fetch("x").stage(), Stage::Load);
        assert_eq!(
            Error::ReconciliationInvariant {
                message: "x".to_string()
            }
            .stage(),
            Stage::Reconcile
        );
        assert_eq!(
            Error::Report {
                message: "x".to_string()
            }
            .stage(),
            Stage::Report
        );
        assert_eq!(Stage::Reconcile.to_string(), "reconcile");
    }

    #[test]
    fn test_malformed_record_is_not_fatal() {
        let error = Error::MalformedRecord {
            index: 0,
            name: None,
            reason: "missing name".to_string(),
        };
        assert!(!error.is_fatal());
        assert!(Error::fetch("x").is_fatal());
    }

    #[test]
    fn test_exit_codes_distinguish_fatal_errors() {
        assert_eq!(exit_codes::for_error(&Error::fetch("x")), exit_codes::FETCH_ERROR);
        assert_eq!(exit_codes::for_error(&Error::config("x")), exit_codes::CONFIG_ERROR);
        assert_eq!(
            exit_codes::for_error(&Error::ReconciliationInvariant {
                message: "x".to_string()
            }),
            exit_codes::INTERNAL_ERROR
        );
        let io = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(exit_codes::for_error(&io), exit_codes::GENERAL_ERROR);
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.starts_with("[load] I/O error"));
        assert!(display.contains("File not found"));
        assert_eq!(error.stage(), Stage::Load);
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_str = "invalid: [unclosed";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: Error = yaml_error.into();
        let display = format!("{}", error);
        assert!(display.starts_with("[load] YAML parsing error"));
    }

    #[test]
    fn test_error_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(error.to_string().starts_with("[load] JSON error"));
        assert_eq!(error.stage(), Stage::Load);
    }
}
