//! Shared test utilities for the CLI end-to-end tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_inventory(inventories::SCENARIO);
//!     fixture.command().arg("run").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{configs, inventories, TestFixture, NOW};
}

/// Reference time used by every fixture inventory.
#[allow(dead_code)]
pub const NOW: &str = "2024-02-01T00:00:00Z";

/// Configuration YAML snippets.
#[allow(dead_code)]
pub mod configs {
    /// Keeps `A` no matter what.
    pub const ALLOW_A: &str = "allowlist:\n  - A\n";

    /// A configuration that fails validation.
    pub const DUPLICATE_ALLOWLIST: &str = "allowlist: [A, A]\n";

    /// A key the configuration does not know.
    pub const UNKNOWN_KEY: &str = "allowList: [A]\n";

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "allowlist: [unclosed";
}

/// Inventory snapshots as the fetch step writes them.
#[allow(dead_code)]
pub mod inventories {
    /// Five repositories covering keep and three delete tiers.
    pub const SCENARIO: &str = r#"[
  {"name": "A", "description": "", "isFork": true, "pushedAt": "2024-01-30T00:00:00Z"},
  {"name": "demo-app", "description": "a demo", "isFork": false, "pushedAt": "2024-01-30T00:00:00Z"},
  {"name": "C", "description": "", "isFork": false, "pushedAt": "2024-01-30T00:00:00Z"},
  {"name": "D", "description": "A real production service with clear purpose", "isFork": false, "pushedAt": "2023-12-03T00:00:00Z"},
  {"name": "E", "description": "A real production service with clear purpose", "isFork": false, "pushedAt": "2024-01-30T00:00:00Z"}
]"#;

    /// A snapshot whose fetch stopped early.
    pub const INCOMPLETE: &str = r#"{
  "complete": false,
  "repositories": [
    {"name": "svc", "description": "Payments service for the online shop", "pushedAt": "2024-01-30T00:00:00Z"}
  ]
}"#;

    /// The same name twice.
    pub const DUPLICATE_NAMES: &str = r#"[
  {"name": "svc", "pushedAt": "2024-01-30T00:00:00Z"},
  {"name": "svc", "pushedAt": "2024-01-29T00:00:00Z"}
]"#;

    /// One good entry, one whose name is not a string.
    pub const BADLY_TYPED: &str = r#"[
  {"name": "svc", "description": "Payments service for the online shop", "pushedAt": "2024-01-30T00:00:00Z"},
  {"name": 42, "isFork": "yes", "pushedAt": "2024-01-30T00:00:00Z"}
]"#;

    /// One good entry, one without a name.
    pub const WITH_MALFORMED: &str = r#"{
  "capturedAt": "2024-02-01T00:00:00Z",
  "repositories": [
    {"name": "svc", "description": "Payments service for the online shop", "pushedAt": "2024-01-30T00:00:00Z"},
    {"description": "nameless", "pushedAt": "2024-01-30T00:00:00Z"}
  ]
}"#;
}

/// A temporary working directory holding a config and an inventory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `.repo-triage.yaml` into the working directory.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file(".repo-triage.yaml", content)
    }

    /// Write `repos.json` into the working directory.
    pub fn with_inventory(self, content: &str) -> Self {
        self.with_file("repos.json", content)
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn inventory_path(&self) -> PathBuf {
        self.temp_dir.path().join("repos.json")
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A `repo-triage` command running in the fixture directory.
    ///
    /// `REPO_TRIAGE_CONFIG` and `RUST_LOG` are cleared so the caller's
    /// environment cannot leak in.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("repo-triage");
        cmd.current_dir(self.path())
            .env_remove("REPO_TRIAGE_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    /// `repo-triage run` against the fixture inventory at [`NOW`].
    pub fn run_command(&self) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.args(["run", "--inventory", "repos.json", "--now", NOW]);
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
