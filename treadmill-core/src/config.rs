//! The single configuration value threaded through a run.
//!
//! [`Settings`] is built once by the entry point and handed to every
//! component by reference. There is no configuration file: the project
//! constants live in [`Settings::default`] and the per-run flags are set
//! with the builder methods.

use std::path::{Path, PathBuf};

/// Name the tool reports in commit messages and diagnostics.
pub const TOOL_NAME: &str = "buildah-vendor-treadmill";

/// Immutable configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    // Project constants.
    pub product: String,
    pub upstream_module: String,
    pub upstream_branch: String,
    pub downstream_repo: String,
    pub mainline: String,
    pub treadmill_title: String,
    pub manifest: PathBuf,
    pub lockfile: PathBuf,
    pub vendor_manifest: PathBuf,
    pub graphql_endpoint: String,
    pub scratch_root: PathBuf,
    pub scratch_prefix: String,
    pub tool_name: String,
    pub tool_version: String,
    pub repo_root: PathBuf,

    // Run flags.
    pub dry_run: bool,
    pub verbose: bool,
    pub debug: bool,
    /// Parsed and carried; no check is bypassed by it.
    pub force: bool,
    pub token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            product: "buildah".to_string(),
            upstream_module: "github.com/containers/buildah".to_string(),
            upstream_branch: "main".to_string(),
            downstream_repo: "containers/podman".to_string(),
            mainline: "main".to_string(),
            treadmill_title: "DO NOT MERGE: buildah vendor treadmill".to_string(),
            manifest: PathBuf::from("go.mod"),
            lockfile: PathBuf::from("go.sum"),
            vendor_manifest: PathBuf::from("vendor/modules.txt"),
            graphql_endpoint: "https://api.github.com/graphql".to_string(),
            scratch_root: std::env::temp_dir(),
            scratch_prefix: "buildah-bud-".to_string(),
            tool_name: TOOL_NAME.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            repo_root: PathBuf::from("."),
            dry_run: false,
            verbose: false,
            debug: false,
            force: false,
            token: None,
        }
    }
}

impl Settings {
    pub fn with_repo_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.repo_root = root.into();
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = version.into();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Empty tokens are treated as absent.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Vendored copy of the upstream module, e.g.
    /// `vendor/github.com/containers/buildah/`.
    pub fn vendor_subtree(&self) -> String {
        format!("vendor/{}/", self.upstream_module)
    }

    /// Paths every vendor commit must touch, in check order.
    pub fn required_vendor_paths(&self) -> [&Path; 3] {
        [
            self.manifest.as_path(),
            self.lockfile.as_path(),
            self.vendor_manifest.as_path(),
        ]
    }

    pub fn manifest_on_disk(&self) -> PathBuf {
        self.repo_root.join(&self.manifest)
    }

    /// Default log filter for the run: `--debug` wins over `--verbose`.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "trace"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Suffix appended to progress lines while nothing is being mutated.
    pub fn dry_run_suffix(&self) -> &'static str {
        if self.dry_run {
            " [dry-run]"
        } else {
            ""
        }
    }
}
