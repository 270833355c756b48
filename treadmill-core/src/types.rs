//! Domain types for the treadmill workflow.
//!
//! Everything here is derived from the repository or the review platform on
//! each run. Nothing is persisted between invocations.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Commit classification
// ---------------------------------------------------------------------------

/// What a single commit looks like from the treadmill's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitClassification {
    /// Subject names the product and, somewhere later, "treadmill".
    TreadmillCommit,
    /// Diff touches every pin/lock file plus the vendored upstream tree.
    VendorCommit,
    Neither,
}

impl fmt::Display for CommitClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitClassification::TreadmillCommit => write!(f, "treadmill commit"),
            CommitClassification::VendorCommit => write!(f, "vendor commit"),
            CommitClassification::Neither => write!(f, "plain commit"),
        }
    }
}

/// Result of comparing a commit's touched paths against the vendor layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorCheck {
    /// Human-readable expectations the commit did not meet, in check order.
    pub unmet: Vec<String>,
}

impl VendorCheck {
    pub fn is_vendor(&self) -> bool {
        self.unmet.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Working tree
// ---------------------------------------------------------------------------

/// Cleanliness of the tracked files in the working tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStatus {
    pub clean: bool,
    pub changed_paths: Vec<PathBuf>,
}

impl RepoStatus {
    pub fn from_paths(changed_paths: Vec<PathBuf>) -> Self {
        Self {
            clean: changed_paths.is_empty(),
            changed_paths,
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest pin
// ---------------------------------------------------------------------------

/// The upstream module reference recorded in the dependency manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPin {
    pub module_path: String,
    pub reference: String,
}

impl fmt::Display for DependencyPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.module_path, self.reference)
    }
}

// ---------------------------------------------------------------------------
// Review platform
// ---------------------------------------------------------------------------

/// Pull request state as reported by the GraphQL API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrState {
    Open,
    Closed,
    #[default]
    #[serde(other)]
    Other,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrState::Open => write!(f, "OPEN"),
            PrState::Closed => write!(f, "CLOSED"),
            PrState::Other => write!(f, "OTHER"),
        }
    }
}

/// One search hit. Non-PR hits come back as empty nodes, hence the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct TreadmillPr {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: PrState,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Summary of a finished workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
    /// `false` when the run found nothing worth verifying.
    pub changed: bool,
    pub message: String,
}

impl WorkflowOutcome {
    pub fn unchanged(message: impl Into<String>) -> Self {
        Self {
            changed: false,
            message: message.into(),
        }
    }

    pub fn changed(message: impl Into<String>) -> Self {
        Self {
            changed: true,
            message: message.into(),
        }
    }
}
