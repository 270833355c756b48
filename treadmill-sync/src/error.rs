//! Error types for treadmill-sync.

use std::path::PathBuf;

use thiserror::Error;

use treadmill_core::RepoError;
use treadmill_github::QueryError;

/// All errors that can end a sync or pick run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Precondition or command failure from the repository layer.
    #[error(transparent)]
    Repo(#[from] RepoError),

    /// The treadmill PR could not be pinned down.
    #[error("treadmill PR lookup failed: {0}")]
    Query(#[from] QueryError),

    /// The downstream build itself broke; no further checks were run.
    #[error("`{command}` failed with exit status {status}; please fix and fold the fix into {fold_into}")]
    BuildFailed {
        command: String,
        status: i32,
        fold_into: String,
    },

    /// One or more auxiliary checks failed after a good build.
    #[error("{} check(s) failed: {}; please fix and fold the fix into {fold_into} before pushing", .failed.len(), .failed.join(", "))]
    Verification {
        failed: Vec<String>,
        fold_into: String,
    },

    /// The treadmill payload commit has nothing worth keeping.
    #[error("commit message of {rev} has no line starting with 'Changes as of'")]
    MissingChangesSection { rev: String },

    /// I/O failure while clearing scratch directories.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`WorkflowError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WorkflowError {
    WorkflowError::Io {
        path: path.into(),
        source,
    }
}
