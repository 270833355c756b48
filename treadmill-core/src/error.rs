//! Error types for treadmill-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while inspecting or mutating the repository.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A check that must hold before the workflow may continue did not.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// An external command ran and exited non-zero.
    #[error("command `{command}` failed with exit status {status}")]
    CommandFailed { command: String, status: i32 },

    /// An external command could not be started at all.
    #[error("could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The manifest exists but carries no pin for the module.
    #[error("no pin for {module} in {manifest}")]
    PinNotFound { module: String, manifest: String },

    /// The manifest could not be read from disk or from the given commit.
    #[error("cannot read manifest {manifest}: {reason}")]
    ManifestUnreadable { manifest: String, reason: String },

    /// Something looked up by name (e.g. a git remote) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O failure with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A scripted fake saw an invocation it did not expect.
    #[error("unexpected invocation `{got}` (expected {expected})")]
    UnexpectedInvocation { expected: String, got: String },
}

/// Convenience constructor for [`RepoError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RepoError {
    RepoError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`RepoError::Precondition`].
pub fn precondition(message: impl Into<String>) -> RepoError {
    RepoError::Precondition(message.into())
}
