//! Treadmill core library: repository state inspection, manifest pins,
//! command execution, and the shared configuration value.
//!
//! Public API surface:
//! - [`config`]: [`Settings`], built once per run
//! - [`error`]: [`RepoError`]
//! - [`runner`] / [`exec`]: process execution behind [`CommandRunner`]
//! - [`repo`]: [`RepoStateInspector`]
//! - [`manifest`]: [`VersionExtractor`]
//! - [`fakes`]: [`ScriptedRunner`] for tests

pub mod config;
pub mod error;
pub mod exec;
pub mod fakes;
pub mod manifest;
pub mod repo;
pub mod runner;
pub mod types;

pub use config::Settings;
pub use error::RepoError;
pub use exec::Executor;
pub use fakes::ScriptedRunner;
pub use manifest::VersionExtractor;
pub use repo::RepoStateInspector;
pub use runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};
pub use types::{
    CommitClassification, DependencyPin, PrState, RepoStatus, TreadmillPr, VendorCheck,
    WorkflowOutcome,
};
