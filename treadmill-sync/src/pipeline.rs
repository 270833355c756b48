//! Shared workflow entrypoint used by the CLI.

use treadmill_core::{CommandRunner, RepoStateInspector, Settings, WorkflowOutcome};
use treadmill_github::TreadmillLocator;

use crate::{PickOrchestrator, SyncOrchestrator, WorkflowError};

/// Which workflow to run. Exactly one per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Re-vendor upstream mainline onto the treadmill branch.
    Sync,
    /// Cherry-pick the treadmill payload onto a real vendor commit.
    Pick,
}

/// Run `action` with the given process runner and PR locator.
///
/// The locator is only consulted by [`Action::Pick`].
pub fn run(
    action: Action,
    runner: &dyn CommandRunner,
    locator: &dyn TreadmillLocator,
    settings: &Settings,
) -> Result<WorkflowOutcome, WorkflowError> {
    if settings.force {
        tracing::debug!("--force given; no check is currently bypassed by it");
    }
    let repo = RepoStateInspector::new(runner, settings);
    match action {
        Action::Sync => SyncOrchestrator::new(repo).run(),
        Action::Pick => PickOrchestrator::new(repo, locator).run(),
    }
}
