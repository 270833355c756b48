pub mod pick;
pub mod sync;

use anyhow::{Context, Result};
use treadmill_core::{Settings, SystemRunner, WorkflowOutcome};
use treadmill_github::GithubLocator;
use treadmill_sync::{pipeline, Action};

/// Run `action` against the repository in `settings.repo_root` with real
/// processes and the live GitHub API.
fn execute(action: Action, settings: &Settings) -> Result<WorkflowOutcome> {
    let runner = SystemRunner::new(settings.repo_root.clone());
    let locator = GithubLocator::new(settings);
    let label = match action {
        Action::Sync => "sync",
        Action::Pick => "pick",
    };
    pipeline::run(action, &runner, &locator, settings).with_context(|| format!("{label} failed"))
}

fn dry_run_prefix(settings: &Settings) -> &'static str {
    if settings.dry_run {
        "[dry-run] "
    } else {
        ""
    }
}
