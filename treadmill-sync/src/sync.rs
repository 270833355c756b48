//! Daily re-sync of the treadmill branch.
//!
//! ```text
//! Start → CheckClean → [DropPriorVendorCommit] → RequireTreadmillHead
//!       → PullMainline → [Rebase] → ReVendor → CommitJunk
//!       → {ShortCircuitExit | BuildVerify} → Done
//! ```
//!
//! Every step re-derives where it is from git, so an interrupted run can be
//! restarted from the top. Nothing is rolled back on failure.

use std::fmt;

use treadmill_core::{
    error::precondition, CommitClassification, DependencyPin, Invocation, RepoStateInspector,
    Settings, VersionExtractor, WorkflowOutcome,
};

use crate::error::WorkflowError;
use crate::message::junk_commit_message;
use crate::verify::BuildVerifier;

/// Steps of the sync state machine, for progress output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    CheckClean,
    DropPriorVendorCommit,
    RequireTreadmillHead,
    PullMainline,
    Rebase,
    ReVendor,
    CommitJunk,
    BuildVerify,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncStep::CheckClean => "checking working tree",
            SyncStep::DropPriorVendorCommit => "dropping previous vendor commit",
            SyncStep::RequireTreadmillHead => "checking treadmill commit",
            SyncStep::PullMainline => "pulling mainline",
            SyncStep::Rebase => "rebasing onto mainline",
            SyncStep::ReVendor => "vendoring upstream mainline",
            SyncStep::CommitJunk => "committing vendor diff",
            SyncStep::BuildVerify => "verifying build",
        };
        f.write_str(label)
    }
}

/// Runs the sync workflow against one repository.
pub struct SyncOrchestrator<'a> {
    repo: RepoStateInspector<'a>,
    versions: VersionExtractor<'a>,
    verifier: BuildVerifier<'a>,
    settings: &'a Settings,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(repo: RepoStateInspector<'a>) -> Self {
        let settings = repo.settings();
        Self {
            repo,
            versions: VersionExtractor::new(repo),
            verifier: BuildVerifier::new(repo.exec(), settings),
            settings,
        }
    }

    pub fn run(&self) -> Result<WorkflowOutcome, WorkflowError> {
        let branch = self.repo.current_branch()?;
        self.step(SyncStep::CheckClean);
        self.repo.require_clean()?;

        let dropped = self.drop_prior_vendor_commit()?;
        // A dry run skipped the reset, so the treadmill commit is still HEAD^.
        let head = if dropped && self.settings.dry_run { "HEAD^" } else { "HEAD" };
        self.require_treadmill_head(head)?;

        // The pin carried by the treadmill commit itself, so a fix folded into
        // it after a failed run is verified again.
        let before = if head == "HEAD" {
            self.versions.upstream_pin(None)?
        } else {
            self.versions.upstream_pin(Some(head))?
        };
        tracing::info!("{} before sync: {}", self.settings.product, before.reference);

        self.pull_mainline(&branch)?;
        let rebased = self.rebase_if_needed()?;
        let after = self.revendor()?;
        self.commit_junk(&after)?;

        let Some(kind) = classify_change(&before.reference, &after.reference, rebased) else {
            tracing::info!("nothing has changed since the last sync");
            return Ok(WorkflowOutcome::unchanged(format!(
                "nothing changed: {} still at {}, branch already on {}",
                self.settings.product, after.reference, self.settings.mainline
            )));
        };
        let message = format!(
            "{kind} ({} {} -> {})",
            self.settings.product, before.reference, after.reference
        );
        tracing::info!("{message}");

        if self.settings.dry_run {
            tracing::info!("[dry-run] skipping build verification");
            return Ok(WorkflowOutcome::changed(message));
        }
        self.step(SyncStep::BuildVerify);
        self.verifier.verify("HEAD^")?;
        Ok(WorkflowOutcome::changed(message))
    }

    /// Returns `true` when HEAD was (or in a dry run would have been) reset.
    fn drop_prior_vendor_commit(&self) -> Result<bool, WorkflowError> {
        let check = self.repo.vendor_check("HEAD", false)?;
        if !check.is_vendor() {
            return Ok(false);
        }
        if !self.repo.is_treadmill_commit("HEAD^")? {
            return Err(precondition(format!(
                "HEAD is a {product} vendor commit but its parent is not a {product} treadmill commit",
                product = self.settings.product
            ))
            .into());
        }
        self.step(SyncStep::DropPriorVendorCommit);
        self.repo
            .exec()
            .mutate(Invocation::git(["reset", "--hard", "HEAD^"]))?;
        Ok(true)
    }

    fn require_treadmill_head(&self, head: &str) -> Result<(), WorkflowError> {
        self.step(SyncStep::RequireTreadmillHead);
        let kind = self.repo.classify_commit(head)?;
        if kind == CommitClassification::TreadmillCommit {
            return Ok(());
        }
        let subject = self.repo.subject(head)?;
        Err(precondition(format!(
            "{head} is not a {} treadmill commit but a {kind} (subject: '{subject}')",
            self.settings.product
        ))
        .into())
    }

    fn pull_mainline(&self, branch: &str) -> Result<(), WorkflowError> {
        self.step(SyncStep::PullMainline);
        let remote = self.repo.upstream_remote()?;
        let mainline = self.settings.mainline.as_str();
        let exec = self.repo.exec();
        exec.mutate(Invocation::git(["checkout", "-q", mainline]))?;
        exec.mutate(Invocation::git(["pull", "-q", "--rebase", remote.as_str(), mainline]))?;
        exec.mutate(Invocation::git(["checkout", "-q", branch]))?;
        Ok(())
    }

    /// Returns `true` when a rebase was needed.
    fn rebase_if_needed(&self) -> Result<bool, WorkflowError> {
        let mainline = self.settings.mainline.as_str();
        let fork_point = self.repo.fork_point(mainline)?;
        let tip = self.repo.rev_parse(mainline)?;
        if fork_point == tip {
            tracing::info!("branch is already rebased on {mainline}");
            return Ok(false);
        }
        self.step(SyncStep::Rebase);
        // A previous pick can leave the treadmill commit empty; keep it.
        self.repo
            .exec()
            .mutate(Invocation::git(["rebase", "--empty=keep", mainline]))?;
        Ok(true)
    }

    fn revendor(&self) -> Result<DependencyPin, WorkflowError> {
        self.step(SyncStep::ReVendor);
        let target = format!(
            "{}@{}",
            self.settings.upstream_module, self.settings.upstream_branch
        );
        let exec = self.repo.exec();
        exec.mutate(Invocation::new("go", ["get", target.as_str()]).inherit_output())?;
        exec.mutate(Invocation::new("make", ["vendor"]).inherit_output())?;
        let after = self.versions.upstream_pin(None)?;
        tracing::info!("{} after sync: {}", self.settings.product, after.reference);
        Ok(after)
    }

    fn commit_junk(&self, after: &DependencyPin) -> Result<(), WorkflowError> {
        self.step(SyncStep::CommitJunk);
        let message = junk_commit_message(self.settings, &after.reference);
        self.repo.exec().mutate(Invocation::git([
            "commit",
            "-q",
            "--all",
            "--signoff",
            "--allow-empty",
            "-m",
            message.as_str(),
        ]))?;
        Ok(())
    }

    fn step(&self, step: SyncStep) {
        tracing::info!("{step}{}", self.settings.dry_run_suffix());
    }
}

/// How the treadmill moved, or `None` when it did not.
pub fn classify_change(before: &str, after: &str, rebased: bool) -> Option<&'static str> {
    match (before != after, rebased) {
        (false, false) => None,
        (true, false) => Some("new upstream version, same downstream baseline"),
        (false, true) => Some("downstream bumped, upstream unchanged"),
        (true, true) => Some("new upstream version, downstream bumped"),
    }
}
