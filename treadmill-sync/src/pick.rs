//! Landing the treadmill payload as a real commit.
//!
//! ```text
//! Start → RequireVendorHead → LocateOpenPR → FetchScratchBranch
//!       → ComparePins (warn only) → CherryPickPayload → DeleteScratch
//!       → BuildVerify → Done
//! ```
//!
//! The treadmill PR's tip is the junk vendor commit; its parent is the
//! payload, the hand-maintained commit carrying podman changes needed for new
//! buildah. That parent is what gets cherry-picked, with its message
//! rewritten.

use treadmill_core::{Invocation, RepoStateInspector, Settings, VersionExtractor, WorkflowOutcome};
use treadmill_github::TreadmillLocator;

use crate::error::WorkflowError;
use crate::message::rewrite_payload_message;
use crate::verify::BuildVerifier;

/// Runs the pick workflow against one repository.
pub struct PickOrchestrator<'a> {
    repo: RepoStateInspector<'a>,
    versions: VersionExtractor<'a>,
    verifier: BuildVerifier<'a>,
    locator: &'a dyn TreadmillLocator,
    settings: &'a Settings,
    process_id: u32,
}

impl<'a> PickOrchestrator<'a> {
    pub fn new(repo: RepoStateInspector<'a>, locator: &'a dyn TreadmillLocator) -> Self {
        let settings = repo.settings();
        Self {
            repo,
            versions: VersionExtractor::new(repo),
            verifier: BuildVerifier::new(repo.exec(), settings),
            locator,
            settings,
            process_id: std::process::id(),
        }
    }

    /// Override the id used in the scratch branch name.
    pub fn with_process_id(mut self, process_id: u32) -> Self {
        self.process_id = process_id;
        self
    }

    pub fn run(&self) -> Result<WorkflowOutcome, WorkflowError> {
        self.repo.current_branch()?;
        self.repo.require_clean()?;
        self.repo.vendor_check("HEAD", true)?;

        let pr = self
            .locator
            .find_open_treadmill_pr(&self.settings.treadmill_title)?;
        let remote = self.repo.upstream_remote()?;
        let scratch = scratch_branch_name(&self.settings.tool_name, pr, self.process_id);

        // The scratch ref never touches the working branch, so it is fetched
        // and deleted even in a dry run.
        tracing::info!("fetching PR #{pr} into {scratch}");
        let refspec = format!("pull/{pr}/head:{scratch}");
        self.repo
            .exec()
            .read(Invocation::git(["fetch", "-q", remote.as_str(), refspec.as_str()]))?;

        let picked = self.pick_from(&scratch, pr);
        let deleted = self
            .repo
            .exec()
            .read(Invocation::git(["branch", "-D", scratch.as_str()]));
        picked?;
        deleted?;

        let message = format!("cherry-picked payload of treadmill PR #{pr}");
        if self.settings.dry_run {
            tracing::info!("[dry-run] skipping build verification");
            return Ok(WorkflowOutcome::changed(message));
        }
        tracing::info!("verifying build");
        self.verifier.verify("HEAD")?;
        Ok(WorkflowOutcome::changed(message))
    }

    fn pick_from(&self, scratch: &str, pr: u64) -> Result<(), WorkflowError> {
        self.compare_pins(scratch, pr)?;

        let payload = format!("{scratch}^");
        let original = self.repo.commit_message(&payload)?;
        let message = rewrite_payload_message(&original, self.settings, pr)
            .ok_or_else(|| WorkflowError::MissingChangesSection {
                rev: payload.clone(),
            })?;
        tracing::debug!("rewritten message:\n{message}");

        tracing::info!("cherry-picking {payload}{}", self.settings.dry_run_suffix());
        let exec = self.repo.exec();
        // The payload may already be applied on HEAD; keep it as an empty commit.
        exec.mutate(Invocation::git([
            "cherry-pick",
            "--allow-empty",
            "--keep-redundant-commits",
            payload.as_str(),
        ]))?;
        exec.mutate(Invocation::git([
            "commit",
            "-q",
            "--amend",
            "--allow-empty",
            "-m",
            message.as_str(),
        ]))?;
        Ok(())
    }

    /// A mismatch is expected once the treadmill has moved past a tagged
    /// release, so it only warns.
    fn compare_pins(&self, scratch: &str, pr: u64) -> Result<(), WorkflowError> {
        let on_pr = self.versions.upstream_pin(Some(scratch))?;
        let here = self.versions.upstream_pin(None)?;
        if on_pr.reference != here.reference {
            let product = &self.settings.product;
            tracing::warn!(
                "{product} on PR #{pr} is {} but HEAD vendors {}; expected if the treadmill \
                 has moved past a tagged {product} release",
                on_pr.reference,
                here.reference,
            );
        }
        Ok(())
    }
}

/// Scratch branch for one PR fetch, unique per process.
pub fn scratch_branch_name(tool: &str, pr: u64, process_id: u32) -> String {
    format!("{tool}/pr{pr}/tmp{process_id}")
}
