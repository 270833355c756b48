//! Sync workflow scenarios against a scripted git/go/make sequence.
//!
//! The manifest lives in a `TempDir`; `make vendor` is scripted to rewrite it
//! when a scenario needs a new upstream pin.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use treadmill_core::{CommandOutput, RepoError, RepoStateInspector, ScriptedRunner, Settings};
use treadmill_sync::message::junk_commit_message;
use treadmill_sync::{SyncOrchestrator, WorkflowError};

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

const TREADMILL_SUBJECT: &str = "[DO NOT MERGE] buildah treadmill: podman changes";
const REMOTE_LINE: &str = "upstream\thttps://github.com/containers/podman.git (fetch)";
const VENDOR_DIFF: &[&str] = &[
    "go.mod",
    "go.sum",
    "vendor/modules.txt",
    "vendor/github.com/containers/buildah/run.go",
];

struct Fixture {
    dir: TempDir,
    settings: Settings,
}

impl Fixture {
    fn new(pin: &str) -> Self {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("go.mod"), gomod(pin)).expect("write go.mod");
        let settings = Settings::default()
            .with_repo_root(dir.path())
            .with_scratch_root(dir.path().join("scratch"));
        Self { dir, settings }
    }

    fn manifest(&self) -> PathBuf {
        self.dir.path().join("go.mod")
    }
}

fn gomod(pin: &str) -> String {
    format!(
        "module github.com/containers/podman/v5\n\ngo 1.21\n\nrequire (\n\tgithub.com/containers/buildah {pin}\n\tgithub.com/containers/common v0.57.0\n)\n"
    )
}

// ---------------------------------------------------------------------------
// Script fragments
// ---------------------------------------------------------------------------

fn clean_side_branch(runner: ScriptedRunner) -> ScriptedRunner {
    runner
        .expect(
            ["git", "rev-parse", "--abbrev-ref", "HEAD"],
            CommandOutput::ok(["buildah-treadmill"]),
        )
        .expect(
            ["git", "status", "--porcelain", "--untracked-files=no"],
            CommandOutput::empty(),
        )
}

fn head_is_treadmill(runner: ScriptedRunner) -> ScriptedRunner {
    runner
        .expect(
            ["git", "diff", "--name-only", "HEAD^", "HEAD"],
            CommandOutput::ok(["test/e2e/build_test.go"]),
        )
        .expect(
            ["git", "log", "-1", "--format=%s", "HEAD"],
            CommandOutput::ok([TREADMILL_SUBJECT]),
        )
}

fn pull_mainline(runner: ScriptedRunner) -> ScriptedRunner {
    runner
        .expect(["git", "remote", "-v"], CommandOutput::ok([REMOTE_LINE]))
        .expect(["git", "checkout", "-q", "main"], CommandOutput::empty())
        .expect(
            ["git", "pull", "-q", "--rebase", "upstream", "main"],
            CommandOutput::empty(),
        )
        .expect(
            ["git", "checkout", "-q", "buildah-treadmill"],
            CommandOutput::empty(),
        )
}

fn fork_point(runner: ScriptedRunner, fork: &str, tip: &str) -> ScriptedRunner {
    let runner = runner
        .expect(
            ["git", "merge-base", "--fork-point", "main"],
            CommandOutput::ok([fork]),
        )
        .expect(["git", "rev-parse", "main"], CommandOutput::ok([tip]));
    if fork == tip {
        runner
    } else {
        runner.expect(
            ["git", "rebase", "--empty=keep", "main"],
            CommandOutput::empty(),
        )
    }
}

fn revendor(runner: ScriptedRunner, manifest: PathBuf, new_pin: Option<&str>) -> ScriptedRunner {
    let runner = runner.expect(
        ["go", "get", "github.com/containers/buildah@main"],
        CommandOutput::empty(),
    );
    match new_pin {
        Some(pin) => {
            let content = gomod(pin);
            runner.expect_with(["make", "vendor"], CommandOutput::empty(), move || {
                fs::write(&manifest, &content).expect("rewrite go.mod")
            })
        }
        None => runner.expect(["make", "vendor"], CommandOutput::empty()),
    }
}

fn commit_junk(runner: ScriptedRunner, settings: &Settings, pin: &str) -> ScriptedRunner {
    let message = junk_commit_message(settings, pin);
    runner.expect(
        [
            "git",
            "commit",
            "-q",
            "--all",
            "--signoff",
            "--allow-empty",
            "-m",
            message.as_str(),
        ],
        CommandOutput::empty(),
    )
}

fn verify_passes(runner: ScriptedRunner) -> ScriptedRunner {
    runner
        .expect(["make"], CommandOutput::empty())
        .expect(["hack/xref-helpmsgs-manpages"], CommandOutput::empty())
        .expect(
            ["test/buildah-bud/run-buildah-bud-tests", "--no-test"],
            CommandOutput::empty(),
        )
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn up_to_date_treadmill_exits_without_verifying() {
    let fx = Fixture::new("v1.1.0");
    let mut runner = clean_side_branch(ScriptedRunner::new());
    runner = head_is_treadmill(runner);
    runner = pull_mainline(runner);
    runner = fork_point(runner, "abc123", "abc123");
    runner = revendor(runner, fx.manifest(), None);
    runner = commit_junk(runner, &fx.settings, "v1.1.0");

    let outcome = SyncOrchestrator::new(RepoStateInspector::new(&runner, &fx.settings))
        .run()
        .expect("sync");

    assert!(!outcome.changed);
    assert!(outcome.message.contains("nothing changed"), "{}", outcome.message);
    assert!(runner.calls().iter().all(|argv| argv != &["make"]));
    assert!(!runner.ran(&["hack/xref-helpmsgs-manpages"]));
    assert_eq!(runner.remaining(), 0);
}

#[test]
fn new_upstream_version_on_same_baseline() {
    let fx = Fixture::new("v1.0.0");
    let mut runner = clean_side_branch(ScriptedRunner::new());
    runner = head_is_treadmill(runner);
    runner = pull_mainline(runner);
    runner = fork_point(runner, "abc123", "abc123");
    runner = revendor(runner, fx.manifest(), Some("v1.1.0"));
    runner = commit_junk(runner, &fx.settings, "v1.1.0");
    runner = verify_passes(runner);

    let outcome = SyncOrchestrator::new(RepoStateInspector::new(&runner, &fx.settings))
        .run()
        .expect("sync");

    assert!(outcome.changed);
    assert!(
        outcome
            .message
            .contains("new upstream version, same downstream baseline"),
        "{}",
        outcome.message
    );
    assert!(outcome.message.contains("v1.0.0 -> v1.1.0"));
    assert_eq!(runner.remaining(), 0);
}

#[test]
fn downstream_bumped_upstream_unchanged() {
    let fx = Fixture::new("v1.0.0");
    let mut runner = clean_side_branch(ScriptedRunner::new());
    runner = head_is_treadmill(runner);
    runner = pull_mainline(runner);
    runner = fork_point(runner, "old000", "new111");
    runner = revendor(runner, fx.manifest(), None);
    runner = commit_junk(runner, &fx.settings, "v1.0.0");
    runner = verify_passes(runner);

    let outcome = SyncOrchestrator::new(RepoStateInspector::new(&runner, &fx.settings))
        .run()
        .expect("sync");

    assert!(outcome.changed);
    assert!(
        outcome.message.contains("downstream bumped, upstream unchanged"),
        "{}",
        outcome.message
    );
    assert!(runner.ran(&["git", "rebase", "--empty=keep", "main"]));
    assert_eq!(runner.remaining(), 0);
}

#[test]
fn prior_vendor_commit_is_dropped_before_resync() {
    let fx = Fixture::new("v1.1.0");
    let mut runner = clean_side_branch(ScriptedRunner::new())
        .expect(
            ["git", "diff", "--name-only", "HEAD^", "HEAD"],
            CommandOutput::ok(VENDOR_DIFF.iter().copied()),
        )
        .expect(
            ["git", "log", "-1", "--format=%s", "HEAD^"],
            CommandOutput::ok([TREADMILL_SUBJECT]),
        )
        .expect(["git", "reset", "--hard", "HEAD^"], CommandOutput::empty())
        .expect(
            ["git", "log", "-1", "--format=%s", "HEAD"],
            CommandOutput::ok([TREADMILL_SUBJECT]),
        );
    runner = pull_mainline(runner);
    runner = fork_point(runner, "abc123", "abc123");
    runner = revendor(runner, fx.manifest(), None);
    runner = commit_junk(runner, &fx.settings, "v1.1.0");

    let outcome = SyncOrchestrator::new(RepoStateInspector::new(&runner, &fx.settings))
        .run()
        .expect("sync");

    assert!(!outcome.changed);
    assert_eq!(runner.remaining(), 0);
}

#[test]
fn treadmill_fix_after_dropped_vendor_commit_is_verified() {
    // Yesterday's vendor commit pinned v1.1.0; the treadmill commit under it
    // still pins v1.0.0 and now carries the operator's fix.
    let fx = Fixture::new("v1.1.0");
    let manifest = fx.manifest();
    let treadmill_gomod = gomod("v1.0.0");
    let mut runner = clean_side_branch(ScriptedRunner::new())
        .expect(
            ["git", "diff", "--name-only", "HEAD^", "HEAD"],
            CommandOutput::ok(VENDOR_DIFF.iter().copied()),
        )
        .expect(
            ["git", "log", "-1", "--format=%s", "HEAD^"],
            CommandOutput::ok([TREADMILL_SUBJECT]),
        )
        .expect_with(
            ["git", "reset", "--hard", "HEAD^"],
            CommandOutput::empty(),
            move || fs::write(&manifest, &treadmill_gomod).expect("reset go.mod"),
        )
        .expect(
            ["git", "log", "-1", "--format=%s", "HEAD"],
            CommandOutput::ok([TREADMILL_SUBJECT]),
        );
    runner = pull_mainline(runner);
    runner = fork_point(runner, "abc123", "abc123");
    runner = revendor(runner, fx.manifest(), Some("v1.1.0"));
    runner = commit_junk(runner, &fx.settings, "v1.1.0");
    runner = verify_passes(runner);

    let outcome = SyncOrchestrator::new(RepoStateInspector::new(&runner, &fx.settings))
        .run()
        .expect("sync");

    assert!(outcome.changed, "{}", outcome.message);
    assert!(outcome.message.contains("v1.0.0 -> v1.1.0"), "{}", outcome.message);
    assert!(runner.ran(&["make"]));
    assert!(runner.ran(&["test/buildah-bud/run-buildah-bud-tests"]));
    assert_eq!(runner.remaining(), 0);
}

#[test]
fn vendor_head_without_treadmill_parent_is_fatal() {
    let fx = Fixture::new("v1.1.0");
    let runner = clean_side_branch(ScriptedRunner::new())
        .expect(
            ["git", "diff", "--name-only", "HEAD^", "HEAD"],
            CommandOutput::ok(VENDOR_DIFF.iter().copied()),
        )
        .expect(
            ["git", "log", "-1", "--format=%s", "HEAD^"],
            CommandOutput::ok(["Merge pull request #1 from someone/fix"]),
        );

    let err = SyncOrchestrator::new(RepoStateInspector::new(&runner, &fx.settings))
        .run()
        .expect_err("bad parent");

    match err {
        WorkflowError::Repo(RepoError::Precondition(message)) => {
            assert!(message.contains("parent is not a buildah treadmill commit"), "{message}");
        }
        other => panic!("expected precondition failure, got {other:?}"),
    }
    assert!(!runner.ran(&["git", "reset"]));
}

#[test]
fn head_that_is_neither_is_fatal() {
    let fx = Fixture::new("v1.1.0");
    let runner = clean_side_branch(ScriptedRunner::new())
        .expect(
            ["git", "diff", "--name-only", "HEAD^", "HEAD"],
            CommandOutput::ok(["README.md"]),
        )
        .expect(
            ["git", "log", "-1", "--format=%s", "HEAD"],
            CommandOutput::ok(["fix typo"]),
        )
        .expect(
            ["git", "diff", "--name-only", "HEAD^", "HEAD"],
            CommandOutput::ok(["README.md"]),
        )
        .expect(
            ["git", "log", "-1", "--format=%s", "HEAD"],
            CommandOutput::ok(["fix typo"]),
        );

    let err = SyncOrchestrator::new(RepoStateInspector::new(&runner, &fx.settings))
        .run()
        .expect_err("not treadmill");

    let message = err.to_string();
    assert!(message.contains("not a buildah treadmill commit"), "{message}");
    assert!(message.contains("fix typo"), "{message}");
    assert!(message.contains("but a plain commit"), "{message}");
    assert!(!runner.ran(&["git", "checkout"]));
    assert_eq!(runner.remaining(), 0);
}

#[test]
fn broken_build_stops_before_other_checks() {
    let fx = Fixture::new("v1.0.0");
    let mut runner = clean_side_branch(ScriptedRunner::new());
    runner = head_is_treadmill(runner);
    runner = pull_mainline(runner);
    runner = fork_point(runner, "abc123", "abc123");
    runner = revendor(runner, fx.manifest(), Some("v1.1.0"));
    runner = commit_junk(runner, &fx.settings, "v1.1.0");
    runner = runner.expect(["make"], CommandOutput::failed(2));

    let err = SyncOrchestrator::new(RepoStateInspector::new(&runner, &fx.settings))
        .run()
        .expect_err("build broke");

    match err {
        WorkflowError::BuildFailed { status, fold_into, .. } => {
            assert_eq!(status, 2);
            assert_eq!(fold_into, "HEAD^");
        }
        other => panic!("expected BuildFailed, got {other:?}"),
    }
    assert!(!runner.ran(&["hack/xref-helpmsgs-manpages"]));
}

#[test]
fn failed_checks_are_reported_together() {
    let fx = Fixture::new("v1.0.0");
    let mut runner = clean_side_branch(ScriptedRunner::new());
    runner = head_is_treadmill(runner);
    runner = pull_mainline(runner);
    runner = fork_point(runner, "abc123", "abc123");
    runner = revendor(runner, fx.manifest(), Some("v1.1.0"));
    runner = commit_junk(runner, &fx.settings, "v1.1.0");
    runner = runner
        .expect(["make"], CommandOutput::empty())
        .expect(["hack/xref-helpmsgs-manpages"], CommandOutput::failed(1))
        .expect(
            ["test/buildah-bud/run-buildah-bud-tests", "--no-test"],
            CommandOutput::failed(1),
        );

    let err = SyncOrchestrator::new(RepoStateInspector::new(&runner, &fx.settings))
        .run()
        .expect_err("checks failed");

    match err {
        WorkflowError::Verification { failed, fold_into } => {
            assert_eq!(
                failed,
                vec![
                    "hack/xref-helpmsgs-manpages".to_string(),
                    "test/buildah-bud/run-buildah-bud-tests --no-test".to_string(),
                ]
            );
            assert_eq!(fold_into, "HEAD^");
        }
        other => panic!("expected Verification, got {other:?}"),
    }
}

#[test]
fn failed_vendoring_aborts_without_committing() {
    let fx = Fixture::new("v1.0.0");
    let mut runner = clean_side_branch(ScriptedRunner::new());
    runner = head_is_treadmill(runner);
    runner = pull_mainline(runner);
    runner = fork_point(runner, "abc123", "abc123");
    runner = runner.expect(
        ["go", "get", "github.com/containers/buildah@main"],
        CommandOutput::failed(1),
    );

    let err = SyncOrchestrator::new(RepoStateInspector::new(&runner, &fx.settings))
        .run()
        .expect_err("go get failed");

    assert!(
        matches!(err, WorkflowError::Repo(RepoError::CommandFailed { status: 1, .. })),
        "{err:?}"
    );
    assert!(!runner.ran(&["git", "commit"]));
}

#[test]
fn dry_run_skips_every_mutation() {
    let fx = Fixture::new("v1.1.0");
    let settings = fx.settings.clone().with_dry_run(true);
    let runner = clean_side_branch(ScriptedRunner::new())
        .expect(
            ["git", "diff", "--name-only", "HEAD^", "HEAD"],
            CommandOutput::ok(VENDOR_DIFF.iter().copied()),
        )
        .expect(
            ["git", "log", "-1", "--format=%s", "HEAD^"],
            CommandOutput::ok([TREADMILL_SUBJECT]),
        )
        .expect(
            ["git", "log", "-1", "--format=%s", "HEAD^"],
            CommandOutput::ok([TREADMILL_SUBJECT]),
        )
        .expect(
            ["git", "show", "HEAD^:go.mod"],
            CommandOutput::ok(gomod("v1.0.0").lines()),
        )
        .expect(["git", "remote", "-v"], CommandOutput::ok([REMOTE_LINE]))
        .expect(
            ["git", "merge-base", "--fork-point", "main"],
            CommandOutput::ok(["old000"]),
        )
        .expect(["git", "rev-parse", "main"], CommandOutput::ok(["new111"]));

    let outcome = SyncOrchestrator::new(RepoStateInspector::new(&runner, &settings))
        .run()
        .expect("dry-run sync");

    assert!(outcome.changed);
    assert!(
        outcome.message.contains("new upstream version, downstream bumped"),
        "{}",
        outcome.message
    );
    assert!(outcome.message.contains("v1.0.0 -> v1.1.0"), "{}", outcome.message);
    for mutating in [
        &["git", "reset"][..],
        &["git", "checkout"],
        &["git", "pull"],
        &["git", "rebase"],
        &["go"],
        &["make"],
        &["git", "commit"],
    ] {
        assert!(!runner.ran(mutating), "dry-run ran {mutating:?}");
    }
    assert_eq!(runner.remaining(), 0);
}
