//! Build gate shared by both workflows.
//!
//! 1. `make`: a failure here stops everything.
//! 2. `hack/xref-helpmsgs-manpages`: recorded, not fatal yet.
//! 3. Clear `<scratch_root>/<scratch_prefix>*`, run the buildah-bud dry run,
//!    clear again whatever happened.
//! 4. Report every failed check from 2–3 together.

use std::io::ErrorKind;

use treadmill_core::{Executor, Invocation, Settings};

use crate::error::{io_err, WorkflowError};

const BUILD: &[&str] = &["make"];
const XREF: &[&str] = &["hack/xref-helpmsgs-manpages"];
const BUD_DRY_RUN: &[&str] = &["test/buildah-bud/run-buildah-bud-tests", "--no-test"];

/// Runs the downstream build and consistency checks.
pub struct BuildVerifier<'a> {
    exec: Executor<'a>,
    settings: &'a Settings,
}

impl<'a> BuildVerifier<'a> {
    pub fn new(exec: Executor<'a>, settings: &'a Settings) -> Self {
        Self { exec, settings }
    }

    /// `fold_into` names the commit the operator should amend with any fix.
    pub fn verify(&self, fold_into: &str) -> Result<(), WorkflowError> {
        tracing::info!("building podman");
        let build = invocation(BUILD);
        let status = self.exec.status(build.clone())?;
        if status != 0 {
            return Err(WorkflowError::BuildFailed {
                command: build.to_string(),
                status,
                fold_into: fold_into.to_string(),
            });
        }

        let mut failed = Vec::new();

        tracing::info!("cross-checking man pages against --help");
        let xref = invocation(XREF);
        if self.exec.status(xref.clone())? != 0 {
            failed.push(xref.to_string());
        }

        tracing::info!("checking that buildah-bud patches still apply");
        let bud = invocation(BUD_DRY_RUN);
        self.clear_scratch()?;
        let bud_status = self.exec.status(bud.clone());
        self.clear_scratch()?;
        if bud_status? != 0 {
            failed.push(bud.to_string());
        }

        if failed.is_empty() {
            return Ok(());
        }
        for check in &failed {
            tracing::error!("check failed: {check}");
        }
        Err(WorkflowError::Verification {
            failed,
            fold_into: fold_into.to_string(),
        })
    }

    /// Remove scratch directories left by the buildah-bud script. Returns how
    /// many were removed; a missing scratch root counts as nothing to do.
    pub fn clear_scratch(&self) -> Result<usize, WorkflowError> {
        let root = &self.settings.scratch_root;
        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(io_err(root, err)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| io_err(root, e))?;
            let path = entry.path();
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(&self.settings.scratch_prefix));
            if matches && path.is_dir() {
                std::fs::remove_dir_all(&path).map_err(|e| io_err(&path, e))?;
                tracing::debug!("removed {}", path.display());
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn invocation(argv: &[&str]) -> Invocation {
    Invocation::new(argv[0], argv[1..].iter().copied()).inherit_output()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;
    use treadmill_core::{CommandOutput, ScriptedRunner};

    use super::*;

    fn scratch_settings(dir: &TempDir) -> Settings {
        Settings::default().with_scratch_root(dir.path())
    }

    #[test]
    fn clear_scratch_only_touches_prefixed_directories() {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir(dir.path().join("buildah-bud-1234")).expect("mkdir");
        fs::create_dir(dir.path().join("buildah-bud-5678")).expect("mkdir");
        fs::create_dir(dir.path().join("keep-me")).expect("mkdir");
        fs::write(dir.path().join("buildah-bud-file"), "x").expect("write");

        let settings = scratch_settings(&dir);
        let runner = ScriptedRunner::new();
        let verifier = BuildVerifier::new(Executor::new(&runner, false), &settings);

        assert_eq!(verifier.clear_scratch().expect("clear"), 2);
        assert!(dir.path().join("keep-me").exists());
        assert!(dir.path().join("buildah-bud-file").exists());
        assert!(!dir.path().join("buildah-bud-1234").exists());
    }

    #[test]
    fn missing_scratch_root_is_fine() {
        let dir = TempDir::new().expect("tempdir");
        let settings = Settings::default().with_scratch_root(dir.path().join("gone"));
        let runner = ScriptedRunner::new();
        let verifier = BuildVerifier::new(Executor::new(&runner, false), &settings);
        assert_eq!(verifier.clear_scratch().expect("clear"), 0);
    }

    #[test]
    fn scratch_is_cleared_even_when_bud_fails() {
        let dir = TempDir::new().expect("tempdir");
        let leftover = dir.path().join("buildah-bud-leftover");
        let created = leftover.clone();
        let settings = scratch_settings(&dir);
        let runner = ScriptedRunner::new()
            .expect(["make"], CommandOutput::empty())
            .expect(["hack/xref-helpmsgs-manpages"], CommandOutput::empty())
            .expect_with(
                ["test/buildah-bud/run-buildah-bud-tests", "--no-test"],
                CommandOutput::failed(1),
                move || fs::create_dir(&created).expect("script leaves scratch behind"),
            );
        let verifier = BuildVerifier::new(Executor::new(&runner, false), &settings);

        let err = verifier.verify("HEAD^").expect_err("bud failed");
        assert!(matches!(err, WorkflowError::Verification { .. }), "{err:?}");
        assert!(!leftover.exists());
    }
}
