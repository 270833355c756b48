//! Dry-run aware wrapper around a [`CommandRunner`].
//!
//! Callers say up front whether a command only reads state ([`Executor::read`])
//! or changes the repository ([`Executor::mutate`]). In dry-run mode mutating
//! commands are logged and skipped; reads always run.

use crate::error::RepoError;
use crate::runner::{CommandOutput, CommandRunner, Invocation};

#[derive(Clone, Copy)]
pub struct Executor<'a> {
    runner: &'a dyn CommandRunner,
    dry_run: bool,
}

impl<'a> Executor<'a> {
    pub fn new(runner: &'a dyn CommandRunner, dry_run: bool) -> Self {
        Self { runner, dry_run }
    }

    /// Run a read-only command; non-zero exit is an error.
    pub fn read(&self, invocation: Invocation) -> Result<Vec<String>, RepoError> {
        let output = self.probe(&invocation)?;
        checked(&invocation, output)
    }

    /// Run a command that changes the repository; non-zero exit is an error.
    /// Skipped (and reported as empty output) in dry-run mode.
    pub fn mutate(&self, invocation: Invocation) -> Result<Vec<String>, RepoError> {
        if self.dry_run {
            tracing::info!("[dry-run] would run: {invocation}");
            return Ok(Vec::new());
        }
        let output = self.probe(&invocation)?;
        checked(&invocation, output)
    }

    /// Run a command and hand back its exit status without judging it.
    pub fn status(&self, invocation: Invocation) -> Result<i32, RepoError> {
        Ok(self.probe(&invocation)?.status)
    }

    /// Run a read-only command and return its full output, whatever the
    /// exit status.
    pub fn probe(&self, invocation: &Invocation) -> Result<CommandOutput, RepoError> {
        tracing::debug!("$ {invocation}");
        self.runner.run(invocation)
    }
}

fn checked(invocation: &Invocation, output: CommandOutput) -> Result<Vec<String>, RepoError> {
    if output.success() {
        Ok(output.lines)
    } else {
        Err(RepoError::CommandFailed {
            command: invocation.to_string(),
            status: output.status,
        })
    }
}
