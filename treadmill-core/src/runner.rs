//! Process execution seam.
//!
//! Every git, go, make, and check-script call goes through
//! [`CommandRunner`]. Production uses [`SystemRunner`]; tests substitute
//! [`crate::fakes::ScriptedRunner`] and assert on the exact argument vectors.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::RepoError;

/// One external command: program, arguments, and whether its output goes
/// straight to the terminal instead of being captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub inherit_output: bool,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            inherit_output: false,
        }
    }

    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("git", args)
    }

    /// Let long-running output (builds, test scripts) reach the operator.
    pub fn inherit_output(mut self) -> Self {
        self.inherit_output = true;
        self
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                let first = arg.lines().next().unwrap_or_default();
                write!(f, " '{first}…'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured stdout lines and exit status of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `-1` when the process was terminated by a signal.
    pub status: i32,
    pub lines: Vec<String>,
}

impl CommandOutput {
    pub fn ok<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            status: 0,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failed(status: i32) -> Self {
        Self {
            status,
            lines: Vec::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs external commands. Implementations block until the process exits.
pub trait CommandRunner {
    /// Returns `Err` only when the command could not be run; a non-zero exit
    /// is reported through [`CommandOutput::status`].
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, RepoError>;
}

/// Spawns real processes in a fixed working directory.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    cwd: PathBuf,
}

impl SystemRunner {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, RepoError> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).current_dir(&self.cwd);
        tracing::trace!(cwd = %self.cwd.display(), "exec: {invocation}");

        let spawn_err = |source| RepoError::Spawn {
            command: invocation.to_string(),
            source,
        };

        if invocation.inherit_output {
            let status = command.status().map_err(spawn_err)?;
            return Ok(CommandOutput {
                status: status.code().unwrap_or(-1),
                lines: Vec::new(),
            });
        }

        let output = command
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(spawn_err)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            lines: stdout.lines().map(str::to_string).collect(),
        })
    }
}
