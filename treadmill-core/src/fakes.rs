//! Scripted process fake (testing only)
//!
//! [`ScriptedRunner`] replays a fixed list of expected invocations in order,
//! returning canned output for each and recording what was actually run.
//! An out-of-order or unscripted call comes back as
//! [`RepoError::UnexpectedInvocation`] so the workflow under test aborts the
//! same way a failing command would.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::RepoError;
use crate::runner::{CommandOutput, CommandRunner, Invocation};

type SideEffect = Box<dyn Fn()>;

struct Expectation {
    argv: Vec<String>,
    output: CommandOutput,
    side_effect: Option<SideEffect>,
}

/// Replays expected invocations in order.
#[derive(Default)]
pub struct ScriptedRunner {
    script: RefCell<VecDeque<Expectation>>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `argv` next and answer with `output`.
    pub fn expect<I, S>(self, argv: I, output: CommandOutput) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(argv, output, None)
    }

    /// Like [`expect`](Self::expect), and also run `effect` when matched,
    /// e.g. to rewrite a manifest the way `make vendor` would.
    pub fn expect_with<I, S, F>(self, argv: I, output: CommandOutput, effect: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn() + 'static,
    {
        self.push(argv, output, Some(Box::new(effect)))
    }

    fn push<I, S>(self, argv: I, output: CommandOutput, side_effect: Option<SideEffect>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script.borrow_mut().push_back(Expectation {
            argv: argv.into_iter().map(Into::into).collect(),
            output,
            side_effect,
        });
        self
    }

    /// Every argument vector run so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// True when some recorded call starts with `prefix`.
    pub fn ran(&self, prefix: &[&str]) -> bool {
        self.calls.borrow().iter().any(|argv| {
            argv.len() >= prefix.len() && argv.iter().zip(prefix).all(|(a, p)| a == p)
        })
    }

    /// Number of scripted invocations not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, RepoError> {
        let argv = invocation.argv();
        self.calls.borrow_mut().push(argv.clone());

        let next = self.script.borrow_mut().pop_front();
        let Some(expectation) = next else {
            return Err(RepoError::UnexpectedInvocation {
                expected: "end of script".to_string(),
                got: argv.join(" "),
            });
        };
        if expectation.argv != argv {
            return Err(RepoError::UnexpectedInvocation {
                expected: format!("`{}`", expectation.argv.join(" ")),
                got: argv.join(" "),
            });
        }
        if let Some(effect) = &expectation.side_effect {
            effect();
        }
        Ok(expectation.output)
    }
}
