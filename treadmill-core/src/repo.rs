//! Repository state inspection.
//!
//! Everything the workflows decide is derived here from git itself: which
//! branch we are on, whether tracked files are dirty, and what kind of commit
//! sits at a given revision.
//!
//! Classification rules:
//! 1. *Treadmill commit*: the subject contains the product name and, anywhere
//!    after it, the word `treadmill`. Unanchored and ordered; adjacency does
//!    not matter.
//! 2. *Vendor commit*: `git diff --name-only <rev>^ <rev>` lists every
//!    required manifest path and at least one path under the vendored
//!    upstream subtree.
//! 3. Anything else is neither.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{precondition, RepoError};
use crate::exec::Executor;
use crate::runner::{CommandRunner, Invocation};
use crate::types::{CommitClassification, RepoStatus, VendorCheck};

/// Read-mostly view of the git repository the tool runs in.
#[derive(Clone, Copy)]
pub struct RepoStateInspector<'a> {
    exec: Executor<'a>,
    settings: &'a Settings,
}

impl<'a> RepoStateInspector<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self {
            exec: Executor::new(runner, settings.dry_run),
            settings,
        }
    }

    /// The executor this inspector runs commands through.
    pub fn exec(&self) -> Executor<'a> {
        self.exec
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    // -----------------------------------------------------------------------
    // Branch and working tree
    // -----------------------------------------------------------------------

    /// Name of the checked-out branch. Running on the mainline is refused.
    pub fn current_branch(&self) -> Result<String, RepoError> {
        let lines = self
            .exec
            .read(Invocation::git(["rev-parse", "--abbrev-ref", "HEAD"]))?;
        let branch = first_line(&lines, "git rev-parse --abbrev-ref HEAD")?;
        if branch == self.settings.mainline {
            return Err(precondition(format!(
                "please run from a branch other than '{}'",
                self.settings.mainline
            )));
        }
        Ok(branch)
    }

    /// Tracked-file status; untracked files are ignored.
    pub fn status(&self) -> Result<RepoStatus, RepoError> {
        let lines = self.exec.read(Invocation::git([
            "status",
            "--porcelain",
            "--untracked-files=no",
        ]))?;
        Ok(RepoStatus::from_paths(parse_porcelain(&lines)))
    }

    /// Fails unless no tracked file is modified.
    pub fn require_clean(&self) -> Result<(), RepoError> {
        let status = self.status()?;
        if status.clean {
            return Ok(());
        }
        let listing: Vec<String> = status
            .changed_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        Err(precondition(format!(
            "working tree has uncommitted changes: {}",
            listing.join(", ")
        )))
    }

    // -----------------------------------------------------------------------
    // Commit classification
    // -----------------------------------------------------------------------

    pub fn subject(&self, rev: &str) -> Result<String, RepoError> {
        let lines = self
            .exec
            .read(Invocation::git(["log", "-1", "--format=%s", rev]))?;
        Ok(lines.into_iter().next().unwrap_or_default())
    }

    /// Full commit message, body included, joined with `\n`.
    pub fn commit_message(&self, rev: &str) -> Result<String, RepoError> {
        let lines = self
            .exec
            .read(Invocation::git(["log", "-1", "--format=%B", rev]))?;
        Ok(lines.join("\n"))
    }

    pub fn is_treadmill_commit(&self, rev: &str) -> Result<bool, RepoError> {
        let subject = self.subject(rev)?;
        Ok(is_treadmill_subject(&subject, &self.settings.product))
    }

    pub fn classify_commit(&self, rev: &str) -> Result<CommitClassification, RepoError> {
        if self.is_treadmill_commit(rev)? {
            return Ok(CommitClassification::TreadmillCommit);
        }
        let files = self.changed_files(rev)?;
        if vendor_expectations(&files, self.settings).is_vendor() {
            Ok(CommitClassification::VendorCommit)
        } else {
            Ok(CommitClassification::Neither)
        }
    }

    /// Check whether `rev` looks like a vendor commit.
    ///
    /// With `strict`, any unmet expectation is a precondition failure.
    /// Otherwise each one is logged as a warning and returned to the caller,
    /// which should treat the commit as probably not a vendor commit.
    pub fn vendor_check(&self, rev: &str, strict: bool) -> Result<VendorCheck, RepoError> {
        let files = self.changed_files(rev)?;
        let check = vendor_expectations(&files, self.settings);
        if check.is_vendor() {
            return Ok(check);
        }
        if strict {
            return Err(precondition(format!(
                "{rev} is not a {} vendor commit: {}",
                self.settings.product,
                check.unmet.join("; ")
            )));
        }
        for unmet in &check.unmet {
            tracing::warn!("{rev}: {unmet}");
        }
        tracing::warn!("{rev} is probably not a {} vendor commit", self.settings.product);
        Ok(check)
    }

    /// Paths touched by `rev` relative to its first parent.
    pub fn changed_files(&self, rev: &str) -> Result<Vec<String>, RepoError> {
        let parent = format!("{rev}^");
        self.exec
            .read(Invocation::git(["diff", "--name-only", parent.as_str(), rev]))
    }

    // -----------------------------------------------------------------------
    // Refs and remotes
    // -----------------------------------------------------------------------

    pub fn rev_parse(&self, rev: &str) -> Result<String, RepoError> {
        let lines = self.exec.read(Invocation::git(["rev-parse", rev]))?;
        first_line(&lines, &format!("git rev-parse {rev}"))
    }

    /// Where HEAD forked from `mainline`. Falls back to a plain merge-base
    /// when the reflog no longer knows the fork point.
    pub fn fork_point(&self, mainline: &str) -> Result<String, RepoError> {
        let fork = Invocation::git(["merge-base", "--fork-point", mainline]);
        let output = self.exec.probe(&fork)?;
        if output.success() {
            if let Some(sha) = output.lines.into_iter().next() {
                return Ok(sha);
            }
        }
        tracing::debug!("no fork point in reflog, falling back to merge-base");
        let lines = self
            .exec
            .read(Invocation::git(["merge-base", mainline, "HEAD"]))?;
        first_line(&lines, "git merge-base")
    }

    /// Remote whose URL points at the downstream repository on GitHub.
    pub fn upstream_remote(&self) -> Result<String, RepoError> {
        let lines = self.exec.read(Invocation::git(["remote", "-v"]))?;
        remote_for_repo(&lines, &self.settings.downstream_repo).ok_or_else(|| {
            RepoError::NotFound(format!(
                "no git remote points at github.com/{}",
                self.settings.downstream_repo
            ))
        })
    }

    /// Contents of `path` as committed at `rev`.
    pub fn show_file(&self, rev: &str, path: &Path) -> Result<Vec<String>, RepoError> {
        let spec = format!("{rev}:{}", path.display());
        self.exec.read(Invocation::git(["show", spec.as_str()]))
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// `product` somewhere in the subject, then `treadmill` somewhere after it.
pub fn is_treadmill_subject(subject: &str, product: &str) -> bool {
    match subject.find(product) {
        Some(start) => subject[start + product.len()..].contains("treadmill"),
        None => false,
    }
}

/// Compare touched paths against the vendor layout described by `settings`.
pub fn vendor_expectations(files: &[String], settings: &Settings) -> VendorCheck {
    let mut unmet = Vec::new();
    for required in settings.required_vendor_paths() {
        if !files.iter().any(|f| Path::new(f) == required) {
            unmet.push(format!("does not touch {}", required.display()));
        }
    }
    let subtree = settings.vendor_subtree();
    if !files.iter().any(|f| f.starts_with(&subtree)) {
        unmet.push(format!("touches nothing under {subtree}"));
    }
    VendorCheck { unmet }
}

/// Paths from `git status --porcelain` lines; renames report the new path.
pub fn parse_porcelain(lines: &[String]) -> Vec<PathBuf> {
    lines
        .iter()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let path = &line[3..];
            let path = path.rsplit(" -> ").next().unwrap_or(path);
            PathBuf::from(path.trim_matches('"'))
        })
        .collect()
}

/// First fetch remote from `git remote -v` output whose URL is
/// `github.com/<slug>` or `github.com:<slug>`, with or without `.git`.
pub fn remote_for_repo(lines: &[String], slug: &str) -> Option<String> {
    let https = format!("github.com/{slug}");
    let ssh = format!("github.com:{slug}");
    lines.iter().find_map(|line| {
        let mut fields = line.split_whitespace();
        let name = fields.next()?;
        let url = fields.next()?;
        if fields.next() != Some("(fetch)") {
            return None;
        }
        let url = url.trim_end_matches('/').trim_end_matches(".git");
        (url.ends_with(&https) || url.ends_with(&ssh)).then(|| name.to_string())
    })
}

fn first_line(lines: &[String], what: &str) -> Result<String, RepoError> {
    lines
        .first()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .ok_or_else(|| RepoError::NotFound(format!("no output from {what}")))
}
