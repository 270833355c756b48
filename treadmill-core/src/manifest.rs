//! Pinned upstream version lookup.
//!
//! The manifest (`go.mod`) is plain text; a pin line is
//! `<whitespace><module-path><whitespace><ref>` and the first such line for
//! the module wins. The manifest can be read from the working tree or from
//! any commit.

use crate::error::RepoError;
use crate::repo::RepoStateInspector;
use crate::types::DependencyPin;

/// Reads [`DependencyPin`]s through a [`RepoStateInspector`].
#[derive(Clone, Copy)]
pub struct VersionExtractor<'a> {
    repo: RepoStateInspector<'a>,
}

impl<'a> VersionExtractor<'a> {
    pub fn new(repo: RepoStateInspector<'a>) -> Self {
        Self { repo }
    }

    /// Pin for `module_path`, from disk when `at` is `None`, else from the
    /// manifest as committed at that revision.
    pub fn pinned_ref(&self, module_path: &str, at: Option<&str>) -> Result<DependencyPin, RepoError> {
        let settings = self.repo.settings();
        let (label, content) = match at {
            None => {
                let path = settings.manifest_on_disk();
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    RepoError::ManifestUnreadable {
                        manifest: path.display().to_string(),
                        reason: e.to_string(),
                    }
                })?;
                (path.display().to_string(), content)
            }
            Some(rev) => {
                let label = format!("{rev}:{}", settings.manifest.display());
                let lines = self
                    .repo
                    .show_file(rev, &settings.manifest)
                    .map_err(|e| RepoError::ManifestUnreadable {
                        manifest: label.clone(),
                        reason: e.to_string(),
                    })?;
                (label, lines.join("\n"))
            }
        };

        let reference = parse_pin(&content, module_path).ok_or_else(|| RepoError::PinNotFound {
            module: module_path.to_string(),
            manifest: label.clone(),
        })?;
        tracing::debug!(manifest = %label, "{module_path} pinned at {reference}");
        Ok(DependencyPin {
            module_path: module_path.to_string(),
            reference,
        })
    }

    /// Shorthand for the configured upstream module.
    pub fn upstream_pin(&self, at: Option<&str>) -> Result<DependencyPin, RepoError> {
        self.pinned_ref(&self.repo.settings().upstream_module, at)
    }
}

/// Ref following `module_path` on the first line that names it.
pub fn parse_pin(content: &str, module_path: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        if fields.next()? != module_path {
            return None;
        }
        fields.next().map(str::to_string)
    })
}
