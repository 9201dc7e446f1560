//! Revision lookup and change detection through libgit2.

use std::path::{Path, PathBuf};

use git2::{DiffOptions, Repository};

use crate::tools::{ToolError, VersionControl};

/// The git repository containing a run root.
pub struct GitRepository {
    root: PathBuf,
}

fn git_err(err: git2::Error) -> ToolError {
    ToolError::failed("git", err.message())
}

impl GitRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        GitRepository { root: root.into() }
    }

    fn open(&self) -> Result<Repository, ToolError> {
        Repository::discover(&self.root).map_err(git_err)
    }

    /// Path of `path` relative to the repository work tree.
    fn pathspec(repo: &Repository, path: &Path) -> Result<Option<String>, ToolError> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| ToolError::failed("git", "repository has no work tree"))?;
        let workdir = workdir
            .canonicalize()
            .map_err(|e| ToolError::failed("git", e))?;
        let path = path
            .canonicalize()
            .map_err(|e| ToolError::failed("git", format!("{}: {}", path.display(), e)))?;

        let relative = path.strip_prefix(&workdir).map_err(|_| {
            ToolError::failed(
                "git",
                format!("{} is outside of {}", path.display(), workdir.display()),
            )
        })?;

        if relative.as_os_str().is_empty() {
            return Ok(None);
        }
        Ok(Some(relative.to_string_lossy().replace('\\', "/")))
    }
}

impl VersionControl for GitRepository {
    fn revision(&self) -> Result<String, ToolError> {
        let repo = self.open()?;
        let head = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(git_err)?;
        let short = head.as_object().short_id().map_err(git_err)?;
        Ok(short.as_str().unwrap_or_default().to_string())
    }

    fn has_changes(&self, since: &str, path: &Path) -> Result<bool, ToolError> {
        let repo = self.open()?;
        let old = repo
            .revparse_single(since)
            .and_then(|obj| obj.peel_to_tree())
            .map_err(git_err)?;
        let new = repo
            .head()
            .and_then(|head| head.peel_to_tree())
            .map_err(git_err)?;

        let mut opts = DiffOptions::new();
        if let Some(spec) = Self::pathspec(&repo, path)? {
            opts.pathspec(spec).disable_pathspec_match(true);
        }

        let diff = repo
            .diff_tree_to_tree(Some(&old), Some(&new), Some(&mut opts))
            .map_err(git_err)?;
        Ok(diff.deltas().next().is_some())
    }
}
