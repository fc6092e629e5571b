//! Bare mirror wrapper providing the update and history operations.

use std::fs;
use std::path::Path;

use git2::ErrorCode;
use tracing::debug;

use crate::command::Git;
use crate::error::{Error, Result};
use crate::history::HistoryWalk;
use crate::traits::MirrorHandle;

const REMOTE: &str = "origin";

/// High-level wrapper around a bare mirror repository.
pub struct Mirror {
    inner: git2::Repository,
}

impl Mirror {
    /// Open an existing mirror at exactly `path` (no parent search).
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if there is no repository at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = git2::Repository::open(path).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                Error::NotFound(path.to_path_buf())
            } else {
                Error::from(e)
            }
        })?;
        Ok(Self { inner })
    }

    /// Clone `url` as a bare repository at `dest`, creating parent
    /// directories as needed.
    ///
    /// # Errors
    /// Returns error if the directories cannot be created or the clone fails.
    pub fn clone_bare(url: &str, dest: impl AsRef<Path>) -> Result<Self> {
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!("Cloning {url} into {}", dest.display());
        let inner = git2::build::RepoBuilder::new().bare(true).clone(url, dest)?;
        Ok(Self { inner })
    }

    /// Get the path to the git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    // === Update operations ===

    /// Fetch from `origin` using its configured refspecs.
    ///
    /// # Errors
    /// Returns error if the remote is missing or the fetch fails.
    pub fn fetch(&self) -> Result<()> {
        let mut remote = self
            .inner
            .find_remote(REMOTE)
            .map_err(|_| Error::RemoteNotFound(REMOTE.into()))?;

        remote.fetch(&[] as &[&str], None, None)?;
        Ok(())
    }

    /// Move the branch HEAD points at to the commit recorded in FETCH_HEAD.
    ///
    /// Prefers the entry for the same branch, then the entry marked for
    /// merge, then the first entry.
    ///
    /// Does nothing when the last fetch brought in no branches.
    ///
    /// # Errors
    /// Returns error if HEAD is not symbolic.
    pub fn update_head_to_fetched(&self) -> Result<()> {
        let head = self.inner.find_reference("HEAD")?;
        let branch = head
            .symbolic_target()
            .map(String::from)
            .ok_or_else(|| Error::RefNotFound("HEAD".into()))?;

        let mut same_branch = None;
        let mut for_merge = None;
        let mut first = None;
        let walked = self
            .inner
            .fetchhead_foreach(|ref_name, _url, oid, is_merge| {
                if same_branch.is_none() && ref_name == branch {
                    same_branch = Some(*oid);
                }
                if for_merge.is_none() && is_merge {
                    for_merge = Some(*oid);
                }
                if first.is_none() {
                    first = Some(*oid);
                }
                true
            });
        match walked {
            Ok(()) => {}
            // An empty remote leaves no FETCH_HEAD behind.
            Err(e) if e.code() == ErrorCode::NotFound => {
                debug!("Nothing fetched, leaving {branch} as is");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        let Some(target) = same_branch.or(for_merge).or(first) else {
            debug!("Nothing fetched, leaving {branch} as is");
            return Ok(());
        };

        debug!("Updating {branch} to {target}");
        self.inner
            .reference(&branch, target, true, "tally: update to FETCH_HEAD")?;
        Ok(())
    }

    /// `git remote update origin`.
    ///
    /// # Errors
    /// Returns error if git fails.
    pub fn remote_update(&self) -> Result<()> {
        Git::new(self.git_dir()).run(&["remote", "update", REMOTE])
    }

    /// `git remote prune origin`.
    ///
    /// # Errors
    /// Returns error if git fails.
    pub fn remote_prune(&self) -> Result<()> {
        Git::new(self.git_dir()).run(&["remote", "prune", REMOTE])
    }

    /// `git gc --quiet`.
    ///
    /// # Errors
    /// Returns error if git fails.
    pub fn gc(&self) -> Result<()> {
        Git::new(self.git_dir()).run(&["gc", "--quiet"])
    }

    // === History ===

    /// Walk the history reachable from HEAD, oldest first.
    ///
    /// # Errors
    /// Returns [`Error::Unreadable`] if the walk cannot start.
    pub fn history(&self) -> Result<HistoryWalk<'_>> {
        HistoryWalk::new(&self.inner)
    }

    // === Low-level access ===

    /// Get a reference to the underlying git2 repository.
    ///
    /// Use sparingly - prefer high-level methods.
    #[must_use]
    pub const fn inner(&self) -> &git2::Repository {
        &self.inner
    }
}

impl MirrorHandle for Mirror {
    fn fetch(&self) -> Result<()> {
        Self::fetch(self)
    }

    fn update_head_to_fetched(&self) -> Result<()> {
        Self::update_head_to_fetched(self)
    }

    fn sync_remote_branches(&self) -> Result<()> {
        self.remote_update()
    }

    fn prune_remote_branches(&self) -> Result<()> {
        self.remote_prune()
    }

    fn compact(&self) -> Result<()> {
        self.gc()
    }

    fn walk_history(&self) -> Result<impl Iterator<Item = Result<crate::CommitRecord>> + '_> {
        self.history()
    }
}

impl std::fmt::Debug for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirror")
            .field("path", &self.git_dir())
            .finish()
    }
}
