//! Trait abstractions for mirror operations.
//!
//! This module defines the `MirrorOps` and `MirrorHandle` traits which
//! abstract the version-control collaborator, enabling dependency injection
//! and testability.

use std::path::Path;

use crate::{CommitRecord, Result};

/// Trait for obtaining local mirrors of remote repositories.
///
/// This trait abstracts clone/open, allowing for:
/// - Dependency injection in the sync orchestrator
/// - Mock implementations for testing
///
/// Note: operations are synchronous since git2 is a synchronous library.
#[allow(clippy::missing_errors_doc)]
pub trait MirrorOps {
    /// Handle to an opened mirror.
    type Handle: MirrorHandle;

    /// Canonical clone URL for an `owner/project` repository name.
    fn clone_url(&self, name: &str) -> String;

    /// Create a fresh bare mirror of `url` at `dest`.
    fn clone_mirror(&self, url: &str, dest: &Path) -> Result<Self::Handle>;

    /// Open an existing mirror.
    ///
    /// Returns [`crate::Error::NotFound`] if there is no repository at `dest`.
    fn open_mirror(&self, dest: &Path) -> Result<Self::Handle>;
}

/// Trait for operations on an opened mirror.
#[allow(clippy::missing_errors_doc)]
pub trait MirrorHandle {
    // === Update ===

    /// Fetch new objects from `origin`.
    fn fetch(&self) -> Result<()>;

    /// Point the default reference at what the last fetch brought in.
    fn update_head_to_fetched(&self) -> Result<()>;

    /// Pick up branches newly added on the remote.
    fn sync_remote_branches(&self) -> Result<()>;

    /// Drop remote-tracking branches deleted on the remote.
    fn prune_remote_branches(&self) -> Result<()>;

    /// Compact the local object store.
    fn compact(&self) -> Result<()>;

    // === History ===

    /// Walk every commit reachable from the default reference, oldest first.
    ///
    /// Fails up front if the history cannot be read at all. Individual items
    /// fail only for problems confined to that one commit.
    fn walk_history(&self) -> Result<impl Iterator<Item = Result<CommitRecord>> + '_>;
}
