//! Sync orchestrator.
//!
//! For each configured repository: bring the local mirror up to date (or
//! clone it), register the repository, then walk its history oldest-first
//! and record every commit not already in the ledger.
//!
//! Failures are contained: a bad commit is skipped, a failing repository is
//! reported and the run moves on to the next one.

use std::path::PathBuf;

use serde::Serialize;
use tally_git::{CommitRecord, MirrorHandle, MirrorOps};
use tracing::{debug, info, info_span, warn};

use crate::error::{Error, Result};
use crate::repo_name::RepoName;
use crate::store::{RepositoryId, Store};

/// Where a repository is in its sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// No local mirror yet; it will be cloned.
    NotMirrored,
    /// A mirror from an earlier run exists and is being updated.
    MirroredStale,
    /// The mirror matches the remote.
    MirroredFresh,
    /// Commits are being recorded.
    Ingesting,
    /// Finished for this run.
    Done,
    /// Gave up on this repository for this run.
    Error,
}

/// How the mirror was brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorAction {
    Cloned,
    Updated,
}

/// A commit that could not be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub hash: Option<String>,
    pub reason: String,
}

/// Counters for one repository's ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Commits newly added to the ledger.
    pub inserted: usize,
    /// Commits that were already recorded.
    pub skipped: usize,
    /// People added to the identity store.
    pub new_people: usize,
    /// Commits that were skipped because of an error.
    pub failed: Vec<RecordFailure>,
}

/// Result of syncing one repository.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Mirror updated and history ingested.
    Done {
        mirror: MirrorAction,
        repository: RepositoryId,
        stats: IngestStats,
    },

    /// Sync stopped in `state`.
    Failed {
        /// State the repository was in when the error occurred.
        state: SyncState,
        error: Error,
    },
}

/// Per-repository entry of a sync run.
#[derive(Debug)]
pub struct RepoReport {
    pub name: RepoName,
    pub outcome: SyncOutcome,
}

impl RepoReport {
    /// Terminal state of this repository.
    #[must_use]
    pub const fn final_state(&self) -> SyncState {
        match self.outcome {
            SyncOutcome::Done { .. } => SyncState::Done,
            SyncOutcome::Failed { .. } => SyncState::Error,
        }
    }
}

enum Ingested {
    Inserted { new_person: bool },
    AlreadyPresent,
}

/// Drives mirrors and the store through one sync cycle.
///
/// Processes repositories one at a time and commits one at a time; the
/// store's resolve-or-create calls rely on this single-writer order.
pub struct Syncer<'a, M: MirrorOps> {
    mirrors: &'a M,
    store: &'a Store,
    mirrors_dir: PathBuf,
}

impl<'a, M: MirrorOps> Syncer<'a, M> {
    /// Create a new syncer keeping mirrors under `mirrors_dir`.
    #[must_use]
    pub fn new(mirrors: &'a M, store: &'a Store, mirrors_dir: impl Into<PathBuf>) -> Self {
        Self {
            mirrors,
            store,
            mirrors_dir: mirrors_dir.into(),
        }
    }

    /// Sync every repository in `names`, in order.
    ///
    /// Never fails as a whole; each repository's result is in its report.
    pub fn run(&self, names: &[RepoName]) -> Vec<RepoReport> {
        info!("Syncing {} repositories", names.len());
        names.iter().map(|name| self.sync_repository(name)).collect()
    }

    /// Sync a single repository.
    pub fn sync_repository(&self, name: &RepoName) -> RepoReport {
        let _span = info_span!("sync", repo = %name).entered();

        let mut state = SyncState::NotMirrored;
        let outcome = match self.drive(name, &mut state) {
            Ok((mirror, repository, stats)) => {
                info!(
                    inserted = stats.inserted,
                    skipped = stats.skipped,
                    failed = stats.failed.len(),
                    "Finished {name}"
                );
                SyncOutcome::Done {
                    mirror,
                    repository,
                    stats,
                }
            }
            Err(error) => {
                warn!("Giving up on {name} in state {state:?}: {error}");
                SyncOutcome::Failed { state, error }
            }
        };

        RepoReport {
            name: name.clone(),
            outcome,
        }
    }

    fn drive(
        &self,
        name: &RepoName,
        state: &mut SyncState,
    ) -> Result<(MirrorAction, RepositoryId, IngestStats)> {
        let dest = name.mirror_path(&self.mirrors_dir);

        let (handle, mirror) = match self.mirrors.open_mirror(&dest) {
            Ok(handle) => {
                *state = SyncState::MirroredStale;
                info!("Updating mirror at {}", dest.display());
                refresh(&handle).map_err(Error::Mirror)?;
                (handle, MirrorAction::Updated)
            }
            Err(tally_git::Error::NotFound(_)) => {
                *state = SyncState::NotMirrored;
                let url = self.mirrors.clone_url(name);
                info!("Cloning {url} into {}", dest.display());
                let handle = self
                    .mirrors
                    .clone_mirror(&url, &dest)
                    .map_err(Error::Mirror)?;
                (handle, MirrorAction::Cloned)
            }
            Err(e) => {
                *state = SyncState::MirroredStale;
                return Err(Error::Mirror(e));
            }
        };

        *state = SyncState::MirroredFresh;
        let repository = self.store.registry().resolve_or_create(name)?.id();

        *state = SyncState::Ingesting;
        let stats = self.ingest(&handle, repository)?;

        *state = SyncState::Done;
        Ok((mirror, repository, stats))
    }

    fn ingest(&self, handle: &M::Handle, repository: RepositoryId) -> Result<IngestStats> {
        let walk = handle
            .walk_history()
            .map_err(Error::RepositoryUnreadable)?;

        let mut stats = IngestStats::default();
        for item in walk {
            let result = item
                .map_err(record_error)
                .and_then(|record| self.ingest_record(repository, &record));

            match result {
                Ok(Ingested::Inserted { new_person }) => {
                    stats.inserted += 1;
                    stats.new_people += usize::from(new_person);
                }
                Ok(Ingested::AlreadyPresent) => stats.skipped += 1,
                Err(Error::Record { hash, reason }) => {
                    warn!("Skipping commit {}: {reason}", hash.as_deref().unwrap_or("?"));
                    stats.failed.push(RecordFailure { hash, reason });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(stats)
    }

    fn ingest_record(&self, repository: RepositoryId, record: &CommitRecord) -> Result<Ingested> {
        let ledger = self.store.ledger();

        if ledger.exists(repository, &record.hash)? {
            debug!("Commit {} already present", record.hash);
            return Ok(Ingested::AlreadyPresent);
        }

        let author = self
            .store
            .identities()
            .resolve_or_create(&record.author_name, &record.author_email)?;

        ledger.append(
            repository,
            author.id(),
            &record.hash,
            &record.commit_time,
            &record.message,
        )?;
        debug!("Commit {} added", record.hash);

        Ok(Ingested::Inserted {
            new_person: author.is_created(),
        })
    }
}

/// Fetch, move HEAD, sync and prune remote branches, then compact.
fn refresh<H: MirrorHandle>(handle: &H) -> tally_git::Result<()> {
    handle.fetch()?;
    handle.update_head_to_fetched()?;
    handle.sync_remote_branches()?;
    handle.prune_remote_branches()?;
    handle.compact()
}

fn record_error(err: tally_git::Error) -> Error {
    Error::Record {
        hash: err.commit_hash().map(String::from),
        reason: err.to_string(),
    }
}
