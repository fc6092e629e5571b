//! Chronological history walking.

use chrono::{DateTime, Utc};
use git2::{ErrorCode, Oid, Sort};

use crate::error::{Error, Result};

/// One commit as seen by the history walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Full hex object id.
    pub hash: String,
    /// Author display name.
    pub author_name: String,
    /// Author email, used verbatim as the identity key.
    pub author_email: String,
    /// Commit time, whole seconds, UTC.
    pub commit_time: DateTime<Utc>,
    /// Full commit message, trailing newline included.
    pub message: String,
}

/// Lazy, oldest-first walk over the commits reachable from HEAD.
///
/// Commit ids are collected and ordered when the walk is created; each
/// record is only read from the object store when the iterator reaches it.
pub struct HistoryWalk<'repo> {
    repo: &'repo git2::Repository,
    pending: std::vec::IntoIter<Oid>,
}

impl<'repo> HistoryWalk<'repo> {
    /// Start a walk from the repository's HEAD.
    ///
    /// # Errors
    /// Returns [`Error::Unreadable`] if HEAD or any reachable commit cannot be
    /// read. An unborn HEAD gives an empty walk.
    pub(crate) fn new(repo: &'repo git2::Repository) -> Result<Self> {
        let unreadable = |e: git2::Error| Error::Unreadable(e.message().to_string());

        let tip = match repo.head() {
            Ok(head) => head
                .target()
                .ok_or_else(|| Error::Unreadable("HEAD does not point at a commit".into()))?,
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                return Ok(Self {
                    repo,
                    pending: Vec::new().into_iter(),
                });
            }
            Err(e) => return Err(unreadable(e)),
        };

        let mut revwalk = repo.revwalk().map_err(unreadable)?;
        revwalk
            .set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)
            .map_err(unreadable)?;
        revwalk.push(tip).map_err(unreadable)?;

        let mut entries = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(unreadable)?;
            let seconds = repo.find_commit(oid).map_err(unreadable)?.time().seconds();
            entries.push((seconds, oid));
        }

        // Skewed clocks can put a parent after its child in time; a stable
        // sort keeps the native order for equal timestamps.
        entries.sort_by_key(|&(seconds, _)| seconds);
        let pending: Vec<Oid> = entries.into_iter().map(|(_, oid)| oid).collect();

        Ok(Self {
            repo,
            pending: pending.into_iter(),
        })
    }

    fn record(&self, oid: Oid) -> Result<CommitRecord> {
        let hash = oid.to_string();
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|source| Error::UnreadableCommit {
                hash: hash.clone(),
                source,
            })?;

        let seconds = commit.time().seconds();
        let commit_time = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
            Error::InvalidTimestamp {
                hash: hash.clone(),
                seconds,
            }
        })?;

        let author = commit.author();
        Ok(CommitRecord {
            hash,
            author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            commit_time,
            message: String::from_utf8_lossy(commit.message_raw_bytes()).into_owned(),
        })
    }
}

impl Iterator for HistoryWalk<'_> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = self.pending.next()?;
        Some(self.record(oid))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pending.size_hint()
    }
}

impl std::fmt::Debug for HistoryWalk<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryWalk")
            .field("path", &self.repo.path())
            .field("remaining", &self.pending.len())
            .finish()
    }
}
