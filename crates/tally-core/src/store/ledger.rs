//! Commit Ledger: the append-only record of commits per repository.

use chrono::{DateTime, Utc};
use indoc::indoc;
use rusqlite::ErrorCode;

use super::{CommitId, PersonId, RepositoryId, Store, format_commit_time};
use crate::error::{Error, Result};

/// Deduplicated commit records. `(repository, hash)` is unique; rows are
/// never updated or deleted.
#[derive(Debug, Clone, Copy)]
pub struct CommitLedger<'s> {
    store: &'s Store,
}

impl<'s> CommitLedger<'s> {
    pub(super) const fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Whether `hash` is already recorded for `repository`.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub fn exists(&self, repository: RepositoryId, hash: &str) -> Result<bool> {
        let mut stmt = self.store.conn().prepare_cached(indoc! {r"
            select exists(select 1 from commits where repo = ? and hash = ?)
        "})?;
        Ok(stmt.query_row((repository, hash), |row| row.get(0))?)
    }

    /// Record a commit. Callers check [`Self::exists`] first; the time is
    /// stored truncated to whole seconds.
    ///
    /// # Errors
    /// Returns [`Error::Record`] if the row violates a constraint (e.g. the
    /// commit is already recorded), or [`Error::Store`] for other failures.
    pub fn append(
        &self,
        repository: RepositoryId,
        author: PersonId,
        hash: &str,
        timestamp: &DateTime<Utc>,
        message: &str,
    ) -> Result<CommitId> {
        let mut stmt = self.store.conn().prepare_cached(indoc! {r"
            insert into commits(commit_time, repo, author, hash, message)
            values (?, ?, ?, ?, ?)
            returning commit_id
        "})?;

        let params = (
            format_commit_time(timestamp),
            repository,
            author,
            hash,
            message,
        );
        match stmt.query_row(params, |row| row.get(0)) {
            Ok(id) => Ok(CommitId(id)),
            Err(rusqlite::Error::SqliteFailure(e, msg)) if e.code == ErrorCode::ConstraintViolation => {
                Err(Error::Record {
                    hash: Some(hash.to_string()),
                    reason: msg.unwrap_or_else(|| e.to_string()),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Number of commits recorded for `repository`.
    #[cfg(test)]
    pub(crate) fn count(&self, repository: RepositoryId) -> Result<u64> {
        let mut stmt = self
            .store
            .conn()
            .prepare_cached("select count(*) from commits where repo = ?")?;
        Ok(stmt.query_row([repository], |row| row.get(0))?)
    }

    /// Number of commits recorded across all repositories.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub fn total(&self) -> Result<u64> {
        Ok(self
            .store
            .conn()
            .query_row("select count(*) from commits", [], |row| row.get(0))?)
    }
}
