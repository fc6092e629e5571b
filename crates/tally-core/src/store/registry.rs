//! Repository Registry: repository name to stable id.

use indoc::indoc;
use rusqlite::OptionalExtension;
use tracing::debug;

use super::{RepositoryId, Resolved, Store, resolve_or_insert};
use crate::error::Result;

/// Persistent mapping of repository names to ids. Names are never updated
/// or removed once registered.
#[derive(Debug, Clone, Copy)]
pub struct RepositoryRegistry<'s> {
    store: &'s Store,
}

impl<'s> RepositoryRegistry<'s> {
    pub(super) const fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Look up `name`, registering it if absent.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub fn resolve_or_create(&self, name: &str) -> Result<Resolved<RepositoryId>> {
        let conn = self.store.conn();
        let mut get = conn.prepare_cached("select repo_id from repo where name = ?")?;
        let mut set = conn.prepare_cached(indoc! {r"
            insert into repo(name)
            values (?)
            returning repo_id
        "})?;

        let resolved = resolve_or_insert(&mut get, &mut set, [name], [name])?.map(RepositoryId);
        if resolved.is_created() {
            debug!("Registered repository {name} as {}", resolved.id());
        }
        Ok(resolved)
    }

    /// Look up `name` without registering it.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub fn find(&self, name: &str) -> Result<Option<RepositoryId>> {
        let mut get = self
            .store
            .conn()
            .prepare_cached("select repo_id from repo where name = ?")?;
        Ok(get
            .query_row([name], |row| row.get(0))
            .optional()?
            .map(RepositoryId))
    }
}
