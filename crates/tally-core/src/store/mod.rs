//! SQLite backing store for repositories, people and commits.
//!
//! A single [`Store`] owns the connection; the Repository Registry, Identity
//! Store and Commit Ledger borrow it. Every write commits on its own, so an
//! interrupted run leaves a consistent, resumable database.
//!
//! Resolve-or-create is a lookup followed by a conditional insert. That is
//! only race-free with a single writer, which is how the sync orchestrator
//! uses the store.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use indoc::indoc;
use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{CachedStatement, Connection, OptionalExtension};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;

mod identity;
mod ledger;
mod registry;

pub use identity::IdentityStore;
pub use ledger::CommitLedger;
pub use registry::RepositoryRegistry;

const SCHEMA: &str = include_str!("schema.sql");

/// Text format of `commits.commit_time` (UTC, whole seconds).
pub const COMMIT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(i64);

        impl $name {
            /// The raw row id.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                self.0.to_sql()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Identity of a row in the Repository Registry.
    RepositoryId
);
row_id!(
    /// Identity of a row in the Identity Store.
    PersonId
);
row_id!(
    /// Identity of a row in the Commit Ledger.
    CommitId
);

/// Outcome of a resolve-or-create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<T> {
    /// The key was already present.
    Existing(T),
    /// A new row was inserted.
    Created(T),
}

impl<T> Resolved<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        match self {
            Self::Existing(id) => Resolved::Existing(f(id)),
            Self::Created(id) => Resolved::Created(f(id)),
        }
    }
}

impl<T: Copy> Resolved<T> {
    /// The identity, whichever way it was obtained.
    #[must_use]
    pub fn id(&self) -> T {
        match self {
            Self::Existing(id) | Self::Created(id) => *id,
        }
    }

    /// Whether this call inserted the row.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Per-repository totals for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositorySummary {
    pub name: String,
    pub commits: u64,
    pub authors: u64,
    pub first_commit: Option<DateTime<Utc>>,
    pub last_commit: Option<DateTime<Utc>>,
}

/// Handle to the backing database.
///
/// Not `Sync`: share it across threads only through a single mediating owner.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path` and apply the schema.
    ///
    /// # Errors
    /// Returns error if the parent directory can't be created or the
    /// database can't be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening store at {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::init(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns error if the schema can't be applied.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "on")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// The Repository Registry.
    #[must_use]
    pub const fn registry(&self) -> RepositoryRegistry<'_> {
        RepositoryRegistry::new(self)
    }

    /// The Identity Store.
    #[must_use]
    pub const fn identities(&self) -> IdentityStore<'_> {
        IdentityStore::new(self)
    }

    /// The Commit Ledger.
    #[must_use]
    pub const fn ledger(&self) -> CommitLedger<'_> {
        CommitLedger::new(self)
    }

    /// Commit and author totals for every registered repository, by name.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn summary(&self) -> Result<Vec<RepositorySummary>> {
        let mut stmt = self.conn.prepare_cached(indoc! {r"
            select r.name, count(c.commit_id), count(distinct c.author),
                   min(c.commit_time), max(c.commit_time)
            from repo r
            left join commits c on c.repo = r.repo_id
            group by r.repo_id
            order by r.name
        "})?;

        let rows = stmt.query_map([], |row| {
            let first: Option<String> = row.get(3)?;
            let last: Option<String> = row.get(4)?;
            Ok(RepositorySummary {
                name: row.get(0)?,
                commits: row.get(1)?,
                authors: row.get(2)?,
                first_commit: first.as_deref().and_then(parse_commit_time),
                last_commit: last.as_deref().and_then(parse_commit_time),
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Number of rows in the Identity Store.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn person_count(&self) -> Result<u64> {
        Ok(self
            .conn
            .query_row("select count(*) from people", [], |row| row.get(0))?)
    }

    /// Close the connection, reporting any error from doing so.
    ///
    /// # Errors
    /// Returns error if SQLite fails to close cleanly.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    pub(crate) const fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.conn.path())
            .finish()
    }
}

/// Format a commit time the way it is stored.
pub(crate) fn format_commit_time(time: &DateTime<Utc>) -> String {
    time.format(COMMIT_TIME_FORMAT).to_string()
}

fn parse_commit_time(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, COMMIT_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Look up a row id with `get`; if absent, insert with `set` (which must
/// return the new id).
fn resolve_or_insert<P1, P2>(
    get: &mut CachedStatement<'_>,
    set: &mut CachedStatement<'_>,
    get_params: P1,
    set_params: P2,
) -> rusqlite::Result<Resolved<i64>>
where
    P1: rusqlite::Params,
    P2: rusqlite::Params,
{
    if let Some(id) = get.query_row(get_params, |row| row.get(0)).optional()? {
        return Ok(Resolved::Existing(id));
    }
    let id = set.query_row(set_params, |row| row.get(0))?;
    Ok(Resolved::Created(id))
}
