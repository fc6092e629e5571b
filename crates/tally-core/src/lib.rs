//! # tally-core
//!
//! Core library for tally: configuration, the SQLite-backed repository
//! registry, identity store and commit ledger, and the sync orchestrator
//! that feeds them from local mirrors.

pub mod config;
pub mod error;
pub mod repo_name;
pub mod store;
pub mod sync;

#[cfg(test)]
mod test_mocks;

pub use config::{Config, GeneralConfig};
pub use error::{Error, Result};
pub use repo_name::RepoName;
pub use store::{
    CommitId, CommitLedger, IdentityStore, PersonId, RepositoryId, RepositoryRegistry,
    RepositorySummary, Resolved, Store,
};
pub use sync::{
    IngestStats, MirrorAction, RecordFailure, RepoReport, SyncOutcome, SyncState, Syncer,
};
