//! # tally-git
//!
//! Version-control collaborator for tally, built on git2-rs.
//! Keeps bare mirrors of remote repositories up to date and walks
//! their history oldest-first.

mod command;
mod error;
mod history;
mod mirrors;
mod repository;
mod traits;

pub use error::{Error, Result};
pub use history::{CommitRecord, HistoryWalk};
pub use mirrors::{DEFAULT_REMOTE_BASE, GitMirrors};
pub use repository::Mirror;
pub use traits::{MirrorHandle, MirrorOps};
