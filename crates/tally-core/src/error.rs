//! Error types for tally-core.

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tally-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration could not be loaded. Fatal for the whole run.
    #[error("failed to load {}: {message}", file.display())]
    Config { file: PathBuf, message: String },

    /// A repository name is not of the form `owner/project`.
    #[error("invalid repository name '{name}': {reason}")]
    InvalidRepoName {
        /// The invalid name.
        name: String,
        /// Why the name is invalid.
        reason: String,
    },

    /// A repository was requested that is not in the configuration.
    #[error("repository '{0}' is not configured")]
    NotConfigured(String),

    /// The local mirror could not be created or brought up to date.
    #[error("mirror error: {0}")]
    Mirror(#[source] tally_git::Error),

    /// The mirror's history cannot be walked.
    #[error("repository unreadable: {0}")]
    RepositoryUnreadable(#[source] tally_git::Error),

    /// A single commit could not be read or recorded.
    #[error("commit {}: {reason}", hash.as_deref().unwrap_or("<unknown>"))]
    Record {
        /// The commit hash, when it is known.
        hash: Option<String>,
        /// What went wrong.
        reason: String,
    },

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
