//! Error types for tally-git.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during mirror and history operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No repository at the given path.
    #[error("no repository found at {}", .0.display())]
    NotFound(PathBuf),

    /// The remote rejected our credentials (or demanded some).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure talking to the remote.
    #[error("network error: {0}")]
    Network(String),

    /// Local filesystem failure.
    #[error("disk error: {0}")]
    Disk(String),

    /// The mirror exists but its history cannot be read.
    #[error("repository unreadable: {0}")]
    Unreadable(String),

    /// Remote not found.
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// Reference not found.
    #[error("reference not found: {0}")]
    RefNotFound(String),

    /// Commit time cannot be represented as a UTC datetime.
    #[error("commit {hash} has an invalid timestamp ({seconds})")]
    InvalidTimestamp { hash: String, seconds: i64 },

    /// A commit listed by the walk could not be read.
    #[error("commit {hash} unreadable: {source}")]
    UnreadableCommit {
        hash: String,
        #[source]
        source: git2::Error,
    },

    /// The `git` binary exited unsuccessfully.
    #[error("`git {args}` failed ({status}): {stderr}")]
    Command {
        args: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The `git` binary could not be started.
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(git2::Error),
}

impl Error {
    /// The commit this error is about, if it concerns a single commit.
    #[must_use]
    pub fn commit_hash(&self) -> Option<&str> {
        match self {
            Self::InvalidTimestamp { hash, .. } | Self::UnreadableCommit { hash, .. } => {
                Some(hash)
            }
            _ => None,
        }
    }
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        use git2::{ErrorClass, ErrorCode};

        let message = err.message().to_string();
        match (err.code(), err.class()) {
            (ErrorCode::Auth | ErrorCode::Certificate, _) => Self::Auth(message),
            (_, ErrorClass::Net | ErrorClass::Http | ErrorClass::Ssl | ErrorClass::Ssh) => {
                Self::Network(message)
            }
            (_, ErrorClass::Os | ErrorClass::Filesystem) => Self::Disk(message),
            _ => Self::Git2(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Disk(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::ErrorCode;

    #[test]
    fn test_classifies_auth_errors() {
        let err = git2::Error::new(ErrorCode::Auth, git2::ErrorClass::Http, "401");
        assert!(matches!(Error::from(err), Error::Auth(_)));
    }

    #[test]
    fn test_classifies_network_errors() {
        let err = git2::Error::new(
            ErrorCode::GenericError,
            git2::ErrorClass::Net,
            "connection refused",
        );
        assert!(matches!(Error::from(err), Error::Network(_)));
    }

    #[test]
    fn test_classifies_disk_errors() {
        let err = git2::Error::new(
            ErrorCode::GenericError,
            git2::ErrorClass::Os,
            "no space left on device",
        );
        assert!(matches!(Error::from(err), Error::Disk(_)));
    }

    #[test]
    fn test_other_errors_stay_git2() {
        let err = git2::Error::new(
            ErrorCode::NotFound,
            git2::ErrorClass::Reference,
            "no such ref",
        );
        assert!(matches!(Error::from(err), Error::Git2(_)));
    }
}
