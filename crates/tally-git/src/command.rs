//! Maintenance operations delegated to the `git` binary.
//!
//! libgit2 has no equivalent of `git remote prune` or `git gc`, so these run
//! as subprocesses against the mirror's git directory.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, debug_span};

use crate::error::{Error, Result};

/// Runs `git` against a single repository directory.
pub(crate) struct Git<'a> {
    git_dir: &'a Path,
}

impl<'a> Git<'a> {
    pub(crate) const fn new(git_dir: &'a Path) -> Self {
        Self { git_dir }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
        cmd.env("GIT_CONFIG_NOSYSTEM", "1");
        cmd.env("GIT_CONFIG_SYSTEM", "/dev/null");
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.arg("--git-dir").arg(self.git_dir);
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Run `git <args>`, failing on a non-zero exit.
    pub(crate) fn run(&self, args: &[&str]) -> Result<()> {
        let joined = args.join(" ");
        let _span = debug_span!("git", "{joined} {}", self.git_dir.display()).entered();

        let mut cmd = self.command();
        cmd.args(args);

        debug!("{cmd:?}");
        let output = cmd.output().map_err(Error::Spawn)?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify_failure(joined, output.status, stderr))
    }
}

/// Map a failed invocation onto the error taxonomy using git's stderr.
fn classify_failure(args: String, status: std::process::ExitStatus, stderr: String) -> Error {
    let lower = stderr.to_lowercase();

    if lower.contains("authentication failed")
        || lower.contains("could not read username")
        || lower.contains("permission denied")
    {
        Error::Auth(stderr)
    } else if lower.contains("could not resolve host")
        || lower.contains("unable to access")
        || lower.contains("connection refused")
        || lower.contains("connection timed out")
    {
        Error::Network(stderr)
    } else if lower.contains("no space left") || lower.contains("read-only file system") {
        Error::Disk(stderr)
    } else {
        Error::Command {
            args,
            status,
            stderr,
        }
    }
}
