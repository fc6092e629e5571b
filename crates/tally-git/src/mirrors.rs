//! The git2-backed [`MirrorOps`] implementation.

use std::path::Path;

use crate::error::Result;
use crate::repository::Mirror;
use crate::traits::MirrorOps;

/// Default host that `owner/project` names are cloned from.
pub const DEFAULT_REMOTE_BASE: &str = "https://github.com";

/// Clones and opens mirrors of repositories hosted under one base URL.
#[derive(Debug, Clone)]
pub struct GitMirrors {
    remote_base: String,
}

impl GitMirrors {
    /// Create a collaborator cloning from `remote_base`
    /// (e.g. `https://github.com` or a local directory).
    #[must_use]
    pub fn new(remote_base: impl Into<String>) -> Self {
        let remote_base = remote_base.into().trim_end_matches('/').to_string();
        Self { remote_base }
    }
}

impl Default for GitMirrors {
    fn default() -> Self {
        Self::new(DEFAULT_REMOTE_BASE)
    }
}

impl MirrorOps for GitMirrors {
    type Handle = Mirror;

    fn clone_url(&self, name: &str) -> String {
        format!("{}/{name}.git", self.remote_base)
    }

    fn clone_mirror(&self, url: &str, dest: &Path) -> Result<Mirror> {
        Mirror::clone_bare(url, dest)
    }

    fn open_mirror(&self, dest: &Path) -> Result<Mirror> {
        Mirror::open(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_url_default() {
        let mirrors = GitMirrors::default();
        assert_eq!(
            mirrors.clone_url("gluster/glusterfs"),
            "https://github.com/gluster/glusterfs.git"
        );
    }

    #[test]
    fn test_clone_url_ignores_trailing_slash() {
        let mirrors = GitMirrors::new("/srv/git/");
        assert_eq!(mirrors.clone_url("acme/widget"), "/srv/git/acme/widget.git");
    }
}
