//! Repository name validation and newtype.
//!
//! Provides a [`RepoName`] type for `owner/project` names. Names end up in
//! clone URLs and in mirror paths on disk, so validation also rules out
//! path traversal and shell metacharacters.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// A validated `owner/project` repository name.
///
/// # Examples
///
/// ```
/// use tally_core::RepoName;
///
/// let name = RepoName::new("gluster/glusterfs").unwrap();
/// assert_eq!(name.owner(), "gluster");
/// assert_eq!(name.project(), "glusterfs");
///
/// assert!(RepoName::new("glusterfs").is_err());
/// assert!(RepoName::new("../etc/passwd").is_err());
/// assert!(RepoName::new("a/b/c").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoName(String);

impl RepoName {
    /// Create a new validated repository name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRepoName`] if the name is not of the form
    /// `owner/project` or contains characters outside `[A-Za-z0-9._-]`.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        validate_repo_name(&name)?;
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the slash.
    #[must_use]
    pub fn owner(&self) -> &str {
        self.0.split_once('/').map_or("", |(owner, _)| owner)
    }

    /// The part after the slash.
    #[must_use]
    pub fn project(&self) -> &str {
        self.0.split_once('/').map_or("", |(_, project)| project)
    }

    /// Where this repository's bare mirror lives under `mirrors_dir`.
    #[must_use]
    pub fn mirror_path(&self, mirrors_dir: &Path) -> PathBuf {
        mirrors_dir
            .join(self.owner())
            .join(format!("{}.git", self.project()))
    }
}

impl AsRef<str> for RepoName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for RepoName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RepoName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl PartialEq<str> for RepoName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RepoName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for RepoName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RepoName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> Error {
    Error::InvalidRepoName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate an `owner/project` name.
fn validate_repo_name(name: &str) -> Result<(), Error> {
    let Some((owner, project)) = name.split_once('/') else {
        return Err(invalid(name, "expected the form 'owner/project'"));
    };

    if project.contains('/') {
        return Err(invalid(name, "expected exactly one '/'"));
    }

    for (part, segment) in [("owner", owner), ("project", project)] {
        if segment.is_empty() {
            return Err(invalid(name, format!("{part} cannot be empty")));
        }

        // Also covers "." and ".."
        if segment.starts_with('.') {
            return Err(invalid(name, format!("{part} cannot start with '.'")));
        }

        if let Some(c) = segment
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(invalid(name, format!("{part} cannot contain '{c}'")));
        }
    }

    Ok(())
}
