//! Configuration management for tally.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::repo_name::RepoName;

/// Tally configuration loaded from `tally.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
}

impl Config {
    /// Load config from a TOML file.
    ///
    /// Relative paths in the file are resolved against the file's directory.
    /// Duplicate repository names are dropped, keeping the first occurrence.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_error = |message: String| Error::Config {
            file: path.to_path_buf(),
            message,
        };

        let content = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let mut config: Self = toml::from_str(&content).map_err(|e| config_error(e.to_string()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.general.database = base.join(&config.general.database);
        config.general.mirrors_dir = base.join(&config.general.mirrors_dir);

        let mut seen = Vec::with_capacity(config.general.repositories.len());
        for name in config.general.repositories.drain(..) {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        config.general.repositories = seen;

        Ok(config)
    }

    /// The configured repositories, restricted to `only` when non-empty.
    ///
    /// Keeps configuration order.
    ///
    /// # Errors
    /// Returns [`Error::NotConfigured`] if `only` names an unknown repository.
    pub fn select(&self, only: &[RepoName]) -> Result<Vec<RepoName>> {
        if let Some(missing) = only
            .iter()
            .find(|name| !self.general.repositories.contains(name))
        {
            return Err(Error::NotConfigured(missing.to_string()));
        }

        Ok(self
            .general
            .repositories
            .iter()
            .filter(|name| only.is_empty() || only.contains(name))
            .cloned()
            .collect())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
        }
    }
}

/// General tally settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Path of the SQLite database.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Directory holding one bare mirror per repository.
    #[serde(default = "default_mirrors_dir")]
    pub mirrors_dir: PathBuf,

    /// Base URL that `owner/project` names are cloned from.
    #[serde(default = "default_remote_base")]
    pub remote_base: String,

    /// Repositories to sync, in order.
    #[serde(default)]
    pub repositories: Vec<RepoName>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            mirrors_dir: default_mirrors_dir(),
            remote_base: default_remote_base(),
            repositories: Vec::new(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("db").join("project_stats.db")
}

fn default_mirrors_dir() -> PathBuf {
    PathBuf::from("repos")
}

fn default_remote_base() -> String {
    tally_git::DEFAULT_REMOTE_BASE.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn name(s: &str) -> RepoName {
        RepoName::new(s).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.database, PathBuf::from("db/project_stats.db"));
        assert_eq!(config.general.mirrors_dir, PathBuf::from("repos"));
        assert_eq!(config.general.remote_base, "https://github.com");
        assert!(config.general.repositories.is_empty());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tally.toml");
        fs::write(
            &path,
            "[general]\nrepositories = [\"gluster/glusterfs\", \"gluster/glusterdocs\"]\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.general.database, temp.path().join("db/project_stats.db"));
        assert_eq!(config.general.mirrors_dir, temp.path().join("repos"));
        assert_eq!(
            config.general.repositories,
            vec![name("gluster/glusterfs"), name("gluster/glusterdocs")]
        );
    }

    #[test]
    fn test_load_keeps_absolute_paths() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tally.toml");
        fs::write(&path, "[general]\ndatabase = \"/srv/stats.db\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.general.database, PathBuf::from("/srv/stats.db"));
    }

    #[test]
    fn test_duplicates_dropped_in_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tally.toml");
        fs::write(
            &path,
            "[general]\nrepositories = [\"b/two\", \"a/one\", \"b/two\"]\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.general.repositories, vec![name("b/two"), name("a/one")]);
    }

    #[test]
    fn test_missing_config_is_error() {
        let err = Config::load("/nonexistent/path/tally.toml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_invalid_repository_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tally.toml");
        fs::write(&path, "[general]\nrepositories = [\"no-slash\"]\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_load_all_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tally.toml");
        fs::write(
            &path,
            indoc::indoc! {r#"
                [general]
                database = "/srv/stats.db"
                mirrors_dir = "/srv/mirrors"
                remote_base = "https://git.example.com/"
                repositories = ["acme/widget"]
            "#},
        )
        .unwrap();

        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded.general.database, PathBuf::from("/srv/stats.db"));
        assert_eq!(loaded.general.remote_base, "https://git.example.com/");
        assert_eq!(loaded.general.mirrors_dir, PathBuf::from("/srv/mirrors"));
        assert_eq!(loaded.general.repositories, vec![name("acme/widget")]);
    }

    #[test]
    fn test_select() {
        let mut config = Config::default();
        config.general.repositories = vec![name("a/one"), name("b/two"), name("c/three")];

        assert_eq!(config.select(&[]).unwrap().len(), 3);
        assert_eq!(
            config.select(&[name("c/three"), name("a/one")]).unwrap(),
            vec![name("a/one"), name("c/three")]
        );
        assert!(matches!(
            config.select(&[name("d/four")]).unwrap_err(),
            Error::NotConfigured(_)
        ));
    }
}
