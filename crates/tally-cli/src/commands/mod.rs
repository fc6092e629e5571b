//! Command-line definitions and subcommand implementations.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use tally_core::RepoName;

pub mod completions;
pub mod summary;
pub mod sync;

/// Keep local mirrors of git repositories and record their commits in a
/// statistics database.
#[derive(Parser, Debug)]
#[command(name = "tally", version, about)]
pub struct Cli {
    /// Configuration file
    #[arg(global = true, long, short, env = "TALLY_CONFIG", default_value = "tally.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    ///
    /// This can be repeated up to 3 times to enable successively more output.
    #[arg(global = true, long, short, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors and machine-readable results
    #[arg(global = true, long, short, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Update mirrors and record new commits for configured repositories
    Sync {
        /// Only sync this repository (repeatable); must be configured
        #[arg(long = "repo", value_name = "OWNER/PROJECT")]
        repo: Vec<RepoName>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show per-repository commit and author totals
    Summary {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_repos() {
        let cli = Cli::try_parse_from([
            "tally",
            "sync",
            "--repo",
            "gluster/glusterfs",
            "--repo",
            "gluster/gluster-swift",
        ])
        .unwrap();

        match cli.command {
            Commands::Sync { repo, json } => {
                assert_eq!(repo.len(), 2);
                assert_eq!(repo[0], "gluster/glusterfs");
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("tally.toml"));
    }

    #[test]
    fn test_invalid_repo_is_rejected() {
        let err = Cli::try_parse_from(["tally", "sync", "--repo", "../etc"]).unwrap_err();
        assert!(err.to_string().contains("invalid repository name"));
    }
}
