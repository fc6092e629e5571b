//! `tally summary` command - Per-repository totals from the database.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tally_core::{Config, RepositorySummary, Store};

use crate::output;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Run the summary command.
pub fn run(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let store = Store::open(&config.general.database).with_context(|| {
        format!(
            "Failed to open database {}",
            config.general.database.display()
        )
    })?;

    let summary = store.summary()?;
    let people = store.person_count()?;

    if json {
        let doc = serde_json::json!({
            "repositories": summary,
            "people": people,
        });
        output::essential(&serde_json::to_string_pretty(&doc)?);
    } else if summary.is_empty() {
        output::info("No repositories recorded yet. Run `tally sync` first.");
    } else {
        print_table(&summary, people);
    }

    store.close().context("Failed to close database")?;
    Ok(())
}

fn print_table(summary: &[RepositorySummary], people: u64) {
    let width = summary.iter().map(|r| r.name.len()).max().unwrap_or(0);

    for repo in summary {
        let span = match (repo.first_commit, repo.last_commit) {
            (Some(first), Some(last)) => format!(
                "{} .. {}",
                first.format(DATE_FORMAT),
                last.format(DATE_FORMAT)
            ),
            _ => "no commits".to_string(),
        };
        output::essential(&format!(
            "{}  {:>7} commits  {:>5} authors  {}",
            format!("{:<width$}", repo.name).bold(),
            repo.commits,
            repo.authors,
            span.dimmed(),
        ));
    }

    output::hr();
    let commits: u64 = summary.iter().map(|r| r.commits).sum();
    output::detail(&format!(
        "{} repositories, {commits} commits, {people} people",
        summary.len()
    ));
}
