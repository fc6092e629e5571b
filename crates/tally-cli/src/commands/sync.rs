//! `tally sync` command - Update mirrors and record new commits.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tally_core::{
    Config, IngestStats, MirrorAction, RepoName, RepoReport, Store, SyncOutcome, SyncState, Syncer,
};
use tally_git::GitMirrors;

use crate::output;

/// Run the sync command.
///
/// Only startup problems (configuration, database) are errors; a repository
/// that fails is reported and the remaining ones still run.
pub fn run(config_path: &Path, only: &[RepoName], json: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let names = config.select(only)?;

    let store = Store::open(&config.general.database).with_context(|| {
        format!(
            "Failed to open database {}",
            config.general.database.display()
        )
    })?;

    if names.is_empty() && !json {
        output::info("No repositories configured - nothing to sync");
    }

    let mirrors = GitMirrors::new(config.general.remote_base.as_str());
    let reports = Syncer::new(&mirrors, &store, &config.general.mirrors_dir).run(&names);

    if json {
        let entries: Vec<_> = reports.iter().map(JsonReport::from).collect();
        output::essential(&serde_json::to_string_pretty(&entries)?);
    } else {
        print_reports(&reports);
    }

    store.close().context("Failed to close database")?;
    Ok(())
}

fn print_reports(reports: &[RepoReport]) {
    for report in reports {
        match &report.outcome {
            SyncOutcome::Done { mirror, stats, .. } => print_done(&report.name, *mirror, stats),
            SyncOutcome::Failed { state, error } => {
                output::error(&format!(
                    "{} failed while {}: {error}",
                    report.name,
                    state_label(*state)
                ));
            }
        }
    }

    let done = reports
        .iter()
        .filter(|r| r.final_state() == SyncState::Done)
        .count();
    if done == reports.len() {
        output::success(&format!("Synced {done} repositories"));
    } else {
        output::warn(&format!("Synced {done} of {} repositories", reports.len()));
    }
}

fn print_done(name: &RepoName, mirror: MirrorAction, stats: &IngestStats) {
    let action = match mirror {
        MirrorAction::Cloned => "cloned",
        MirrorAction::Updated => "updated",
    };
    output::success(&format!(
        "{name} ({action}): {} new, {} already recorded, {} new people",
        stats.inserted, stats.skipped, stats.new_people
    ));

    if !stats.failed.is_empty() {
        output::warn(&format!("{name}: skipped {} commits", stats.failed.len()));
        for failure in &stats.failed {
            output::detail(&format!(
                "  {} {}",
                failure.hash.as_deref().unwrap_or("<unknown>"),
                failure.reason
            ));
        }
    }
}

const fn state_label(state: SyncState) -> &'static str {
    match state {
        SyncState::NotMirrored => "cloning",
        SyncState::MirroredStale => "updating the mirror",
        SyncState::MirroredFresh => "registering",
        SyncState::Ingesting => "ingesting",
        SyncState::Done => "finishing",
        SyncState::Error => "failing",
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    repository: &'a RepoName,
    state: SyncState,
    #[serde(skip_serializing_if = "Option::is_none")]
    mirror: Option<MirrorAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a IngestStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_in: Option<SyncState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a RepoReport> for JsonReport<'a> {
    fn from(report: &'a RepoReport) -> Self {
        let mut entry = Self {
            repository: &report.name,
            state: report.final_state(),
            mirror: None,
            stats: None,
            failed_in: None,
            error: None,
        };
        match &report.outcome {
            SyncOutcome::Done { mirror, stats, .. } => {
                entry.mirror = Some(*mirror);
                entry.stats = Some(stats);
            }
            SyncOutcome::Failed { state, error } => {
                entry.failed_in = Some(*state);
                entry.error = Some(error.to_string());
            }
        }
        entry
    }
}
