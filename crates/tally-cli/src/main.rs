//! Tally CLI - Mirror repositories and record their commits.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod commands;
mod output;

use commands::{Cli, Commands};

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "TALLY_LOG";

fn configure_tracing(cli: &Cli) -> Result<()> {
    let level = if cli.quiet {
        LevelFilter::ERROR
    } else {
        match cli.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet);

    if let Err(e) = configure_tracing(&cli) {
        output::warn(&format!("Logging disabled: {e}"));
    }

    let result = match &cli.command {
        Commands::Sync { repo, json } => commands::sync::run(&cli.config, repo, *json),
        Commands::Summary { json } => commands::summary::run(&cli.config, *json),
        Commands::Completions { shell } => commands::completions::run(*shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
