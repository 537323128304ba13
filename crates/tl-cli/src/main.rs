use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tl_cli::commands::{import, ingest, status, timeline};
use tl_cli::{Cli, Commands, Config};
use tl_core::Heartbeat;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(tl_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = tl_db::Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so CSV on stdout stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut io::stdout().lock(), &db, &config.database_path)?;
        }
        Some(Commands::Ingest {
            project,
            time,
            branch,
            file,
        }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let heartbeat = Heartbeat {
                time: 0.0,
                project: Some(project),
                branch,
                file,
            };
            ingest::run(&mut db, heartbeat, time)?;
        }
        Some(Commands::Import) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let inserted = import::run(&mut db, io::stdin().lock())?;
            eprintln!("Imported {inserted} heartbeats");
        }
        Some(Commands::Timeline { since, until, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            timeline::run(
                &mut io::stdout().lock(),
                &db,
                since.as_deref(),
                until.as_deref(),
                json,
            )?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
