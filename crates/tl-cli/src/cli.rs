//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Project session timelines from activity heartbeats.
///
/// Records editor heartbeats and folds them into per-project sessions,
/// printed as `project,from,to` lines.
#[derive(Debug, Parser)]
#[command(name = "tl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show heartbeat count and the latest heartbeat.
    Status,

    /// Record a single heartbeat.
    Ingest {
        /// Project the activity belongs to (usually a directory path).
        #[arg(long)]
        project: String,

        /// Unix time in seconds. Defaults to now.
        #[arg(long)]
        time: Option<f64>,

        /// Current VCS branch.
        #[arg(long)]
        branch: Option<String>,

        /// File being edited.
        #[arg(long)]
        file: Option<String>,
    },

    /// Import heartbeats as JSONL from stdin.
    Import,

    /// Print project sessions as CSV.
    Timeline {
        /// Only include heartbeats at or after this time
        /// (ISO 8601, unix seconds, or e.g. "2 hours ago").
        #[arg(long)]
        since: Option<String>,

        /// Only include heartbeats before this time.
        #[arg(long)]
        until: Option<String>,

        /// Output sessions as a JSON array instead of CSV.
        #[arg(long)]
        json: bool,
    },
}
