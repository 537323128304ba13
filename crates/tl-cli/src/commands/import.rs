//! Import command for loading JSONL heartbeats into the local `SQLite` store.

use std::io::BufRead;

use anyhow::{Context, Result};

use tl_core::Heartbeat;
use tl_db::Database;

/// Reads heartbeats from `reader` and stores them. Returns the number inserted.
pub fn run<R: BufRead>(db: &mut Database, reader: R) -> Result<usize> {
    let heartbeats = parse_heartbeats(reader)?;
    let inserted = db.insert_heartbeats(&heartbeats)?;
    tracing::debug!(inserted, "imported heartbeats");
    Ok(inserted)
}

fn parse_heartbeats<R: BufRead>(reader: R) -> Result<Vec<Heartbeat>> {
    let mut heartbeats = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let heartbeat: Heartbeat = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        heartbeats.push(heartbeat);
    }
    Ok(heartbeats)
}
