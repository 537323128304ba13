//! Ingest command for recording a single heartbeat.

use anyhow::Result;
use chrono::Utc;

use tl_core::Heartbeat;
use tl_db::Database;

use crate::commands::util::unix_seconds;

/// Records one heartbeat, stamping it with the current time when `time` is `None`.
pub fn run(db: &mut Database, mut heartbeat: Heartbeat, time: Option<f64>) -> Result<()> {
    if let Some(time) = time {
        anyhow::ensure!(time.is_finite(), "--time must be a finite number");
        heartbeat.time = time;
    } else {
        heartbeat.time = unix_seconds(Utc::now());
    }

    db.insert_heartbeats(std::slice::from_ref(&heartbeat))?;
    tracing::debug!(?heartbeat, "heartbeat ingested");
    Ok(())
}
