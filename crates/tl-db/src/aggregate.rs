//! The `timeline_csv(time, project)` aggregate function.
//!
//! ```sql
//! SELECT timeline_csv(time, project) FROM (
//!     SELECT time, project FROM heartbeats WHERE time > ? ORDER BY time
//! );
//! ```
//!
//! Rows must reach the aggregate ordered by time. SQLite only guarantees that
//! when the input comes from an ordered subquery (or an indexed scan on
//! `time`); `SELECT timeline_csv(time, project) FROM heartbeats` on an
//! unordered table produces meaningless sessions.

use std::borrow::Cow;

use rusqlite::functions::{Aggregate, Context, FunctionFlags};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, ffi};
use tl_core::{Timeline, TimelineError};

/// SQL name of the aggregate.
pub const TIMELINE_CSV: &str = "timeline_csv";

/// Registers `timeline_csv` on `conn`.
pub fn register_timeline_csv(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_aggregate_function(TIMELINE_CSV, 2, FunctionFlags::SQLITE_UTF8, TimelineCsv)?;
    tracing::debug!(function = TIMELINE_CSV, "registered aggregate");
    Ok(())
}

/// One [`Timeline`] per aggregate invocation; SQLite owns the instance
/// between `step` calls and hands it back to `finalize`.
struct TimelineCsv;

impl Aggregate<Timeline, Option<String>> for TimelineCsv {
    fn init(&self, _ctx: &mut Context<'_>) -> rusqlite::Result<Timeline> {
        Ok(Timeline::new())
    }

    fn step(&self, ctx: &mut Context<'_>, timeline: &mut Timeline) -> rusqlite::Result<()> {
        let time = time_arg(ctx.get_raw(0));
        let project = project_arg(ctx.get_raw(1));
        timeline
            .consume(time, project.as_deref())
            .map_err(out_of_memory)
    }

    fn finalize(
        &self,
        _ctx: &mut Context<'_>,
        timeline: Option<Timeline>,
    ) -> rusqlite::Result<Option<String>> {
        // No rows: SQL NULL, like the built-in aggregates.
        let Some(timeline) = timeline else {
            return Ok(None);
        };
        timeline.finish().map(Some).map_err(out_of_memory)
    }
}

/// Reads the time argument the way `sqlite3_value_double` does.
///
/// Values are not validated. Text yields its longest numeric prefix
/// (`'10abc'` reads as 10), other text, NULL and blobs read as zero.
#[expect(
    clippy::cast_precision_loss,
    reason = "integer epoch seconds are far below 2^53"
)]
fn time_arg(value: ValueRef<'_>) -> f64 {
    match value {
        ValueRef::Integer(secs) => secs as f64,
        ValueRef::Real(secs) => secs,
        ValueRef::Text(text) => leading_number(&String::from_utf8_lossy(text)),
        ValueRef::Null | ValueRef::Blob(_) => 0.0,
    }
}

fn leading_number(text: &str) -> f64 {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(text.len());
    (1..=end)
        .rev()
        .find_map(|len| text[..len].parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Reads the project argument as text, SQLite-style. NULL is the absent project.
///
/// Reals keep a fractional part (`42.0`, not `42`). Very large or small reals
/// use Rust's float formatting, which differs from SQLite's `%!.15g`.
fn project_arg(value: ValueRef<'_>) -> Option<Cow<'_, str>> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(Cow::Owned(n.to_string())),
        ValueRef::Real(n) => Some(Cow::Owned(format!("{n:?}"))),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(String::from_utf8_lossy(bytes)),
    }
}

fn out_of_memory(err: TimelineError) -> rusqlite::Error {
    tracing::warn!(error = %err, "timeline aggregate failed");
    rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_NOMEM), Some(err.to_string()))
}
