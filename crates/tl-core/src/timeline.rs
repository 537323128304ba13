//! Session timeline aggregation.
//!
//! Folds a time-ordered stream of `(time, project)` heartbeats into sessions:
//! maximal runs of a single project where consecutive heartbeats are less than
//! [`GAP_THRESHOLD_SECS`] apart. Each closed session goes to a [`RecordSink`]:
//! an [`OutputBuffer`] renders it as a CSV line (see [`crate::csv`]), a
//! `Vec<SessionRecord>` keeps it structured.
//!
//! # Session boundaries
//!
//! 1. The first heartbeat opens a session.
//! 2. A heartbeat for another project within the gap window closes the current
//!    session at the *new* heartbeat's time and opens a session for the new
//!    project.
//! 3. A heartbeat after a gap of [`GAP_THRESHOLD_SECS`] or more closes the
//!    current session at its *last seen* time and opens a fresh session, even
//!    when the project is unchanged.
//! 4. [`Timeline::finish`] closes the open session at its last seen time.
//!
//! Input must already be sorted by time; nothing here reorders heartbeats.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::csv::{OutputBuffer, SessionRecord};

/// Largest gap (exclusive) between two heartbeats that still counts as
/// continuous activity, in seconds.
pub const GAP_THRESHOLD_SECS: f64 = 300.0;

/// Errors raised while building a timeline.
///
/// After an error the [`Timeline`] must be discarded and the aggregation
/// restarted from the beginning of the input.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// Growing the output buffer failed.
    #[error("out of memory while growing timeline output")]
    OutOfMemory(#[from] TryReserveError),
}

/// Destination for closed sessions, in the order they close.
pub trait RecordSink {
    fn emit(&mut self, record: SessionRecord) -> Result<(), TimelineError>;

    /// Number of records emitted so far.
    fn emitted(&self) -> usize;
}

impl RecordSink for OutputBuffer {
    fn emit(&mut self, record: SessionRecord) -> Result<(), TimelineError> {
        self.push(&record)
    }

    fn emitted(&self) -> usize {
        self.records()
    }
}

impl RecordSink for Vec<SessionRecord> {
    fn emit(&mut self, record: SessionRecord) -> Result<(), TimelineError> {
        self.try_reserve(1)?;
        self.push(record);
        Ok(())
    }

    fn emitted(&self) -> usize {
        self.len()
    }
}

/// The session currently being extended.
#[derive(Debug, Clone, PartialEq)]
struct Session {
    project: Option<String>,
    /// When this session began.
    from: f64,
    /// Time of the most recent heartbeat in this session.
    last_seen: f64,
}

impl Session {
    fn close_at(&self, to: f64) -> SessionRecord {
        SessionRecord::from_bounds(self.project.as_deref(), self.from, to)
    }
}

/// Streaming session accumulator.
///
/// Feed heartbeats in non-decreasing time order with [`Timeline::consume`],
/// then call [`Timeline::finish`] (CSV) or [`Timeline::finish_records`] once.
/// One instance covers exactly one ordered sequence.
#[derive(Debug, Default)]
pub struct Timeline<S = OutputBuffer> {
    current: Option<Session>,
    sink: S,
}

impl Timeline {
    /// Creates a timeline that renders CSV.
    pub const fn new() -> Self {
        Self::with_sink(OutputBuffer::new())
    }

    /// Closes the open session, if any, and returns the CSV text.
    ///
    /// A timeline that never consumed a heartbeat yields an empty string.
    pub fn finish(self) -> Result<String, TimelineError> {
        Ok(self.close()?.into_string())
    }
}

impl Timeline<Vec<SessionRecord>> {
    /// Creates a timeline that collects records instead of rendering them.
    pub const fn collecting() -> Self {
        Self::with_sink(Vec::new())
    }

    /// Closes the open session, if any, and returns every record.
    pub fn finish_records(self) -> Result<Vec<SessionRecord>, TimelineError> {
        self.close()
    }
}

impl<S: RecordSink> Timeline<S> {
    pub const fn with_sink(sink: S) -> Self {
        Self {
            current: None,
            sink,
        }
    }

    /// Returns true once at least one heartbeat has been consumed.
    pub const fn has_session(&self) -> bool {
        self.current.is_some()
    }

    /// Number of sessions closed so far. The open session is not counted.
    pub fn records_emitted(&self) -> usize {
        self.sink.emitted()
    }

    /// Consumes one heartbeat.
    ///
    /// `project` compares by exact text; `None` equals only `None`.
    pub fn consume(&mut self, time: f64, project: Option<&str>) -> Result<(), TimelineError> {
        let Some(session) = self.current.as_mut() else {
            self.current = Some(Session {
                project: project.map(str::to_owned),
                from: time,
                last_seen: time,
            });
            return Ok(());
        };

        let diff = time - session.last_seen;
        let project_changed = session.project.as_deref() != project;

        if diff < GAP_THRESHOLD_SECS {
            if project_changed {
                let record = session.close_at(time);
                tracing::trace!(%record, "project switched");
                self.sink.emit(record)?;
                session.from = time;
            }
        } else {
            let record = session.close_at(session.last_seen);
            tracing::trace!(%record, gap = diff, "gap closed session");
            self.sink.emit(record)?;
            session.from = time;
        }

        session.last_seen = time;
        if project_changed {
            session.project = project.map(str::to_owned);
        }

        Ok(())
    }

    /// Flushes the open session and hands back the sink.
    fn close(self) -> Result<S, TimelineError> {
        let Self { current, mut sink } = self;

        if let Some(session) = current {
            sink.emit(session.close_at(session.last_seen))?;
        }

        tracing::debug!(records = sink.emitted(), "timeline finished");
        Ok(sink)
    }
}

fn fold<I, S, K>(events: I, mut timeline: Timeline<K>) -> Result<K, TimelineError>
where
    I: IntoIterator<Item = (f64, Option<S>)>,
    S: AsRef<str>,
    K: RecordSink,
{
    for (time, project) in events {
        timeline.consume(time, project.as_ref().map(AsRef::as_ref))?;
    }
    timeline.close()
}

/// Builds timeline CSV from an ordered sequence of `(time, project)` pairs.
pub fn timeline_csv<I, S>(events: I) -> Result<String, TimelineError>
where
    I: IntoIterator<Item = (f64, Option<S>)>,
    S: AsRef<str>,
{
    Ok(fold(events, Timeline::new())?.into_string())
}

/// Builds session records from an ordered sequence of `(time, project)` pairs.
///
/// Same sessions as [`timeline_csv`], without the lossy text rendering.
pub fn timeline_records<I, S>(events: I) -> Result<Vec<SessionRecord>, TimelineError>
where
    I: IntoIterator<Item = (f64, Option<S>)>,
    S: AsRef<str>,
{
    fold(events, Timeline::collecting())
}
