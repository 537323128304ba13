//! Core domain logic for heartbeat timelines.
//!
//! This crate contains:
//! - Timeline: folding ordered heartbeats into per-project sessions
//! - CSV: rendering and reading session records
//! - Heartbeat: the raw activity signal

pub mod csv;
pub mod heartbeat;
mod timeline;

pub use csv::{OutputBuffer, ParseRecordError, SessionRecord, parse_records};
pub use heartbeat::Heartbeat;
pub use timeline::{
    GAP_THRESHOLD_SECS, RecordSink, Timeline, TimelineError, timeline_csv, timeline_records,
};
