//! CSV rendering of closed sessions.
//!
//! Each session becomes one line `project,from,to` terminated by `\n`. There is
//! no header row. Project labels are written verbatim: a label containing a
//! comma or newline is not escaped. [`parse_records`] reads the rightmost two
//! fields as the bounds, so commas inside a label still read back, but an
//! embedded newline does not.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timeline::TimelineError;

/// Longest rendering of the two bounds plus separators and newline.
const RECORD_OVERHEAD: usize = 2 * 20 + 3;

/// A closed session: one project active from `from` to `to` (whole seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The project label, or `None` for events without a project.
    pub project: Option<String>,
    /// Session start in whole seconds.
    pub from: i64,
    /// Session end in whole seconds.
    pub to: i64,
}

impl SessionRecord {
    /// Builds a record from fractional bounds, truncating toward zero.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "bounds are truncated to whole seconds on purpose"
    )]
    pub fn from_bounds(project: Option<&str>, from: f64, to: f64) -> Self {
        Self {
            project: project.map(str::to_owned),
            from: from.trunc() as i64,
            to: to.trunc() as i64,
        }
    }
}

impl fmt::Display for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.project.as_deref().unwrap_or_default(),
            self.from,
            self.to
        )
    }
}

/// Append-only text buffer holding rendered records in emission order.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    text: String,
    records: usize,
}

impl OutputBuffer {
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            records: 0,
        }
    }

    /// Renders `record` and appends it.
    pub fn push(&mut self, record: &SessionRecord) -> Result<(), TimelineError> {
        append_record(&mut self.text, record)?;
        self.records += 1;
        Ok(())
    }

    /// Number of records appended so far.
    pub const fn records(&self) -> usize {
        self.records
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Appends `record` to `buffer` as a single CSV line.
///
/// Space is reserved up front with [`String::try_reserve`], so a failed
/// allocation is reported as [`TimelineError::OutOfMemory`] instead of
/// aborting the process.
pub fn append_record(buffer: &mut String, record: &SessionRecord) -> Result<(), TimelineError> {
    let project = record.project.as_deref().unwrap_or_default();
    buffer.try_reserve(project.len() + RECORD_OVERHEAD)?;
    buffer.push_str(project);
    buffer.push(',');
    buffer.push_str(&record.from.to_string());
    buffer.push(',');
    buffer.push_str(&record.to.to_string());
    buffer.push('\n');
    Ok(())
}

/// Errors from reading timeline CSV text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseRecordError {
    /// The line did not have three comma-separated fields.
    #[error("line {line}: expected `project,from,to`")]
    MissingField { line: usize },

    /// A bound was not an integer.
    #[error("line {line}: invalid {field} value {value:?}")]
    InvalidBound {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Parses timeline CSV text back into records.
///
/// Blank lines are skipped. An empty project field reads back as `None`, so
/// `Some("")` does not survive the text form; use
/// [`crate::timeline_records`] when labels must be kept exactly.
pub fn parse_records(csv: &str) -> Result<Vec<SessionRecord>, ParseRecordError> {
    let mut records = Vec::new();
    for (idx, line) in csv.lines().enumerate() {
        let line_no = idx + 1;
        if line.is_empty() {
            continue;
        }

        let mut fields = line.rsplitn(3, ',');
        let (Some(to), Some(from), Some(project)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(ParseRecordError::MissingField { line: line_no });
        };

        records.push(SessionRecord {
            project: (!project.is_empty()).then(|| project.to_string()),
            from: parse_bound(from, "from", line_no)?,
            to: parse_bound(to, "to", line_no)?,
        });
    }
    Ok(records)
}

fn parse_bound(value: &str, field: &'static str, line: usize) -> Result<i64, ParseRecordError> {
    value.parse().map_err(|_| ParseRecordError::InvalidBound {
        line,
        field,
        value: value.to_string(),
    })
}
