//! Storage layer for heartbeat timelines.
//!
//! Persists heartbeats using `rusqlite` and exposes the `timeline_csv`
//! aggregate on every connection it opens.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Each aggregate invocation gets its own accumulator, so concurrent queries on
//! separate connections never share session state.
//!
//! # Schema
//!
//! Heartbeat times are stored as REAL unix seconds so the aggregate can read
//! them without parsing, and so `ORDER BY time` is chronological.

mod aggregate;

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use tl_core::{Heartbeat, SessionRecord, TimelineError};

pub use aggregate::{TIMELINE_CSV, register_timeline_csv};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A time range whose start is after its end.
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange { start: f64, end: f64 },
    /// Building the timeline in process failed.
    #[error("timeline error: {0}")]
    Timeline(#[from] TimelineError),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the schema and registers the aggregate.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- time: unix seconds, fractional part kept
            -- project: usually a directory path, NULL when unknown
            CREATE TABLE IF NOT EXISTS heartbeats (
                time REAL NOT NULL,
                project TEXT,
                branch TEXT,
                file TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_heartbeats_time ON heartbeats(time);
            ",
        )?;
        register_timeline_csv(&self.conn)?;
        Ok(())
    }

    /// Borrows the underlying connection for ad-hoc queries.
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Inserts a batch of heartbeats in one transaction.
    pub fn insert_heartbeats(&mut self, heartbeats: &[Heartbeat]) -> Result<usize, DbError> {
        if heartbeats.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO heartbeats (time, project, branch, file) VALUES (?, ?, ?, ?)",
            )?;
            for heartbeat in heartbeats {
                inserted += stmt.execute(params![
                    heartbeat.time,
                    heartbeat.project,
                    heartbeat.branch,
                    heartbeat.file,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(inserted, "stored heartbeats");
        Ok(inserted)
    }

    /// Lists all heartbeats ordered by time, then insertion order.
    pub fn list_heartbeats(&self) -> Result<Vec<Heartbeat>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT time, project, branch, file
            FROM heartbeats
            ORDER BY time ASC, rowid ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Heartbeat {
                time: row.get(0)?,
                project: row.get(1)?,
                branch: row.get(2)?,
                file: row.get(3)?,
            })
        })?;
        let mut heartbeats = Vec::new();
        for row in rows {
            heartbeats.push(row?);
        }
        Ok(heartbeats)
    }

    /// Number of stored heartbeats.
    pub fn heartbeat_count(&self) -> Result<i64, DbError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM heartbeats", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Time of the latest heartbeat, if any.
    pub fn last_heartbeat_time(&self) -> Result<Option<f64>, DbError> {
        let time = self
            .conn
            .query_row(
                "SELECT time FROM heartbeats ORDER BY time DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(time)
    }

    /// Builds the session timeline CSV for heartbeats in `[start, end)`.
    ///
    /// Either bound may be open. Returns an empty string when no heartbeats
    /// fall in the range.
    pub fn timeline_csv(&self, start: Option<f64>, end: Option<f64>) -> Result<String, DbError> {
        check_range(start, end)?;

        tracing::debug!(?start, ?end, "building timeline");
        let csv: Option<String> = self.conn.query_row(
            "
            SELECT timeline_csv(time, project) FROM (
                SELECT time, project
                FROM heartbeats
                WHERE (?1 IS NULL OR time >= ?1) AND (?2 IS NULL OR time < ?2)
                ORDER BY time ASC, rowid ASC
            )
            ",
            params![start, end],
            |row| row.get(0),
        )?;
        Ok(csv.unwrap_or_default())
    }

    /// Builds the sessions for heartbeats in `[start, end)` as records.
    ///
    /// Same sessions as [`Database::timeline_csv`], but project labels come
    /// back exactly as stored, including commas, newlines and empty strings.
    pub fn timeline_records(
        &self,
        start: Option<f64>,
        end: Option<f64>,
    ) -> Result<Vec<SessionRecord>, DbError> {
        check_range(start, end)?;

        tracing::debug!(?start, ?end, "building timeline records");
        let mut stmt = self.conn.prepare(
            "
            SELECT time, project
            FROM heartbeats
            WHERE (?1 IS NULL OR time >= ?1) AND (?2 IS NULL OR time < ?2)
            ORDER BY time ASC, rowid ASC
            ",
        )?;
        let rows = stmt.query_map(params![start, end], |row| {
            Ok((row.get::<_, f64>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(tl_core::timeline_records(events)?)
    }
}

fn check_range(start: Option<f64>, end: Option<f64>) -> Result<(), DbError> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(DbError::InvalidRange { start, end });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(time: f64, project: &str) -> Heartbeat {
        Heartbeat::new(time, Some(project.to_string()))
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.heartbeat_count().unwrap(), 0);
    }

    #[test]
    fn reopening_file_database_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tl.db");

        {
            let mut db = Database::open(&path).unwrap();
            db.insert_heartbeats(&[beat(1.0, "a")]).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.heartbeat_count().unwrap(), 1);
        assert_eq!(db.timeline_csv(None, None).unwrap(), "a,1,1\n");
    }

    #[test]
    fn list_heartbeats_returns_ordered_rows() {
        let mut db = Database::open_in_memory().unwrap();
        let mut late = beat(200.0, "b");
        late.branch = Some("main".to_string());
        late.file = Some("src/lib.rs".to_string());
        db.insert_heartbeats(&[late.clone(), beat(100.0, "a")]).unwrap();

        let heartbeats = db.list_heartbeats().unwrap();
        assert_eq!(heartbeats, vec![beat(100.0, "a"), late]);
    }

    #[test]
    fn timeline_sorts_rows_before_aggregating() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_heartbeats(&[
            beat(600.0, "B"),
            beat(100.0, "A"),
            beat(500.0, "A"),
            beat(0.0, "A"),
        ])
        .unwrap();

        assert_eq!(
            db.timeline_csv(None, None).unwrap(),
            "A,0,100\nA,500,600\nB,600,600\n"
        );
    }

    #[test]
    fn timeline_respects_half_open_range() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_heartbeats(&[beat(0.0, "a"), beat(100.0, "a"), beat(200.0, "b")])
            .unwrap();

        assert_eq!(
            db.timeline_csv(Some(100.0), Some(200.0)).unwrap(),
            "a,100,100\n"
        );
        assert_eq!(db.timeline_csv(Some(150.0), None).unwrap(), "b,200,200\n");
    }

    #[test]
    fn timeline_of_empty_range_is_empty() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_heartbeats(&[beat(10.0, "a")]).unwrap();
        assert_eq!(db.timeline_csv(Some(50.0), None).unwrap(), "");
    }

    #[test]
    fn timeline_rejects_inverted_range() {
        let db = Database::open_in_memory().unwrap();
        let err = db.timeline_csv(Some(10.0), Some(5.0)).unwrap_err();
        assert!(matches!(err, DbError::InvalidRange { .. }));
        let err = db.timeline_records(Some(10.0), Some(5.0)).unwrap_err();
        assert!(matches!(err, DbError::InvalidRange { .. }));
    }

    #[test]
    fn timeline_records_keep_labels_exactly() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_heartbeats(&[
            beat(0.0, "/src/a\nb"),
            beat(10.0, ""),
            Heartbeat::new(20.0, None),
        ])
        .unwrap();

        assert_eq!(
            db.timeline_records(None, None).unwrap(),
            vec![
                SessionRecord {
                    project: Some("/src/a\nb".to_string()),
                    from: 0,
                    to: 10,
                },
                SessionRecord {
                    project: Some(String::new()),
                    from: 10,
                    to: 20,
                },
                SessionRecord {
                    project: None,
                    from: 20,
                    to: 20,
                },
            ]
        );
        assert_eq!(
            db.timeline_csv(None, None).unwrap(),
            "/src/a\nb,0,10\n,10,20\n,20,20\n"
        );
    }

    #[test]
    fn timeline_records_respect_range() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_heartbeats(&[beat(200.0, "b"), beat(0.0, "a"), beat(100.0, "a")])
            .unwrap();

        let records = db.timeline_records(Some(100.0), None).unwrap();
        assert_eq!(
            records,
            vec![
                SessionRecord {
                    project: Some("a".to_string()),
                    from: 100,
                    to: 200,
                },
                SessionRecord {
                    project: Some("b".to_string()),
                    from: 200,
                    to: 200,
                },
            ]
        );
    }

    #[test]
    fn last_heartbeat_time_tracks_latest() {
        let mut db = Database::open_in_memory().unwrap();
        assert_eq!(db.last_heartbeat_time().unwrap(), None);
        db.insert_heartbeats(&[beat(30.0, "a"), beat(10.0, "a")]).unwrap();
        assert_eq!(db.last_heartbeat_time().unwrap(), Some(30.0));
    }

    #[test]
    fn connection_exposes_aggregate_for_ad_hoc_sql() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_heartbeats(&[beat(0.0, "a"), beat(400.0, "a")]).unwrap();
        let csv: String = db
            .connection()
            .query_row(
                "SELECT timeline_csv(time, project ORDER BY time) FROM heartbeats",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(csv, "a,0,0\na,400,400\n");
    }
}
