//! Status command for showing what has been recorded.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use tl_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, db_path: &Path) -> Result<()> {
    writeln!(writer, "Timeline status")?;
    writeln!(writer, "Database: {}", db_path.display())?;

    let count = db.heartbeat_count()?;
    let Some(last) = db.last_heartbeat_time()? else {
        writeln!(writer, "No heartbeats recorded.")?;
        return Ok(());
    };

    writeln!(writer, "Heartbeats: {count}")?;
    writeln!(writer, "Last heartbeat: {last}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use tl_core::Heartbeat;

    #[test]
    fn status_reports_empty_database() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, Path::new("[TEMP]/tl.db")).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Timeline status
        Database: [TEMP]/tl.db
        No heartbeats recorded.
        ");
    }

    #[test]
    fn status_reports_count_and_latest() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_heartbeats(&[
            Heartbeat::new(1_700_000_100.0, Some("a".to_string())),
            Heartbeat::new(1_700_000_000.0, Some("a".to_string())),
        ])
        .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, Path::new("[TEMP]/tl.db")).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Timeline status
        Database: [TEMP]/tl.db
        Heartbeats: 2
        Last heartbeat: 1700000100
        ");
    }
}
