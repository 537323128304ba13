//! Timeline command: prints project sessions for a time range.

use std::io::Write;

use anyhow::{Context, Result};

use tl_db::Database;

use crate::commands::util::parse_time_bound;

/// Prints the session timeline as CSV, or as JSON when `json` is set.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    since: Option<&str>,
    until: Option<&str>,
    json: bool,
) -> Result<()> {
    let start = since
        .map(parse_time_bound)
        .transpose()
        .context("invalid --since")?;
    let end = until
        .map(parse_time_bound)
        .transpose()
        .context("invalid --until")?;

    if json {
        let records = db.timeline_records(start, end)?;
        let json = serde_json::to_string_pretty(&records)?;
        writeln!(writer, "{json}")?;
    } else {
        let csv = db.timeline_csv(start, end)?;
        write!(writer, "{csv}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use tl_core::Heartbeat;

    fn seeded_db() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let beats = [
            (0.0, "/src/web"),
            (100.0, "/src/web"),
            (500.0, "/src/web"),
            (600.0, "/src/api"),
        ];
        let beats: Vec<_> = beats
            .iter()
            .map(|(time, project)| Heartbeat::new(*time, Some((*project).to_string())))
            .collect();
        db.insert_heartbeats(&beats).unwrap();
        db
    }

    fn render(db: &Database, since: Option<&str>, json: bool) -> String {
        let mut output = Vec::new();
        run(&mut output, db, since, None, json).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn timeline_prints_csv() {
        assert_snapshot!(render(&seeded_db(), None, false), @r"
        /src/web,0,100
        /src/web,500,600
        /src/api,600,600
        ");
    }

    #[test]
    fn timeline_since_filters_heartbeats() {
        assert_eq!(render(&seeded_db(), Some("550"), false), "/src/api,600,600\n");
    }

    #[test]
    fn timeline_prints_json() {
        assert_snapshot!(render(&seeded_db(), Some("500"), true), @r#"
        [
          {
            "project": "/src/web",
            "from": 500,
            "to": 600
          },
          {
            "project": "/src/api",
            "from": 600,
            "to": 600
          }
        ]
        "#);
    }

    #[test]
    fn timeline_json_keeps_labels_with_newlines_and_empty_labels() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_heartbeats(&[
            Heartbeat::new(0.0, Some("/src/a\nb".to_string())),
            Heartbeat::new(10.0, Some(String::new())),
        ])
        .unwrap();

        assert_eq!(render(&db, None, false), "/src/a\nb,0,10\n,10,10\n");
        assert_snapshot!(render(&db, None, true), @r#"
        [
          {
            "project": "/src/a\nb",
            "from": 0,
            "to": 10
          },
          {
            "project": "",
            "from": 10,
            "to": 10
          }
        ]
        "#);
    }

    #[test]
    fn timeline_of_empty_database_prints_nothing() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(render(&db, None, false), "");
        assert_eq!(render(&db, None, true), "[]\n");
    }

    #[test]
    fn timeline_rejects_bad_bound() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        let err = run(&mut output, &db, Some("soon"), None, false).unwrap_err();
        assert!(err.to_string().contains("invalid --since"));
    }
}
