//! Output formatting and persistence for page views.
//!
//! Supports pretty-printing, JSON to stdout, and CSV table export.

use std::fmt::Debug;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

/// Logs a view using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(view: &T) {
    info!("{:#?}", view);
}

/// Writes a view as pretty-printed JSON to `writer`.
pub fn write_json<W: Write, T: Serialize>(mut writer: W, view: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, view)?;
    writeln!(writer)?;
    Ok(())
}

/// Prints a view as pretty-printed JSON on stdout.
pub fn print_json<T: Serialize>(view: &T) -> Result<()> {
    write_json(io::stdout().lock(), view)
}

/// Writes `rows` as a CSV table with a header line, replacing any existing file.
///
/// With `gzip` the table is gzip-compressed.
pub fn write_table<T: Serialize>(path: &Path, rows: &[T], gzip: bool) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), gzip, "Writing CSV table");

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;

    if gzip {
        let encoder = GzEncoder::new(file, Compression::default());
        let encoder = write_rows(encoder, rows)?;
        encoder.finish()?;
    } else {
        write_rows(file, rows)?;
    }

    info!(path = %path.display(), rows = rows.len(), "Table exported");
    Ok(())
}

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<W> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV writer: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::goal_comparison::GoalRow;
    use std::env;
    use std::fs;
    use std::io::Read;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    fn rows() -> Vec<GoalRow> {
        vec![
            GoalRow {
                category: "Design".into(),
                projects: 12,
                average_pledged: 1006.0,
                average_goal: 50.0,
                percentage_of_goal: Some(2011.0),
            },
            GoalRow {
                category: "Music".into(),
                projects: 11,
                average_pledged: 55.0,
                average_goal: 0.0,
                percentage_of_goal: None,
            },
        ]
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&rows());
    }

    #[test]
    fn test_write_json() {
        let mut buf = Vec::new();
        write_json(&mut buf, &rows()).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed[0]["category"], "Design");
        assert!(parsed[1]["percentage_of_goal"].is_null());
    }

    #[test]
    fn test_write_table_header_and_rows() {
        let path = temp_path("kickstats_test_table.csv");
        let _ = fs::remove_file(&path);

        write_table(&path, &rows(), false).unwrap();
        // Overwrites rather than appends
        write_table(&path, &rows(), false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "category,projects,average_pledged,average_goal,percentage_of_goal"
        );
        assert_eq!(lines[2], "Music,11,55.0,0.0,");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_table_gzip() {
        let path = temp_path("kickstats_test_table.csv.gz");
        let _ = fs::remove_file(&path);

        write_table(&path, &rows(), true).unwrap();

        let mut decoder = flate2::read::GzDecoder::new(File::open(&path).unwrap());
        let mut content = String::new();
        decoder.read_to_string(&mut content).unwrap();
        assert!(content.starts_with("category,projects"));
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }
}
