//! Output persistence for derived tables.
//!
//! Supports CSV snapshots (optionally gzip-compressed) and pretty JSON
//! documents.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;

/// Writes `rows` as a CSV file with a header row, replacing any existing
/// file.
///
/// With `gzip`, the file is compressed and `.gz` is appended to its name.
/// Returns the path actually written.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T], gzip: bool) -> Result<PathBuf> {
    let path = if gzip {
        let mut name = path.as_os_str().to_owned();
        name.push(".gz");
        PathBuf::from(name)
    } else {
        path.to_path_buf()
    };
    debug!(path = %path.display(), rows = rows.len(), gzip, "Writing CSV export");

    let file = File::create(&path)?;
    if gzip {
        let encoder = GzEncoder::new(file, Compression::default());
        let encoder = write_rows(encoder, rows)?;
        encoder.finish()?;
    } else {
        write_rows(file, rows)?;
    }

    Ok(path)
}

fn write_rows<W: Write, T: Serialize>(inner: W, rows: &[T]) -> Result<W> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(inner);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Writes `value` as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    debug!(path = %path.display(), "Writing JSON document");
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use serde::Serialize;
    use std::fs;
    use std::io::Read;

    #[derive(Serialize)]
    struct Sample {
        state: &'static str,
        score: f64,
    }

    fn samples() -> Vec<Sample> {
        vec![
            Sample {
                state: "WA",
                score: 1.5,
            },
            Sample {
                state: "OR",
                score: 2.0,
            },
        ]
    }

    #[test]
    fn test_write_csv_has_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir.path().join("out.csv"), &samples(), false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["state,score", "WA,1.5", "OR,2.0"]);
    }

    #[test]
    fn test_write_csv_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.csv");
        write_csv(&target, &samples(), false).unwrap();
        write_csv(&target, &samples(), false).unwrap();

        let content = fs::read_to_string(&target).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_write_csv_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir.path().join("out.csv"), &samples(), true).unwrap();
        assert!(path.to_string_lossy().ends_with("out.csv.gz"));

        let mut decoded = String::new();
        GzDecoder::new(fs::File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.starts_with("state,score\n"));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &samples()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[1]["state"], "OR");
    }
}
