//! Schema-driven CSV parsing for the AQI and birth datasets.
//!
//! A [`Schema`] names the columns a loader reads and where they sit. It is
//! checked against the header row once, before any data row is converted, so
//! a reordered or renamed export fails fast instead of silently reading the
//! wrong column.

use std::fmt::Display;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{ReportError, Result};

/// One declared column: its header name and zero-based ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ordinal: usize,
}

/// A name→ordinal table for one input layout.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    columns: &'static [Column],
}

impl Schema {
    pub const fn new(columns: &'static [Column]) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    /// Returns the ordinal declared for `name`.
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.ordinal)
    }

    /// Minimum number of fields a row needs to satisfy every declared column.
    pub fn width(&self) -> usize {
        self.columns.iter().map(|c| c.ordinal + 1).max().unwrap_or(0)
    }

    /// Checks the header row against the declared layout.
    ///
    /// A header matches when it starts with the declared name, ignoring ASCII
    /// case, so `Average Birth Weight (grams)` satisfies `Average Birth Weight`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::SchemaDrift`] on the first mismatching column.
    pub fn validate(&self, headers: &StringRecord, source: &str) -> Result<()> {
        for column in self.columns {
            let found = headers.get(column.ordinal).unwrap_or("");
            if !header_matches(found, column.name) {
                return Err(ReportError::SchemaDrift {
                    source_name: source.to_string(),
                    ordinal: column.ordinal,
                    expected: column.name.to_string(),
                    found: found.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn header_matches(found: &str, expected: &str) -> bool {
    found
        .get(..expected.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(expected))
}

/// A data row viewed through its schema.
pub struct Row<'a> {
    schema: &'a Schema,
    record: &'a StringRecord,
    source: &'a str,
    line: u64,
}

impl<'a> Row<'a> {
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Raw text of a declared column.
    pub fn text(&self, name: &str) -> Result<&'a str> {
        let ordinal = self
            .schema
            .ordinal(name)
            .ok_or_else(|| self.error(name, "column is not declared in the schema"))?;
        self.record
            .get(ordinal)
            .ok_or_else(|| self.error(name, "row has no such column"))
    }

    /// Parses a declared column into `T`.
    pub fn parse<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.text(name)?;
        raw.parse::<T>()
            .map_err(|e| self.error(name, format!("cannot convert `{raw}`: {e}")))
    }

    /// Builds a [`ReportError::Parse`] located at this row.
    pub fn error(&self, column: &str, message: impl Into<String>) -> ReportError {
        ReportError::Parse {
            source_name: self.source.to_string(),
            line: self.line,
            column: column.to_string(),
            message: message.into(),
        }
    }
}

/// Reads every data row of `reader` through `schema`, converting each with
/// `convert`.
///
/// The header row is validated first. Undeclared columns are ignored; a row
/// shorter than [`Schema::width`] or a failed conversion aborts the load.
///
/// # Errors
///
/// Returns the first schema, parse or CSV error encountered.
pub fn read_records<R, T, F>(reader: R, source: &str, schema: &Schema, mut convert: F) -> Result<Vec<T>>
where
    R: Read,
    F: FnMut(&Row<'_>) -> Result<T>,
{
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    schema.validate(&headers, source)?;

    let width = schema.width();
    let mut records = Vec::new();
    let mut record = StringRecord::new();

    while rdr.read_record(&mut record)? {
        let line = record.position().map_or(0, csv::Position::line);
        if record.len() < width {
            return Err(ReportError::Parse {
                source_name: source.to_string(),
                line,
                column: headers.get(width - 1).unwrap_or_default().to_string(),
                message: format!("expected at least {width} columns, found {}", record.len()),
            });
        }

        let row = Row {
            schema,
            record: &record,
            source,
            line,
        };
        records.push(convert(&row)?);
    }

    Ok(records)
}

/// Opens `path`, reads it fully through [`read_records`] and closes it.
pub fn read_file<T, F>(path: &Path, schema: &Schema, convert: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> Result<T>,
{
    let file = File::open(path)?;
    read_records(file, &path.display().to_string(), schema, convert)
}

/// Expands a glob pattern into a sorted list of existing paths.
///
/// # Errors
///
/// Returns [`ReportError::NoInputFiles`] when nothing matches.
pub fn glob_paths(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = glob::glob(pattern)?.collect::<std::result::Result<Vec<_>, _>>()?;
    if paths.is_empty() {
        return Err(ReportError::NoInputFiles(pattern.to_string()));
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: Schema = Schema::new(&[
        Column {
            name: "Name",
            ordinal: 0,
        },
        Column {
            name: "Count",
            ordinal: 2,
        },
    ]);

    fn parse(input: &str) -> Result<Vec<(String, u32)>> {
        read_records(input.as_bytes(), "test.csv", &SCHEMA, |row| {
            Ok((row.text("Name")?.to_string(), row.parse("Count")?))
        })
    }

    #[test]
    fn test_schema_width_and_ordinal() {
        assert_eq!(SCHEMA.width(), 3);
        assert_eq!(SCHEMA.ordinal("Count"), Some(2));
        assert_eq!(SCHEMA.ordinal("Missing"), None);
    }

    #[test]
    fn test_reads_declared_columns_and_skips_header() {
        let rows = parse("Name,Ignored,Count,Extra\na,x,1,y\n b , x , 7 ,\n").unwrap();
        assert_eq!(rows, vec![("a".to_string(), 1), ("b".to_string(), 7)]);
    }

    #[test]
    fn test_header_prefix_match_ignores_case() {
        let rows = parse("name,Ignored,COUNT (days)\na,x,3\n").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_schema_drift_fails_before_rows() {
        let err = parse("Name,Count,Ignored\na,1,x\n").unwrap_err();
        match err {
            ReportError::SchemaDrift {
                ordinal, expected, ..
            } => {
                assert_eq!(ordinal, 2);
                assert_eq!(expected, "Count");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input_is_schema_drift() {
        assert!(matches!(parse(""), Err(ReportError::SchemaDrift { .. })));
    }

    #[test]
    fn test_bad_number_aborts_load() {
        let err = parse("Name,Ignored,Count\na,x,1\nb,x,seven\nc,x,3\n").unwrap_err();
        match err {
            ReportError::Parse { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, "Count");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row_aborts_load() {
        let err = parse("Name,Ignored,Count\na,x\n").unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
    }

    #[test]
    fn test_glob_without_matches() {
        let err = glob_paths("/nonexistent-dir-for-tests/annual_aqi_by_county_*.csv").unwrap_err();
        assert!(matches!(err, ReportError::NoInputFiles(_)));
    }
}
