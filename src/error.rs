//! Error type shared by the loaders, tables and exporters.

use thiserror::Error;

/// Errors raised while loading, querying or exporting report tables.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A queried state, county or partition is absent from the loaded data.
    #[error("no {kind} found for `{key}`")]
    MissingKey {
        /// What was looked up (e.g. "state").
        kind: &'static str,
        /// The key as supplied by the caller.
        key: String,
    },

    /// A field could not be coerced, or a row is too short for the schema.
    #[error("parse error in {source_name} at line {line}, column `{column}`: {message}")]
    Parse {
        source_name: String,
        line: u64,
        column: String,
        message: String,
    },

    /// The header row does not match the declared schema.
    #[error(
        "schema drift in {source_name}: expected `{expected}` at column {ordinal}, found `{found}`"
    )]
    SchemaDrift {
        source_name: String,
        ordinal: usize,
        expected: String,
        found: String,
    },

    /// A glob pattern matched no input file.
    #[error("no input files match `{0}`")]
    NoInputFiles(String),

    /// A chart selects a column its rows do not carry.
    #[error("chart `{chart}` references unknown column `{column}`")]
    UnknownColumn { chart: String, column: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("unreadable glob match: {0}")]
    Glob(#[from] glob::GlobError),
}

impl ReportError {
    pub(crate) fn missing(kind: &'static str, key: impl Into<String>) -> Self {
        Self::MissingKey {
            kind,
            key: key.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
