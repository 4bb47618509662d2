//! Report configuration.
//!
//! Defaults can come from the environment (`AQI_GLOB`, `BIRTH_DATA_PATH`,
//! `REPORT_OUTPUT_DIR`, usually via `.env`) or from a JSON file:
//! ```json
//! {
//!   "aqi_glob": "data/annual_aqi_by_county_*.csv",
//!   "birth_data_path": "data/birth_data.csv",
//!   "dataset": "combined",
//!   "export_csv": true
//! }
//! ```
//! Missing keys fall back to the environment, then to the built-in defaults.
//! CLI flags are applied on top by `main`.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which part of the report to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Dataset {
    /// AQI choropleth and best/worst sunburst.
    AirQuality,
    /// Birth-weight charts.
    Birth,
    /// Joined AQI and birth-weight charts.
    Combined,
    /// Everything above.
    #[default]
    All,
}

impl Dataset {
    pub fn loads_air_quality(self) -> bool {
        !matches!(self, Dataset::Birth)
    }

    pub fn loads_birth(self) -> bool {
        !matches!(self, Dataset::AirQuality)
    }

    pub fn renders_air_quality(self) -> bool {
        matches!(self, Dataset::AirQuality | Dataset::All)
    }

    pub fn renders_birth(self) -> bool {
        matches!(self, Dataset::Birth | Dataset::All)
    }

    pub fn renders_combined(self) -> bool {
        matches!(self, Dataset::Combined | Dataset::All)
    }
}

/// Where rendered charts go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputTarget {
    /// One chart document per file under the output directory.
    #[default]
    File,
    /// Chart documents streamed to stdout.
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default = "ReportConfig::from_env")]
pub struct ReportConfig {
    /// Glob locating the annual AQI-by-county files.
    pub aqi_glob: String,
    pub birth_data_path: PathBuf,
    /// Directory for charts, CSV exports and `report.json`.
    pub output_dir: PathBuf,
    pub dataset: Dataset,
    pub target: OutputTarget,
    pub export_csv: bool,
    pub gzip: bool,
    /// Join year; defaults to the latest year present in both datasets.
    pub year: Option<i32>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            aqi_glob: "annual_aqi_by_county_*.csv".to_string(),
            birth_data_path: PathBuf::from("birth_data.csv"),
            output_dir: PathBuf::from("output"),
            dataset: Dataset::default(),
            target: OutputTarget::default(),
            export_csv: false,
            gzip: false,
            year: None,
        }
    }
}

impl ReportConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Applies `AQI_GLOB`, `BIRTH_DATA_PATH` and `REPORT_OUTPUT_DIR` as
    /// resolved by `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(glob) = lookup("AQI_GLOB") {
            self.aqi_glob = glob;
        }
        if let Some(path) = lookup("BIRTH_DATA_PATH") {
            self.birth_data_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("REPORT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }
}
