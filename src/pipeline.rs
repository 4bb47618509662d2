//! The report pipeline: load, aggregate, join, export and render.
//!
//! All logging happens here; the tables and the join are pure.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::air_quality::{self, AirQualityTable};
use crate::analyzers::merge::{MergedTable, merge};
use crate::analyzers::types::{
    AirQualityExportRow, BirthExportRow, Quadrant, ReportIndex, StateIndexEntry,
};
use crate::birth::{self, BirthTable};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::output::{write_csv, write_json};
use crate::parser::glob_paths;
use crate::report::{ChartRenderer, air_quality_charts, birth_charts, combined_charts};

/// What a pipeline run produced.
#[derive(Debug, Default)]
pub struct ReportSummary {
    pub air_quality_records: usize,
    pub dropped_records: usize,
    pub birth_records: usize,
    pub join_year: Option<i32>,
    pub merged_rows: usize,
    pub charts: Vec<String>,
    pub exports: Vec<PathBuf>,
}

/// Best county, worst county and severity score of one state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateQuery {
    pub state: String,
    pub best_county: String,
    pub worst_county: String,
    pub severity_score: f64,
}

/// Loads every AQI file matching `pattern` into one table.
#[tracing::instrument]
pub fn load_air_quality(pattern: &str) -> Result<AirQualityTable> {
    let mut records = Vec::new();
    for path in glob_paths(pattern)? {
        let loaded = air_quality::load_file(&path)?;
        debug!(path = %path.display(), records = loaded.len(), "AQI file loaded");
        records.extend(loaded);
    }

    let table = AirQualityTable::load(records);
    info!(
        records = table.records().len(),
        states = table.summaries().count(),
        "Air quality table built"
    );
    if table.dropped() > 0 {
        info!(
            dropped = table.dropped(),
            "Dropped AQI records without a state abbreviation"
        );
    }
    Ok(table)
}

/// Loads the birth-weight file into a table.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_births(path: &Path) -> Result<BirthTable> {
    let table = BirthTable::load(birth::load_file(path)?);
    info!(
        records = table.records().len(),
        state_years = table.state_year_aggregates().count(),
        "Birth table built"
    );
    Ok(table)
}

/// Answers the best/worst/score query for `state`.
pub fn query_state(table: &AirQualityTable, state: &str) -> Result<StateQuery> {
    Ok(StateQuery {
        state: state.to_string(),
        best_county: table.best_in_state(state)?.to_string(),
        worst_county: table.worst_in_state(state)?.to_string(),
        severity_score: table.severity_score(state)?,
    })
}

/// Latest year present in both tables.
pub fn default_join_year(air: &AirQualityTable, births: &BirthTable) -> Option<i32> {
    let birth_years = births.years();
    air.years()
        .into_iter()
        .rev()
        .find(|year| birth_years.contains(year))
}

/// Runs the whole report as configured, handing charts to `renderer`.
#[tracing::instrument(skip_all, fields(dataset = ?config.dataset, target = ?config.target))]
pub fn run(config: &ReportConfig, renderer: &mut dyn ChartRenderer) -> Result<ReportSummary> {
    let mut summary = ReportSummary::default();

    let air = if config.dataset.loads_air_quality() {
        Some(load_air_quality(&config.aqi_glob)?)
    } else {
        None
    };
    let births = if config.dataset.loads_birth() {
        Some(load_births(&config.birth_data_path)?)
    } else {
        None
    };

    fs::create_dir_all(&config.output_dir)?;
    let export_path = |name: &str| config.output_dir.join(name);
    let mut charts = Vec::new();

    if let Some(air) = &air {
        summary.air_quality_records = air.records().len();
        summary.dropped_records = air.dropped();

        if config.dataset.renders_air_quality() {
            charts.extend(air_quality_charts(air)?);
            if config.export_csv {
                summary.exports.push(write_csv(
                    &export_path("Air_Quality_by_county.csv"),
                    &AirQualityExportRow::rows(air),
                    config.gzip,
                )?);
                summary.exports.push(write_csv(
                    &export_path("Best_and_Worst_AQI_by_State.csv"),
                    &air.extremes()?,
                    config.gzip,
                )?);
            }
        }
    }

    if let Some(births) = &births {
        summary.birth_records = births.records().len();

        if config.dataset.renders_birth() {
            charts.extend(birth_charts(births)?);
            if config.export_csv {
                summary.exports.push(write_csv(
                    &export_path("Birth_Weight_by_county.csv"),
                    &BirthExportRow::rows(births),
                    config.gzip,
                )?);
                let state_years: Vec<_> = births.state_year_aggregates().collect();
                summary.exports.push(write_csv(
                    &export_path("Birth_Weight_by_state_year.csv"),
                    &state_years,
                    config.gzip,
                )?);
            }
        }
    }

    if config.dataset.renders_combined() {
        if let (Some(air), Some(births)) = (&air, &births) {
            match config.year.or_else(|| default_join_year(air, births)) {
                Some(year) => {
                    let merged = merge(air, births, year)?;
                    log_merge(&merged);
                    summary.join_year = Some(year);
                    summary.merged_rows = merged.rows.len();

                    charts.extend(combined_charts(&merged)?);
                    if config.export_csv {
                        summary.exports.push(write_csv(
                            &export_path("Air_Quality_and_Birth_Weight.csv"),
                            &merged.rows,
                            config.gzip,
                        )?);
                    }
                }
                None => warn!("No year present in both datasets, skipping join"),
            }
        }
    }

    for chart in &charts {
        let written = renderer.render(chart)?;
        debug!(
            chart = %chart.name,
            rows = chart.data.len(),
            path = ?written,
            "Chart rendered"
        );
        summary.charts.push(chart.name.clone());
    }

    let index = ReportIndex {
        generated_at: Utc::now(),
        join_year: summary.join_year,
        merged_rows: summary.merged_rows,
        states: air.as_ref().map(state_index).transpose()?.unwrap_or_default(),
        charts: summary.charts.clone(),
        exports: summary
            .exports
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    };
    write_json(&export_path("report.json"), &index)?;

    info!(
        charts = summary.charts.len(),
        exports = summary.exports.len(),
        output_dir = %config.output_dir.display(),
        "Report complete"
    );
    Ok(summary)
}

fn state_index(air: &AirQualityTable) -> Result<Vec<StateIndexEntry>> {
    air.summaries()
        .map(|s| {
            Ok(StateIndexEntry {
                state: s.state.clone(),
                state_abbrev: s.state_abbrev,
                air_quality_score: s.air_quality_score,
                best_county: air.best_in_state(&s.state)?.to_string(),
                worst_county: air.worst_in_state(&s.state)?.to_string(),
            })
        })
        .collect()
}

fn log_merge(merged: &MergedTable) {
    info!(
        year = merged.year,
        rows = merged.rows.len(),
        median_severity = ?merged.median_severity,
        median_birth_weight = ?merged.median_birth_weight,
        "Datasets joined"
    );
    debug!(
        worse_air_higher_weight = merged.quadrant_count(Quadrant::WorseAirHigherWeight),
        worse_air_lower_weight = merged.quadrant_count(Quadrant::WorseAirLowerWeight),
        better_air_higher_weight = merged.quadrant_count(Quadrant::BetterAirHigherWeight),
        better_air_lower_weight = merged.quadrant_count(Quadrant::BetterAirLowerWeight),
        on_median = merged.unclassified_count(),
        "Quadrant classification"
    );
}
