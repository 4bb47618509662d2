//! Row types handed to the CSV exporter, the chart renderer and the report index.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::air_quality::{AirQualityRecord, AirQualityTable, StateAirSummary};
use crate::birth::{BirthAggregate, BirthTable, GRAMS_PER_POUND};

/// One AQI county row: the source column layout followed by the state
/// aggregates, so the export reloads through the AQI schema.
#[derive(Debug, Serialize)]
pub struct AirQualityExportRow {
    #[serde(rename = "State")]
    pub(crate) state: String,
    #[serde(rename = "County")]
    pub(crate) county: String,
    #[serde(rename = "Year")]
    pub(crate) year: i32,
    #[serde(rename = "Days with AQI")]
    pub(crate) days_with_aqi: u32,
    #[serde(rename = "Good Days")]
    pub(crate) good_days: u32,
    #[serde(rename = "Moderate Days")]
    pub(crate) moderate_days: u32,
    #[serde(rename = "Unhealthy for Sensitive Groups Days")]
    pub(crate) sensitive_groups_days: u32,
    #[serde(rename = "Unhealthy Days")]
    pub(crate) unhealthy_days: u32,
    #[serde(rename = "Very Unhealthy Days")]
    pub(crate) very_unhealthy_days: u32,
    #[serde(rename = "Hazardous Days")]
    pub(crate) hazardous_days: u32,
    #[serde(rename = "Max AQI")]
    pub(crate) max_aqi: u32,

    pub(crate) state_abbrev: &'static str,
    pub(crate) mean_good_days_by_state: f64,
    pub(crate) mean_moderate_days_by_state: f64,
    pub(crate) mean_unhealthy_days_by_state: f64,
    pub(crate) mean_very_unhealthy_days_by_state: f64,
    pub(crate) mean_hazardous_days_by_state: f64,
    pub(crate) county_severity_score: f64,
    pub(crate) air_quality_score: f64,
}

impl AirQualityExportRow {
    fn new(record: &AirQualityRecord, summary: &StateAirSummary) -> Self {
        Self {
            state: record.state.clone(),
            county: record.county.clone(),
            year: record.year,
            days_with_aqi: record.days_with_aqi,
            good_days: record.good_days,
            moderate_days: record.moderate_days,
            sensitive_groups_days: record.sensitive_groups_days,
            unhealthy_days: record.unhealthy_days,
            very_unhealthy_days: record.very_unhealthy_days,
            hazardous_days: record.hazardous_days,
            max_aqi: record.max_aqi,
            state_abbrev: summary.state_abbrev,
            mean_good_days_by_state: summary.mean_good_days,
            mean_moderate_days_by_state: summary.mean_moderate_days,
            mean_unhealthy_days_by_state: summary.mean_unhealthy_days,
            mean_very_unhealthy_days_by_state: summary.mean_very_unhealthy_days,
            mean_hazardous_days_by_state: summary.mean_hazardous_days,
            county_severity_score: record.severity_score(),
            air_quality_score: summary.air_quality_score,
        }
    }

    /// One row per record of `table`, in load order.
    pub fn rows(table: &AirQualityTable) -> Vec<Self> {
        table
            .records()
            .iter()
            .filter_map(|r| table.summary(&r.state).map(|s| Self::new(r, s)))
            .collect()
    }
}

/// One birth record in the source column layout (weight written back in
/// grams) followed by its state-year and county aggregates.
#[derive(Debug, Serialize)]
pub struct BirthExportRow {
    #[serde(rename = "Year")]
    pub(crate) year: i32,
    #[serde(rename = "County of Residence")]
    pub(crate) county_of_residence: String,
    #[serde(rename = "County of Residence FIPS")]
    pub(crate) fips: &'static str,
    #[serde(rename = "Births")]
    pub(crate) births: &'static str,
    #[serde(rename = "Average Age of Mother (years)")]
    pub(crate) mother_age: &'static str,
    #[serde(rename = "Average OE Gestational Age (weeks)")]
    pub(crate) oe_gestational_age: &'static str,
    #[serde(rename = "Average LMP Gestational Age (weeks)")]
    pub(crate) lmp_gestational_age: &'static str,
    #[serde(rename = "Average Birth Weight (grams)")]
    pub(crate) birth_weight_grams: f64,

    pub(crate) county: String,
    pub(crate) state: String,
    pub(crate) average_birth_weight: f64,
    pub(crate) avg_birth_weight_by_state: f64,
    pub(crate) min_birth_weight_by_state: f64,
    pub(crate) county_with_lowest_birth_weight: String,
    pub(crate) max_birth_weight_by_state: f64,
    pub(crate) county_with_highest_birth_weight: String,
    pub(crate) avg_birth_weight_by_county: f64,
    pub(crate) min_birth_weight_by_county: f64,
    pub(crate) max_birth_weight_by_county: f64,
}

impl BirthExportRow {
    /// One row per record of `table`, in load order.
    pub fn rows(table: &BirthTable) -> Vec<Self> {
        table
            .records()
            .iter()
            .filter_map(|r| {
                let state = table.aggregates_for(&r.state, r.year).ok()?;
                let county = table.county_aggregate(&r.county, &r.state).ok()?;
                Some(Self {
                    year: r.year,
                    county_of_residence: format!("{}, {}", r.county, r.state),
                    fips: "",
                    births: "",
                    mother_age: "",
                    oe_gestational_age: "",
                    lmp_gestational_age: "",
                    birth_weight_grams: r.average_birth_weight * GRAMS_PER_POUND,
                    county: r.county.clone(),
                    state: r.state.clone(),
                    average_birth_weight: r.average_birth_weight,
                    avg_birth_weight_by_state: state.mean_birth_weight,
                    min_birth_weight_by_state: state.min_birth_weight,
                    county_with_lowest_birth_weight: state.min_county.clone(),
                    max_birth_weight_by_state: state.max_birth_weight,
                    county_with_highest_birth_weight: state.max_county.clone(),
                    avg_birth_weight_by_county: county.mean_birth_weight,
                    min_birth_weight_by_county: county.min_birth_weight,
                    max_birth_weight_by_county: county.max_birth_weight,
                })
            })
            .collect()
    }
}

/// Position of a merged row relative to the severity and birth-weight
/// medians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    /// Severity above its median, weight above its median.
    WorseAirHigherWeight,
    WorseAirLowerWeight,
    BetterAirHigherWeight,
    BetterAirLowerWeight,
}

/// One county present in both datasets for the join year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub county: String,
    pub state: String,
    pub state_abbrev: &'static str,
    pub year: i32,
    pub days_with_aqi: u32,
    pub max_aqi: u32,
    pub moderate_days: u32,
    pub unhealthy_days: u32,
    pub very_unhealthy_days: u32,
    pub hazardous_days: u32,
    pub county_severity_score: f64,
    /// State severity score.
    pub air_quality_score: f64,
    /// Mean weight of this county in the join year.
    pub avg_birth_weight_by_county: f64,
    pub avg_birth_weight_by_state: f64,
    pub min_birth_weight_by_state: f64,
    pub max_birth_weight_by_state: f64,
    pub county_with_lowest_birth_weight: String,
    pub county_with_highest_birth_weight: String,
    pub quadrant: Option<Quadrant>,
}

impl MergedRecord {
    pub(crate) fn new(
        air: &AirQualityRecord,
        state_abbrev: &'static str,
        air_quality_score: f64,
        county_birth_weight: f64,
        births: &BirthAggregate,
    ) -> Self {
        Self {
            county: air.county.clone(),
            state: air.state.clone(),
            state_abbrev,
            year: air.year,
            days_with_aqi: air.days_with_aqi,
            max_aqi: air.max_aqi,
            moderate_days: air.moderate_days,
            unhealthy_days: air.unhealthy_days,
            very_unhealthy_days: air.very_unhealthy_days,
            hazardous_days: air.hazardous_days,
            county_severity_score: air.severity_score(),
            air_quality_score,
            avg_birth_weight_by_county: county_birth_weight,
            avg_birth_weight_by_state: births.mean_birth_weight,
            min_birth_weight_by_state: births.min_birth_weight,
            max_birth_weight_by_state: births.max_birth_weight,
            county_with_lowest_birth_weight: births.min_county.clone(),
            county_with_highest_birth_weight: births.max_county.clone(),
            quadrant: None,
        }
    }
}

/// Summary entry for one state in the report index.
#[derive(Debug, Serialize)]
pub struct StateIndexEntry {
    pub(crate) state: String,
    pub(crate) state_abbrev: &'static str,
    pub(crate) air_quality_score: f64,
    pub(crate) best_county: String,
    pub(crate) worst_county: String,
}

/// Top-level index of one report run, written as `report.json`.
#[derive(Debug, Serialize)]
pub struct ReportIndex {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) join_year: Option<i32>,
    pub(crate) merged_rows: usize,
    pub(crate) states: Vec<StateIndexEntry>,
    pub(crate) charts: Vec<String>,
    pub(crate) exports: Vec<String>,
}
