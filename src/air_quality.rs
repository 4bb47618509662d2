//! County air-quality records and the per-state table built from them.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::analyzers::utility::mean;
use crate::error::{ReportError, Result};
use crate::geo::state_abbreviation;
use crate::parser::{Column, Row, Schema, read_file};

/// Column layout of the EPA `annual_aqi_by_county_<year>.csv` files.
pub const AQI_SCHEMA: Schema = Schema::new(&[
    Column { name: "State", ordinal: 0 },
    Column { name: "County", ordinal: 1 },
    Column { name: "Year", ordinal: 2 },
    Column { name: "Days with AQI", ordinal: 3 },
    Column { name: "Good Days", ordinal: 4 },
    Column { name: "Moderate Days", ordinal: 5 },
    Column { name: "Unhealthy for Sensitive Groups Days", ordinal: 6 },
    Column { name: "Unhealthy Days", ordinal: 7 },
    Column { name: "Very Unhealthy Days", ordinal: 8 },
    Column { name: "Hazardous Days", ordinal: 9 },
    Column { name: "Max AQI", ordinal: 10 },
]);

/// Day-count weights of the severity score: hazardous, very unhealthy,
/// unhealthy, moderate.
pub const SEVERITY_WEIGHTS: [f64; 4] = [20.0, 10.0, 5.0, 1.0];

/// Weighted severity score over (hazardous, very unhealthy, unhealthy,
/// moderate) day counts or means. Lower is better.
pub fn severity_score(hazardous: f64, very_unhealthy: f64, unhealthy: f64, moderate: f64) -> f64 {
    let [w_haz, w_very, w_unh, w_mod] = SEVERITY_WEIGHTS;
    w_haz * hazardous + w_very * very_unhealthy + w_unh * unhealthy + w_mod * moderate
}

/// One county-year of AQI day counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirQualityRecord {
    pub state: String,
    pub county: String,
    pub year: i32,
    pub days_with_aqi: u32,
    pub good_days: u32,
    pub moderate_days: u32,
    pub sensitive_groups_days: u32,
    pub unhealthy_days: u32,
    pub very_unhealthy_days: u32,
    pub hazardous_days: u32,
    pub max_aqi: u32,
}

impl AirQualityRecord {
    /// Builds a record from the core day counts. `days_with_aqi` is the sum
    /// of the bins; no sensitive-groups days are recorded.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: &str,
        county: &str,
        year: i32,
        good_days: u32,
        moderate_days: u32,
        unhealthy_days: u32,
        very_unhealthy_days: u32,
        hazardous_days: u32,
        max_aqi: u32,
    ) -> Self {
        Self {
            state: state.to_string(),
            county: county.to_string(),
            year,
            days_with_aqi: good_days
                + moderate_days
                + unhealthy_days
                + very_unhealthy_days
                + hazardous_days,
            good_days,
            moderate_days,
            sensitive_groups_days: 0,
            unhealthy_days,
            very_unhealthy_days,
            hazardous_days,
            max_aqi,
        }
    }

    /// Converts one row read through [`AQI_SCHEMA`].
    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            state: row.text("State")?.to_string(),
            county: row.text("County")?.to_string(),
            year: row.parse("Year")?,
            days_with_aqi: row.parse("Days with AQI")?,
            good_days: row.parse("Good Days")?,
            moderate_days: row.parse("Moderate Days")?,
            sensitive_groups_days: row.parse("Unhealthy for Sensitive Groups Days")?,
            unhealthy_days: row.parse("Unhealthy Days")?,
            very_unhealthy_days: row.parse("Very Unhealthy Days")?,
            hazardous_days: row.parse("Hazardous Days")?,
            max_aqi: row.parse("Max AQI")?,
        })
    }

    /// The ranking tuple, most severe bin first.
    pub fn severity_key(&self) -> (u32, u32, u32, u32) {
        (
            self.hazardous_days,
            self.very_unhealthy_days,
            self.unhealthy_days,
            self.moderate_days,
        )
    }

    /// This county's own contribution under the state score formula.
    pub fn severity_score(&self) -> f64 {
        severity_score(
            f64::from(self.hazardous_days),
            f64::from(self.very_unhealthy_days),
            f64::from(self.unhealthy_days),
            f64::from(self.moderate_days),
        )
    }
}

/// Orders two records by air quality: `Less` means `a` has the better air.
///
/// Compares hazardous days, then very unhealthy, unhealthy and moderate days.
pub fn compare_severity(a: &AirQualityRecord, b: &AirQualityRecord) -> Ordering {
    a.severity_key().cmp(&b.severity_key())
}

/// Loads AQI records from one CSV file.
pub fn load_file(path: &Path) -> Result<Vec<AirQualityRecord>> {
    read_file(path, &AQI_SCHEMA, AirQualityRecord::from_row)
}

/// Per-state means of every severity bin and the composite score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAirSummary {
    pub state: String,
    pub state_abbrev: &'static str,
    pub county_count: usize,
    pub mean_good_days: f64,
    pub mean_moderate_days: f64,
    pub mean_unhealthy_days: f64,
    pub mean_very_unhealthy_days: f64,
    pub mean_hazardous_days: f64,
    pub air_quality_score: f64,
}

impl StateAirSummary {
    fn from_records(state: &str, state_abbrev: &'static str, records: &[&AirQualityRecord]) -> Self {
        let column = |f: fn(&AirQualityRecord) -> u32| -> f64 {
            let values: Vec<f64> = records.iter().map(|r| f64::from(f(r))).collect();
            mean(&values)
        };

        let mean_good_days = column(|r| r.good_days);
        let mean_moderate_days = column(|r| r.moderate_days);
        let mean_unhealthy_days = column(|r| r.unhealthy_days);
        let mean_very_unhealthy_days = column(|r| r.very_unhealthy_days);
        let mean_hazardous_days = column(|r| r.hazardous_days);

        Self {
            state: state.to_string(),
            state_abbrev,
            county_count: records.len(),
            mean_good_days,
            mean_moderate_days,
            mean_unhealthy_days,
            mean_very_unhealthy_days,
            mean_hazardous_days,
            air_quality_score: severity_score(
                mean_hazardous_days,
                mean_very_unhealthy_days,
                mean_unhealthy_days,
                mean_moderate_days,
            ),
        }
    }
}

/// Which end of a state's ranking a county sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Extreme {
    Best,
    Worst,
}

/// Best or worst county of a state, with its max AQI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtremeCounty {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "County")]
    pub county: String,
    #[serde(rename = "Rank")]
    pub rank: Extreme,
    #[serde(rename = "Max_AQI")]
    pub max_aqi: u32,
}

/// All AQI records of US states and territories with their per-state
/// aggregates, computed once at load.
#[derive(Debug, Clone, Default)]
pub struct AirQualityTable {
    records: Vec<AirQualityRecord>,
    summaries: BTreeMap<String, StateAirSummary>,
    dropped: usize,
}

impl AirQualityTable {
    /// Builds the table. Records whose state has no postal abbreviation are
    /// dropped and counted in [`AirQualityTable::dropped`].
    ///
    /// Dropped records take no part in any query either: best, worst and
    /// score lookups for such a state (e.g. `Country Of Mexico`) return
    /// [`ReportError::MissingKey`] rather than one of its counties.
    pub fn load(records: Vec<AirQualityRecord>) -> Self {
        let total = records.len();
        let records: Vec<AirQualityRecord> = records
            .into_iter()
            .filter(|r| state_abbreviation(&r.state).is_some())
            .collect();
        let dropped = total - records.len();

        let mut by_state: BTreeMap<&str, Vec<&AirQualityRecord>> = BTreeMap::new();
        for record in &records {
            by_state.entry(record.state.as_str()).or_default().push(record);
        }

        let summaries = by_state
            .into_iter()
            .filter_map(|(state, group)| {
                let abbrev = state_abbreviation(state)?;
                Some((
                    state.to_string(),
                    StateAirSummary::from_records(state, abbrev, &group),
                ))
            })
            .collect();

        Self {
            records,
            summaries,
            dropped,
        }
    }

    pub fn records(&self) -> &[AirQualityRecord] {
        &self.records
    }

    /// Number of input records excluded for lacking a state abbreviation.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Aggregates for `state`, if it has any record.
    pub fn summary(&self, state: &str) -> Option<&StateAirSummary> {
        self.summaries.get(state)
    }

    /// Per-state aggregates in state-name order.
    pub fn summaries(&self) -> impl Iterator<Item = &StateAirSummary> {
        self.summaries.values()
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Composite severity score of `state`.
    ///
    /// # Errors
    ///
    /// [`ReportError::MissingKey`] if the state has no record.
    pub fn severity_score(&self, state: &str) -> Result<f64> {
        self.summary(state)
            .map(|s| s.air_quality_score)
            .ok_or_else(|| ReportError::missing("state", state))
    }

    /// Record of the county with the worst air in `state`.
    ///
    /// On a full tie the first record in input order wins.
    pub fn worst_record_in_state(&self, state: &str) -> Result<&AirQualityRecord> {
        self.select_in_state(state, Ordering::Greater)
    }

    /// Record of the county with the best air in `state`.
    pub fn best_record_in_state(&self, state: &str) -> Result<&AirQualityRecord> {
        self.select_in_state(state, Ordering::Less)
    }

    /// Name of the county with the worst air in `state`.
    pub fn worst_in_state(&self, state: &str) -> Result<&str> {
        self.worst_record_in_state(state).map(|r| r.county.as_str())
    }

    /// Name of the county with the best air in `state`.
    pub fn best_in_state(&self, state: &str) -> Result<&str> {
        self.best_record_in_state(state).map(|r| r.county.as_str())
    }

    fn select_in_state(&self, state: &str, preferred: Ordering) -> Result<&AirQualityRecord> {
        self.records
            .iter()
            .filter(|r| r.state == state)
            .reduce(|kept, candidate| {
                if compare_severity(candidate, kept) == preferred {
                    candidate
                } else {
                    kept
                }
            })
            .ok_or_else(|| ReportError::missing("state", state))
    }

    /// Best and worst county of every state, in state-name order.
    pub fn extremes(&self) -> Result<Vec<ExtremeCounty>> {
        let mut rows = Vec::with_capacity(self.summaries.len() * 2);
        for state in self.summaries.keys() {
            for (rank, record) in [
                (Extreme::Best, self.best_record_in_state(state)?),
                (Extreme::Worst, self.worst_record_in_state(state)?),
            ] {
                rows.push(ExtremeCounty {
                    state: state.clone(),
                    county: record.county.clone(),
                    rank,
                    max_aqi: record.max_aqi,
                });
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spokane() -> AirQualityRecord {
        AirQualityRecord::new("Washington", "Spokane", 2018, 250, 20, 5, 0, 0, 100)
    }

    fn los_angeles() -> AirQualityRecord {
        AirQualityRecord::new("California", "LA", 2018, 100, 100, 50, 20, 10, 200)
    }

    #[test]
    fn test_spokane_compares_better_than_la() {
        assert_eq!(compare_severity(&spokane(), &los_angeles()), Ordering::Less);
        assert_eq!(compare_severity(&los_angeles(), &spokane()), Ordering::Greater);
    }

    #[test]
    fn test_hazardous_days_dominate_ranking() {
        let mild_but_hazardous = AirQualityRecord::new("Utah", "A", 2018, 0, 0, 0, 0, 1, 0);
        let heavy_otherwise = AirQualityRecord::new("Utah", "B", 2018, 0, 300, 60, 5, 0, 0);
        assert_eq!(
            compare_severity(&mild_but_hazardous, &heavy_otherwise),
            Ordering::Greater
        );
    }

    #[test]
    fn test_new_infers_days_with_aqi() {
        let record = spokane();
        assert_eq!(record.days_with_aqi, 275);
        assert_eq!(record.sensitive_groups_days, 0);
    }

    #[test]
    fn test_single_county_state_is_best_and_worst() {
        let table = AirQualityTable::load(vec![spokane(), los_angeles()]);
        assert_eq!(table.worst_in_state("Washington").unwrap(), "Spokane");
        assert_eq!(table.best_in_state("Washington").unwrap(), "Spokane");
    }

    #[test]
    fn test_missing_state() {
        let table = AirQualityTable::load(vec![spokane()]);
        assert!(matches!(
            table.worst_in_state("Japan"),
            Err(ReportError::MissingKey { .. })
        ));
        assert!(matches!(
            table.best_in_state("Japan"),
            Err(ReportError::MissingKey { .. })
        ));
        assert!(table.severity_score("Japan").is_err());
    }

    #[test]
    fn test_full_tie_keeps_first_encountered() {
        let table = AirQualityTable::load(vec![
            AirQualityRecord::new("Idaho", "First", 2018, 300, 10, 1, 0, 0, 90),
            AirQualityRecord::new("Idaho", "Second", 2018, 200, 10, 1, 0, 0, 95),
        ]);
        assert_eq!(table.worst_in_state("Idaho").unwrap(), "First");
        assert_eq!(table.best_in_state("Idaho").unwrap(), "First");
    }

    #[test]
    fn test_state_means_and_score() {
        let table = AirQualityTable::load(vec![
            AirQualityRecord::new("Nevada", "Clark", 2018, 200, 100, 10, 2, 1, 300),
            AirQualityRecord::new("Nevada", "Washoe", 2018, 300, 50, 0, 0, 0, 150),
        ]);
        let summary = table.summary("Nevada").unwrap();
        assert_eq!(summary.state_abbrev, "NV");
        assert_eq!(summary.county_count, 2);
        assert_eq!(summary.mean_moderate_days, 75.0);
        assert_eq!(summary.mean_unhealthy_days, 5.0);
        assert_eq!(summary.mean_very_unhealthy_days, 1.0);
        assert_eq!(summary.mean_hazardous_days, 0.5);
        // 20 * 0.5 + 10 * 1 + 5 * 5 + 75
        assert_eq!(table.severity_score("Nevada").unwrap(), 120.0);
    }

    #[test]
    fn test_score_monotonic_in_hazardous_mean() {
        let base = severity_score(1.0, 2.0, 3.0, 4.0);
        assert!(severity_score(1.5, 2.0, 3.0, 4.0) > base);
        assert!(severity_score(1.0, 2.5, 3.0, 4.0) > base);
        assert!(severity_score(1.0, 2.0, 3.5, 4.0) > base);
        assert!(severity_score(1.0, 2.0, 3.0, 4.5) > base);
    }

    #[test]
    fn test_record_severity_score() {
        assert_eq!(los_angeles().severity_score(), 20.0 * 10.0 + 10.0 * 20.0 + 5.0 * 50.0 + 100.0);
    }

    #[test]
    fn test_unmapped_states_are_dropped() {
        let table = AirQualityTable::load(vec![
            spokane(),
            AirQualityRecord::new("Country Of Mexico", "Baja California Norte", 2018, 1, 1, 1, 1, 1, 1),
        ]);
        assert_eq!(table.records().len(), 1);
        assert_eq!(table.dropped(), 1);
        for result in [
            table.best_in_state("Country Of Mexico"),
            table.worst_in_state("Country Of Mexico"),
        ] {
            assert!(matches!(result, Err(ReportError::MissingKey { .. })));
        }
        assert!(table.severity_score("Country Of Mexico").is_err());
    }

    #[test]
    fn test_extremes_lists_best_then_worst() {
        let table = AirQualityTable::load(vec![
            spokane(),
            AirQualityRecord::new("Washington", "Chelan", 2018, 200, 80, 12, 5, 3, 420),
        ]);
        let extremes = table.extremes().unwrap();
        assert_eq!(extremes.len(), 2);
        assert_eq!(extremes[0].county, "Spokane");
        assert_eq!(extremes[0].rank, Extreme::Best);
        assert_eq!(extremes[1].county, "Chelan");
        assert_eq!(extremes[1].max_aqi, 420);
    }
}
