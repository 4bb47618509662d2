//! Birth-weight records and their per-state and per-county aggregates.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::analyzers::utility::round_to;
use crate::error::{ReportError, Result};
use crate::geo::strip_county_suffix;
use crate::parser::{Column, Row, Schema, read_file};

/// Column layout of `birth_data.csv`. Columns 2..=6 and 8.. are not read.
pub const BIRTH_SCHEMA: Schema = Schema::new(&[
    Column { name: "Year", ordinal: 0 },
    Column { name: "County of Residence", ordinal: 1 },
    Column { name: "Average Birth Weight", ordinal: 7 },
]);

/// Divisor applied to the source weight column.
///
/// The column is documented as grams and 453.592 is grams per pound, but the
/// resulting values have never been checked against an independent source.
/// Kept as is; see DESIGN.md.
pub const GRAMS_PER_POUND: f64 = 453.592;

/// Converts a source weight to pounds rounded to two decimals.
pub fn grams_to_pounds(grams: f64) -> f64 {
    round_to(grams / GRAMS_PER_POUND, 2)
}

/// Extracts the leading 4-digit year from a date-like field such as
/// `2018-01-01` or `2018`.
pub fn parse_year(field: &str) -> Option<i32> {
    let token = field.split('-').next()?.trim();
    if token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

/// Splits a `"Spokane County, WA"` composite into county and state.
pub fn split_county_state(composite: &str) -> Option<(&str, &str)> {
    let (county, state) = composite.split_once(',')?;
    let (county, state) = (county.trim(), state.trim());
    if county.is_empty() || state.is_empty() {
        return None;
    }
    Some((county, state))
}

/// One county-year of birth data.
///
/// Field order defines the derived ordering: year, county, state, weight.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize)]
pub struct BirthRecord {
    pub year: i32,
    /// County as printed in the source, e.g. `Spokane County`.
    pub county: String,
    /// Postal abbreviation.
    pub state: String,
    /// Average birth weight in pounds.
    pub average_birth_weight: f64,
}

impl BirthRecord {
    pub fn new(year: i32, county: &str, state: &str, average_birth_weight: f64) -> Self {
        Self {
            year,
            county: county.to_string(),
            state: state.to_string(),
            average_birth_weight,
        }
    }

    /// Converts one row read through [`BIRTH_SCHEMA`].
    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        let year = parse_year(row.text("Year")?)
            .ok_or_else(|| row.error("Year", "expected a 4-digit year before the first `-`"))?;

        let composite = row.text("County of Residence")?;
        let (county, state) = split_county_state(composite).ok_or_else(|| {
            row.error(
                "County of Residence",
                format!("expected `county, state`, found `{composite}`"),
            )
        })?;

        let grams: f64 = row.parse("Average Birth Weight")?;
        if !grams.is_finite() {
            return Err(row.error(
                "Average Birth Weight",
                format!("expected a finite weight, found `{grams}`"),
            ));
        }

        Ok(Self::new(year, county, state, grams_to_pounds(grams)))
    }

    /// County name used as join key, without the `County` suffix.
    pub fn join_county(&self) -> Option<&str> {
        strip_county_suffix(&self.county)
    }
}

/// Loads birth records from a CSV file.
pub fn load_file(path: &Path) -> Result<Vec<BirthRecord>> {
    read_file(path, &BIRTH_SCHEMA, BirthRecord::from_row)
}

/// Birth-weight statistics of one state in one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BirthAggregate {
    pub state: String,
    pub year: i32,
    pub record_count: usize,
    pub mean_birth_weight: f64,
    pub min_birth_weight: f64,
    pub max_birth_weight: f64,
    pub min_county: String,
    pub max_county: String,
}

/// Birth-weight statistics of one county across all loaded years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountyBirthAggregate {
    pub county: String,
    pub state: String,
    pub record_count: usize,
    pub mean_birth_weight: f64,
    pub min_birth_weight: f64,
    pub max_birth_weight: f64,
}

/// Running mean and extrema; ties keep the first value seen.
struct Accumulator<'a> {
    sum: f64,
    count: usize,
    min: (f64, &'a str),
    max: (f64, &'a str),
}

impl<'a> Accumulator<'a> {
    fn new(weight: f64, county: &'a str) -> Self {
        Self {
            sum: weight,
            count: 1,
            min: (weight, county),
            max: (weight, county),
        }
    }

    fn push(&mut self, weight: f64, county: &'a str) {
        self.sum += weight;
        self.count += 1;
        if weight < self.min.0 {
            self.min = (weight, county);
        }
        if weight > self.max.0 {
            self.max = (weight, county);
        }
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

fn accumulate<'a, K: Ord>(map: &mut BTreeMap<K, Accumulator<'a>>, key: K, weight: f64, county: &'a str) {
    map.entry(key)
        .and_modify(|acc| acc.push(weight, county))
        .or_insert_with(|| Accumulator::new(weight, county));
}

/// All birth records with aggregates computed once at load.
#[derive(Debug, Clone, Default)]
pub struct BirthTable {
    records: Vec<BirthRecord>,
    state_years: BTreeMap<(String, i32), BirthAggregate>,
    counties: BTreeMap<(String, String), CountyBirthAggregate>,
    county_years: BTreeMap<(String, String, i32), f64>,
}

impl BirthTable {
    pub fn load(records: Vec<BirthRecord>) -> Self {
        let mut state_years = BTreeMap::new();
        let mut counties = BTreeMap::new();
        let mut county_years = BTreeMap::new();

        for r in &records {
            let weight = r.average_birth_weight;
            accumulate(&mut state_years, (r.state.as_str(), r.year), weight, &r.county);
            accumulate(&mut counties, (r.state.as_str(), r.county.as_str()), weight, &r.county);
            accumulate(
                &mut county_years,
                (r.county.as_str(), r.state.as_str(), r.year),
                weight,
                &r.county,
            );
        }

        let state_years = state_years
            .into_iter()
            .map(|((state, year), acc)| {
                let aggregate = BirthAggregate {
                    state: state.to_string(),
                    year,
                    record_count: acc.count,
                    mean_birth_weight: acc.mean(),
                    min_birth_weight: acc.min.0,
                    max_birth_weight: acc.max.0,
                    min_county: acc.min.1.to_string(),
                    max_county: acc.max.1.to_string(),
                };
                ((state.to_string(), year), aggregate)
            })
            .collect();

        let counties = counties
            .into_iter()
            .map(|((state, county), acc)| {
                let aggregate = CountyBirthAggregate {
                    county: county.to_string(),
                    state: state.to_string(),
                    record_count: acc.count,
                    mean_birth_weight: acc.mean(),
                    min_birth_weight: acc.min.0,
                    max_birth_weight: acc.max.0,
                };
                ((state.to_string(), county.to_string()), aggregate)
            })
            .collect();

        let county_years = county_years
            .into_iter()
            .map(|((county, state, year), acc)| {
                ((county.to_string(), state.to_string(), year), acc.mean())
            })
            .collect();

        Self {
            records,
            state_years,
            counties,
            county_years,
        }
    }

    pub fn records(&self) -> &[BirthRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean, extrema and extremal counties of `state` in `year`.
    ///
    /// # Errors
    ///
    /// [`ReportError::MissingKey`] when no record falls in the partition.
    pub fn aggregates_for(&self, state: &str, year: i32) -> Result<&BirthAggregate> {
        self.state_years
            .get(&(state.to_string(), year))
            .ok_or_else(|| ReportError::missing("state-year", format!("{state} {year}")))
    }

    /// Every state-year aggregate, ordered by state then year.
    pub fn state_year_aggregates(&self) -> impl Iterator<Item = &BirthAggregate> {
        self.state_years.values()
    }

    /// Statistics of `county` (as printed in the source) across years.
    pub fn county_aggregate(&self, county: &str, state: &str) -> Result<&CountyBirthAggregate> {
        self.counties
            .get(&(state.to_string(), county.to_string()))
            .ok_or_else(|| ReportError::missing("county", format!("{county}, {state}")))
    }

    /// Every county aggregate, ordered by state then county.
    pub fn county_aggregates(&self) -> impl Iterator<Item = &CountyBirthAggregate> {
        self.counties.values()
    }

    /// Mean weight of one county in one year.
    pub fn county_year_mean(&self, county: &str, state: &str, year: i32) -> Option<f64> {
        self.county_years
            .get(&(county.to_string(), state.to_string(), year))
            .copied()
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}
