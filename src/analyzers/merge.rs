//! Year-restricted join of the AQI and birth tables, and the quadrant
//! classification of the joined counties.

use std::collections::BTreeMap;

use crate::air_quality::AirQualityTable;
use crate::analyzers::types::{MergedRecord, Quadrant};
use crate::analyzers::utility::median;
use crate::birth::BirthTable;
use crate::error::Result;
use crate::geo::state_abbreviation;

/// Rows of both datasets joined for one year, with the medians used to
/// classify them.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    pub year: i32,
    pub rows: Vec<MergedRecord>,
    pub median_severity: Option<f64>,
    pub median_birth_weight: Option<f64>,
}

impl MergedTable {
    /// Number of rows in `quadrant`.
    pub fn quadrant_count(&self, quadrant: Quadrant) -> usize {
        self.rows
            .iter()
            .filter(|r| r.quadrant == Some(quadrant))
            .count()
    }

    /// Rows sitting on a median, left out of every quadrant.
    pub fn unclassified_count(&self) -> usize {
        self.rows.iter().filter(|r| r.quadrant.is_none()).count()
    }
}

/// Inner-joins the AQI and birth tables on (county, state abbreviation) for
/// `year`, then classifies the result into quadrants.
///
/// AQI rows without a birth counterpart, and birth rows whose county lacks the
/// `County` suffix or has no AQI counterpart, are left out. Each merged row
/// carries the state severity score over that year's AQI records, the
/// county's mean birth weight for the year and the state-year birth
/// aggregates.
pub fn merge(air: &AirQualityTable, births: &BirthTable, year: i32) -> Result<MergedTable> {
    // (county key, state) -> county label as printed in the birth data
    let mut birth_keys: BTreeMap<(&str, &str), &str> = BTreeMap::new();
    for record in births.records().iter().filter(|r| r.year == year) {
        if let Some(county) = record.join_county() {
            birth_keys
                .entry((county, record.state.as_str()))
                .or_insert(record.county.as_str());
        }
    }

    // State scores come from the join year only.
    let air = AirQualityTable::load(
        air.records()
            .iter()
            .filter(|r| r.year == year)
            .cloned()
            .collect(),
    );

    let mut rows = Vec::new();
    for record in air.records() {
        let Some(abbrev) = state_abbreviation(&record.state) else {
            continue;
        };
        let Some(&label) = birth_keys.get(&(record.county.as_str(), abbrev)) else {
            continue;
        };
        let Some(county_weight) = births.county_year_mean(label, abbrev, year) else {
            continue;
        };

        let state_births = births.aggregates_for(abbrev, year)?;
        let score = air.severity_score(&record.state)?;

        rows.push(MergedRecord::new(
            record,
            abbrev,
            score,
            county_weight,
            state_births,
        ));
    }

    Ok(classify(year, rows))
}

/// Places a point relative to the two medians. Points equal to either median
/// belong to no quadrant.
pub fn quadrant(
    severity: f64,
    birth_weight: f64,
    median_severity: f64,
    median_birth_weight: f64,
) -> Option<Quadrant> {
    let worse_air = if severity > median_severity {
        true
    } else if severity < median_severity {
        false
    } else {
        return None;
    };

    let higher_weight = if birth_weight > median_birth_weight {
        true
    } else if birth_weight < median_birth_weight {
        false
    } else {
        return None;
    };

    Some(match (worse_air, higher_weight) {
        (true, true) => Quadrant::WorseAirHigherWeight,
        (true, false) => Quadrant::WorseAirLowerWeight,
        (false, true) => Quadrant::BetterAirHigherWeight,
        (false, false) => Quadrant::BetterAirLowerWeight,
    })
}

/// Computes the medians of the state severity score and the county birth
/// weight over `rows` and assigns each row its quadrant.
pub fn classify(year: i32, mut rows: Vec<MergedRecord>) -> MergedTable {
    let severities: Vec<f64> = rows.iter().map(|r| r.air_quality_score).collect();
    let weights: Vec<f64> = rows.iter().map(|r| r.avg_birth_weight_by_county).collect();

    let median_severity = median(&severities);
    let median_birth_weight = median(&weights);

    if let (Some(ms), Some(mw)) = (median_severity, median_birth_weight) {
        for row in &mut rows {
            row.quadrant = quadrant(row.air_quality_score, row.avg_birth_weight_by_county, ms, mw);
        }
    }

    MergedTable {
        year,
        rows,
        median_severity,
        median_birth_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air_quality::AirQualityRecord;
    use crate::birth::BirthRecord;

    fn air() -> AirQualityTable {
        AirQualityTable::load(vec![
            AirQualityRecord::new("Washington", "Spokane", 2018, 250, 20, 5, 0, 0, 100),
            AirQualityRecord::new("Washington", "Yakima", 2018, 300, 40, 2, 0, 0, 150),
            AirQualityRecord::new("Oregon", "Spokane", 2018, 300, 10, 0, 0, 0, 80),
            AirQualityRecord::new("California", "Fresno", 2018, 150, 150, 40, 5, 1, 250),
            AirQualityRecord::new("California", "Fresno", 2017, 150, 150, 40, 5, 1, 250),
        ])
    }

    fn births() -> BirthTable {
        BirthTable::load(vec![
            BirthRecord::new(2018, "Spokane County", "WA", 7.40),
            BirthRecord::new(2018, "Fresno County", "CA", 7.00),
            BirthRecord::new(2018, "Kern County", "CA", 7.20),
            BirthRecord::new(2017, "Fresno County", "CA", 6.90),
            BirthRecord::new(2018, "Baltimore city", "MD", 7.10),
        ])
    }

    #[test]
    fn test_join_keeps_only_pairs_present_in_both() {
        let merged = merge(&air(), &births(), 2018).unwrap();
        let keys: Vec<(&str, &str)> = merged
            .rows
            .iter()
            .map(|r| (r.county.as_str(), r.state_abbrev))
            .collect();
        assert_eq!(keys, vec![("Spokane", "WA"), ("Fresno", "CA")]);
    }

    #[test]
    fn test_join_carries_both_sides() {
        let merged = merge(&air(), &births(), 2018).unwrap();
        let fresno = &merged.rows[1];
        assert_eq!(fresno.year, 2018);
        assert_eq!(fresno.avg_birth_weight_by_county, 7.00);
        assert!((fresno.avg_birth_weight_by_state - 7.10).abs() < 1e-9);
        assert_eq!(fresno.county_with_lowest_birth_weight, "Fresno County");
        assert_eq!(fresno.county_with_highest_birth_weight, "Kern County");
        assert_eq!(fresno.hazardous_days, 1);
    }

    #[test]
    fn test_join_restricted_to_year() {
        let merged = merge(&air(), &births(), 2017).unwrap();
        assert_eq!(merged.rows.len(), 1);
        assert_eq!(merged.rows[0].avg_birth_weight_by_county, 6.90);

        let none = merge(&air(), &births(), 2010).unwrap();
        assert!(none.rows.is_empty());
        assert_eq!(none.median_severity, None);
    }

    #[test]
    fn test_join_scores_states_from_join_year_only() {
        let air = AirQualityTable::load(vec![
            AirQualityRecord::new("Washington", "Spokane", 2017, 0, 300, 50, 20, 10, 400),
            AirQualityRecord::new("Washington", "Spokane", 2018, 300, 10, 0, 0, 0, 60),
        ]);
        let births = BirthTable::load(vec![BirthRecord::new(2018, "Spokane County", "WA", 7.40)]);

        let merged = merge(&air, &births, 2018).unwrap();
        assert_eq!(merged.rows.len(), 1);
        assert_eq!(merged.rows[0].air_quality_score, 10.0);
        assert_eq!(merged.median_severity, Some(10.0));
    }

    #[test]
    fn test_quadrant_strict_inequalities() {
        assert_eq!(quadrant(2.0, 8.0, 1.0, 7.0), Some(Quadrant::WorseAirHigherWeight));
        assert_eq!(quadrant(2.0, 6.0, 1.0, 7.0), Some(Quadrant::WorseAirLowerWeight));
        assert_eq!(quadrant(0.5, 8.0, 1.0, 7.0), Some(Quadrant::BetterAirHigherWeight));
        assert_eq!(quadrant(0.5, 6.0, 1.0, 7.0), Some(Quadrant::BetterAirLowerWeight));
        assert_eq!(quadrant(1.0, 8.0, 1.0, 7.0), None);
        assert_eq!(quadrant(2.0, 7.0, 1.0, 7.0), None);
    }

    fn row(score: f64, weight: f64) -> MergedRecord {
        let air = AirQualityRecord::new("Texas", "Harris", 2018, 0, 0, 0, 0, 0, 0);
        let births = crate::birth::BirthAggregate {
            state: "TX".to_string(),
            year: 2018,
            record_count: 1,
            mean_birth_weight: weight,
            min_birth_weight: weight,
            max_birth_weight: weight,
            min_county: "Harris County".to_string(),
            max_county: "Harris County".to_string(),
        };
        MergedRecord::new(&air, "TX", score, weight, &births)
    }

    #[test]
    fn test_classify_excludes_rows_on_a_median() {
        let table = classify(
            2018,
            vec![row(10.0, 7.0), row(20.0, 7.5), row(30.0, 8.0), row(40.0, 6.5), row(50.0, 7.2)],
        );
        // medians: severity 30, weight 7.2
        assert_eq!(table.median_severity, Some(30.0));
        assert_eq!(table.median_birth_weight, Some(7.2));
        assert_eq!(table.rows[0].quadrant, Some(Quadrant::BetterAirLowerWeight));
        assert_eq!(table.rows[1].quadrant, Some(Quadrant::BetterAirHigherWeight));
        assert_eq!(table.rows[2].quadrant, None);
        assert_eq!(table.rows[3].quadrant, Some(Quadrant::WorseAirLowerWeight));
        assert_eq!(table.rows[4].quadrant, None);
        assert_eq!(table.unclassified_count(), 2);
        assert_eq!(table.quadrant_count(Quadrant::WorseAirHigherWeight), 0);
    }
}
