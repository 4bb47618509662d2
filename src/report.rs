//! Chart descriptors handed to the visualization layer.
//!
//! A [`ChartSpec`] is a fully computed table (rows with named, typed columns)
//! plus the column selection a plotting tool needs. The [`ChartRenderer`]
//! trait is the seam to that tool: [`FileRenderer`] writes one JSON chart
//! document per chart, [`InteractiveRenderer`] streams them to a terminal or
//! viewer process.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::air_quality::AirQualityTable;
use crate::analyzers::merge::MergedTable;
use crate::analyzers::types::BirthExportRow;
use crate::birth::BirthTable;
use crate::error::{ReportError, Result};
use crate::output::write_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Choropleth,
    Sunburst,
    Bar,
    Scatter,
    Area,
}

/// One chart: its kind, column selection and data rows.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub name: String,
    pub kind: ChartKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub y: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Column holding state abbreviations on a choropleth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<String>,
    /// Hierarchy of a sunburst, outermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    /// Column sizing sunburst segments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,
    pub data: Vec<serde_json::Value>,
}

impl ChartSpec {
    pub fn new(name: &str, kind: ChartKind, title: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            title: title.to_string(),
            x: None,
            y: Vec::new(),
            color: None,
            size: None,
            locations: None,
            path: Vec::new(),
            values: None,
            data: Vec::new(),
        }
    }

    pub fn x(mut self, column: &str) -> Self {
        self.x = Some(column.to_string());
        self
    }

    pub fn y(mut self, columns: &[&str]) -> Self {
        self.y = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn color(mut self, column: &str) -> Self {
        self.color = Some(column.to_string());
        self
    }

    pub fn size(mut self, column: &str) -> Self {
        self.size = Some(column.to_string());
        self
    }

    pub fn locations(mut self, column: &str) -> Self {
        self.locations = Some(column.to_string());
        self
    }

    pub fn path(mut self, columns: &[&str]) -> Self {
        self.path = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn values(mut self, column: &str) -> Self {
        self.values = Some(column.to_string());
        self
    }

    /// Every column the chart selects.
    pub fn selected_columns(&self) -> impl Iterator<Item = &str> {
        self.x
            .iter()
            .chain(&self.y)
            .chain(&self.color)
            .chain(&self.size)
            .chain(&self.locations)
            .chain(&self.path)
            .chain(&self.values)
            .map(String::as_str)
    }

    /// Attaches the data rows and checks the selection against them.
    ///
    /// # Errors
    ///
    /// [`ReportError::UnknownColumn`] if a selected column is absent from
    /// the rows.
    pub fn with_rows<T: Serialize>(mut self, rows: &[T]) -> Result<Self> {
        self.data = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let Some(first) = self.data.first() else {
            return Ok(());
        };
        for column in self.selected_columns() {
            if first.get(column).is_none() {
                return Err(ReportError::UnknownColumn {
                    chart: self.name.clone(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Hands finished charts to a visualization backend.
pub trait ChartRenderer {
    /// Renders one chart, returning the file written, if any.
    fn render(&mut self, chart: &ChartSpec) -> Result<Option<PathBuf>>;
}

/// Writes `<dir>/<chart name>.json` for every chart.
pub struct FileRenderer {
    dir: PathBuf,
}

impl FileRenderer {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl ChartRenderer for FileRenderer {
    fn render(&mut self, chart: &ChartSpec) -> Result<Option<PathBuf>> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.json", chart.name));
        write_json(&path, chart)?;
        Ok(Some(path))
    }
}

/// Streams each chart as one JSON document per line to a writer, typically
/// stdout piped into a viewer.
pub struct InteractiveRenderer<W: Write> {
    out: W,
}

impl<W: Write> InteractiveRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl InteractiveRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ChartRenderer for InteractiveRenderer<W> {
    fn render(&mut self, chart: &ChartSpec) -> Result<Option<PathBuf>> {
        serde_json::to_writer(&mut self.out, chart)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(None)
    }
}

/// State choropleth of the severity score and the best/worst county sunburst.
pub fn air_quality_charts(table: &AirQualityTable) -> Result<Vec<ChartSpec>> {
    let summaries: Vec<_> = table.summaries().collect();
    let extremes = table.extremes()?;

    Ok(vec![
        ChartSpec::new(
            "Air_Quality_in_US_by_State",
            ChartKind::Choropleth,
            "Air Quality by State",
        )
        .locations("state_abbrev")
        .color("air_quality_score")
        .with_rows(&summaries)?,
        ChartSpec::new(
            "Best_and_Worst_AQI_by_State",
            ChartKind::Sunburst,
            "Best and Worst Air Quality by State",
        )
        .path(&["State", "County"])
        .values("Max_AQI")
        .with_rows(&extremes)?,
    ])
}

/// Birth weight by state-year and county, plus the lightest and heaviest
/// county of each state-year.
pub fn birth_charts(table: &BirthTable) -> Result<Vec<ChartSpec>> {
    let state_years: Vec<_> = table.state_year_aggregates().collect();
    let records = BirthExportRow::rows(table);

    Ok(vec![
        ChartSpec::new(
            "yearly_bw_state",
            ChartKind::Bar,
            "Average Birth Weight by State and Year",
        )
        .x("state")
        .y(&["mean_birth_weight"])
        .color("year")
        .with_rows(&state_years)?,
        ChartSpec::new(
            "yearly_bw_county",
            ChartKind::Area,
            "Average Birth Weight by County and Year",
        )
        .x("county")
        .y(&["avg_birth_weight_by_county"])
        .color("year")
        .with_rows(&records)?,
        ChartSpec::new(
            "lowest_weight_in_state",
            ChartKind::Scatter,
            "Lowest Birth Weight in State",
        )
        .x("min_county")
        .y(&["min_birth_weight"])
        .color("state")
        .size("min_birth_weight")
        .with_rows(&state_years)?,
        ChartSpec::new(
            "highest_weight_in_state",
            ChartKind::Scatter,
            "Highest Birth Weight in State",
        )
        .x("max_county")
        .y(&["max_birth_weight"])
        .color("state")
        .size("max_birth_weight")
        .with_rows(&state_years)?,
    ])
}

/// AQI against birth weight for the joined counties.
pub fn combined_charts(merged: &MergedTable) -> Result<Vec<ChartSpec>> {
    Ok(vec![
        ChartSpec::new(
            "AQI_bw_by_state_bar_chart",
            ChartKind::Bar,
            "AQI and Average Birth Weight for Counties Grouped by State",
        )
        .x("state_abbrev")
        .y(&["avg_birth_weight_by_county"])
        .color("days_with_aqi")
        .with_rows(&merged.rows)?,
        ChartSpec::new(
            "AQI_bw_by_county_area_chart",
            ChartKind::Area,
            "AQI and Birth Weight by County",
        )
        .x("county")
        .y(&["days_with_aqi", "avg_birth_weight_by_county"])
        .color("days_with_aqi")
        .with_rows(&merged.rows)?,
        ChartSpec::new(
            "AQI_bw_quadrants",
            ChartKind::Scatter,
            "Severity Score against Birth Weight",
        )
        .x("air_quality_score")
        .y(&["avg_birth_weight_by_county"])
        .color("quadrant")
        .with_rows(&merged.rows)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air_quality::AirQualityRecord;

    #[derive(Serialize)]
    struct Point {
        state: &'static str,
        value: f64,
    }

    fn points() -> Vec<Point> {
        vec![
            Point {
                state: "WA",
                value: 1.0,
            },
            Point {
                state: "CA",
                value: 2.0,
            },
        ]
    }

    #[test]
    fn test_with_rows_accepts_known_columns() {
        let chart = ChartSpec::new("c", ChartKind::Bar, "t")
            .x("state")
            .y(&["value"])
            .with_rows(&points())
            .unwrap();
        assert_eq!(chart.data.len(), 2);
        assert_eq!(chart.data[1]["state"], "CA");
    }

    #[test]
    fn test_with_rows_rejects_unknown_column() {
        let err = ChartSpec::new("c", ChartKind::Bar, "t")
            .x("state")
            .color("year")
            .with_rows(&points())
            .unwrap_err();
        match err {
            ReportError::UnknownColumn { chart, column } => {
                assert_eq!(chart, "c");
                assert_eq!(column, "year");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_file_renderer_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = FileRenderer::new(dir.path().join("charts"));
        let chart = ChartSpec::new("states", ChartKind::Choropleth, "t")
            .locations("state")
            .color("value")
            .with_rows(&points())
            .unwrap();

        let path = renderer.render(&chart).unwrap().unwrap();
        assert!(path.ends_with("charts/states.json"));

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["kind"], "choropleth");
        assert_eq!(doc["locations"], "state");
        assert!(doc.get("x").is_none());
    }

    #[test]
    fn test_interactive_renderer_streams_lines() {
        let mut renderer = InteractiveRenderer::new(Vec::new());
        let chart = ChartSpec::new("c", ChartKind::Area, "t");
        assert_eq!(renderer.render(&chart).unwrap(), None);
        assert_eq!(renderer.render(&chart).unwrap(), None);

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_air_quality_charts() {
        let table = AirQualityTable::load(vec![
            AirQualityRecord::new("Washington", "Spokane", 2018, 250, 20, 5, 0, 0, 100),
            AirQualityRecord::new("Washington", "Chelan", 2018, 200, 80, 12, 5, 3, 420),
            AirQualityRecord::new("Oregon", "Multnomah", 2018, 300, 40, 2, 0, 0, 130),
        ]);
        let charts = air_quality_charts(&table).unwrap();
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].data.len(), 2);
        assert_eq!(charts[0].data[0]["state_abbrev"], "OR");
        assert_eq!(charts[1].data.len(), 4);
    }
}
