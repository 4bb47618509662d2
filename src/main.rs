//! CLI entry point for the air quality and birth weight report.
//!
//! Provides subcommands for running the full report (charts, CSV exports and
//! the report index) and for querying one state's best and worst county.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use aqi_birth_report::config::{Dataset, OutputTarget, ReportConfig};
use aqi_birth_report::pipeline::{load_air_quality, query_state, run};
use aqi_birth_report::report::{ChartRenderer, FileRenderer, InteractiveRenderer};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "aqi_birth_report")]
#[command(
    about = "Analyze county air quality and birth weight data to find trends",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the datasets, render charts and optionally export CSV snapshots
    Report {
        /// JSON config file; flags below override it
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Glob locating the annual AQI-by-county CSV files
        #[arg(long)]
        aqi_glob: Option<String>,

        /// Birth data CSV file
        #[arg(long)]
        birth_data: Option<PathBuf>,

        /// Directory for charts, exports and report.json
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Which datasets to report on
        #[arg(short, long, value_enum)]
        dataset: Option<Dataset>,

        /// Stream charts to stdout instead of writing chart files
        #[arg(short, long, default_value_t = false)]
        web_output: bool,

        /// Export the derived tables as CSV
        #[arg(short, long, default_value_t = false)]
        csv: bool,

        /// Gzip compress CSV exports
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Year used to join the datasets (default: latest common year)
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Show the best and worst county and the severity score of a state
    Query {
        /// Full state name, e.g. "Washington"
        #[arg(value_name = "STATE")]
        state: String,

        /// Glob locating the annual AQI-by-county CSV files
        #[arg(long)]
        aqi_glob: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/aqi_birth_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("aqi_birth_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            config,
            aqi_glob,
            birth_data,
            output_dir,
            dataset,
            web_output,
            csv,
            gzip,
            year,
        } => {
            let mut report_config = match config {
                Some(path) => ReportConfig::load(&path)?,
                None => ReportConfig::from_env(),
            };
            if let Some(glob) = aqi_glob {
                report_config.aqi_glob = glob;
            }
            if let Some(path) = birth_data {
                report_config.birth_data_path = path;
            }
            if let Some(dir) = output_dir {
                report_config.output_dir = dir;
            }
            if let Some(dataset) = dataset {
                report_config.dataset = dataset;
            }
            if web_output {
                report_config.target = OutputTarget::Interactive;
            }
            report_config.export_csv |= csv;
            report_config.gzip |= gzip;
            if year.is_some() {
                report_config.year = year;
            }

            let mut renderer: Box<dyn ChartRenderer> = match report_config.target {
                OutputTarget::File => Box::new(FileRenderer::new(&report_config.output_dir)),
                OutputTarget::Interactive => Box::new(InteractiveRenderer::stdout()),
            };

            let summary = run(&report_config, renderer.as_mut())?;
            info!(
                aqi_records = summary.air_quality_records,
                dropped = summary.dropped_records,
                birth_records = summary.birth_records,
                join_year = ?summary.join_year,
                merged_rows = summary.merged_rows,
                "Report summary"
            );
        }
        Commands::Query { state, aqi_glob } => {
            let pattern = aqi_glob.unwrap_or_else(|| ReportConfig::from_env().aqi_glob);
            let table = load_air_quality(&pattern)?;
            let answer = query_state(&table, &state)?;

            info!(
                state = %answer.state,
                best_county = %answer.best_county,
                worst_county = %answer.worst_county,
                severity_score = answer.severity_score,
                "State air quality"
            );
        }
    }

    Ok(())
}
