pub mod air_quality;
pub mod analyzers;
pub mod birth;
pub mod config;
pub mod error;
pub mod geo;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod report;

pub use error::{ReportError, Result};
