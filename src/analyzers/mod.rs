//! Cross-dataset analysis.
//!
//! This module joins the AQI and birth tables for a reporting year,
//! classifies the joined counties against the severity and birth-weight
//! medians, and defines the row shapes exported to CSV and handed to the
//! chart renderer.

pub mod merge;
pub mod types;
pub mod utility;
