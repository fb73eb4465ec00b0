//! Exploratory analysis of an enriched ridership dataset.
//!
//! This module parses the enriched/cleaned rows, computes descriptive
//! statistics, a null audit, per-AMBA IQR outliers and temporal and
//! categorical trip profiles, and bundles them into one JSON report.

pub mod aggregate;
pub mod analyzer;
pub mod outliers;
pub mod types;
pub mod utility;

pub use analyzer::analyze;
pub use types::EdaReport;
