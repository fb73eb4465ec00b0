//! Data types used by the analysis report.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::calendar::{DayType, WeekdayName};

/// One usage row, parsed from the enriched/cleaned dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord<'a> {
    pub(crate) date: NaiveDate,
    pub(crate) quantity: f64,
    pub(crate) transport_type: &'a str,
    pub(crate) amba: &'a str,
    pub(crate) weekday: Option<WeekdayName>,
    pub(crate) day_type: Option<DayType>,
    pub(crate) reason: Option<&'a str>,
}

/// Descriptive statistics in the shape of a dataframe `describe()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q1: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Serialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

/// Null counts per column, and for the audited columns, per transport type.
#[derive(Debug, Serialize)]
pub struct NullAudit {
    pub by_column: BTreeMap<String, usize>,
    pub by_transport_type: BTreeMap<String, BTreeMap<String, usize>>,
}

/// IQR outlier bounds for one group. Outliers are counted, never removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSummary {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub total: usize,
    pub outliers: usize,
}

#[derive(Debug, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub describe: Describe,
    pub outliers: OutlierSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledTotal {
    pub label: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareTotal {
    pub label: String,
    pub total: f64,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: u32,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTransportTotal {
    /// `YYYY-MM`
    pub month: String,
    pub transport_type: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub weekday: String,
    pub totals: BTreeMap<String, f64>,
}

/// Temporal and categorical trip totals.
#[derive(Debug, Default, Serialize)]
pub struct Profiles {
    pub by_month: Vec<MonthTotal>,
    pub by_weekday: Vec<LabeledTotal>,
    pub monthly_by_transport_type: Vec<MonthlyTransportTotal>,
    pub by_transport_type: Vec<ShareTotal>,
    /// Mean of the per-date totals within each day type.
    pub mean_daily_by_day_type: Vec<LabeledTotal>,
    pub workday_split: Vec<ShareTotal>,
    /// Holidays with a known reason only, ascending by total.
    pub by_holiday_reason: Vec<LabeledTotal>,
    pub weekday_by_transport_type: Vec<PivotRow>,
}

/// Complete exploratory report for one dataset, written as JSON.
#[derive(Debug, Serialize)]
pub struct EdaReport {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub shape: Shape,
    pub date_range: Option<DateRange>,
    pub duplicate_rows: usize,
    /// Rows whose date or quantity could not be parsed; left out of every statistic.
    pub unparsed_rows: usize,
    /// Rows with a negative quantity; left out of every statistic.
    pub negative_quantity_rows: usize,
    /// Rows whose weekday or day type label is not in the locale table. They
    /// stay in the quantity statistics but not in the label profiles.
    pub unrecognized_label_rows: usize,
    pub quantity: Describe,
    pub quantity_log1p: Describe,
    pub constant_columns: Vec<String>,
    pub nulls: NullAudit,
    pub by_amba: Vec<GroupSummary>,
    pub profiles: Profiles,
}
