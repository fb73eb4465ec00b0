use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::analyzers::aggregate::build_profiles;
use crate::analyzers::outliers::iqr_outliers;
use crate::analyzers::types::{
    DateRange, EdaReport, GroupSummary, NullAudit, Shape, UsageRecord,
};
use crate::analyzers::utility::{describe, mean};
use crate::calendar::{Locale, parse_date};
use crate::clean::parse_quantity;
use crate::config::Columns;
use crate::dataset::{Dataset, is_null};
use crate::error::PipelineError;

/// Resolved column positions for [`UsageRecord`] extraction.
struct ColumnMap {
    date: usize,
    quantity: usize,
    transport_type: Option<usize>,
    amba: Option<usize>,
    weekday: Option<usize>,
    day_type: Option<usize>,
    reason: Option<usize>,
}

impl ColumnMap {
    fn resolve(dataset: &Dataset, columns: &Columns) -> Result<Self, PipelineError> {
        Ok(Self {
            date: dataset.require_column(&columns.date)?,
            quantity: dataset.require_column(&columns.quantity)?,
            transport_type: dataset.column_index(&columns.transport_type),
            amba: dataset.column_index(&columns.amba),
            weekday: dataset.column_index(&columns.weekday),
            day_type: dataset.column_index(&columns.day_type),
            reason: dataset.column_index(&columns.reason),
        })
    }
}

fn optional<'a>(row: &'a [String], idx: Option<usize>) -> &'a str {
    idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
}

pub fn count_duplicates(dataset: &Dataset) -> usize {
    let mut seen = HashSet::with_capacity(dataset.len());
    dataset.rows.iter().filter(|row| !seen.insert(*row)).count()
}

/// Columns where every non-null value is numeric and the sample standard
/// deviation is exactly zero (at least two values required).
pub fn constant_numeric_columns(dataset: &Dataset) -> Vec<String> {
    dataset
        .headers
        .iter()
        .enumerate()
        .filter_map(|(col, name)| {
            let values: Option<Vec<f64>> = dataset
                .rows
                .iter()
                .map(|r| r[col].as_str())
                .filter(|f| !is_null(f))
                .map(|f| f.trim().parse::<f64>().ok())
                .collect();
            let values = values?;
            if values.len() < 2 {
                return None;
            }
            let first = values[0];
            values.iter().all(|v| *v == first).then(|| name.clone())
        })
        .collect()
}

pub fn null_audit(dataset: &Dataset, columns: &Columns) -> NullAudit {
    let mut by_column = BTreeMap::new();
    for (col, name) in dataset.headers.iter().enumerate() {
        let nulls = dataset.rows.iter().filter(|r| is_null(&r[col])).count();
        by_column.insert(name.clone(), nulls);
    }

    let transport = dataset.column_index(&columns.transport_type);
    let mut by_transport_type = BTreeMap::new();
    for name in &columns.null_audit {
        let Some(col) = dataset.column_index(name) else {
            continue;
        };
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for row in dataset.rows.iter().filter(|r| is_null(&r[col])) {
            *counts.entry(optional(row, transport).to_string()).or_default() += 1;
        }
        by_transport_type.insert(name.clone(), counts);
    }

    NullAudit {
        by_column,
        by_transport_type,
    }
}

/// Builds the exploratory report. Never modifies the dataset: negative
/// quantities and unparseable rows are counted and left out of the statistics.
#[tracing::instrument(skip_all, fields(records = dataset.len()))]
pub fn analyze(
    dataset: &Dataset,
    columns: &Columns,
    locale: &Locale,
    date_formats: &[String],
) -> Result<EdaReport, PipelineError> {
    let map = ColumnMap::resolve(dataset, columns)?;

    let mut records = Vec::with_capacity(dataset.len());
    let mut unparsed_rows = 0;
    let mut negative_quantity_rows = 0;
    let mut unrecognized_label_rows = 0;

    for (index, row) in dataset.rows.iter().enumerate() {
        let date = parse_date(&row[map.date], date_formats);
        let quantity = parse_quantity(index, &columns.quantity, &row[map.quantity]);
        let (Some(date), Ok(quantity)) = (date, quantity) else {
            unparsed_rows += 1;
            continue;
        };
        if quantity < 0.0 {
            negative_quantity_rows += 1;
            continue;
        }

        let weekday_label = optional(row, map.weekday);
        let day_type_label = optional(row, map.day_type);
        let reason = optional(row, map.reason);

        let weekday = match map.weekday.map(|_| locale.parse_weekday(weekday_label)) {
            Some(Ok(w)) => Some(w),
            Some(Err(e)) => {
                debug!(index, error = %e, "Label not in locale table");
                None
            }
            None => None,
        };
        let day_type = map.day_type.and_then(|_| locale.parse_day_type(day_type_label));
        let weekday_missed = map.weekday.is_some() && weekday.is_none();
        let day_type_missed = map.day_type.is_some() && day_type.is_none();
        if weekday_missed || day_type_missed {
            unrecognized_label_rows += 1;
        }

        records.push(UsageRecord {
            date,
            quantity,
            transport_type: optional(row, map.transport_type),
            amba: optional(row, map.amba),
            weekday,
            day_type,
            reason: (!is_null(reason)).then_some(reason),
        });
    }

    if unparsed_rows > 0 {
        warn!(unparsed_rows, "Rows left out of the report");
    }
    if negative_quantity_rows > 0 {
        warn!(negative_quantity_rows, "Rows with negative quantity left out of the report");
    }
    if unrecognized_label_rows > 0 {
        warn!(
            unrecognized_label_rows,
            "Rows with weekday or day type labels outside the locale table; \
             left out of the weekday and day type profiles"
        );
    }
    if map.day_type.is_none() {
        warn!("No day type column; day type profiles will be empty");
    }

    let quantities: Vec<f64> = records.iter().map(|r| r.quantity).collect();
    let logs: Vec<f64> = quantities.iter().map(|q| q.ln_1p()).collect();

    let date_range = records
        .iter()
        .map(|r| r.date)
        .min()
        .zip(records.iter().map(|r| r.date).max())
        .map(|(first, last)| DateRange { first, last });

    let mut amba_groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in &records {
        amba_groups.entry(r.amba).or_default().push(r.quantity);
    }
    let by_amba = amba_groups
        .into_iter()
        .map(|(group, values)| GroupSummary {
            group: group.to_string(),
            describe: describe(&values),
            outliers: iqr_outliers(&values),
        })
        .collect();

    let report = EdaReport {
        schema_version: 1,
        generated_at: Utc::now(),
        shape: Shape {
            rows: dataset.len(),
            columns: dataset.headers.len(),
        },
        date_range,
        duplicate_rows: count_duplicates(dataset),
        unparsed_rows,
        negative_quantity_rows,
        unrecognized_label_rows,
        quantity: describe(&quantities),
        quantity_log1p: describe(&logs),
        constant_columns: constant_numeric_columns(dataset),
        nulls: null_audit(dataset, columns),
        by_amba,
        profiles: build_profiles(&records, locale),
    };

    info!(
        rows = report.shape.rows,
        analyzed = records.len(),
        mean_quantity = mean(&quantities),
        duplicates = report.duplicate_rows,
        "Analysis complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DEFAULT_DATE_FORMATS;

    fn formats() -> Vec<String> {
        DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Dataset {
        let csv = "\
DIA_TRANSPORTE,TIPO_TRANSPORTE,AMBA,PROVINCIA,CANTIDAD,DATO_PRELIMINAR,DIA_SEMANA,TIPO_DIA,MOTIVO_FERIADO
2024-05-01,COLECTIVO,SI,BUENOS AIRES,100,NO,WEDNESDAY,HOLIDAY,NO HOLIDAY
2024-05-01,COLECTIVO,SI,BUENOS AIRES,100,NO,WEDNESDAY,HOLIDAY,NO HOLIDAY
2024-05-02,SUBTE,SI,,400,NO,THURSDAY,WORKDAY,NO HOLIDAY
2024-05-04,TREN,NO,,-3,NO,SATURDAY,WEEKEND,NO HOLIDAY
2024-05-25,COLECTIVO,NO,SANTA FE,20,NO,SATURDAY,HOLIDAY,REVOLUCIÓN DE MAYO
,COLECTIVO,NO,SANTA FE,20,NO,,,
";
        Dataset::from_bytes(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_count_duplicates() {
        assert_eq!(count_duplicates(&sample()), 1);
    }

    #[test]
    fn test_constant_numeric_columns() {
        let ds = Dataset::from_bytes(b"A,B,C\n1,x,5\n1,y,6\n").unwrap();
        assert_eq!(constant_numeric_columns(&ds), vec!["A".to_string()]);
    }

    #[test]
    fn test_null_audit_by_transport() {
        let audit = null_audit(&sample(), &Columns::default());
        assert_eq!(audit.by_column["PROVINCIA"], 2);
        assert_eq!(audit.by_column["DIA_TRANSPORTE"], 1);
        let prov = &audit.by_transport_type["PROVINCIA"];
        assert_eq!(prov.get("SUBTE"), Some(&1));
        assert_eq!(prov.get("TREN"), Some(&1));
        assert!(!audit.by_transport_type.contains_key("JURISDICCION"));
    }

    #[test]
    fn test_analyze_report() {
        let report = analyze(&sample(), &Columns::default(), &Locale::english(), &formats()).unwrap();

        assert_eq!(report.shape.rows, 6);
        assert_eq!(report.shape.columns, 9);
        assert_eq!(report.unparsed_rows, 1);
        assert_eq!(report.negative_quantity_rows, 1);
        assert_eq!(report.quantity.count, 4);
        assert_eq!(report.quantity.max, 400.0);
        assert_eq!(report.constant_columns, Vec::<String>::new());

        let range = report.date_range.unwrap();
        assert_eq!(range.first.to_string(), "2024-05-01");
        assert_eq!(range.last.to_string(), "2024-05-25");

        assert_eq!(report.by_amba.len(), 2);
        assert_eq!(report.by_amba[0].group, "NO");
        assert_eq!(report.by_amba[0].describe.count, 1);

        let reasons = &report.profiles.by_holiday_reason;
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].label, "REVOLUCIÓN DE MAYO");
    }

    #[test]
    fn test_analyze_counts_labels_outside_locale() {
        let csv = "\
DIA_TRANSPORTE,TIPO_TRANSPORTE,AMBA,CANTIDAD,DIA_SEMANA,TIPO_DIA
2024-03-04,COLECTIVO,SI,100,LUNES,HÁBIL
2024-03-05,COLECTIVO,SI,50,MARTES,HÁBIL
2024-03-06,COLECTIVO,SI,10,WEDNESDAY,WORKDAY
";
        let ds = Dataset::from_bytes(csv.as_bytes()).unwrap();
        let report = analyze(&ds, &Columns::default(), &Locale::english(), &formats()).unwrap();

        assert_eq!(report.quantity.count, 3);
        assert_eq!(report.unparsed_rows, 0);
        assert_eq!(report.unrecognized_label_rows, 2);
        let weekday_total: f64 = report.profiles.by_weekday.iter().map(|d| d.total).sum();
        assert_eq!(weekday_total, 10.0);

        // same rows are fully profiled with the matching locale
        let report = analyze(&ds, &Columns::default(), &Locale::spanish_ar(), &formats()).unwrap();
        assert_eq!(report.unrecognized_label_rows, 1);
        assert_eq!(report.profiles.by_weekday[0].total, 100.0);
    }

    #[test]
    fn test_analyze_without_label_columns_counts_nothing() {
        let ds = Dataset::from_bytes(b"DIA_TRANSPORTE,CANTIDAD\n2024-03-04,5\n").unwrap();
        let report = analyze(&ds, &Columns::default(), &Locale::english(), &formats()).unwrap();
        assert_eq!(report.unrecognized_label_rows, 0);
    }

    #[test]
    fn test_analyze_requires_quantity_column() {
        let ds = Dataset::from_bytes(b"DIA_TRANSPORTE\n2024-01-01\n").unwrap();
        assert_eq!(
            analyze(&ds, &Columns::default(), &Locale::english(), &formats()).unwrap_err(),
            PipelineError::MissingColumn("CANTIDAD".into())
        );
    }
}
