//! File-backed holiday and holiday-reason sources.
//!
//! Reason files come in two shapes:
//!
//! A JSON object keyed by ISO date:
//! ```json
//! { "2024-12-25": "NAVIDAD", "2024-07-09": "DÍA DE LA INDEPENDENCIA" }
//! ```
//!
//! Or a CSV of `month,day,reason` rows for one year, where `month` is a
//! number or a month name from the locale table:
//! ```text
//! month,day,reason
//! diciembre,25,Navidad
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::{info, warn};

use crate::calendar::{HolidayReasonMap, Locale};
use crate::error::PipelineError;
use crate::infra::nagerdate::parse_holidays;
use crate::services::holiday_api::{Holiday, HolidaySource};

/// Holidays read from a saved `PublicHolidays` JSON array. The file may hold
/// several years; each call returns the requested one.
pub struct FileHolidaySource {
    holidays: Vec<Holiday>,
}

impl FileHolidaySource {
    pub fn load(path: &str) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read holiday file '{path}'"))?;
        let holidays = parse_holidays(&bytes)
            .with_context(|| format!("holiday file '{path}' is not a holiday array"))?;
        Ok(Self { holidays })
    }
}

#[async_trait]
impl HolidaySource for FileHolidaySource {
    async fn list_holidays(&self, year: i32, _country: &str) -> Result<Vec<Holiday>> {
        Ok(self
            .holidays
            .iter()
            .filter(|h| h.date.year() == year)
            .cloned()
            .collect())
    }
}

pub fn load_reason_json(content: &str) -> Result<HolidayReasonMap> {
    let entries: HashMap<NaiveDate, String> = serde_json::from_str(content)?;
    Ok(entries
        .into_iter()
        .map(|(date, reason)| (date, reason.trim().to_uppercase()))
        .collect())
}

#[derive(Debug, Deserialize)]
struct ReasonRow {
    month: String,
    day: String,
    reason: String,
}

/// Entries that could not be turned into a date are returned next to the map
/// instead of failing the whole file.
pub fn load_reason_csv(
    content: &str,
    year: i32,
    locale: &Locale,
) -> Result<(HolidayReasonMap, Vec<PipelineError>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut map = HolidayReasonMap::new();
    let mut rejected = Vec::new();

    for (index, result) in rdr.deserialize::<ReasonRow>().enumerate() {
        let row = result?;
        match reason_date(&row, year, locale, index) {
            Ok(date) => {
                map.insert(date, row.reason.to_uppercase());
            }
            Err(e) => {
                warn!(index, error = %e, "Skipping reason entry");
                rejected.push(e);
            }
        }
    }

    Ok((map, rejected))
}

fn reason_date(
    row: &ReasonRow,
    year: i32,
    locale: &Locale,
    index: usize,
) -> Result<NaiveDate, PipelineError> {
    let month = locale.month_number(&row.month)?;
    let day: u32 = row
        .day
        .parse()
        .map_err(|_| PipelineError::invalid_input(index, "day", &row.day, "not a day number"))?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        PipelineError::invalid_input(
            index,
            "day",
            &row.day,
            format!("no such day in {year}-{month:02}"),
        )
    })
}

/// Picks the loader from the file extension (`.json` or CSV otherwise).
pub fn load_reason_file(path: &str, year: i32, locale: &Locale) -> Result<HolidayReasonMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read reason file '{path}'"))?;

    let is_json = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let map = if is_json {
        load_reason_json(&content).with_context(|| format!("invalid reason file '{path}'"))?
    } else {
        let (map, rejected) = load_reason_csv(&content, year, locale)
            .with_context(|| format!("invalid reason file '{path}'"))?;
        if !rejected.is_empty() {
            warn!(path, rejected = rejected.len(), "Some reason entries were skipped");
        }
        map
    };

    info!(path, reasons = map.len(), "Holiday reasons loaded");
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_load_reason_json() {
        let map = load_reason_json(r#"{"2024-12-25": "Navidad", "2024-05-01": "DÍA DEL TRABAJADOR"}"#)
            .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(ymd(2024, 12, 25)), Some("NAVIDAD"));
    }

    #[test]
    fn test_load_reason_json_bad_date_key() {
        assert!(load_reason_json(r#"{"25/12/2024": "NAVIDAD"}"#).is_err());
    }

    #[test]
    fn test_load_reason_csv_with_month_names() {
        let content = "month,day,reason\nenero,1,Año nuevo\nJulio,9,Día de la Independencia\n12,25,Navidad\n";
        let (map, rejected) = load_reason_csv(content, 2024, &Locale::spanish_ar()).unwrap();
        assert!(rejected.is_empty());
        assert_eq!(map.get(ymd(2024, 1, 1)), Some("AÑO NUEVO"));
        assert_eq!(map.get(ymd(2024, 7, 9)), Some("DÍA DE LA INDEPENDENCIA"));
        assert_eq!(map.get(ymd(2024, 12, 25)), Some("NAVIDAD"));
    }

    #[test]
    fn test_load_reason_csv_rejects_unknown_month_and_bad_day() {
        let content = "month,day,reason\nbrumario,1,Golpe\nfebrero,30,Imposible\nmayo,x,Roto\nmayo,25,Revolución de Mayo\n";
        let (map, rejected) = load_reason_csv(content, 2024, &Locale::spanish_ar()).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(rejected.len(), 3);
        assert!(matches!(
            rejected[0],
            PipelineError::UnrecognizedToken { kind: "month", .. }
        ));
        assert!(matches!(rejected[1], PipelineError::InvalidInput { index: 1, .. }));
    }

    #[test]
    fn test_load_reason_file_by_extension() {
        let path = temp_path("sube_pipeline_test_reasons.json");
        fs::write(&path, r#"{"2024-12-25": "NAVIDAD"}"#).unwrap();
        let map = load_reason_file(&path, 2024, &Locale::english()).unwrap();
        assert_eq!(map.len(), 1);
        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_file_holiday_source_filters_by_year() {
        let path = temp_path("sube_pipeline_test_holidays.json");
        fs::write(
            &path,
            r#"[{"date":"2024-01-01","localName":"Año Nuevo"},{"date":"2025-01-01","localName":"Año Nuevo"}]"#,
        )
        .unwrap();

        let source = FileHolidaySource::load(&path).unwrap();
        let holidays = source.list_holidays(2025, "AR").await.unwrap();
        assert_eq!(holidays.len(), 1);
        assert_eq!(holidays[0].date, ymd(2025, 1, 1));

        fs::remove_file(&path).unwrap();
    }
}
