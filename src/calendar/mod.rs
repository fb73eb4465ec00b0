//! Calendar classification: day types, weekday names and holiday reasons.

pub mod day_type;
pub mod holidays;
pub mod locale;
pub mod weekday;

pub use day_type::{DayType, classify};
pub use holidays::{HolidayReasonMap, HolidaySet, SourceMismatch, attach_reason, reconcile};
pub use locale::{Locale, LocaleSpec, NO_HOLIDAY};
pub use weekday::{WeekdayName, weekday_name};

use chrono::{NaiveDate, NaiveDateTime};

pub const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%d/%m/%Y"];

/// Parses a record date with the first matching format. Formats carrying a
/// time component are accepted and the time is dropped.
pub fn parse_date<S: AsRef<str>>(raw: &str, formats: &[S]) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    formats.iter().find_map(|fmt| {
        let fmt = fmt.as_ref();
        NaiveDate::parse_from_str(raw, fmt)
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(raw, fmt).ok().map(|dt| dt.date()))
    })
}
