use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::calendar::{DayType, SourceMismatch};

/// Summary of one enrichment run, logged and optionally written as JSON.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct EnrichStats {
    pub timestamp: DateTime<Utc>,
    pub records_in: usize,
    pub records_out: usize,
    pub failed: usize,

    // day types
    pub holidays: usize,
    pub weekends: usize,
    pub workdays: usize,

    // reason attachment
    pub with_reason: usize,
    /// Records classified HOLIDAY whose reason lookup returned the sentinel.
    pub holiday_without_reason: usize,

    // source disagreement, computed once per run
    pub missing_reason_dates: Vec<NaiveDate>,
    pub orphan_reason_dates: Vec<NaiveDate>,
    /// The input already had a reason column and no reason map was given, so
    /// its values were passed through unchanged.
    pub stale_reason_column: bool,

    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl EnrichStats {
    pub fn new(records_in: usize) -> Self {
        EnrichStats {
            timestamp: Utc::now(),
            records_in,
            ..Default::default()
        }
    }

    pub fn with_mismatch(mut self, mismatch: &SourceMismatch) -> Self {
        self.missing_reason_dates = mismatch.missing_reason.clone();
        self.orphan_reason_dates = mismatch.orphan_reason.clone();
        self
    }

    pub fn record(&mut self, date: NaiveDate, day_type: DayType, has_reason: Option<bool>) {
        self.records_out += 1;
        match day_type {
            DayType::Holiday => self.holidays += 1,
            DayType::Weekend => self.weekends += 1,
            DayType::Workday => self.workdays += 1,
        }
        match has_reason {
            Some(true) => self.with_reason += 1,
            Some(false) if day_type == DayType::Holiday => self.holiday_without_reason += 1,
            _ => {}
        }
        self.first_date = Some(self.first_date.map_or(date, |d| d.min(date)));
        self.last_date = Some(self.last_date.map_or(date, |d| d.max(date)));
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn failed_pct(&self) -> f64 {
        Self::pct(self.failed, self.records_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(EnrichStats::pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(EnrichStats::pct(50, 100), 50.0);
        assert_eq!(EnrichStats::pct(1, 4), 25.0);
    }

    #[test]
    fn test_record_counts_and_range() {
        let mut stats = EnrichStats::new(4);
        stats.record(ymd(2024, 5, 1), DayType::Holiday, Some(false));
        stats.record(ymd(2024, 12, 25), DayType::Holiday, Some(true));
        stats.record(ymd(2024, 3, 2), DayType::Weekend, Some(false));
        stats.failed = 1;

        assert_eq!(stats.records_out, 3);
        assert_eq!(stats.holidays, 2);
        assert_eq!(stats.weekends, 1);
        assert_eq!(stats.with_reason, 1);
        assert_eq!(stats.holiday_without_reason, 1);
        assert_eq!(stats.first_date, Some(ymd(2024, 3, 2)));
        assert_eq!(stats.last_date, Some(ymd(2024, 12, 25)));
        assert_eq!(stats.failed_pct(), 25.0);
    }

    #[test]
    fn test_no_reason_stage_counts_nothing() {
        let mut stats = EnrichStats::new(1);
        stats.record(ymd(2024, 1, 1), DayType::Holiday, None);
        assert_eq!(stats.holiday_without_reason, 0);
        assert_eq!(stats.with_reason, 0);
    }
}
