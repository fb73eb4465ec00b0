//! Batch enrichment: appends weekday name, day type and holiday reason to
//! every record of a dataset.
//!
//! Records are independent of each other; the holiday tables are shared
//! read-only. Output order equals input order, and records whose date cannot
//! be parsed are dropped and returned as [`RecordFailure`]s.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::calendar::{
    DayType, HolidayReasonMap, HolidaySet, Locale, WeekdayName, attach_reason, classify,
    parse_date, reconcile, weekday_name,
};
use crate::config::Columns;
use crate::dataset::Dataset;
use crate::error::{PipelineError, RecordFailure};
use crate::stats::EnrichStats;

/// Derived fields for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enrichment<'a> {
    pub weekday: WeekdayName,
    pub day_type: DayType,
    /// `None` when no reason map was supplied.
    pub reason: Option<&'a str>,
}

pub struct EnrichedBatch {
    pub dataset: Dataset,
    pub failures: Vec<RecordFailure>,
    pub stats: EnrichStats,
}

pub struct Enricher<'a> {
    holidays: &'a HolidaySet,
    reasons: Option<&'a HolidayReasonMap>,
    locale: &'a Locale,
    columns: &'a Columns,
    date_formats: &'a [String],
}

impl<'a> Enricher<'a> {
    pub fn new(
        holidays: &'a HolidaySet,
        locale: &'a Locale,
        columns: &'a Columns,
        date_formats: &'a [String],
    ) -> Self {
        Self {
            holidays,
            reasons: None,
            locale,
            columns,
            date_formats,
        }
    }

    /// Adds the reason stage. Dates absent from `reasons` get the map's sentinel.
    pub fn with_reasons(mut self, reasons: &'a HolidayReasonMap) -> Self {
        self.reasons = Some(reasons);
        self
    }

    pub fn enrich_date(&self, date: NaiveDate) -> Enrichment<'a> {
        Enrichment {
            weekday: weekday_name(date),
            day_type: classify(date, self.holidays),
            reason: self.reasons.map(|r| attach_reason(date, r)),
        }
    }

    pub fn parse_record_date(&self, index: usize, raw: &str) -> Result<NaiveDate, PipelineError> {
        parse_date(raw, self.date_formats).ok_or_else(|| {
            let message = if raw.trim().is_empty() {
                "missing date"
            } else {
                "unparseable date"
            };
            PipelineError::invalid_input(index, &self.columns.date, raw, message)
        })
    }

    /// Fails only when the date column itself is missing; per-record problems
    /// end up in [`EnrichedBatch::failures`].
    #[tracing::instrument(skip_all, fields(records = dataset.len()))]
    pub fn enrich(&self, mut dataset: Dataset) -> Result<EnrichedBatch, PipelineError> {
        let date_idx = dataset.require_column(&self.columns.date)?;
        let weekday_idx = dataset.ensure_column(&self.columns.weekday);
        let day_type_idx = dataset.ensure_column(&self.columns.day_type);
        let reason_idx = self
            .reasons
            .map(|_| dataset.ensure_column(&self.columns.reason));

        let mut stats = EnrichStats::new(dataset.len());
        if self.reasons.is_none() && dataset.column_index(&self.columns.reason).is_some() {
            warn!(
                column = %self.columns.reason,
                "Reason column kept from the input without a reason map; it may contradict the new day types"
            );
            stats.stale_reason_column = true;
        }
        if let Some(reasons) = self.reasons {
            let mismatch = reconcile(self.holidays, reasons);
            if !mismatch.is_consistent() {
                warn!(
                    missing_reason = mismatch.missing_reason.len(),
                    orphan_reason = mismatch.orphan_reason.len(),
                    "Holiday set and reason map disagree"
                );
                mismatch.log();
            }
            stats = stats.with_mismatch(&mismatch);
        }

        let rows = std::mem::take(&mut dataset.rows);
        let mut failures = Vec::new();

        for (index, mut row) in rows.into_iter().enumerate() {
            let date = match self.parse_record_date(index, &row[date_idx]) {
                Ok(date) => date,
                Err(error) => {
                    debug!(index, error = %error, "Record excluded");
                    failures.push(RecordFailure { index, error });
                    continue;
                }
            };

            let e = self.enrich_date(date);
            row[weekday_idx] = self.locale.weekday_label(e.weekday).to_string();
            row[day_type_idx] = self.locale.day_type_label(e.day_type).to_string();
            if let (Some(idx), Some(reason)) = (reason_idx, e.reason) {
                row[idx] = reason.to_string();
            }

            let has_reason = self.reasons.map(|r| r.get(date).is_some());
            stats.record(date, e.day_type, has_reason);
            dataset.rows.push(row);
        }

        stats.failed = failures.len();
        if !failures.is_empty() {
            warn!(
                failed = failures.len(),
                failed_pct = stats.failed_pct(),
                "Records excluded from enrichment"
            );
        }
        info!(
            records_out = stats.records_out,
            holidays = stats.holidays,
            weekends = stats.weekends,
            workdays = stats.workdays,
            holiday_without_reason = stats.holiday_without_reason,
            "Enrichment complete"
        );

        Ok(EnrichedBatch {
            dataset,
            failures,
            stats,
        })
    }
}
