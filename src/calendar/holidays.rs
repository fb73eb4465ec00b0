//! Holiday membership and holiday-reason lookup tables.
//!
//! The two tables are built from independent sources and are allowed to
//! disagree; [`reconcile`] reports the disagreement without fixing it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::calendar::locale::NO_HOLIDAY;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate) -> bool {
        self.dates.insert(date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.dates.iter().map(|d| d.year()).collect()
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}

impl Extend<NaiveDate> for HolidaySet {
    fn extend<I: IntoIterator<Item = NaiveDate>>(&mut self, iter: I) {
        self.dates.extend(iter);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayReasonMap {
    reasons: BTreeMap<NaiveDate, String>,
    sentinel: String,
}

impl Default for HolidayReasonMap {
    fn default() -> Self {
        Self {
            reasons: BTreeMap::new(),
            sentinel: NO_HOLIDAY.to_string(),
        }
    }
}

impl HolidayReasonMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the string returned for dates with no known reason.
    pub fn with_sentinel(mut self, sentinel: &str) -> Self {
        self.sentinel = sentinel.to_string();
        self
    }

    /// Later entries for the same date replace earlier ones.
    pub fn insert(&mut self, date: NaiveDate, reason: impl Into<String>) -> Option<String> {
        self.reasons.insert(date, reason.into())
    }

    pub fn get(&self, date: NaiveDate) -> Option<&str> {
        self.reasons.get(&date).map(String::as_str)
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &str)> {
        self.reasons.iter().map(|(d, r)| (*d, r.as_str()))
    }
}

impl<S: Into<String>> FromIterator<(NaiveDate, S)> for HolidayReasonMap {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, S)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (date, reason) in iter {
            map.insert(date, reason);
        }
        map
    }
}

/// The reason for `date`, or the map's sentinel.
pub fn attach_reason(date: NaiveDate, reasons: &HolidayReasonMap) -> &str {
    reasons.get(date).unwrap_or(reasons.sentinel())
}

/// Dates on which the holiday set and the reason map disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMismatch {
    /// Holidays with no reason entry; they enrich as HOLIDAY + sentinel.
    pub missing_reason: Vec<NaiveDate>,
    /// Reason entries for dates that are not in the holiday set.
    pub orphan_reason: Vec<NaiveDate>,
}

impl SourceMismatch {
    pub fn is_consistent(&self) -> bool {
        self.missing_reason.is_empty() && self.orphan_reason.is_empty()
    }

    pub fn log(&self) {
        for date in &self.missing_reason {
            warn!(date = %date, "Holiday has no reason entry; records will carry the no-holiday sentinel");
        }
        for date in &self.orphan_reason {
            warn!(date = %date, "Reason entry for a date the holiday source does not list");
        }
    }
}

pub fn reconcile(holidays: &HolidaySet, reasons: &HolidayReasonMap) -> SourceMismatch {
    let years = holidays.years();
    SourceMismatch {
        missing_reason: holidays
            .iter()
            .filter(|d| reasons.get(*d).is_none())
            .collect(),
        // reason files for other years are not a disagreement
        orphan_reason: reasons
            .iter()
            .map(|(d, _)| d)
            .filter(|d| !holidays.contains(*d) && (years.is_empty() || years.contains(&d.year())))
            .collect(),
    }
}
