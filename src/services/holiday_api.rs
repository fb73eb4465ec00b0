//! Trait and types for public-holiday providers.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{HolidayReasonMap, HolidaySet};

/// One public holiday as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub date: NaiveDate,
    /// Name in the jurisdiction's language, e.g. "Día de la Independencia".
    pub local_name: String,
    #[serde(default)]
    pub name: String,
}

/// Abstraction over a holiday calendar provider (e.g., Nager.Date).
#[async_trait::async_trait]
pub trait HolidaySource: Send + Sync {
    /// Returns the public holidays of `country` (ISO 3166-1 alpha-2) in `year`.
    async fn list_holidays(&self, year: i32, country: &str) -> Result<Vec<Holiday>>;
}

/// Fetches every requested year and merges the results in year order.
pub async fn collect_holidays<S: HolidaySource + ?Sized>(
    source: &S,
    years: &[i32],
    country: &str,
) -> Result<Vec<Holiday>> {
    let mut all = Vec::new();
    for &year in years {
        all.extend(source.list_holidays(year, country).await?);
    }
    Ok(all)
}

pub fn holiday_set(holidays: &[Holiday]) -> HolidaySet {
    holidays.iter().map(|h| h.date).collect()
}

/// Reason map taken from the same provider as the holiday set, so the two
/// always agree on membership. Names are upper-cased.
pub fn reasons_from_holidays(holidays: &[Holiday]) -> HolidayReasonMap {
    holidays
        .iter()
        .map(|h| (h.date, h.local_name.trim().to_uppercase()))
        .collect()
}
