use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::analyzers::types::{
    LabeledTotal, MonthTotal, MonthlyTransportTotal, PivotRow, Profiles, ShareTotal, UsageRecord,
};
use crate::analyzers::utility::mean;
use crate::calendar::{DayType, Locale, WeekdayName};

fn share(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

pub fn by_month(records: &[UsageRecord]) -> Vec<MonthTotal> {
    let mut totals: BTreeMap<u32, f64> = BTreeMap::new();
    for r in records {
        *totals.entry(r.date.month()).or_default() += r.quantity;
    }
    totals
        .into_iter()
        .map(|(month, total)| MonthTotal { month, total })
        .collect()
}

/// Monday-first; weekdays with no rows are reported with a zero total.
pub fn by_weekday(records: &[UsageRecord], locale: &Locale) -> Vec<LabeledTotal> {
    let mut totals = [0.0; 7];
    for r in records {
        if let Some(w) = r.weekday {
            totals[w.index()] += r.quantity;
        }
    }
    WeekdayName::ALL
        .iter()
        .map(|w| LabeledTotal {
            label: locale.weekday_label(*w).to_string(),
            total: totals[w.index()],
        })
        .collect()
}

/// Chronological, then by transport type.
pub fn monthly_by_transport_type(records: &[UsageRecord]) -> Vec<MonthlyTransportTotal> {
    let mut totals: BTreeMap<((i32, u32), &str), f64> = BTreeMap::new();
    for r in records {
        *totals
            .entry(((r.date.year(), r.date.month()), r.transport_type))
            .or_default() += r.quantity;
    }
    totals
        .into_iter()
        .map(|(((y, m), transport_type), total)| MonthlyTransportTotal {
            month: format!("{y}-{m:02}"),
            transport_type: transport_type.to_string(),
            total,
        })
        .collect()
}

pub fn by_transport_type(records: &[UsageRecord]) -> Vec<ShareTotal> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for r in records {
        *totals.entry(r.transport_type).or_default() += r.quantity;
    }
    let grand: f64 = totals.values().sum();
    totals
        .into_iter()
        .map(|(label, total)| ShareTotal {
            label: label.to_string(),
            total,
            share_pct: share(total, grand),
        })
        .collect()
}

/// Sums trips per (date, day type), then averages those daily totals per day type.
pub fn mean_daily_by_day_type(records: &[UsageRecord], locale: &Locale) -> Vec<LabeledTotal> {
    let mut daily: HashMap<(NaiveDate, DayType), f64> = HashMap::new();
    for r in records {
        if let Some(d) = r.day_type {
            *daily.entry((r.date, d)).or_default() += r.quantity;
        }
    }

    let mut per_type: BTreeMap<DayType, Vec<f64>> = BTreeMap::new();
    for ((_, day_type), total) in daily {
        per_type.entry(day_type).or_default().push(total);
    }

    per_type
        .into_iter()
        .map(|(day_type, totals)| LabeledTotal {
            label: locale.day_type_label(day_type).to_string(),
            total: mean(&totals),
        })
        .collect()
}

/// Workday vs every other day type. Rows without a day type are ignored.
pub fn workday_split(records: &[UsageRecord]) -> Vec<ShareTotal> {
    let (mut workday, mut other) = (0.0, 0.0);
    for r in records {
        match r.day_type {
            Some(DayType::Workday) => workday += r.quantity,
            Some(_) => other += r.quantity,
            None => {}
        }
    }
    let grand = workday + other;
    vec![
        ShareTotal {
            label: "non_workday".into(),
            total: other,
            share_pct: share(other, grand),
        },
        ShareTotal {
            label: "workday".into(),
            total: workday,
            share_pct: share(workday, grand),
        },
    ]
}

/// Only HOLIDAY rows whose reason is not the sentinel, ascending by total.
pub fn by_holiday_reason(records: &[UsageRecord], locale: &Locale) -> Vec<LabeledTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for r in records {
        if r.day_type != Some(DayType::Holiday) {
            continue;
        }
        match r.reason {
            Some(reason) if reason != locale.no_holiday() => {
                *totals.entry(reason).or_default() += r.quantity;
            }
            _ => {}
        }
    }
    let mut out: Vec<_> = totals
        .into_iter()
        .map(|(label, total)| LabeledTotal {
            label: label.to_string(),
            total,
        })
        .collect();
    out.sort_by(|a, b| a.total.total_cmp(&b.total).then_with(|| a.label.cmp(&b.label)));
    out
}

pub fn weekday_by_transport_type(records: &[UsageRecord], locale: &Locale) -> Vec<PivotRow> {
    let mut cells: [BTreeMap<String, f64>; 7] = Default::default();
    for r in records {
        if let Some(w) = r.weekday {
            *cells[w.index()]
                .entry(r.transport_type.to_string())
                .or_default() += r.quantity;
        }
    }
    WeekdayName::ALL
        .iter()
        .zip(cells)
        .map(|(w, totals)| PivotRow {
            weekday: locale.weekday_label(*w).to_string(),
            totals,
        })
        .collect()
}

pub fn build_profiles(records: &[UsageRecord], locale: &Locale) -> Profiles {
    Profiles {
        by_month: by_month(records),
        by_weekday: by_weekday(records, locale),
        monthly_by_transport_type: monthly_by_transport_type(records),
        by_transport_type: by_transport_type(records),
        mean_daily_by_day_type: mean_daily_by_day_type(records, locale),
        workday_split: workday_split(records),
        by_holiday_reason: by_holiday_reason(records, locale),
        weekday_by_transport_type: weekday_by_transport_type(records, locale),
    }
}
