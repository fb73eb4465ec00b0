use chrono::NaiveDate;

use crate::calendar::holidays::HolidaySet;
use crate::calendar::weekday::weekday_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayType {
    Holiday,
    Weekend,
    Workday,
}

/// Classifies `date` against `holidays`. Holiday status wins over the weekend.
///
/// The year of `holidays` is not checked against `date`; pass the set built
/// for the years being processed.
pub fn classify(date: NaiveDate, holidays: &HolidaySet) -> DayType {
    if holidays.contains(date) {
        DayType::Holiday
    } else if weekday_name(date).is_weekend() {
        DayType::Weekend
    } else {
        DayType::Workday
    }
}
