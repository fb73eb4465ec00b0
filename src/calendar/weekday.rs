use chrono::{Datelike, NaiveDate, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeekdayName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl WeekdayName {
    /// Monday-first order, the order weekday profiles are reported in.
    pub const ALL: [WeekdayName; 7] = [
        WeekdayName::Monday,
        WeekdayName::Tuesday,
        WeekdayName::Wednesday,
        WeekdayName::Thursday,
        WeekdayName::Friday,
        WeekdayName::Saturday,
        WeekdayName::Sunday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Panics if `i >= 7`; callers index with positions of a seven-entry table.
    pub(crate) fn from_index(i: usize) -> Self {
        Self::ALL[i]
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, WeekdayName::Saturday | WeekdayName::Sunday)
    }
}

impl From<Weekday> for WeekdayName {
    fn from(w: Weekday) -> Self {
        Self::ALL[w.num_days_from_monday() as usize]
    }
}

pub fn weekday_name(date: NaiveDate) -> WeekdayName {
    date.weekday().into()
}
