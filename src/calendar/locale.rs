//! Display vocabularies for weekday names, day-type labels and month names.
//!
//! A [`Locale`] is built once from configuration and passed by reference to
//! everything that renders or parses a label. Weekday names live in a
//! fixed-size array so a table with a gap cannot be constructed.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::calendar::day_type::DayType;
use crate::calendar::weekday::WeekdayName;
use crate::error::PipelineError;

pub const NO_HOLIDAY: &str = "NO HOLIDAY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTypeLabels {
    pub holiday: String,
    pub weekend: String,
    pub workday: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    weekdays: [String; 7],
    day_types: DayTypeLabels,
    no_holiday: String,
    months: HashMap<String, u32>,
}

/// Raw locale table as it appears in the JSON config file.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleTable {
    pub weekdays: Vec<String>,
    pub day_types: DayTypeTable,
    pub no_holiday: String,
    #[serde(default)]
    pub months: HashMap<String, u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayTypeTable {
    pub holiday: String,
    pub weekend: String,
    pub workday: String,
}

/// Either a preset name (`"en"`, `"es-AR"`) or an inline table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocaleSpec {
    Preset(String),
    Table(LocaleTable),
}

impl Default for LocaleSpec {
    fn default() -> Self {
        LocaleSpec::Preset("en".to_string())
    }
}

const EN_MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const ES_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

fn month_table(names: &[&str; 12]) -> HashMap<String, u32> {
    names
        .iter()
        .zip(1..=12)
        .map(|(name, n)| (name.to_string(), n))
        .collect()
}

impl Locale {
    pub fn english() -> Self {
        Locale {
            weekdays: [
                "MONDAY", "TUESDAY", "WEDNESDAY", "THURSDAY", "FRIDAY", "SATURDAY", "SUNDAY",
            ]
            .map(String::from),
            day_types: DayTypeLabels {
                holiday: "HOLIDAY".into(),
                weekend: "WEEKEND".into(),
                workday: "WORKDAY".into(),
            },
            no_holiday: NO_HOLIDAY.into(),
            months: month_table(&EN_MONTHS),
        }
    }

    /// Labels used by the published SUBE datasets.
    pub fn spanish_ar() -> Self {
        Locale {
            weekdays: [
                "LUNES",
                "MARTES",
                "MIÉRCOLES",
                "JUEVES",
                "VIERNES",
                "SÁBADO",
                "DOMINGO",
            ]
            .map(String::from),
            day_types: DayTypeLabels {
                holiday: "FERIADO".into(),
                weekend: "FIN_DE_SEMANA".into(),
                workday: "HÁBIL".into(),
            },
            no_holiday: "NO FERIADO".into(),
            months: month_table(&ES_MONTHS),
        }
    }

    pub fn from_spec(spec: &LocaleSpec) -> Result<Self, PipelineError> {
        match spec {
            LocaleSpec::Preset(name) => match name.as_str() {
                "en" => Ok(Self::english()),
                "es" | "es-AR" => Ok(Self::spanish_ar()),
                other => Err(PipelineError::InvalidConfig(format!(
                    "unknown locale preset {other:?}"
                ))),
            },
            LocaleSpec::Table(table) => Self::from_table(table),
        }
    }

    pub fn from_table(table: &LocaleTable) -> Result<Self, PipelineError> {
        let weekdays: [String; 7] = table.weekdays.clone().try_into().map_err(|v: Vec<String>| {
            PipelineError::InvalidConfig(format!(
                "weekday table needs exactly 7 names (Monday..Sunday), got {}",
                v.len()
            ))
        })?;

        if let Some(label) = first_duplicate(weekdays.iter().map(String::as_str)) {
            return Err(PipelineError::InvalidConfig(format!(
                "weekday label {label:?} appears more than once"
            )));
        }
        let day_types = &table.day_types;
        if let Some(label) = first_duplicate([
            day_types.holiday.as_str(),
            day_types.weekend.as_str(),
            day_types.workday.as_str(),
        ]) {
            return Err(PipelineError::InvalidConfig(format!(
                "day type label {label:?} appears more than once"
            )));
        }

        if let Some((name, n)) = table.months.iter().find(|(_, n)| !(1..=12).contains(*n)) {
            return Err(PipelineError::InvalidConfig(format!(
                "month {name:?} maps to {n}, expected 1..=12"
            )));
        }

        let months = if table.months.is_empty() {
            month_table(&EN_MONTHS)
        } else {
            table
                .months
                .iter()
                .map(|(k, v)| (normalize_token(k), *v))
                .collect()
        };

        Ok(Locale {
            weekdays,
            day_types: DayTypeLabels {
                holiday: table.day_types.holiday.clone(),
                weekend: table.day_types.weekend.clone(),
                workday: table.day_types.workday.clone(),
            },
            no_holiday: table.no_holiday.clone(),
            months,
        })
    }

    pub fn weekday_label(&self, weekday: WeekdayName) -> &str {
        &self.weekdays[weekday.index()]
    }

    pub fn day_type_label(&self, day_type: DayType) -> &str {
        match day_type {
            DayType::Holiday => &self.day_types.holiday,
            DayType::Weekend => &self.day_types.weekend,
            DayType::Workday => &self.day_types.workday,
        }
    }

    pub fn no_holiday(&self) -> &str {
        &self.no_holiday
    }

    /// Reverse lookup of a rendered weekday label.
    pub fn parse_weekday(&self, label: &str) -> Result<WeekdayName, PipelineError> {
        self.weekdays
            .iter()
            .position(|w| w == label.trim())
            .map(WeekdayName::from_index)
            .ok_or_else(|| PipelineError::UnrecognizedToken {
                kind: "weekday",
                token: label.to_string(),
            })
    }

    pub fn parse_day_type(&self, label: &str) -> Option<DayType> {
        let label = label.trim();
        [DayType::Holiday, DayType::Weekend, DayType::Workday]
            .into_iter()
            .find(|d| self.day_type_label(*d) == label)
    }

    /// Resolves a month token: a number `1..=12` or a name from the month table.
    pub fn month_number(&self, token: &str) -> Result<u32, PipelineError> {
        let token = normalize_token(token);
        if let Ok(n) = token.parse::<u32>() {
            if (1..=12).contains(&n) {
                return Ok(n);
            }
        }
        self.months
            .get(&token)
            .copied()
            .ok_or(PipelineError::UnrecognizedToken {
                kind: "month",
                token,
            })
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::english()
    }
}

fn first_duplicate<'a>(labels: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    labels.into_iter().find(|l| !seen.insert(*l))
}

fn normalize_token(token: &str) -> String {
    token.trim().to_lowercase()
}
