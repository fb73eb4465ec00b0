//! Pipeline configuration.
//!
//! Stored as an optional JSON file; every section falls back to the SUBE
//! defaults when omitted:
//! ```json
//! {
//!   "locale": "es-AR",
//!   "country": "AR",
//!   "columns": { "date": "DIA_TRANSPORTE" },
//!   "date_formats": ["%Y-%m-%d"],
//!   "imputation": [
//!     { "name": "subte_jurisdiccion",
//!       "when": [{ "column": "TIPO_TRANSPORTE", "equals": "SUBTE" }],
//!       "column": "JURISDICCION", "value": "CABA", "mode": "if_missing" }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::calendar::{DEFAULT_DATE_FORMATS, Locale, LocaleSpec};
use crate::clean::RuleTable;

/// Column names read and written by the pipeline.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Columns {
    pub date: String,
    pub weekday: String,
    pub day_type: String,
    pub reason: String,
    pub quantity: String,
    pub transport_type: String,
    pub amba: String,
    pub month: String,
    pub month_year: String,
    pub quantity_log: String,
    pub is_workday: String,
    /// Columns whose nulls are broken down by transport type in the report.
    pub null_audit: Vec<String>,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            date: "DIA_TRANSPORTE".into(),
            weekday: "DIA_SEMANA".into(),
            day_type: "TIPO_DIA".into(),
            reason: "MOTIVO_FERIADO".into(),
            quantity: "CANTIDAD".into(),
            transport_type: "TIPO_TRANSPORTE".into(),
            amba: "AMBA".into(),
            month: "MES".into(),
            month_year: "MES_ANO".into(),
            quantity_log: "CANTIDAD_LOG".into(),
            is_workday: "ES_HABIL".into(),
            null_audit: vec!["JURISDICCION".into(), "PROVINCIA".into(), "MUNICIPIO".into()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub locale: LocaleSpec,
    pub country: String,
    pub columns: Columns,
    pub date_formats: Vec<String>,
    pub imputation: RuleTable,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            locale: LocaleSpec::default(),
            country: "AR".into(),
            columns: Columns::default(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            imputation: RuleTable::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("invalid config file '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(content)?;
        if config.date_formats.is_empty() {
            anyhow::bail!("date_formats must list at least one format");
        }
        Ok(config)
    }

    /// Reads `explicit` if given, then `SUBE_CONFIG`, otherwise the defaults.
    pub fn resolve(explicit: Option<&str>) -> Result<Self> {
        let from_env = std::env::var("SUBE_CONFIG").ok();
        match explicit.or(from_env.as_deref()) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn build_locale(&self) -> Result<Locale> {
        Ok(Locale::from_spec(&self.locale)?)
    }
}
