//! Cleaning stage: negative-count filter, rule-based imputation and the
//! derived month / log / workday columns.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::{DayType, Locale, parse_date};
use crate::config::Columns;
use crate::dataset::{Dataset, is_null};
use crate::error::{PipelineError, RecordFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Only write when the target field is null.
    #[default]
    IfMissing,
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Condition {
    pub column: String,
    pub equals: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImputationRule {
    pub name: String,
    /// All conditions must hold; an empty list matches every row.
    #[serde(default)]
    pub when: Vec<Condition>,
    pub column: String,
    pub value: String,
    #[serde(default)]
    pub mode: FillMode,
}

impl ImputationRule {
    fn new(name: &str, when: &[(&str, &str)], column: &str, value: &str, mode: FillMode) -> Self {
        Self {
            name: name.into(),
            when: when
                .iter()
                .map(|(c, v)| Condition {
                    column: c.to_string(),
                    equals: v.to_string(),
                })
                .collect(),
            column: column.into(),
            value: value.into(),
            mode,
        }
    }
}

/// Cells changed by one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub rule: String,
    pub filled: usize,
}

/// Ordered imputation rules; later rules see the writes of earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RuleTable(Vec<ImputationRule>);

impl Default for RuleTable {
    /// Corrections for the known gaps of the SUBE 2024 dataset.
    fn default() -> Self {
        use FillMode::*;
        let subte = [("TIPO_TRANSPORTE", "SUBTE")];
        let sfe = [("TIPO_TRANSPORTE", "COLECTIVO"), ("LINEA", "LINEA_500I_SFE")];
        let valle = [("TIPO_TRANSPORTE", "TREN"), ("LINEA", "FFCC TREN DEL VALLE")];
        RuleTable(vec![
            ImputationRule::new("subte_jurisdiccion", &subte, "JURISDICCION", "CABA", IfMissing),
            ImputationRule::new(
                "subte_provincia",
                &subte,
                "PROVINCIA",
                "CIUDAD AUTÓNOMA DE BUENOS AIRES",
                IfMissing,
            ),
            ImputationRule::new("subte_municipio", &subte, "MUNICIPIO", "CABA", IfMissing),
            ImputationRule::new("linea_500i_provincia", &sfe, "PROVINCIA", "SANTA FE", Overwrite),
            ImputationRule::new("linea_500i_municipio", &sfe, "MUNICIPIO", "SANTA FE", Overwrite),
            ImputationRule::new("tren_del_valle_provincia", &valle, "PROVINCIA", "JN", Overwrite),
            ImputationRule::new("tren_del_valle_municipio", &valle, "MUNICIPIO", "SD", Overwrite),
        ])
    }
}

impl RuleTable {
    pub fn new(rules: Vec<ImputationRule>) -> Self {
        RuleTable(rules)
    }

    pub fn rules(&self) -> &[ImputationRule] {
        &self.0
    }

    /// Applies every rule in order. A rule naming a column the dataset lacks
    /// is an error; nothing is written in that case.
    pub fn apply(&self, dataset: &mut Dataset) -> Result<Vec<RuleReport>, PipelineError> {
        let resolved = self
            .0
            .iter()
            .map(|rule| {
                let target = dataset.require_column(&rule.column)?;
                let conds = rule
                    .when
                    .iter()
                    .map(|c| Ok((dataset.require_column(&c.column)?, c.equals.as_str())))
                    .collect::<Result<Vec<_>, PipelineError>>()?;
                Ok((rule, target, conds))
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        let mut reports = Vec::with_capacity(resolved.len());
        for (rule, target, conds) in resolved {
            let mut filled = 0;
            for row in &mut dataset.rows {
                if !conds.iter().all(|(i, v)| row[*i] == *v) {
                    continue;
                }
                let write = match rule.mode {
                    FillMode::IfMissing => is_null(&row[target]),
                    FillMode::Overwrite => row[target] != rule.value,
                };
                if write {
                    row[target] = rule.value.clone();
                    filled += 1;
                }
            }
            debug!(rule = %rule.name, filled, "Imputation rule applied");
            reports.push(RuleReport {
                rule: rule.name.clone(),
                filled,
            });
        }
        Ok(reports)
    }
}

pub fn parse_quantity(index: usize, column: &str, raw: &str) -> Result<f64, PipelineError> {
    let raw_trim = raw.trim();
    if raw_trim.is_empty() {
        return Err(PipelineError::invalid_input(index, column, raw, "missing quantity"));
    }
    raw_trim
        .parse::<f64>()
        .ok()
        .filter(|q| q.is_finite())
        .ok_or_else(|| PipelineError::invalid_input(index, column, raw, "unparseable quantity"))
}

pub struct CleanedBatch {
    pub dataset: Dataset,
    pub failures: Vec<RecordFailure>,
    pub negatives_removed: usize,
    pub rules: Vec<RuleReport>,
}

pub struct Cleaner<'a> {
    rules: &'a RuleTable,
    locale: &'a Locale,
    columns: &'a Columns,
    date_formats: &'a [String],
}

impl<'a> Cleaner<'a> {
    pub fn new(
        rules: &'a RuleTable,
        locale: &'a Locale,
        columns: &'a Columns,
        date_formats: &'a [String],
    ) -> Self {
        Self {
            rules,
            locale,
            columns,
            date_formats,
        }
    }

    /// Imputes, drops negative counts, then derives `MES`, `MES_ANO`,
    /// `CANTIDAD_LOG` and (when the day type column exists) `ES_HABIL`.
    #[tracing::instrument(skip_all, fields(records = dataset.len()))]
    pub fn clean(&self, mut dataset: Dataset) -> Result<CleanedBatch, PipelineError> {
        let date_idx = dataset.require_column(&self.columns.date)?;
        let qty_idx = dataset.require_column(&self.columns.quantity)?;
        let day_type_idx = dataset.column_index(&self.columns.day_type);
        if day_type_idx.is_none() {
            warn!(
                column = %self.columns.day_type,
                "No day type column; run enrich first to get the workday flag"
            );
        }

        let rules = self.rules.apply(&mut dataset)?;
        for report in &rules {
            info!(rule = %report.rule, filled = report.filled, "Imputation");
        }

        let month_idx = dataset.ensure_column(&self.columns.month);
        let month_year_idx = dataset.ensure_column(&self.columns.month_year);
        let log_idx = dataset.ensure_column(&self.columns.quantity_log);
        let workday_idx = day_type_idx.map(|_| dataset.ensure_column(&self.columns.is_workday));
        let workday_label = self.locale.day_type_label(DayType::Workday);

        let rows = std::mem::take(&mut dataset.rows);
        let mut failures = Vec::new();
        let mut negatives_removed = 0;

        for (index, mut row) in rows.into_iter().enumerate() {
            let quantity = match parse_quantity(index, &self.columns.quantity, &row[qty_idx]) {
                Ok(q) => q,
                Err(error) => {
                    failures.push(RecordFailure { index, error });
                    continue;
                }
            };
            if quantity < 0.0 {
                debug!(index, quantity, "Negative quantity dropped");
                negatives_removed += 1;
                continue;
            }
            let Some(date) = parse_date(&row[date_idx], self.date_formats) else {
                failures.push(RecordFailure {
                    index,
                    error: PipelineError::invalid_input(
                        index,
                        &self.columns.date,
                        &row[date_idx],
                        "unparseable date",
                    ),
                });
                continue;
            };

            row[month_idx] = date.month().to_string();
            row[month_year_idx] = format!("{}-{:02}", date.year(), date.month());
            row[log_idx] = quantity.ln_1p().to_string();
            if let (Some(src), Some(dst)) = (day_type_idx, workday_idx) {
                row[dst] = (row[src] == workday_label).to_string();
            }
            dataset.rows.push(row);
        }

        if negatives_removed > 0 {
            warn!(negatives_removed, "Rows with negative quantity removed");
        }
        info!(
            records_out = dataset.len(),
            failed = failures.len(),
            "Cleaning complete"
        );

        Ok(CleanedBatch {
            dataset,
            failures,
            negatives_removed,
            rules,
        })
    }
}
