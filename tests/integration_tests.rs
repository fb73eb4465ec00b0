use std::env;
use std::fs;

use sube_pipeline::analyzers::analyze;
use sube_pipeline::calendar::{HolidayReasonMap, Locale};
use sube_pipeline::clean::{Cleaner, RuleTable};
use sube_pipeline::config::Columns;
use sube_pipeline::dataset::{Dataset, load_dataset};
use sube_pipeline::enrich::Enricher;
use sube_pipeline::infra::files::{FileHolidaySource, load_reason_file};
use sube_pipeline::output::{append_failures, write_dataset};
use sube_pipeline::services::holiday_api::{collect_holidays, holiday_set, reasons_from_holidays};

const SAMPLE: &str = "tests/fixtures/dat-ab-usos-sample.csv";
const HOLIDAYS: &str = "tests/fixtures/holidays-2024-AR.json";
const REASONS: &str = "tests/fixtures/feriados-2024.csv";

fn temp_path(name: &str) -> String {
    format!("{}/sube_pipeline_it_{}", env::temp_dir().display(), name)
}

fn formats() -> Vec<String> {
    sube_pipeline::calendar::DEFAULT_DATE_FORMATS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn column<'a>(ds: &'a Dataset, row: usize, name: &str) -> &'a str {
    let col = ds.column_index(name).unwrap();
    ds.field(row, col)
}

#[tokio::test]
async fn test_full_pipeline() {
    let locale = Locale::spanish_ar();
    let columns = Columns::default();
    let formats = formats();

    let source = FileHolidaySource::load(HOLIDAYS).unwrap();
    let holidays = collect_holidays(&source, &[2024], "AR").await.unwrap();
    let holiday_dates = holiday_set(&holidays);
    assert_eq!(holiday_dates.len(), 3);

    let reasons = load_reason_file(REASONS, 2024, &locale)
        .unwrap()
        .with_sentinel(locale.no_holiday());

    // enrich
    let raw = load_dataset(SAMPLE).await.unwrap();
    assert_eq!(raw.len(), 8);
    let enriched = Enricher::new(&holiday_dates, &locale, &columns, &formats)
        .with_reasons(&reasons)
        .enrich(raw)
        .unwrap();

    assert_eq!(enriched.dataset.len(), 7);
    assert_eq!(enriched.failures.len(), 1);
    assert_eq!(enriched.failures[0].index, 6);

    let stats = &enriched.stats;
    assert_eq!((stats.holidays, stats.weekends, stats.workdays), (4, 1, 2));
    assert_eq!(stats.with_reason, 3);
    assert_eq!(stats.holiday_without_reason, 1);
    assert_eq!(stats.missing_reason_dates.len(), 1);
    assert_eq!(stats.missing_reason_dates[0].to_string(), "2024-05-01");
    assert_eq!(stats.orphan_reason_dates[0].to_string(), "2024-04-01");

    let ds = &enriched.dataset;
    assert_eq!(column(ds, 0, "DIA_SEMANA"), "LUNES");
    assert_eq!(column(ds, 0, "TIPO_DIA"), "FERIADO");
    assert_eq!(column(ds, 0, "MOTIVO_FERIADO"), "AÑO NUEVO");
    assert_eq!(column(ds, 2, "TIPO_DIA"), "FIN_DE_SEMANA");
    assert_eq!(column(ds, 2, "MOTIVO_FERIADO"), "NO FERIADO");
    assert_eq!(column(ds, 3, "TIPO_DIA"), "HÁBIL");
    // holiday with no reason entry keeps the sentinel
    assert_eq!(column(ds, 5, "TIPO_DIA"), "FERIADO");
    assert_eq!(column(ds, 5, "MOTIVO_FERIADO"), "NO FERIADO");

    let enriched_path = temp_path("enriched.csv");
    let rejects_path = temp_path("rejects.csv");
    let _ = fs::remove_file(&rejects_path);
    write_dataset(&enriched_path, ds, false).unwrap();
    append_failures(&rejects_path, "enrich", &enriched.failures).unwrap();
    let rejects = fs::read_to_string(&rejects_path).unwrap();
    assert!(rejects.starts_with("stage,index,error\n"));
    assert!(rejects.contains("enrich,6,"));

    // clean
    let reloaded = load_dataset(&enriched_path).await.unwrap();
    let rules = RuleTable::default();
    let cleaned = Cleaner::new(&rules, &locale, &columns, &formats)
        .clean(reloaded)
        .unwrap();

    assert_eq!(cleaned.negatives_removed, 1);
    assert!(cleaned.failures.is_empty());
    let ds = &cleaned.dataset;
    assert_eq!(ds.len(), 6);
    assert_eq!(column(ds, 1, "JURISDICCION"), "CABA");
    assert_eq!(column(ds, 3, "PROVINCIA"), "SANTA FE");
    assert_eq!(column(ds, 5, "MUNICIPIO"), "SD");
    assert_eq!(column(ds, 0, "MES"), "1");
    assert_eq!(column(ds, 0, "MES_ANO"), "2024-01");
    assert_eq!(column(ds, 3, "ES_HABIL"), "true");
    assert_eq!(column(ds, 0, "ES_HABIL"), "false");

    let clean_path = temp_path("clean.csv.gz");
    write_dataset(&clean_path, ds, true).unwrap();

    // analyze
    let reloaded = load_dataset(&clean_path).await.unwrap();
    let report = analyze(&reloaded, &columns, &locale, &formats).unwrap();

    assert_eq!(report.shape.rows, 6);
    assert_eq!(report.unparsed_rows, 0);
    assert_eq!(report.negative_quantity_rows, 0);
    assert_eq!(report.unrecognized_label_rows, 0);
    assert_eq!(report.quantity.count, 6);
    assert_eq!(report.quantity.max, 3000.0);

    let reasons: Vec<_> = report
        .profiles
        .by_holiday_reason
        .iter()
        .map(|r| (r.label.as_str(), r.total))
        .collect();
    assert_eq!(reasons, vec![("NAVIDAD", 75.0), ("AÑO NUEVO", 2000.0)]);

    let split = &report.profiles.workday_split;
    assert_eq!(split[1].total, 450.0);
    assert_eq!(split[0].total, 5375.0);

    let months: Vec<_> = report
        .profiles
        .by_month
        .iter()
        .map(|m| (m.month, m.total))
        .collect();
    assert_eq!(months, vec![(1, 2000.0), (3, 3450.0), (5, 300.0), (12, 75.0)]);
    assert_eq!(report.profiles.by_weekday[0].label, "LUNES");

    for path in [enriched_path, rejects_path, clean_path] {
        let _ = fs::remove_file(path);
    }
}

#[tokio::test]
async fn test_reasons_from_holiday_source() {
    let locale = Locale::english();
    let columns = Columns::default();
    let formats = formats();

    let source = FileHolidaySource::load(HOLIDAYS).unwrap();
    let holidays = collect_holidays(&source, &[2024], "AR").await.unwrap();
    let holiday_dates = holiday_set(&holidays);
    let reasons: HolidayReasonMap = reasons_from_holidays(&holidays);

    let raw = load_dataset(SAMPLE).await.unwrap();
    let batch = Enricher::new(&holiday_dates, &locale, &columns, &formats)
        .with_reasons(&reasons)
        .enrich(raw)
        .unwrap();

    // one source, so nothing to disagree about
    assert!(batch.stats.missing_reason_dates.is_empty());
    assert!(batch.stats.orphan_reason_dates.is_empty());
    assert_eq!(batch.stats.holiday_without_reason, 0);
    assert_eq!(column(&batch.dataset, 5, "MOTIVO_FERIADO"), "DÍA DEL TRABAJADOR");
    assert_eq!(column(&batch.dataset, 2, "TIPO_DIA"), "WEEKEND");
}

#[tokio::test]
async fn test_holiday_file_filters_by_year() {
    let source = FileHolidaySource::load(HOLIDAYS).unwrap();
    let none = collect_holidays(&source, &[2023], "AR").await.unwrap();
    assert!(none.is_empty());
}
