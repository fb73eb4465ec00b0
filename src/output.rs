//! Output persistence: enriched datasets, rejected records and JSON reports.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::RecordFailure;
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Logs a serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    create_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("failed to create '{path}'"))?;
    serde_json::to_writer_pretty(file, value)?;
    info!(path, "JSON report written");
    Ok(())
}

fn create_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_csv<W: Write>(writer: W, dataset: &Dataset) -> Result<W> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(&dataset.headers)?;
    for row in &dataset.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

/// Writes a dataset as CSV, gzip-compressed if `gzip` is set. Rows keep
/// their order and every column of the header.
pub fn write_dataset(path: &str, dataset: &Dataset, gzip: bool) -> Result<()> {
    create_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("failed to create '{path}'"))?;

    if gzip {
        let encoder = write_csv(GzEncoder::new(file, Compression::default()), dataset)?;
        encoder.finish()?;
    } else {
        write_csv(file, dataset)?;
    }

    info!(path, rows = dataset.len(), gzip, "Dataset written");
    Ok(())
}

#[derive(Debug, Serialize)]
struct RejectRow<'a> {
    stage: &'a str,
    index: usize,
    error: String,
}

/// Appends rejected records to a CSV file.
///
/// Writes the header when the file is new or empty. An empty batch leaves
/// the file untouched.
pub fn append_failures(path: &str, stage: &str, failures: &[RecordFailure]) -> Result<()> {
    if failures.is_empty() {
        debug!(path, stage, "No rejected records to append");
        return Ok(());
    }

    let has_content = std::fs::metadata(path).is_ok_and(|m| m.len() > 0);
    debug!(path, has_content, count = failures.len(), "Appending rejected records");

    create_parent_dir(path)?;
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!has_content) // appending: header only on first write
        .from_writer(file);

    for failure in failures {
        writer.serialize(RejectRow {
            stage,
            index: failure.index,
            error: failure.error.to_string(),
        })?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use flate2::read::GzDecoder;
    use std::env;
    use std::fs;
    use std::io::Read;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample() -> Dataset {
        Dataset {
            headers: vec!["DIA_TRANSPORTE".into(), "LINEA".into()],
            rows: vec![
                vec!["2024-01-01".into(), "LINEA 60".into()],
                vec!["2024-01-02".into(), "".into()],
            ],
        }
    }

    fn failure(index: usize) -> RecordFailure {
        RecordFailure {
            index,
            error: PipelineError::invalid_input(index, "DIA_TRANSPORTE", "", "missing date"),
        }
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&vec![1, 2, 3]).unwrap();
    }

    #[test]
    fn test_write_dataset_round_trips() {
        let path = temp_path("sube_pipeline_test_dataset.csv");
        write_dataset(&path, &sample(), false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "DIA_TRANSPORTE,LINEA\n2024-01-01,LINEA 60\n2024-01-02,\n");
        assert_eq!(Dataset::from_bytes(content.as_bytes()).unwrap(), sample());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_dataset_gzip() {
        let path = temp_path("sube_pipeline_test_dataset.csv.gz");
        write_dataset(&path, &sample(), true).unwrap();

        let bytes = fs::read(&path).unwrap();
        let mut decoded = String::new();
        GzDecoder::new(bytes.as_slice()).read_to_string(&mut decoded).unwrap();
        assert!(decoded.starts_with("DIA_TRANSPORTE,LINEA\n"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_failures_writes_header_once() {
        let path = temp_path("sube_pipeline_test_rejects.csv");
        let _ = fs::remove_file(&path);

        append_failures(&path, "enrich", &[failure(1), failure(4)]).unwrap();
        append_failures(&path, "clean", &[failure(2)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.starts_with("stage,")).count();
        assert_eq!(header_count, 1);
        // 1 header + 3 rejected rows
        assert_eq!(content.lines().count(), 4);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_failures_empty_first_batch_keeps_header() {
        let path = temp_path("sube_pipeline_test_rejects_empty_first.csv");
        let _ = fs::remove_file(&path);

        append_failures(&path, "enrich", &[]).unwrap();
        assert!(!Path::new(&path).exists());

        append_failures(&path, "clean", &[failure(2)]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("stage,index,error\n"));
        assert!(content.contains("clean,2,"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_failures_to_existing_empty_file_writes_header() {
        let path = temp_path("sube_pipeline_test_rejects_zero_bytes.csv");
        fs::write(&path, "").unwrap();

        append_failures(&path, "enrich", &[failure(0)]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("stage,index,error\n"));
        assert_eq!(content.lines().count(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_creates_parent_dir() {
        let dir = temp_path("sube_pipeline_test_reports");
        let path = format!("{dir}/report.json");
        let _ = fs::remove_dir_all(&dir);

        write_json(&path, &serde_json::json!({"rows": 2})).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["rows"], 2);

        fs::remove_dir_all(&dir).unwrap();
    }
}
