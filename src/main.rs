//! CLI entry point for the SUBE ridership pipeline.
//!
//! Provides subcommands to enrich usage records with day types and holiday
//! reasons, clean them, produce an exploratory report, and list holidays.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use sube_pipeline::{
    analyzers::analyze,
    calendar::{HolidayReasonMap, Locale},
    clean::Cleaner,
    config::PipelineConfig,
    dataset::load_dataset,
    enrich::Enricher,
    infra::{files::FileHolidaySource, files::load_reason_file, nagerdate::NagerDateClient},
    output::{append_failures, print_json, write_dataset, write_json},
    services::holiday_api::{
        Holiday, HolidaySource, collect_holidays, holiday_set, reasons_from_holidays,
    },
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// `--reasons` value that takes reasons from the holiday source itself.
const REASONS_FROM_HOLIDAYS: &str = "holidays";

#[derive(Parser)]
#[command(name = "sube_pipeline")]
#[command(about = "Enrich, clean and summarise SUBE transit usage data", long_about = None)]
struct Cli {
    /// JSON config file (falls back to SUBE_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append weekday, day type and holiday reason columns
    Enrich {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Holiday years to load (repeat for datasets spanning years)
        #[arg(short, long, required = true)]
        year: Vec<i32>,

        /// ISO country code; overrides the config file
        #[arg(long)]
        country: Option<String>,

        /// Read holidays from a saved JSON array instead of the holiday API
        #[arg(long)]
        holidays_file: Option<String>,

        /// Reason file (.json or month,day,reason CSV), or "holidays" to use
        /// the holiday source's names
        #[arg(long)]
        reasons: Option<String>,

        /// CSV file to write the enriched records to
        #[arg(short, long, default_value = "df-sube-enriched.csv")]
        output: String,

        /// CSV file to append rejected records to
        #[arg(long)]
        rejects: Option<String>,

        /// Optional: write the run summary as JSON
        #[arg(long)]
        stats: Option<String>,

        /// Gzip compress the output CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Drop negative counts, impute known gaps and add derived columns
    Clean {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[arg(short, long, default_value = "df-sube-clean.csv")]
        output: String,

        #[arg(long)]
        rejects: Option<String>,

        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Write the exploratory analysis report as JSON
    Analyze {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[arg(short, long, default_value = "eda_report.json")]
        output: String,
    },
    /// List the holidays the holiday source returns
    Holidays {
        #[arg(short, long)]
        year: i32,

        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        holidays_file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/sube_pipeline.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("sube_pipeline.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::resolve(cli.config.as_deref())?;
    let locale = config.build_locale()?;

    match cli.command {
        Commands::Enrich {
            source,
            year,
            country,
            holidays_file,
            reasons,
            output,
            rejects,
            stats,
            gzip,
        } => {
            let country = country.unwrap_or_else(|| config.country.clone());
            let source_impl = holiday_source(holidays_file.as_deref())?;
            let holidays = collect_holidays(source_impl.as_ref(), &year, &country).await?;
            let holiday_dates = holiday_set(&holidays);
            info!(years = ?year, country = %country, holidays = holiday_dates.len(), "Holiday set ready");

            let reason_map = load_reasons(reasons.as_deref(), &holidays, &year, &locale)?
                .map(|m| m.with_sentinel(locale.no_holiday()));

            let dataset = load_dataset(&source).await?;
            info!(rows = dataset.len(), columns = dataset.headers.len(), "Records loaded");

            let mut enricher =
                Enricher::new(&holiday_dates, &locale, &config.columns, &config.date_formats);
            if let Some(map) = &reason_map {
                enricher = enricher.with_reasons(map);
            }
            let batch = enricher.enrich(dataset)?;

            write_dataset(&output, &batch.dataset, gzip)?;
            if let Some(path) = &rejects {
                append_failures(path, "enrich", &batch.failures)?;
            }
            match &stats {
                Some(path) => write_json(path, &batch.stats)?,
                None => print_json(&batch.stats)?,
            }
        }
        Commands::Clean {
            source,
            output,
            rejects,
            gzip,
        } => {
            let dataset = load_dataset(&source).await?;
            let cleaner = Cleaner::new(
                &config.imputation,
                &locale,
                &config.columns,
                &config.date_formats,
            );
            let batch = cleaner.clean(dataset)?;

            write_dataset(&output, &batch.dataset, gzip)?;
            if let Some(path) = &rejects {
                append_failures(path, "clean", &batch.failures)?;
            }
            info!(
                negatives_removed = batch.negatives_removed,
                failed = batch.failures.len(),
                rules = batch.rules.len(),
                "Clean finished"
            );
        }
        Commands::Analyze { source, output } => {
            let dataset = load_dataset(&source).await?;
            let report = analyze(&dataset, &config.columns, &locale, &config.date_formats)?;
            write_json(&output, &report)?;
        }
        Commands::Holidays {
            year,
            country,
            holidays_file,
        } => {
            let country = country.unwrap_or_else(|| config.country.clone());
            let source_impl = holiday_source(holidays_file.as_deref())?;
            let holidays = source_impl.list_holidays(year, &country).await?;

            info!(total = holidays.len(), year, country = %country, "Holiday list fetched");
            for h in &holidays {
                info!(date = %h.date, local_name = %h.local_name, name = %h.name, "Holiday");
            }
        }
    }

    Ok(())
}

fn holiday_source(holidays_file: Option<&str>) -> Result<Box<dyn HolidaySource>> {
    Ok(match holidays_file {
        Some(path) => Box::new(FileHolidaySource::load(path)?),
        None => Box::new(NagerDateClient::from_env()?),
    })
}

/// Builds the reason map selected by `--reasons`, if any.
fn load_reasons(
    reasons: Option<&str>,
    holidays: &[Holiday],
    years: &[i32],
    locale: &Locale,
) -> Result<Option<HolidayReasonMap>> {
    let Some(reasons) = reasons else {
        return Ok(None);
    };
    if reasons == REASONS_FROM_HOLIDAYS {
        info!("Using holiday names as reasons");
        return Ok(Some(reasons_from_holidays(holidays)));
    }

    // month,day,reason files carry no year of their own
    let year = *years.first().context("at least one --year is required")?;
    if years.len() > 1 && !reasons.ends_with(".json") {
        warn!(year, "Reason CSV has no year column; dating its entries with the first --year");
    }
    Ok(Some(load_reason_file(reasons, year, locale)?))
}
