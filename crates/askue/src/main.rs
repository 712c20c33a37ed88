mod bootstrap;
mod report;

use std::fs::File;

use anyhow::{Context, Result};
use askue_core::models::Reading;
use askue_core::settings::Settings;
use askue_data::anomaly::{find_anomalies, AnomalyConfig};
use askue_data::dataset::{Dataset, DatasetFilter};
use askue_data::export::{load_dataset, save_dataset, write_csv};
use askue_data::parser::ParserConfig;
use askue_data::reader::{find_input_files, load_raw_files};
use askue_data::summary::{daily_totals, selection_stats, summarize};
use askue_runtime::session::IngestSession;
use chrono::{NaiveDateTime, NaiveTime};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();
    settings.validate()?;

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("ASKUE v{} starting", env!("CARGO_PKG_VERSION"));

    let config = ParserConfig {
        checksum_tolerance: settings.checksum_tolerance,
    };

    let dataset = match &settings.dataset {
        Some(path) if path.exists() => load_dataset(path)
            .with_context(|| format!("loading dataset {}", path.display()))?,
        _ => Dataset::new(),
    };
    tracing::info!("Starting with {} stored readings", dataset.len());

    let mut session = IngestSession::with_dataset(dataset, config);
    if settings.no_cache {
        session.set_cache(None);
    }

    // ── Ingest ────────────────────────────────────────────────────────────

    let paths = find_input_files(&settings.inputs, settings.extension.as_deref());
    let (files, mut issues) = load_raw_files(&paths, settings.context_date);
    let outcome = session.ingest(&files);
    issues.extend(outcome.issues);

    if !session.files().is_empty() {
        print!("{}", report::render_files(session.files()));
    }
    print!("{}", report::render_issues(&issues));
    println!(
        "Ingested {} files: {} readings, {} new, dataset now {}",
        outcome.files_parsed,
        outcome.batch_readings,
        outcome.readings_added,
        session.dataset().len()
    );

    // ── View ──────────────────────────────────────────────────────────────

    let filter = DatasetFilter::all()
        .with_meters(settings.meters.iter().cloned())
        .with_channels(settings.channel_filter())
        .with_dates(settings.from, settings.to);
    let view: Vec<&Reading> = session.dataset().filter(&filter).collect();

    print!("{}", report::render_summary(&summarize(view.iter().copied())));

    let from = settings
        .from
        .map(|d| d.and_time(NaiveTime::MIN))
        .unwrap_or(NaiveDateTime::MIN);
    let to = settings
        .to
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .unwrap_or(NaiveDateTime::MAX);
    if let Some(stats) = selection_stats(view.iter().copied(), from, to) {
        print!("{}", report::render_selection(&stats));
    }

    if settings.daily {
        print!("{}", report::render_daily(&daily_totals(view.iter().copied())));
    }

    if settings.anomalies {
        let anomaly_config = AnomalyConfig {
            z_threshold: settings.z_threshold,
        };
        let anomalies = find_anomalies(view.iter().copied(), &anomaly_config);
        print!(
            "{}",
            report::render_anomalies(&anomalies, anomaly_config.z_threshold)
        );
    }

    // ── Persist ───────────────────────────────────────────────────────────

    if let Some(output) = &settings.output {
        let file = File::create(output)
            .with_context(|| format!("creating export {}", output.display()))?;
        let rows = write_csv(file, view.iter().copied())?;
        tracing::info!("Exported {} rows to {}", rows, output.display());
    }

    if let Some(path) = &settings.dataset {
        save_dataset(path, session.dataset())
            .with_context(|| format!("saving dataset {}", path.display()))?;
        tracing::info!(
            "Saved {} readings to {}",
            session.dataset().len(),
            path.display()
        );
    }

    Ok(())
}
