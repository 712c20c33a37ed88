use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AskueError, Result};
use crate::models::Channel;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Ingest ASKUE 30917 meter logs into a half-hour energy dataset
#[derive(Parser, Debug, Clone)]
#[command(
    name = "askue",
    about = "Ingest ASKUE 30917 meter logs into a half-hour energy dataset",
    version
)]
pub struct Settings {
    /// Files or directories to ingest
    pub inputs: Vec<PathBuf>,

    /// Delivery date used to place year-less (MMDD) headers [default: file modification date]
    #[arg(long, value_parser = parse_date)]
    pub context_date: Option<NaiveDate>,

    /// Only ingest files with this extension when walking directories
    #[arg(long)]
    pub extension: Option<String>,

    /// Canonical dataset CSV, loaded before ingestion and saved after
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Export the filtered view as CSV
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Restrict the view to these meter ids
    #[arg(long = "meter")]
    pub meters: Vec<String>,

    /// Restrict the view to these channel suffixes (1-4)
    #[arg(long = "channel", value_parser = clap::value_parser!(u8).range(1..=4))]
    pub channels: Vec<u8>,

    /// First day of the view (inclusive)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Last day of the view (inclusive)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,

    /// Allowed difference between declared and calculated daily sums
    #[arg(long, default_value = "1.0")]
    pub checksum_tolerance: f64,

    /// |z-score| above which a reading is flagged as anomalous
    #[arg(long, default_value = "3.0")]
    pub z_threshold: f64,

    /// List anomalous readings of the view
    #[arg(long)]
    pub anomalies: bool,

    /// Print daily totals of the view
    #[arg(long)]
    pub daily: bool,

    /// Parse every file even when an identical one was parsed before
    #[arg(long)]
    pub no_cache: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

fn valid_tolerance(v: f64) -> bool {
    !v.is_nan() && v >= 0.0
}

fn valid_threshold(v: f64) -> bool {
    !v.is_nan() && v > 0.0
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.askue/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_tolerance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_threshold: Option<f64>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".askue").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to the default path, creating parent directories
    /// if needed.
    pub fn save(&self) -> std::result::Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the default config file if it exists.
    pub fn clear() -> std::result::Result<(), std::io::Error> {
        Self::clear_at(&Self::config_path())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation: accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Raw ArgMatches are needed to query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug_flag(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "dataset") && settings.dataset.is_none() {
            settings.dataset = last.dataset;
        }
        if !is_arg_explicitly_set(&matches, "extension") && settings.extension.is_none() {
            settings.extension = last.extension;
        }
        // Persisted values that no longer validate are ignored.
        if !is_arg_explicitly_set(&matches, "checksum_tolerance") {
            if let Some(v) = last.checksum_tolerance.filter(|&v| valid_tolerance(v)) {
                settings.checksum_tolerance = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "z_threshold") {
            if let Some(v) = last.z_threshold.filter(|&v| valid_threshold(v)) {
                settings.z_threshold = v;
            }
        }

        settings = Self::apply_debug_flag(settings);

        // Only a valid run becomes the new last-used state.
        if settings.validate().is_ok() {
            let params = LastUsedParams::from(&settings);
            if let Err(e) = params.save_to(config_path) {
                tracing::debug!("could not persist last-used params: {e}");
            }
        }

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug_flag(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Reject numeric settings that would make validation meaningless.
    pub fn validate(&self) -> Result<()> {
        if !valid_tolerance(self.checksum_tolerance) {
            return Err(AskueError::Config(format!(
                "checksum tolerance must be non-negative, got {}",
                self.checksum_tolerance
            )));
        }
        if !valid_threshold(self.z_threshold) {
            return Err(AskueError::Config(format!(
                "z-score threshold must be positive, got {}",
                self.z_threshold
            )));
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AskueError::Config(format!(
                    "--from {from} is after --to {to}"
                )));
            }
        }
        Ok(())
    }

    /// Channel filter as typed channels.
    pub fn channel_filter(&self) -> Vec<Channel> {
        self.channels
            .iter()
            .filter_map(|&s| Channel::from_suffix(s))
            .collect()
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            dataset: s.dataset.clone(),
            extension: s.extension.clone(),
            checksum_tolerance: Some(s.checksum_tolerance),
            z_threshold: Some(s.z_threshold),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
