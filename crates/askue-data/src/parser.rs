//! File and batch parsing.
//!
//! `parse_file` runs one [`RawFile`] through decoder, header resolver,
//! tokenizer and expander. `parse_batch` does that for every file and merges
//! the results into one [`Dataset`]. Neither ever fails: a file without a
//! usable date is reported as an [`IngestIssue`] and bad lines are dropped.

use askue_core::models::{FileDescriptor, IngestIssue, RawFile, Reading};
use askue_core::stats::DEFAULT_CHECKSUM_TOLERANCE;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::dataset::Dataset;
use crate::decoder::{decode, split_lines};
use crate::expander::expand;
use crate::header::resolve_header_date;
use crate::tokenizer::{tokenize, LineKind};

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParserConfig {
    /// Largest accepted difference between declared and calculated daily sums.
    pub checksum_tolerance: f64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            checksum_tolerance: DEFAULT_CHECKSUM_TOLERANCE,
        }
    }
}

// ── Single file ───────────────────────────────────────────────────────────────

/// Line counters for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    /// Lines shaped like `(CODE):...`.
    pub data_lines: usize,
    /// Data lines turned into 48 readings.
    pub records: usize,
    /// Data lines ignored silently (short code, unknown suffix).
    pub skipped: usize,
    /// Data lines dropped because an interval value did not parse.
    pub malformed: usize,
}

/// Everything one file produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FileParse {
    pub descriptor: FileDescriptor,
    /// Resolved header date; `None` when the file was rejected.
    pub date: Option<NaiveDate>,
    /// Readings in file order, possibly with duplicate keys.
    pub readings: Vec<Reading>,
    pub issues: Vec<IngestIssue>,
    pub stats: LineStats,
}

/// Parse one file.
pub fn parse_file(file: &RawFile, config: &ParserConfig) -> FileParse {
    let descriptor = file.descriptor();
    let (text, encoding) = decode(&file.content);
    let lines = split_lines(&text);
    debug!(
        "{}: decoded {} lines as {:?}",
        file.name,
        lines.len(),
        encoding
    );

    let header = lines.first().copied().unwrap_or_default();
    let date = match resolve_header_date(header, file.context_date) {
        Ok(date) => date,
        Err(e) => {
            debug!("{}: header rejected: {}", file.name, e);
            warn!("{}: date not found in header, file skipped", file.name);
            return FileParse {
                descriptor,
                date: None,
                readings: Vec::new(),
                issues: vec![IngestIssue::DateNotFound {
                    file: file.name.clone(),
                }],
                stats: LineStats::default(),
            };
        }
    };

    let mut stats = LineStats::default();
    let mut readings = Vec::new();
    let mut issues = Vec::new();

    for (line_no, line) in lines.iter().enumerate() {
        let record = match tokenize(line) {
            Ok(LineKind::NotData) => continue,
            Ok(LineKind::Skipped) => {
                stats.data_lines += 1;
                stats.skipped += 1;
                continue;
            }
            Ok(LineKind::Record(record)) => {
                stats.data_lines += 1;
                record
            }
            Err(e) => {
                stats.data_lines += 1;
                stats.malformed += 1;
                debug!("{}:{}: line dropped: {}", file.name, line_no + 1, e);
                continue;
            }
        };

        let expansion = expand(&record, date, config.checksum_tolerance);
        if let Some(mismatch) = expansion.mismatch {
            let issue = IngestIssue::ChecksumMismatch {
                file: file.name.clone(),
                meter_id: record.meter_id.clone(),
                suffix: record.suffix(),
                expected: mismatch.expected,
                calculated: mismatch.calculated,
            };
            warn!("{}", issue);
            issues.push(issue);
        }
        readings.extend(expansion.readings);
        stats.records += 1;
    }

    debug!(
        "{}: date {}, {} data lines, {} records, {} skipped, {} malformed",
        file.name, date, stats.data_lines, stats.records, stats.skipped, stats.malformed
    );

    FileParse {
        descriptor,
        date: Some(date),
        readings,
        issues,
        stats,
    }
}

// ── Batch ─────────────────────────────────────────────────────────────────────

/// Merged output of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBatch {
    /// Deduplicated and sorted; later files win over earlier ones.
    pub dataset: Dataset,
    /// One descriptor per file, in input order.
    pub files: Vec<FileDescriptor>,
    pub issues: Vec<IngestIssue>,
}

/// Parse every file of a batch in order.
pub fn parse_batch(files: &[RawFile], config: &ParserConfig) -> ParsedBatch {
    let parses: Vec<FileParse> = files.iter().map(|f| parse_file(f, config)).collect();
    let batch = ParsedBatch::from_parses(parses);
    info!(
        "Parsed {} files into {} readings ({} issues)",
        batch.files.len(),
        batch.dataset.len(),
        batch.issues.len()
    );
    batch
}

impl ParsedBatch {
    /// Assemble a batch from already parsed files, in batch order.
    pub fn from_parses(parses: impl IntoIterator<Item = FileParse>) -> Self {
        let mut files = Vec::new();
        let mut issues = Vec::new();
        let mut readings = Vec::new();

        for parse in parses {
            files.push(parse.descriptor);
            issues.extend(parse.issues);
            readings.extend(parse.readings);
        }

        Self {
            dataset: Dataset::from_readings(readings),
            files,
            issues,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
