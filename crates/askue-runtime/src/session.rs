//! Ingestion session owning the canonical dataset.
//!
//! [`IngestSession`] is the single writer of a [`Dataset`]: every batch goes
//! through [`IngestSession::ingest`], which needs `&mut self`. Callers decide
//! when a session starts (empty or from a saved dataset) and when it ends.

use std::collections::HashSet;

use askue_core::models::{FileDescriptor, IngestIssue, RawFile};
use askue_data::dataset::Dataset;
use askue_data::parser::{parse_file, FileParse, ParsedBatch, ParserConfig};

use crate::cache::ParseCache;

// ── IngestOutcome ─────────────────────────────────────────────────────────────

/// What one call to [`IngestSession::ingest`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutcome {
    /// Files handed to the parser.
    pub files_parsed: usize,
    /// Distinct readings the batch produced.
    pub batch_readings: usize,
    /// Keys that were not in the dataset before.
    pub readings_added: usize,
    /// Issues of this batch, in file order.
    pub issues: Vec<IngestIssue>,
}

impl IngestOutcome {
    /// Number of issues that discarded data (as opposed to warnings).
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| !i.is_warning()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_warning()).count()
    }
}

// ── IngestSession ─────────────────────────────────────────────────────────────

pub struct IngestSession {
    dataset: Dataset,
    /// Every file seen in this session, first occurrence of each name.
    files: Vec<FileDescriptor>,
    cache: Option<ParseCache>,
    config: ParserConfig,
}

impl IngestSession {
    /// Empty session with a default-sized parse cache.
    pub fn new(config: ParserConfig) -> Self {
        Self {
            dataset: Dataset::new(),
            files: Vec::new(),
            cache: Some(ParseCache::default()),
            config,
        }
    }

    /// Continue from a previously saved dataset.
    pub fn with_dataset(dataset: Dataset, config: ParserConfig) -> Self {
        Self {
            dataset,
            ..Self::new(config)
        }
    }

    /// Replace the parse cache; `None` parses every file afresh.
    pub fn set_cache(&mut self, cache: Option<ParseCache>) {
        self.cache = cache;
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Parse `files` and merge the result into the dataset.
    ///
    /// Readings from this batch replace existing readings with the same key.
    /// Descriptors are appended for file names not seen before.
    pub fn ingest(&mut self, files: &[RawFile]) -> IngestOutcome {
        let parses: Vec<FileParse> = files.iter().map(|f| self.parse(f)).collect();
        let batch = ParsedBatch::from_parses(parses);

        let before = self.dataset.len();
        let batch_readings = batch.dataset.len();
        self.dataset.merge_in(batch.dataset);
        let readings_added = self.dataset.len() - before;

        let mut known: HashSet<String> = self.files.iter().map(|d| d.name.clone()).collect();
        for descriptor in batch.files {
            if known.insert(descriptor.name.clone()) {
                self.files.push(descriptor);
            }
        }

        tracing::info!(
            files = files.len(),
            batch_readings,
            readings_added,
            total = self.dataset.len(),
            issues = batch.issues.len(),
            "batch ingested"
        );

        IngestOutcome {
            files_parsed: files.len(),
            batch_readings,
            readings_added,
            issues: batch.issues,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&ParseCache> {
        self.cache.as_ref()
    }

    /// Discard the dataset and file list. The cache survives.
    pub fn reset(&mut self) {
        self.dataset = Dataset::new();
        self.files.clear();
        tracing::debug!("session reset");
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn parse(&mut self, file: &RawFile) -> FileParse {
        match self.cache.as_mut() {
            Some(cache) => cache.get_or_parse(file, &self.config),
            None => parse_file(file, &self.config),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use askue_core::models::{Channel, ReadingKey};
    use chrono::{NaiveDate, NaiveDateTime};

    fn file(name: &str, body: &str) -> RawFile {
        RawFile::new(
            name,
            body.as_bytes().to_vec(),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
        )
    }

    fn day_file(name: &str, yymmdd: &str, line: &str) -> RawFile {
        file(name, &format!("((//30917:{yymmdd}:000057:++\n{line}\n"))
    }

    fn first_key(meter: &str, channel: Channel) -> ReadingKey {
        ReadingKey {
            timestamp: NaiveDateTime::parse_from_str("2025-01-01 00:00", "%Y-%m-%d %H:%M")
                .unwrap(),
            meter_id: meter.to_string(),
            channel,
        }
    }

    // ── ingest ────────────────────────────────────────────────────────────

    #[test]
    fn test_ingest_into_empty_session() {
        let mut session = IngestSession::new(ParserConfig::default());
        let outcome = session.ingest(&[day_file("a.txt", "250101", "(123452):0:1")]);

        assert_eq!(outcome.files_parsed, 1);
        assert_eq!(outcome.batch_readings, 48);
        assert_eq!(outcome.readings_added, 48);
        assert!(outcome.issues.is_empty());
        assert_eq!(session.dataset().len(), 48);
        assert_eq!(session.files().len(), 1);
    }

    #[test]
    fn test_reingest_same_file_is_idempotent() {
        let mut session = IngestSession::new(ParserConfig::default());
        let f = day_file("a.txt", "250101", "(123452):0:1");
        session.ingest(std::slice::from_ref(&f));
        let snapshot = session.dataset().clone();

        let outcome = session.ingest(&[f]);
        assert_eq!(outcome.readings_added, 0);
        assert_eq!(session.dataset(), &snapshot);
        assert_eq!(session.files().len(), 1);
        assert_eq!(session.cache().map(|c| c.hits()), Some(1));
    }

    #[test]
    fn test_later_batch_overwrites_values() {
        let mut session = IngestSession::new(ParserConfig::default());
        session.ingest(&[day_file("a.txt", "250101", "(123452):0:1")]);
        session.ingest(&[day_file("a-fixed.txt", "250101", "(123452):0:9")]);

        let key = first_key("12345", Channel::ActiveConsumption);
        assert_eq!(session.dataset().get(&key).map(|r| r.value), Some(9.0));
        assert_eq!(session.dataset().len(), 48);
        assert_eq!(session.files().len(), 2);
    }

    #[test]
    fn test_issues_are_per_batch() {
        let mut session = IngestSession::new(ParserConfig::default());
        let outcome = session.ingest(&[
            file("bad.txt", "nothing"),
            day_file("warn.txt", "250101", "(123451):90.0:50.0:50.0"),
        ]);
        assert_eq!(outcome.error_count(), 1);
        assert_eq!(outcome.warning_count(), 1);
        // Rejected files are still listed.
        assert_eq!(session.files().len(), 2);

        let next = session.ingest(&[day_file("ok.txt", "250102", "(123452):0:1")]);
        assert!(next.issues.is_empty());
    }

    #[test]
    fn test_with_dataset_and_without_cache() {
        let mut seed = IngestSession::new(ParserConfig::default());
        seed.ingest(&[day_file("a.txt", "250101", "(111112):0:1")]);
        let saved = seed.into_dataset();

        let mut session = IngestSession::with_dataset(saved, ParserConfig::default());
        session.set_cache(None);
        let outcome = session.ingest(&[day_file("b.txt", "250101", "(222222):0:1")]);

        assert_eq!(outcome.readings_added, 48);
        assert_eq!(session.dataset().len(), 96);
        assert!(session.cache().is_none());
        assert_eq!(session.dataset().meters().len(), 2);
    }

    #[test]
    fn test_reset() {
        let mut session = IngestSession::new(ParserConfig::default());
        session.ingest(&[day_file("a.txt", "250101", "(123452):0:1")]);
        session.reset();
        assert!(session.dataset().is_empty());
        assert!(session.files().is_empty());
        assert_eq!(session.cache().map(|c| c.len()), Some(1));
    }
}
