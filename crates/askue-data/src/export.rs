//! Tabular CSV export and import of readings.
//!
//! The columns are fixed: `DateTime, Date, Time, MeterID, Type, Suffix,
//! Value`. The same layout doubles as the on-disk format of the canonical
//! dataset between runs.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use askue_core::error::{AskueError, Result};
use askue_core::models::{Channel, Reading};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::Dataset;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// One CSV row.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "DateTime")]
    datetime: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "MeterID")]
    meter_id: String,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Suffix")]
    suffix: u8,
    #[serde(rename = "Value")]
    value: f64,
}

impl From<&Reading> for CsvRow {
    fn from(r: &Reading) -> Self {
        Self {
            datetime: r.timestamp.format(DATETIME_FORMAT).to_string(),
            date: r.timestamp.format(DATE_FORMAT).to_string(),
            time: r.timestamp.format(TIME_FORMAT).to_string(),
            meter_id: r.meter_id.clone(),
            kind: r.channel.label().to_string(),
            suffix: r.channel.suffix(),
            value: r.value,
        }
    }
}

impl TryFrom<CsvRow> for Reading {
    type Error = AskueError;

    fn try_from(row: CsvRow) -> Result<Self> {
        let timestamp = NaiveDateTime::parse_from_str(row.datetime.trim(), DATETIME_FORMAT)
            .map_err(|e| AskueError::TimestampParse(format!("'{}': {}", row.datetime, e)))?;
        let channel =
            Channel::from_suffix(row.suffix).ok_or(AskueError::UnknownChannel(row.suffix))?;
        Ok(Reading {
            timestamp,
            meter_id: row.meter_id,
            channel,
            value: row.value,
        })
    }
}

// ── Streams ───────────────────────────────────────────────────────────────────

/// Write `readings` as CSV with a header row.
pub fn write_csv<'a, W: Write>(
    writer: W,
    readings: impl IntoIterator<Item = &'a Reading>,
) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for reading in readings {
        wtr.serialize(CsvRow::from(reading))?;
        rows += 1;
    }
    wtr.flush()?;
    Ok(rows)
}

/// Read readings from CSV. The channel comes from the `Suffix` column; the
/// `Type`, `Date` and `Time` columns are informational.
///
/// Fields are read verbatim: `MeterID` is part of the reading key and keeps
/// any whitespace it was written with.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Reading>> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize::<CsvRow>()
        .map(|row| Reading::try_from(row?))
        .collect()
}

// ── Dataset files ─────────────────────────────────────────────────────────────

/// Atomically write `dataset` to `path`, creating parent directories.
pub fn save_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("csv.tmp");
    let file = File::create(&tmp)?;
    let rows = write_csv(file, dataset)?;
    std::fs::rename(&tmp, path)?;

    debug!("Saved {} readings to {}", rows, path.display());
    Ok(())
}

/// Load a dataset previously written by [`save_dataset`] or [`write_csv`].
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let file = File::open(path).map_err(|source| AskueError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let readings = read_csv(file)?;
    debug!("Loaded {} readings from {}", readings.len(), path.display());
    Ok(Dataset::from_readings(readings))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn reading(t: &str, meter: &str, channel: Channel, value: f64) -> Reading {
        Reading {
            timestamp: NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M").unwrap(),
            meter_id: meter.to_string(),
            channel,
            value,
        }
    }

    fn sample() -> Dataset {
        Dataset::from_readings(vec![
            reading("2025-01-01 00:00", "01234", Channel::ActiveConsumption, 1.5),
            reading("2025-01-01 23:30", "01234", Channel::ReactiveGeneration, 0.25),
        ])
    }

    fn to_string(readings: &Dataset) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, readings).unwrap();
        String::from_utf8(buf).unwrap()
    }

    // ── write_csv ─────────────────────────────────────────────────────────────

    #[test]
    fn test_csv_header_and_row_shape() {
        let text = to_string(&sample());
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("DateTime,Date,Time,MeterID,Type,Suffix,Value")
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("2025-01-01 00:00:00,2025-01-01,00:00:00,01234,"));
        assert!(first.contains(",2,1.5"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_write_reports_row_count() {
        let mut buf = Vec::new();
        assert_eq!(write_csv(&mut buf, &sample()).unwrap(), 2);
    }

    // ── read_csv ──────────────────────────────────────────────────────────────

    #[test]
    fn test_read_back_preserves_rows() {
        let ds = sample();
        let text = to_string(&ds);
        let back = Dataset::from_readings(read_csv(text.as_bytes()).unwrap());
        assert_eq!(back, ds);
    }

    #[test]
    fn test_read_keeps_leading_zero_meter() {
        let text = to_string(&sample());
        let rows = read_csv(text.as_bytes()).unwrap();
        assert_eq!(rows[0].meter_id, "01234");
    }

    #[test]
    fn test_reload_keeps_meter_whitespace_and_key() {
        use crate::parser::{parse_batch, ParserConfig};
        use askue_core::models::RawFile;
        use chrono::NaiveDate;

        let file = RawFile::new(
            "spaced.txt",
            b"((//30917:250101:000057:++\n( 12342):0:1\n".to_vec(),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
        );
        let parsed = parse_batch(&[file], &ParserConfig::default()).dataset;
        assert_eq!(parsed.readings()[0].meter_id, " 1234");

        let reloaded = Dataset::from_readings(read_csv(to_string(&parsed).as_bytes()).unwrap());
        assert_eq!(reloaded, parsed);

        let merged = reloaded.merge(parsed);
        assert_eq!(merged.len(), 48);
    }

    #[test]
    fn test_read_rejects_unknown_suffix() {
        let text = "DateTime,Date,Time,MeterID,Type,Suffix,Value\n\
                    2025-01-01 00:00:00,2025-01-01,00:00:00,12345,x,7,1.0\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, AskueError::UnknownChannel(7)));
    }

    #[test]
    fn test_read_rejects_bad_timestamp() {
        let text = "DateTime,Date,Time,MeterID,Type,Suffix,Value\n\
                    01.01.2025 00:00,2025-01-01,00:00:00,12345,x,2,1.0\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, AskueError::TimestampParse(_)));
    }

    #[test]
    fn test_read_rejects_bad_value() {
        let text = "DateTime,Date,Time,MeterID,Type,Suffix,Value\n\
                    2025-01-01 00:00:00,2025-01-01,00:00:00,12345,x,2,abc\n";
        assert!(matches!(
            read_csv(text.as_bytes()).unwrap_err(),
            AskueError::Csv(_)
        ));
    }

    // ── dataset files ─────────────────────────────────────────────────────────

    #[test]
    fn test_save_and_load_dataset() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("dataset.csv");

        save_dataset(&path, &sample()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("csv.tmp").exists());
        assert_eq!(load_dataset(&path).unwrap(), sample());
    }

    #[test]
    fn test_load_missing_dataset() {
        let tmp = TempDir::new().unwrap();
        let err = load_dataset(&tmp.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, AskueError::FileRead { .. }));
    }
}
