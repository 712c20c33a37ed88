//! Expansion of a tokenized record into 48 timestamped readings.

use askue_core::models::{Reading, INTERVAL_MINUTES};
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::tokenizer::RawRecord;

/// Result of expanding one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// Exactly 48 readings on the half-hour grid of the file date.
    pub readings: Vec<Reading>,
    /// Sum of the 48 values.
    pub calculated_sum: f64,
    /// Set when the declared total disagrees with `calculated_sum`.
    pub mismatch: Option<ChecksumMismatch>,
}

/// Declared and calculated daily totals that differ beyond tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChecksumMismatch {
    pub expected: f64,
    pub calculated: f64,
}

/// Start of interval `index` on `date`.
pub fn interval_start(date: NaiveDate, index: usize) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN) + Duration::minutes(index as i64 * INTERVAL_MINUTES)
}

/// Expand `record` onto the half-hour grid of `file_date`.
///
/// A declared total of zero or less disables the checksum comparison.
pub fn expand(record: &RawRecord, file_date: NaiveDate, tolerance: f64) -> Expansion {
    let mut calculated_sum = 0.0;
    let readings: Vec<Reading> = record
        .values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            calculated_sum += value;
            Reading {
                timestamp: interval_start(file_date, i),
                meter_id: record.meter_id.clone(),
                channel: record.channel,
                value,
            }
        })
        .collect();

    let expected = record.expected_sum;
    let mismatch = (expected > 0.0 && (calculated_sum - expected).abs() > tolerance).then_some(
        ChecksumMismatch {
            expected,
            calculated: calculated_sum,
        },
    );

    Expansion {
        readings,
        calculated_sum,
        mismatch,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
