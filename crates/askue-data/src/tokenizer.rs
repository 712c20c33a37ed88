//! Data-line tokenizer.
//!
//! A data line has the shape `(CODE):CHECKSUM:V1:V2:...:V48`. The last
//! character of `CODE` selects the channel and its first five characters are
//! the meter id. Numbers use either `.` or `,` as the decimal separator.

use askue_core::models::{Channel, INTERVALS_PER_DAY, METER_ID_LEN};
use thiserror::Error;

/// One tokenized data line.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub meter_id: String,
    pub channel: Channel,
    /// Declared daily total; `0.0` when absent or unparseable.
    pub expected_sum: f64,
    pub values: [f64; INTERVALS_PER_DAY],
}

impl RawRecord {
    pub fn suffix(&self) -> u8 {
        self.channel.suffix()
    }
}

/// A line that looked like a record but could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("interval {index} has non-numeric value '{raw}'")]
    InvalidValue { index: usize, raw: String },
}

/// Outcome of tokenizing one line that is not a hard failure.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// A usable record.
    Record(RawRecord),
    /// Not a data line (header, comment, blank).
    NotData,
    /// A data line intentionally ignored: short code, non-digit suffix or a
    /// suffix outside 1..=4.
    Skipped,
}

/// `true` when `line` has the shape of a data record.
pub fn is_data_line(line: &str) -> bool {
    line.starts_with('(') && line.contains("):")
}

/// Tokenize one line.
///
/// Skips are silent and returned as [`LineKind::Skipped`]; an unparseable
/// interval value is an `Err` that drops this line only.
pub fn tokenize(line: &str) -> Result<LineKind, LineError> {
    if !is_data_line(line) {
        return Ok(LineKind::NotData);
    }

    let mut fields = line.split(':');
    let code: String = fields
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|&c| c != '(' && c != ')')
        .collect();

    if code.chars().count() < METER_ID_LEN {
        return Ok(LineKind::Skipped);
    }

    let Some(channel) = code
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .and_then(|d| Channel::from_suffix(d as u8))
    else {
        return Ok(LineKind::Skipped);
    };

    let meter_id: String = code.chars().take(METER_ID_LEN).collect();

    let expected_sum = fields.next().and_then(parse_decimal).unwrap_or(0.0);

    let mut values = [0.0; INTERVALS_PER_DAY];
    for (index, raw) in fields.take(INTERVALS_PER_DAY).enumerate() {
        let cleaned = raw.trim();
        if cleaned.is_empty() {
            continue;
        }
        values[index] = parse_decimal(cleaned).ok_or_else(|| LineError::InvalidValue {
            index,
            raw: raw.to_string(),
        })?;
    }

    Ok(LineKind::Record(RawRecord {
        meter_id,
        channel,
        expected_sum,
        values,
    }))
}

/// Parse a decimal that may use `,` as separator. Surrounding whitespace is
/// ignored.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.contains(',') {
        trimmed.replace(',', ".").parse().ok()
    } else {
        trimmed.parse().ok()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
