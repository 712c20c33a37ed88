//! Header date resolution.
//!
//! The first line of a 30917 file looks like `((//30917:250101:000057:++`.
//! Its second colon-separated field carries the covered day either as
//! `YYMMDD` or as a year-less `MMDD`; the latter is placed using the date the
//! file was delivered.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Marker every 30917 header carries.
pub const LAYOUT_MARKER: &str = "30917";

/// Why a header yielded no date. Every variant rejects the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("header does not contain the 30917 marker")]
    MissingMarker,
    #[error("header has no date field")]
    MissingDateField,
    #[error("unsupported date field '{0}'")]
    UnsupportedForm(String),
    #[error("no such calendar day {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

/// Resolve the calendar day a file covers from its header line.
///
/// `context_date` is only consulted for 4-digit `MMDD` fields. A December
/// file delivered in January belongs to the previous year, a January file
/// delivered in December to the next one.
pub fn resolve_header_date(header: &str, context_date: NaiveDate) -> Result<NaiveDate, HeaderError> {
    if !header.contains(LAYOUT_MARKER) {
        return Err(HeaderError::MissingMarker);
    }

    let field = header
        .split(':')
        .nth(1)
        .map(str::trim)
        .ok_or(HeaderError::MissingDateField)?;

    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HeaderError::UnsupportedForm(field.to_string()));
    }

    let (year, month, day) = match field.len() {
        6 => (
            2000 + digits(&field[0..2]) as i32,
            digits(&field[2..4]),
            digits(&field[4..6]),
        ),
        4 => {
            let month = digits(&field[0..2]);
            let day = digits(&field[2..4]);
            (placed_year(month, context_date), month, day)
        }
        _ => return Err(HeaderError::UnsupportedForm(field.to_string())),
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or(HeaderError::InvalidDate { year, month, day })
}

/// Year for a year-less file month relative to the delivery date.
fn placed_year(file_month: u32, context_date: NaiveDate) -> i32 {
    match (file_month, context_date.month()) {
        (12, 1) => context_date.year() - 1,
        (1, 12) => context_date.year() + 1,
        _ => context_date.year(),
    }
}

/// Value of a run of ASCII digits already validated by the caller.
fn digits(s: &str) -> u32 {
    s.bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
