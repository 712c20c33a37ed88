use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of half-hour intervals in one 30917 record.
pub const INTERVALS_PER_DAY: usize = 48;

/// Length of one interval in minutes.
pub const INTERVAL_MINUTES: i64 = 30;

/// Width of the meter identifier at the start of a record code.
pub const METER_ID_LEN: usize = 5;

// ── Channel ───────────────────────────────────────────────────────────────────

/// One of the four quantities a meter reports, keyed by the last digit of the
/// record code.
///
/// Declaration order follows the suffix, so the derived `Ord` sorts channels
/// as 1, 2, 3, 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// Suffix 1, kWh.
    ActiveGeneration,
    /// Suffix 2, kWh.
    ActiveConsumption,
    /// Suffix 3, kVArh.
    ReactiveGeneration,
    /// Suffix 4, kVArh.
    ReactiveConsumption,
}

impl Channel {
    /// All channels in suffix order.
    pub const ALL: [Channel; 4] = [
        Channel::ActiveGeneration,
        Channel::ActiveConsumption,
        Channel::ReactiveGeneration,
        Channel::ReactiveConsumption,
    ];

    /// Map a record-code suffix to a channel. `None` for anything but 1..=4.
    pub fn from_suffix(suffix: u8) -> Option<Self> {
        match suffix {
            1 => Some(Channel::ActiveGeneration),
            2 => Some(Channel::ActiveConsumption),
            3 => Some(Channel::ReactiveGeneration),
            4 => Some(Channel::ReactiveConsumption),
            _ => None,
        }
    }

    /// The numeric suffix this channel is encoded with.
    pub fn suffix(self) -> u8 {
        match self {
            Channel::ActiveGeneration => 1,
            Channel::ActiveConsumption => 2,
            Channel::ReactiveGeneration => 3,
            Channel::ReactiveConsumption => 4,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Channel::ActiveGeneration | Channel::ActiveConsumption)
    }

    /// Energy unit of the interval values.
    pub fn unit(self) -> &'static str {
        if self.is_active() {
            "kWh"
        } else {
            "kVArh"
        }
    }

    /// Display label used in the `Type` column of exports.
    pub fn label(self) -> &'static str {
        match self {
            Channel::ActiveGeneration => "Active generation(1) (kWh)",
            Channel::ActiveConsumption => "Active consumption(2) (kWh)",
            Channel::ReactiveGeneration => "Reactive generation(3) (kVArh)",
            Channel::ReactiveConsumption => "Reactive consumption(4) (kVArh)",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// One half-hour value of one meter channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Start of the interval, local meter time.
    pub timestamp: NaiveDateTime,
    /// Meter identifier (first five characters of the record code).
    pub meter_id: String,
    pub channel: Channel,
    /// Energy for the interval, in [`Channel::unit`].
    pub value: f64,
}

impl Reading {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }

    /// The deduplication key of this reading.
    pub fn key(&self) -> ReadingKey {
        ReadingKey {
            timestamp: self.timestamp,
            meter_id: self.meter_id.clone(),
            channel: self.channel,
        }
    }
}

/// Identity of a reading in the canonical dataset.
///
/// Field order matters: the derived `Ord` sorts by timestamp first, which is
/// the canonical dataset order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadingKey {
    pub timestamp: NaiveDateTime,
    pub meter_id: String,
    pub channel: Channel,
}

impl ReadingKey {
    pub fn into_reading(self, value: f64) -> Reading {
        Reading {
            timestamp: self.timestamp,
            meter_id: self.meter_id,
            channel: self.channel,
            value,
        }
    }
}

// ── Files ─────────────────────────────────────────────────────────────────────

/// One input file as handed over by an acquisition collaborator.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub content: Vec<u8>,
    /// Delivery date of the file, used to place year-less header dates.
    pub context_date: NaiveDate,
}

impl RawFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>, context_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            context_date,
        }
    }

    pub fn descriptor(&self) -> FileDescriptor {
        FileDescriptor {
            name: self.name.clone(),
            size: self.content.len() as u64,
        }
    }
}

/// Name and size of a parsed file, for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

impl FileDescriptor {
    /// Size as `"{:.1} KB"`.
    pub fn size_label(&self) -> String {
        format!("{:.1} KB", self.size as f64 / 1024.0)
    }
}

// ── Issues ────────────────────────────────────────────────────────────────────

/// A problem reported back to the user for one ingestion batch.
///
/// Issues never abort a batch; they travel next to the (possibly partial)
/// dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestIssue {
    /// The file could not be read at all and was skipped.
    FileRead { file: String, reason: String },
    /// No usable date in the header; every record of the file was discarded.
    DateNotFound { file: String },
    /// The sum of the 48 values differs from the declared daily total.
    /// The readings were kept.
    ChecksumMismatch {
        file: String,
        meter_id: String,
        suffix: u8,
        expected: f64,
        calculated: f64,
    },
}

impl IngestIssue {
    /// `true` for advisory issues whose data was still ingested.
    pub fn is_warning(&self) -> bool {
        matches!(self, IngestIssue::ChecksumMismatch { .. })
    }

    pub fn file(&self) -> &str {
        match self {
            IngestIssue::FileRead { file, .. }
            | IngestIssue::DateNotFound { file }
            | IngestIssue::ChecksumMismatch { file, .. } => file,
        }
    }
}

impl fmt::Display for IngestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestIssue::FileRead { file, reason } => {
                write!(f, "{file}: Failed to read file ({reason})")
            }
            IngestIssue::DateNotFound { file } => write!(f, "{file}: Date not found in header"),
            IngestIssue::ChecksumMismatch {
                file,
                meter_id,
                suffix,
                expected,
                calculated,
            } => write!(
                f,
                "Warn: {file} ({meter_id}-{suffix}) SumMismatch: File={expected:.1}, Calc={calculated:.1}"
            ),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
