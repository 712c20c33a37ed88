//! The canonical reading dataset and its merge rules.
//!
//! A [`Dataset`] holds at most one reading per (timestamp, meter, channel)
//! and is always sorted by that key, timestamp first. Merging concatenates
//! and keeps the last occurrence of every key, so newer data replaces older
//! data and merging a dataset into itself changes nothing.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use askue_core::models::{Channel, Reading, ReadingKey};
use chrono::NaiveDate;

// ── Dataset ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    readings: Vec<Reading>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from rows in concatenation order.
    ///
    /// Rows sharing a key collapse to the last one; the result is sorted.
    pub fn from_readings(rows: impl IntoIterator<Item = Reading>) -> Self {
        let mut by_key: BTreeMap<ReadingKey, f64> = BTreeMap::new();
        for reading in rows {
            let value = reading.value;
            let key = ReadingKey {
                timestamp: reading.timestamp,
                meter_id: reading.meter_id,
                channel: reading.channel,
            };
            by_key.insert(key, value);
        }

        Self {
            readings: by_key
                .into_iter()
                .map(|(key, value)| key.into_reading(value))
                .collect(),
        }
    }

    /// Combine `self` with `newer`; on key collisions `newer` wins.
    pub fn merge(self, newer: Dataset) -> Dataset {
        if self.is_empty() {
            return newer;
        }
        if newer.is_empty() {
            return self;
        }
        Self::from_readings(self.readings.into_iter().chain(newer.readings))
    }

    /// In-place form of [`Dataset::merge`].
    pub fn merge_in(&mut self, newer: Dataset) {
        let current = std::mem::take(self);
        *self = current.merge(newer);
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Look up the reading stored under `key`.
    pub fn get(&self, key: &ReadingKey) -> Option<&Reading> {
        self.readings
            .binary_search_by(|r| {
                (&r.timestamp, &r.meter_id, &r.channel).cmp(&(
                    &key.timestamp,
                    &key.meter_id,
                    &key.channel,
                ))
            })
            .ok()
            .map(|idx| &self.readings[idx])
    }

    /// Distinct meter ids, sorted.
    pub fn meters(&self) -> BTreeSet<String> {
        self.readings.iter().map(|r| r.meter_id.clone()).collect()
    }

    /// Distinct channels present, in suffix order.
    pub fn channels(&self) -> BTreeSet<Channel> {
        self.readings.iter().map(|r| r.channel).collect()
    }

    /// First and last calendar day covered.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.readings.first()?;
        let last = self.readings.last()?;
        Some((first.date(), last.date()))
    }

    /// Readings that pass `filter`, in dataset order.
    pub fn filter<'a>(&'a self, filter: &'a DatasetFilter) -> impl Iterator<Item = &'a Reading> + 'a {
        self.readings.iter().filter(move |r| filter.matches(r))
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}

impl FromIterator<Reading> for Dataset {
    fn from_iter<I: IntoIterator<Item = Reading>>(iter: I) -> Self {
        Self::from_readings(iter)
    }
}

// ── DatasetFilter ─────────────────────────────────────────────────────────────

/// Selection of meters, channels and an inclusive day range.
///
/// Empty sets and `None` bounds select everything.
#[derive(Debug, Clone, Default)]
pub struct DatasetFilter {
    pub meters: HashSet<String>,
    pub channels: HashSet<Channel>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DatasetFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_meters<I, S>(mut self, meters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meters.extend(meters.into_iter().map(Into::into));
        self
    }

    pub fn with_channels(mut self, channels: impl IntoIterator<Item = Channel>) -> Self {
        self.channels.extend(channels);
        self
    }

    pub fn with_dates(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn matches(&self, reading: &Reading) -> bool {
        if !self.meters.is_empty() && !self.meters.contains(&reading.meter_id) {
            return false;
        }
        if !self.channels.is_empty() && !self.channels.contains(&reading.channel) {
            return false;
        }
        let day = reading.date();
        if self.from.is_some_and(|from| day < from) {
            return false;
        }
        if self.to.is_some_and(|to| day > to) {
            return false;
        }
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
