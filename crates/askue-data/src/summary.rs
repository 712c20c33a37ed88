//! Energy totals, selection statistics and daily aggregation over a view of
//! readings.

use std::collections::BTreeMap;

use askue_core::models::{Channel, Reading};
use askue_core::stats::SeriesStats;
use chrono::{NaiveDate, NaiveDateTime};

// ── EnergySummary ─────────────────────────────────────────────────────────────

/// Headline totals of a view.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergySummary {
    /// Σ active consumption (suffix 2), kWh.
    pub consumption_active: f64,
    /// Σ reactive consumption (suffix 4), kVArh.
    pub consumption_reactive: f64,
    /// Σ active generation (suffix 1), kWh.
    pub generation_active: f64,
    /// Σ reactive generation (suffix 3), kVArh.
    pub generation_reactive: f64,
    /// Largest single active-consumption interval; `0.0` when there is none.
    pub peak_consumption: f64,
    /// Consumption power factor P / √(P² + Q²); `0.0` without active consumption.
    pub cos_phi: f64,
    pub readings: usize,
}

impl EnergySummary {
    pub fn total(&self, channel: Channel) -> f64 {
        match channel {
            Channel::ActiveGeneration => self.generation_active,
            Channel::ActiveConsumption => self.consumption_active,
            Channel::ReactiveGeneration => self.generation_reactive,
            Channel::ReactiveConsumption => self.consumption_reactive,
        }
    }
}

/// Totals, peak and power factor of `readings`.
pub fn summarize<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> EnergySummary {
    let mut summary = EnergySummary::default();
    let mut peak: Option<f64> = None;

    for r in readings {
        summary.readings += 1;
        match r.channel {
            Channel::ActiveGeneration => summary.generation_active += r.value,
            Channel::ActiveConsumption => {
                summary.consumption_active += r.value;
                peak = Some(peak.map_or(r.value, |p| p.max(r.value)));
            }
            Channel::ReactiveGeneration => summary.generation_reactive += r.value,
            Channel::ReactiveConsumption => summary.consumption_reactive += r.value,
        }
    }

    summary.peak_consumption = peak.unwrap_or(0.0);
    summary.cos_phi = power_factor(summary.consumption_active, summary.consumption_reactive);
    summary
}

/// P / √(P² + Q²), or `0.0` unless `active > 0`.
pub fn power_factor(active: f64, reactive: f64) -> f64 {
    if active > 0.0 {
        active / active.hypot(reactive)
    } else {
        0.0
    }
}

// ── Selection statistics ──────────────────────────────────────────────────────

/// Statistics of one (meter, channel) series inside a selected range.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    /// `"{meter} {channel label}"`.
    pub name: String,
    pub meter_id: String,
    pub channel: Channel,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Result of [`selection_stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionStats {
    /// One entry per series, sorted by name.
    pub series: Vec<SeriesSummary>,
    /// Earliest and latest timestamp actually selected.
    pub range: (NaiveDateTime, NaiveDateTime),
}

/// Per-series statistics for readings with `from <= timestamp <= to`.
///
/// Returns `None` when nothing falls in the range.
pub fn selection_stats<'a>(
    readings: impl IntoIterator<Item = &'a Reading>,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Option<SelectionStats> {
    let mut groups: BTreeMap<(String, Channel), SeriesStats> = BTreeMap::new();
    let mut range: Option<(NaiveDateTime, NaiveDateTime)> = None;

    for r in readings {
        if r.timestamp < from || r.timestamp > to {
            continue;
        }
        groups
            .entry((r.meter_id.clone(), r.channel))
            .or_default()
            .push(r.value);
        range = Some(match range {
            None => (r.timestamp, r.timestamp),
            Some((lo, hi)) => (lo.min(r.timestamp), hi.max(r.timestamp)),
        });
    }

    let range = range?;
    let mut series: Vec<SeriesSummary> = groups
        .into_iter()
        .map(|((meter_id, channel), stats)| SeriesSummary {
            name: format!("{meter_id} {channel}"),
            meter_id,
            channel,
            sum: stats.sum,
            avg: stats.mean(),
            min: stats.min,
            max: stats.max,
        })
        .collect();
    series.sort_by(|a, b| a.name.cmp(&b.name));

    Some(SelectionStats { series, range })
}

// ── Daily totals ──────────────────────────────────────────────────────────────

/// Sum of one series over one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub meter_id: String,
    pub channel: Channel,
    pub total: f64,
    /// Number of half-hour readings that contributed.
    pub intervals: usize,
}

/// Group `readings` by (day, meter, channel), sorted by that key.
pub fn daily_totals<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> Vec<DailyTotal> {
    let mut map: BTreeMap<(NaiveDate, String, Channel), (f64, usize)> = BTreeMap::new();

    for r in readings {
        let slot = map
            .entry((r.date(), r.meter_id.clone(), r.channel))
            .or_insert((0.0, 0));
        slot.0 += r.value;
        slot.1 += 1;
    }

    map.into_iter()
        .map(|((date, meter_id, channel), (total, intervals))| DailyTotal {
            date,
            meter_id,
            channel,
            total,
            intervals,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
