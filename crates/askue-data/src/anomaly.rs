//! Per-series z-score anomaly tagging.
//!
//! Scores are computed on demand for whatever view the caller passes in
//! (usually a filtered slice of the dataset) and are never stored on the
//! dataset itself.

use std::collections::HashMap;

use askue_core::models::{Channel, Reading};
use askue_core::stats::{z_score, SeriesStats, DEFAULT_Z_THRESHOLD};

/// Tuning for [`score_readings`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyConfig {
    /// `|z|` strictly above this marks a reading as anomalous.
    pub z_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_Z_THRESHOLD,
        }
    }
}

/// A reading with the statistics of its (meter, channel) series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredReading<'a> {
    pub reading: &'a Reading,
    pub mean: f64,
    pub std_dev: f64,
    pub z_score: f64,
    pub is_anomaly: bool,
}

/// Score every reading against the other readings of its series.
///
/// Output order matches input order.
pub fn score_readings<'a, I>(readings: I, config: &AnomalyConfig) -> Vec<ScoredReading<'a>>
where
    I: IntoIterator<Item = &'a Reading>,
    I::IntoIter: Clone,
{
    let iter = readings.into_iter();

    let mut series: HashMap<(&'a str, Channel), SeriesStats> = HashMap::new();
    for r in iter.clone() {
        series
            .entry((r.meter_id.as_str(), r.channel))
            .or_default()
            .push(r.value);
    }

    iter.map(|r| {
        let stats = series
            .get(&(r.meter_id.as_str(), r.channel))
            .copied()
            .unwrap_or_default();
        let mean = stats.mean();
        let std_dev = stats.std_dev();
        let z = z_score(r.value, mean, std_dev);
        ScoredReading {
            reading: r,
            mean,
            std_dev,
            z_score: z,
            is_anomaly: z.abs() > config.z_threshold,
        }
    })
    .collect()
}

/// Only the anomalous readings of `readings`, in input order.
pub fn find_anomalies<'a, I>(readings: I, config: &AnomalyConfig) -> Vec<ScoredReading<'a>>
where
    I: IntoIterator<Item = &'a Reading>,
    I::IntoIter: Clone,
{
    score_readings(readings, config)
        .into_iter()
        .filter(|s| s.is_anomaly)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(meter: &str, channel: Channel, values: &[f64]) -> Vec<Reading> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| Reading {
                timestamp: start + Duration::minutes(30 * i as i64),
                meter_id: meter.to_string(),
                channel,
                value,
            })
            .collect()
    }

    fn spike_series() -> Vec<f64> {
        let mut values = vec![1.0; 47];
        values.push(100.0);
        values
    }

    #[test]
    fn test_spike_is_flagged() {
        let readings = series("12345", Channel::ActiveConsumption, &spike_series());
        let anomalies = find_anomalies(&readings, &AnomalyConfig::default());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].reading.value, 100.0);
        assert!(anomalies[0].z_score > 3.0);
    }

    #[test]
    fn test_constant_series_never_flagged() {
        let readings = series("12345", Channel::ActiveConsumption, &[0.7; 48]);
        let scored = score_readings(&readings, &AnomalyConfig::default());
        assert_eq!(scored.len(), 48);
        assert!(scored.iter().all(|s| s.z_score == 0.0 && !s.is_anomaly));
        assert!(scored.iter().all(|s| s.std_dev == 0.0));
    }

    #[test]
    fn test_series_are_scored_independently() {
        // A spike in one meter must not be diluted by, or leak into, another.
        let mut readings = series("11111", Channel::ActiveConsumption, &spike_series());
        readings.extend(series("22222", Channel::ActiveConsumption, &[50.0; 48]));
        readings.extend(series("11111", Channel::ReactiveConsumption, &[100.0; 48]));

        let anomalies = find_anomalies(&readings, &AnomalyConfig::default());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].reading.meter_id, "11111");
        assert_eq!(anomalies[0].reading.channel, Channel::ActiveConsumption);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let values = [1.0, 2.0, 3.0, 4.0, 10.0];
        let readings = series("12345", Channel::ActiveGeneration, &values);
        assert!(find_anomalies(&readings, &AnomalyConfig::default()).is_empty());

        let strict = AnomalyConfig { z_threshold: 1.5 };
        let flagged = find_anomalies(&readings, &strict);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].reading.value, 10.0);
    }

    #[test]
    fn test_single_reading_scores_zero() {
        let readings = series("12345", Channel::ActiveGeneration, &[5.0]);
        let scored = score_readings(&readings, &AnomalyConfig::default());
        assert_eq!(scored[0].z_score, 0.0);
        assert!(!scored[0].is_anomaly);
    }

    #[test]
    fn test_scores_keep_input_order() {
        let readings = series("12345", Channel::ActiveGeneration, &[3.0, 1.0, 2.0]);
        let scored = score_readings(&readings, &AnomalyConfig::default());
        let values: Vec<f64> = scored.iter().map(|s| s.reading.value).collect();
        assert_eq!(values, vec![3.0, 1.0, 2.0]);
        assert!((scored[0].mean - 2.0).abs() < 1e-12);
        assert!((scored[0].std_dev - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        let readings: Vec<Reading> = Vec::new();
        assert!(score_readings(&readings, &AnomalyConfig::default()).is_empty());
    }
}
