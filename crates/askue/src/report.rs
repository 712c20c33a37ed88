//! Plain-text rendering of ingestion results for the terminal.

use std::fmt::Write as _;

use askue_core::formatting::{format_energy, format_number};
use askue_core::models::{Channel, FileDescriptor, IngestIssue};
use askue_data::anomaly::ScoredReading;
use askue_data::summary::{DailyTotal, EnergySummary, SelectionStats};

// ── Files and issues ──────────────────────────────────────────────────────────

pub fn render_files(files: &[FileDescriptor]) -> String {
    let mut out = format!("Files ({})\n", files.len());
    for f in files {
        let _ = writeln!(out, "  {:<40} {:>10}", f.name, f.size_label());
    }
    out
}

/// Errors first, then warnings, each in batch order.
pub fn render_issues(issues: &[IngestIssue]) -> String {
    if issues.is_empty() {
        return String::new();
    }
    let mut out = format!("Issues ({})\n", issues.len());
    let (warnings, errors): (Vec<_>, Vec<_>) = issues.iter().partition(|i| i.is_warning());
    for issue in errors.into_iter().chain(warnings) {
        let _ = writeln!(out, "  {issue}");
    }
    out
}

// ── Summary ───────────────────────────────────────────────────────────────────

pub fn render_summary(summary: &EnergySummary) -> String {
    let mut out = format!("Summary ({} readings)\n", summary.readings);
    for channel in [
        Channel::ActiveConsumption,
        Channel::ReactiveConsumption,
        Channel::ActiveGeneration,
        Channel::ReactiveGeneration,
    ] {
        let _ = writeln!(
            out,
            "  {:<32} {:>16}",
            channel.label(),
            format_energy(summary.total(channel), channel)
        );
    }
    let _ = writeln!(
        out,
        "  {:<32} {:>16}",
        "Peak consumption interval",
        format!("{} kWh", format_number(summary.peak_consumption, 2))
    );
    let _ = writeln!(out, "  {:<32} {:>16.3}", "cos φ", summary.cos_phi);
    out
}

pub fn render_selection(stats: &SelectionStats) -> String {
    let (from, to) = stats.range;
    let mut out = format!("Series {from} .. {to}\n");
    let _ = writeln!(
        out,
        "  {:<40} {:>12} {:>10} {:>10} {:>10}",
        "Series", "Sum", "Avg", "Min", "Max"
    );
    for s in &stats.series {
        let _ = writeln!(
            out,
            "  {:<40} {:>12} {:>10} {:>10} {:>10}",
            s.name,
            format_number(s.sum, 1),
            format_number(s.avg, 2),
            format_number(s.min, 2),
            format_number(s.max, 2)
        );
    }
    out
}

pub fn render_daily(totals: &[DailyTotal]) -> String {
    let mut out = format!("Daily totals ({})\n", totals.len());
    for t in totals {
        let _ = writeln!(
            out,
            "  {}  {}  {}  {:>14}  ({} intervals)",
            t.date,
            t.meter_id,
            t.channel.suffix(),
            format_number(t.total, 1),
            t.intervals
        );
    }
    out
}

pub fn render_anomalies(anomalies: &[ScoredReading<'_>], threshold: f64) -> String {
    let mut out = format!("Anomalies (|z| > {threshold}): {}\n", anomalies.len());
    for a in anomalies {
        let r = a.reading;
        let _ = writeln!(
            out,
            "  {}  {}-{}  value {:>10}  mean {:>10}  z {:+.2}",
            r.timestamp.format("%Y-%m-%d %H:%M"),
            r.meter_id,
            r.channel.suffix(),
            format_number(r.value, 2),
            format_number(a.mean, 2),
            a.z_score
        );
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use askue_core::models::Reading;
    use chrono::{NaiveDate, NaiveDateTime};

    #[test]
    fn test_render_files() {
        let files = vec![FileDescriptor {
            name: "a.txt".to_string(),
            size: 2048,
        }];
        let out = render_files(&files);
        assert!(out.starts_with("Files (1)"));
        assert!(out.contains("a.txt"));
        assert!(out.contains("2.0 KB"));
    }

    #[test]
    fn test_render_issues_errors_first() {
        let issues = vec![
            IngestIssue::ChecksumMismatch {
                file: "w.txt".to_string(),
                meter_id: "12345".to_string(),
                suffix: 1,
                expected: 90.0,
                calculated: 100.0,
            },
            IngestIssue::DateNotFound {
                file: "e.txt".to_string(),
            },
        ];
        let out = render_issues(&issues);
        let err = out.find("e.txt: Date not found in header").unwrap();
        let warn = out.find("Warn: w.txt (12345-1)").unwrap();
        assert!(err < warn);
        assert_eq!(render_issues(&[]), "");
    }

    #[test]
    fn test_render_summary() {
        let summary = EnergySummary {
            consumption_active: 12345.0,
            cos_phi: 0.9,
            readings: 3,
            ..Default::default()
        };
        let out = render_summary(&summary);
        assert!(out.contains("12 345 kWh"));
        assert!(out.contains("0.900"));
    }

    #[test]
    fn test_render_daily() {
        let totals = vec![DailyTotal {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            meter_id: "12345".to_string(),
            channel: Channel::ActiveConsumption,
            total: 1500.0,
            intervals: 48,
        }];
        let out = render_daily(&totals);
        assert!(out.contains("2025-01-01  12345  2"));
        assert!(out.contains("1 500.0"));
    }

    #[test]
    fn test_render_anomalies() {
        let reading = Reading {
            timestamp: NaiveDateTime::parse_from_str("2025-01-01 23:30", "%Y-%m-%d %H:%M")
                .unwrap(),
            meter_id: "12345".to_string(),
            channel: Channel::ActiveConsumption,
            value: 100.0,
        };
        let scored = ScoredReading {
            reading: &reading,
            mean: 3.06,
            std_dev: 14.29,
            z_score: 6.78,
            is_anomaly: true,
        };
        let out = render_anomalies(&[scored], 3.0);
        assert!(out.starts_with("Anomalies (|z| > 3): 1"));
        assert!(out.contains("2025-01-01 23:30  12345-2"));
        assert!(out.contains("+6.78"));
    }
}
