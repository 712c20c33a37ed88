//! Small descriptive-statistics helpers shared by the anomaly tagger and the
//! summary views.

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Allowed gap between a record's declared daily total and the sum of its
/// 48 values before a mismatch is reported.
pub const DEFAULT_CHECKSUM_TOLERANCE: f64 = 1.0;

/// `|z|` above which a reading is flagged as anomalous.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

// ── SeriesStats ───────────────────────────────────────────────────────────────

/// Running descriptive statistics over one series of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    mean: f64,
    m2: f64,
}

impl Default for SeriesStats {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: 0.0,
            m2: 0.0,
        }
    }
}

impl SeriesStats {
    /// Build statistics from an iterator of values.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut stats = Self::default();
        for v in values {
            stats.push(v);
        }
        stats
    }

    /// Welford update; constant series keep an exactly zero spread.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Arithmetic mean, `0.0` when empty.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation (n − 1 denominator).
    ///
    /// Returns `0.0` for fewer than two values.
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / (self.count - 1) as f64).sqrt()
    }
}

// ── z-score ───────────────────────────────────────────────────────────────────

/// Standard score of `value`; a zero deviation is replaced by 1 so constant
/// series always score 0.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    let divisor = if std_dev == 0.0 { 1.0 } else { std_dev };
    (value - mean) / divisor
}

// ── Tests ──────────────────────────────────────────────────────────────────────
