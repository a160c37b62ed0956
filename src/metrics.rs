//! Timing histograms for the per-frame pipeline stages.
//! Fixed-capacity sample rings keep the last N observations per metric and
//! report p50/p95/p99 summaries.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Well-known metric names.
pub mod metric_names {
    pub const DETECT: &str = "t_detect";
    pub const ALARM_UPDATE: &str = "t_alarm_update";
    pub const FRAME_TOTAL: &str = "t_frame_total";
}

/// Last-N sample ring for one metric.
struct SampleRing {
    samples: Vec<f64>,
    pos: usize,
    count: usize,
}

impl SampleRing {
    fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            pos: 0,
            count: 0,
        }
    }

    fn push(&mut self, value: f64) {
        let capacity = self.samples.len();
        self.samples[self.pos] = value;
        self.pos = (self.pos + 1) % capacity;
        self.count = (self.count + 1).min(capacity);
    }

    fn percentile(&self, p: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples[..self.count].to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let idx = ((p / 100.0) * (self.count as f64 - 1.0)).round() as usize;
        sorted[idx.min(self.count - 1)]
    }
}

/// Histogram registry shared across the engine.
pub struct MetricsRegistry {
    histograms: Mutex<HashMap<&'static str, SampleRing>>,
    ring_capacity: usize,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            histograms: Mutex::new(HashMap::new()),
            ring_capacity: 1024,
        }
    }

    /// Record one sample (microseconds) for the named metric.
    pub fn record(&self, name: &'static str, value_us: f64) {
        let mut histograms = self.histograms.lock();
        histograms
            .entry(name)
            .or_insert_with(|| SampleRing::new(self.ring_capacity))
            .push(value_us);
    }

    /// Time a closure and record its duration under `name`.
    pub fn time<T>(&self, name: &'static str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(name, start.elapsed().as_micros() as f64);
        out
    }

    pub fn percentile(&self, name: &str, p: f64) -> f64 {
        let histograms = self.histograms.lock();
        histograms.get(name).map(|r| r.percentile(p)).unwrap_or(0.0)
    }

    /// p50/p95/p99 snapshot of every metric.
    pub fn summary(&self) -> HashMap<String, MetricSummary> {
        let histograms = self.histograms.lock();
        histograms
            .iter()
            .map(|(&name, ring)| {
                (
                    name.to_string(),
                    MetricSummary {
                        p50_us: ring.percentile(50.0),
                        p95_us: ring.percentile(95.0),
                        p99_us: ring.percentile(99.0),
                        count: ring.count,
                    },
                )
            })
            .collect()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedMetrics = Arc<MetricsRegistry>;

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricSummary {
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    pub count: usize,
}
