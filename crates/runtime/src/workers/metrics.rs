//! Proof service metrics.
//!
//! Tracks request outcomes, stage timings and queue depth.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Counters shared by the worker and every service handle.
///
/// Counters are atomics; only the per-category failure table takes a lock.
#[derive(Debug, Default)]
pub struct ProofMetrics {
    generated: AtomicU64,
    failed: AtomicU64,

    /// Requests accepted by a handle and not yet answered.
    queue_depth: AtomicU64,
    peak_queue_depth: AtomicU64,

    total_witness_time_nanos: AtomicU64,
    total_proving_time_nanos: AtomicU64,

    failures_by_category: Mutex<BTreeMap<&'static str, u64>>,
}

impl ProofMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful proof and its stage timings.
    pub fn record_success(&self, witness_time: Duration, proving_time: Duration) {
        self.generated.fetch_add(1, Ordering::Relaxed);
        self.total_witness_time_nanos
            .fetch_add(witness_time.as_nanos() as u64, Ordering::Relaxed);
        self.total_proving_time_nanos
            .fetch_add(proving_time.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Records a failed request under `category`.
    pub fn record_failure(&self, category: &'static str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        // A poisoned table still holds valid counts.
        let mut table = self
            .failures_by_category
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *table.entry(category).or_default() += 1;
    }

    /// Called when a request is queued.
    pub fn enqueue(&self) {
        let depth = self.queue_depth.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_queue_depth.fetch_max(depth, Ordering::Relaxed);
    }

    /// Called when a queued request completes or is abandoned.
    pub fn dequeue(&self) {
        let _ = self
            .queue_depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| Some(d.saturating_sub(1)));
    }

    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn queue_depth(&self) -> u64 {
        self.queue_depth.load(Ordering::Relaxed)
    }

    pub fn peak_queue_depth(&self) -> u64 {
        self.peak_queue_depth.load(Ordering::Relaxed)
    }

    pub fn avg_witness_time(&self) -> Duration {
        self.average(&self.total_witness_time_nanos)
    }

    pub fn avg_proving_time(&self) -> Duration {
        self.average(&self.total_proving_time_nanos)
    }

    fn average(&self, total: &AtomicU64) -> Duration {
        match self.generated() {
            0 => Duration::ZERO,
            n => Duration::from_nanos(total.load(Ordering::Relaxed) / n),
        }
    }

    /// Returns success rate as a percentage (0-100).
    pub fn success_rate(&self) -> f64 {
        let generated = self.generated();
        let total = generated + self.failed();
        if total == 0 {
            100.0
        } else {
            (generated as f64 / total as f64) * 100.0
        }
    }

    /// Point-in-time copy of all metrics.
    ///
    /// Fields are read one at a time, so a snapshot taken while requests
    /// complete may mix before and after values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let failures_by_category = self
            .failures_by_category
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();

        MetricsSnapshot {
            generated: self.generated(),
            failed: self.failed(),
            failures_by_category,
            queue_depth: self.queue_depth(),
            peak_queue_depth: self.peak_queue_depth(),
            avg_witness_time: self.avg_witness_time(),
            avg_proving_time: self.avg_proving_time(),
            success_rate: self.success_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub generated: u64,
    pub failed: u64,
    pub failures_by_category: BTreeMap<String, u64>,
    pub queue_depth: u64,
    pub peak_queue_depth: u64,
    pub avg_witness_time: Duration,
    pub avg_proving_time: Duration,
    pub success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics_report_full_success() {
        let snapshot = ProofMetrics::new().snapshot();
        assert_eq!(snapshot.generated, 0);
        assert_eq!(snapshot.success_rate, 100.0);
        assert_eq!(snapshot.avg_proving_time, Duration::ZERO);
    }

    #[test]
    fn test_averages_over_successes_only() {
        let metrics = ProofMetrics::new();
        metrics.record_success(Duration::from_millis(10), Duration::from_millis(100));
        metrics.record_success(Duration::from_millis(30), Duration::from_millis(300));
        metrics.record_failure("invalid_input");

        assert_eq!(metrics.avg_witness_time(), Duration::from_millis(20));
        assert_eq!(metrics.avg_proving_time(), Duration::from_millis(200));
        let rate = metrics.success_rate();
        assert!((rate - 200.0 / 3.0).abs() < 1e-9, "{rate}");
    }

    #[test]
    fn test_failures_grouped_by_category() {
        let metrics = ProofMetrics::new();
        metrics.record_failure("invalid_input");
        metrics.record_failure("invalid_input");
        metrics.record_failure("backend_fault");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.failed, 3);
        assert_eq!(snapshot.failures_by_category["invalid_input"], 2);
        assert_eq!(snapshot.failures_by_category["backend_fault"], 1);
    }

    #[test]
    fn test_queue_depth_tracks_peak_and_never_underflows() {
        let metrics = ProofMetrics::new();
        metrics.enqueue();
        metrics.enqueue();
        metrics.dequeue();
        metrics.enqueue();
        assert_eq!(metrics.queue_depth(), 2);
        assert_eq!(metrics.peak_queue_depth(), 2);

        for _ in 0..5 {
            metrics.dequeue();
        }
        assert_eq!(metrics.queue_depth(), 0);
        assert_eq!(metrics.peak_queue_depth(), 2);
    }
}
