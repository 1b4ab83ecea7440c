//! Fetch cycle metrics
//!
//! Tracks latency percentiles and outcome counts for the store's fetches.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for percentile calculation
const MAX_SAMPLES: usize = 100;

/// How a fetch cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Accepted and applied to the store
    Applied,
    /// Current fetch that failed (transport or validation)
    Failed,
    /// Superseded by a newer fetch and ignored
    Discarded,
}

/// Snapshot of the collected metrics
#[derive(Debug, Clone, PartialEq)]
pub struct FetchMetrics {
    /// Name of the provider
    pub provider_name: String,
    /// 50th percentile latency in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency in milliseconds
    pub latency_p99_ms: f64,
    /// Share of non-discarded cycles that were applied (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of completed cycles
    pub total_fetches: u64,
    /// Cycles that ended in a failure shown to the user
    pub failed_fetches: u64,
    /// Cycles whose result arrived after a newer fetch started
    pub discarded_fetches: u64,
}

impl FetchMetrics {
    /// Creates metrics with no data
    pub fn empty(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_fetches: 0,
            failed_fetches: 0,
            discarded_fetches: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    samples: VecDeque<f64>,
    total: u64,
    failed: u64,
    discarded: u64,
}

/// Collects fetch metrics for one store
pub struct MetricsCollector {
    provider_name: String,
    counters: RwLock<Counters>,
}

impl MetricsCollector {
    /// Creates a new metrics collector for a provider
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            counters: RwLock::new(Counters {
                samples: VecDeque::with_capacity(MAX_SAMPLES),
                ..Counters::default()
            }),
        }
    }

    /// Records a completed fetch cycle
    pub async fn record(&self, duration: Duration, outcome: FetchOutcome) {
        let mut counters = self.counters.write().await;
        counters.total += 1;

        match outcome {
            FetchOutcome::Applied => {
                if counters.samples.len() >= MAX_SAMPLES {
                    counters.samples.pop_front();
                }
                counters.samples.push_back(duration.as_secs_f64() * 1000.0);
            }
            FetchOutcome::Failed => counters.failed += 1,
            FetchOutcome::Discarded => counters.discarded += 1,
        }
    }

    /// Computes current metrics from collected samples
    pub async fn get_metrics(&self) -> FetchMetrics {
        let counters = self.counters.read().await;
        if counters.total == 0 {
            return FetchMetrics::empty(&self.provider_name);
        }

        let mut latencies: Vec<f64> = counters.samples.iter().copied().collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let settled = counters.total - counters.discarded;
        let success_rate = if settled > 0 {
            (settled - counters.failed) as f64 / settled as f64
        } else {
            1.0
        };

        FetchMetrics {
            provider_name: self.provider_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_fetches: counters.total,
            failed_fetches: counters.failed,
            discarded_fetches: counters.discarded,
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new("test");

        collector.record(Duration::from_millis(100), FetchOutcome::Applied).await;
        collector.record(Duration::from_millis(200), FetchOutcome::Applied).await;
        collector.record(Duration::from_millis(150), FetchOutcome::Failed).await;
        collector.record(Duration::from_millis(900), FetchOutcome::Discarded).await;

        let metrics = collector.get_metrics().await;

        assert_eq!(metrics.provider_name, "test");
        assert_eq!(metrics.total_fetches, 4);
        assert_eq!(metrics.failed_fetches, 1);
        assert_eq!(metrics.discarded_fetches, 1);
        assert!(metrics.success_rate > 0.6 && metrics.success_rate < 0.7);
        assert!(metrics.latency_p99_ms <= 200.0);
    }

    #[tokio::test]
    async fn test_empty_metrics() {
        let metrics = MetricsCollector::new("test").get_metrics().await;
        assert_eq!(metrics, FetchMetrics::empty("test"));
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0];
        assert_eq!(percentile(&values, 50.0), 6.0);
        assert_eq!(percentile(&values, 99.0), 11.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
