//! Summary statistics over trial durations.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summary of a set of timed trials, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Number of samples
    pub count: usize,
    /// Arithmetic mean
    pub mean_ns: f64,
    /// Median (mean of the two middle samples for an even count)
    pub median_ns: f64,
    /// 90th percentile, nearest rank
    pub p90_ns: u64,
    /// 99th percentile, nearest rank
    pub p99_ns: u64,
    /// Fastest sample
    pub min_ns: u64,
    /// Slowest sample
    pub max_ns: u64,
    /// Population standard deviation
    pub stddev_ns: f64,
}

impl Stats {
    /// Computes statistics over `samples`, or `None` if there are none.
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<u64> = samples.iter().map(|d| saturating_nanos(*d)).collect();
        sorted.sort_unstable();

        let count = sorted.len();
        let mean = sorted.iter().map(|&ns| ns as f64).sum::<f64>() / count as f64;
        let variance = sorted
            .iter()
            .map(|&ns| {
                let diff = ns as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / count as f64;

        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] as f64 + sorted[count / 2] as f64) / 2.0
        } else {
            sorted[count / 2] as f64
        };

        Some(Self {
            count,
            mean_ns: mean,
            median_ns: median,
            p90_ns: nearest_rank(&sorted, 90.0),
            p99_ns: nearest_rank(&sorted, 99.0),
            min_ns: sorted[0],
            max_ns: sorted[count - 1],
            stddev_ns: variance.sqrt(),
        })
    }

    /// Mean as a [`Duration`].
    pub fn mean(&self) -> Duration {
        Duration::from_nanos(self.mean_ns.round() as u64)
    }

    /// Median as a [`Duration`].
    pub fn median(&self) -> Duration {
        Duration::from_nanos(self.median_ns.round() as u64)
    }

    /// Throughput in MiB/s for `bytes` processed per trial, at the mean time.
    pub fn throughput_mib_s(&self, bytes: usize) -> f64 {
        if self.mean_ns <= 0.0 {
            return 0.0;
        }
        (bytes as f64 / (1024.0 * 1024.0)) / (self.mean_ns / 1e9)
    }
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Nearest-rank percentile of an ascending, non-empty slice.
fn nearest_rank(sorted: &[u64], percentile: f64) -> u64 {
    let rank = ((percentile / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&v| Duration::from_millis(v)).collect()
    }

    #[test]
    fn test_empty_has_no_stats() {
        assert!(Stats::from_samples(&[]).is_none());
    }

    #[test]
    fn test_basic_summary() {
        let stats = Stats::from_samples(&ms(&[4, 2, 8, 6])).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min_ns, 2_000_000);
        assert_eq!(stats.max_ns, 8_000_000);
        assert_eq!(stats.mean(), Duration::from_millis(5));
        assert_eq!(stats.median(), Duration::from_millis(5));
        // Population stddev of 2, 4, 6, 8 is sqrt(5)
        assert!((stats.stddev_ns - 5f64.sqrt() * 1e6).abs() < 1.0);
    }

    #[test]
    fn test_nearest_rank_percentiles() {
        let samples: Vec<Duration> = (1..=10).map(Duration::from_millis).collect();
        let stats = Stats::from_samples(&samples).unwrap();
        assert_eq!(stats.p90_ns, 9_000_000);
        assert_eq!(stats.p99_ns, 10_000_000);
        assert_eq!(stats.median(), Duration::from_micros(5_500));

        let single = Stats::from_samples(&ms(&[3])).unwrap();
        assert_eq!(single.p90_ns, 3_000_000);
        assert_eq!(single.stddev_ns, 0.0);
    }

    #[test]
    fn test_throughput() {
        let stats = Stats::from_samples(&ms(&[1000, 1000])).unwrap();
        let mib = 1024 * 1024;
        assert!((stats.throughput_mib_s(10 * mib) - 10.0).abs() < 1e-9);
    }
}
