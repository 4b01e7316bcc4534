//! Online min/mean/max accumulation
//!
//! Summaries are folded one sample at a time so a stream of any length is
//! tracked in constant memory.

use serde::Serialize;

/// Min/mean/max of a sample series, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Smallest sample
    pub min: f64,
    /// Arithmetic mean of all samples
    pub mean: f64,
    /// Largest sample
    pub max: f64,
}

/// Running count/min/max/sum over a sample series
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningSummary {
    count: u64,
    min: f64,
    max: f64,
    sum: f64,
}

impl RunningSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the summary
    pub fn push(&mut self, sample: f64) {
        if self.count == 0 {
            self.min = sample;
            self.max = sample;
        } else {
            self.min = self.min.min(sample);
            self.max = self.max.max(sample);
        }
        self.sum += sample;
        self.count += 1;
    }

    /// Number of samples folded so far
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Summary over all samples, or `None` when fewer than `min_samples`
    /// have been folded
    pub fn summarize(&self, min_samples: u64) -> Option<SummaryStats> {
        if self.count == 0 || self.count < min_samples {
            return None;
        }

        Some(SummaryStats {
            min: self.min,
            mean: self.sum / self.count as f64,
            max: self.max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let summary = RunningSummary::new();
        assert_eq!(summary.count(), 0);
        assert!(summary.summarize(1).is_none());
        // Zero minimum still needs at least one sample
        assert!(summary.summarize(0).is_none());
    }

    #[test]
    fn test_single_sample() {
        let mut summary = RunningSummary::new();
        summary.push(300.0);

        let stats = summary.summarize(1).unwrap();
        assert_eq!(stats.min, 300.0);
        assert_eq!(stats.mean, 300.0);
        assert_eq!(stats.max, 300.0);
    }

    #[test]
    fn test_min_samples_threshold() {
        let mut summary = RunningSummary::new();
        summary.push(1.0);
        assert!(summary.summarize(2).is_none());

        summary.push(3.0);
        assert!(summary.summarize(2).is_some());
    }

    #[test]
    fn test_min_mean_max() {
        let mut summary = RunningSummary::new();
        for sample in [20.0, 10.0, 40.0, 30.0] {
            summary.push(sample);
        }

        let stats = summary.summarize(1).unwrap();
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 40.0);
        assert!((stats.mean - 25.0).abs() < 1e-9);
        assert_eq!(summary.count(), 4);
    }

    #[test]
    fn test_negative_first_sample() {
        // min/max must seed from the first sample, not from zero
        let mut summary = RunningSummary::new();
        summary.push(-5.0);
        summary.push(-2.0);

        let stats = summary.summarize(1).unwrap();
        assert_eq!(stats.min, -5.0);
        assert_eq!(stats.max, -2.0);
    }
}
