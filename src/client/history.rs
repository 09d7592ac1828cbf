use crate::client::constants::DEFAULT_HISTORY_LEN;
use crate::client::sample::Sample;
use crate::client::statistics::HistoryStats;
use std::collections::VecDeque;
use tracing::debug;

/// Fixed-capacity FIFO of the most recent samples.
///
/// Samples are kept in insertion (chronological) order. Adding to a full
/// history evicts the oldest sample first; evicted samples are gone for
/// good and no longer count towards [`BoundedHistory::stats`].
#[derive(Debug, Clone)]
pub struct BoundedHistory {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl BoundedHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add(&mut self, sample: Sample) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() >= self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                debug!(evicted = %evicted.time_label(), "History full, evicting oldest sample");
            }
        }
        self.samples.push_back(sample);
    }

    /// Statistics over the retained samples, or None when empty
    pub fn stats(&self) -> Option<HistoryStats> {
        HistoryStats::from_samples(self.samples.iter())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> + Clone {
        self.samples.iter()
    }

    pub fn downloads(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.download_mbps).collect()
    }

    pub fn uploads(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.upload_mbps).collect()
    }

    pub fn latencies(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.latency_ms).collect()
    }

    pub fn time_labels(&self) -> Vec<String> {
        self.samples.iter().map(Sample::time_label).collect()
    }
}

impl Default for BoundedHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}
