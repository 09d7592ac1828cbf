use crate::client::constants::*;
use crate::client::sample::Sample;
use hdrhistogram::Histogram;
use tracing::{debug, warn};

/// Average, minimum and maximum of one measured quantity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    fn from_values<I: Iterator<Item = f64>>(values: I) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            avg: sum / count as f64,
            min,
            max,
        })
    }
}

/// Aggregate statistics over the samples currently retained in a history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub download: Summary,
    pub upload: Summary,
    pub latency: Summary,
    pub count: usize,
    /// Median latency in ms, from an HDR histogram of the retained samples
    pub latency_p50: Option<f64>,
    pub latency_p90: Option<f64>,
}

impl HistoryStats {
    /// Computes statistics over `samples`; None when there are none
    pub fn from_samples<'a, I>(samples: I) -> Option<Self>
    where
        I: Iterator<Item = &'a Sample> + Clone,
    {
        let download = Summary::from_values(samples.clone().map(|s| s.download_mbps))?;
        let upload = Summary::from_values(samples.clone().map(|s| s.upload_mbps))?;
        let latency = Summary::from_values(samples.clone().map(|s| s.latency_ms))?;
        let count = samples.clone().count();

        let (latency_p50, latency_p90) = match latency_percentiles(samples) {
            Some(hist) => (
                Some(hist.value_at_quantile(0.5) as f64 / 1000.0),
                Some(hist.value_at_quantile(0.9) as f64 / 1000.0),
            ),
            None => (None, None),
        };

        debug!(
            count = count,
            avg_download_mbps = download.avg,
            avg_upload_mbps = upload.avg,
            avg_latency_ms = latency.avg,
            "Statistics calculated"
        );

        Some(Self {
            download,
            upload,
            latency,
            count,
            latency_p50,
            latency_p90,
        })
    }
}

/// Records latencies (in microseconds) into a histogram for percentile queries
fn latency_percentiles<'a, I>(samples: I) -> Option<Histogram<u64>>
where
    I: Iterator<Item = &'a Sample>,
{
    let mut hist = match Histogram::<u64>::new_with_bounds(
        HISTOGRAM_LOW_BOUND_US,
        HISTOGRAM_HIGH_BOUND_US,
        HISTOGRAM_SIGNIFICANT_DIGITS,
    ) {
        Ok(hist) => hist,
        Err(e) => {
            warn!(error = %e, "Failed to create latency histogram");
            return None;
        }
    };

    for sample in samples {
        let micros = (sample.latency_ms * 1000.0).round() as u64;
        let clamped = micros.clamp(HISTOGRAM_LOW_BOUND_US, HISTOGRAM_HIGH_BOUND_US);
        if let Err(e) = hist.record(clamped) {
            warn!(latency_us = micros, error = %e, "Failed to record latency");
        }
    }

    if hist.is_empty() {
        None
    } else {
        Some(hist)
    }
}
