use crate::client::constants::{BITS_PER_BYTE, BITS_PER_MEGABIT, NANOS_PER_MILLI};
use chrono::{DateTime, Local};
use std::time::Duration;

/// One completed measurement cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    /// Round-trip latency; 0.0 when the probe got no answer
    pub latency_ms: f64,
    /// False when `latency_ms` is the 0.0 stand-in for "no answer"
    pub probe_answered: bool,
}

impl Sample {
    pub fn new(
        timestamp: DateTime<Local>,
        download_mbps: f64,
        upload_mbps: f64,
        latency_ms: Option<f64>,
    ) -> Self {
        Self {
            timestamp,
            download_mbps,
            upload_mbps,
            latency_ms: latency_ms.unwrap_or(0.0),
            probe_answered: latency_ms.is_some(),
        }
    }

    /// Builds a sample stamped with the current local time
    pub fn now(download_mbps: f64, upload_mbps: f64, latency_ms: Option<f64>) -> Self {
        Self::new(Local::now(), download_mbps, upload_mbps, latency_ms)
    }

    /// Wall-clock label used on chart axes
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Converts a byte rate to megabits per second (decimal megabits)
pub fn bytes_per_sec_to_mbps(bytes_per_sec: f64) -> f64 {
    bytes_per_sec * BITS_PER_BYTE / BITS_PER_MEGABIT
}

/// Converts a round-trip time to milliseconds
pub fn duration_to_ms(rtt: Duration) -> f64 {
    rtt.as_nanos() as f64 / NANOS_PER_MILLI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gigabit_conversion() {
        assert_eq!(bytes_per_sec_to_mbps(125_000_000.0), 1000.0);
        assert_eq!(bytes_per_sec_to_mbps(0.0), 0.0);
    }

    #[test]
    fn test_latency_conversion() {
        assert_eq!(duration_to_ms(Duration::from_millis(42)), 42.0);
        assert_eq!(duration_to_ms(Duration::from_micros(1500)), 1.5);
    }

    #[test]
    fn test_unanswered_probe_is_zero() {
        let sample = Sample::now(10.0, 5.0, None);
        assert_eq!(sample.latency_ms, 0.0);
        assert!(!sample.probe_answered);

        let sample = Sample::now(10.0, 5.0, Some(12.5));
        assert_eq!(sample.latency_ms, 12.5);
        assert!(sample.probe_answered);
    }

    #[test]
    fn test_time_label_format() {
        let label = Sample::now(1.0, 1.0, None).time_label();
        assert_eq!(label.len(), 8);
        assert_eq!(label.matches(':').count(), 2);
    }
}
