//! Server monitoring and statistics display

use colored::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Bytes in a decimal megabyte, for the status line
const BYTES_PER_MB: f64 = 1_000_000.0;

/// Monitor for tracking server transfer statistics.
///
/// Session handlers bump atomic counters; a background thread renders the
/// status line periodically so transfers are never blocked by the display.
pub struct ServerMonitor {
    counters: ServerCounters,
    start_time: Instant,
    update_interval: Duration,
}

impl ServerMonitor {
    /// Create a new server monitor with the specified update interval in milliseconds
    pub fn new(update_interval_ms: u64) -> Self {
        Self {
            counters: ServerCounters::default(),
            start_time: Instant::now(),
            update_interval: Duration::from_millis(update_interval_ms),
        }
    }

    /// Shared handle to the counters for session threads
    pub fn counters(&self) -> ServerCounters {
        self.counters.clone()
    }

    /// Start the background display thread.
    pub fn start_display(&self) {
        let counters = self.counters.clone();
        let update_interval = self.update_interval;

        thread::spawn(move || {
            let mut last_bytes = 0u64;
            let mut last_tick = Instant::now();

            loop {
                thread::sleep(update_interval);

                let snapshot = counters.snapshot();
                let total = snapshot.bytes_received + snapshot.bytes_sent;
                let now = Instant::now();

                // Instantaneous rate over the last display interval
                let secs = now.duration_since(last_tick).as_secs_f64();
                let rate_mbps = if secs > 0.0 {
                    (total.saturating_sub(last_bytes)) as f64 * 8.0 / BYTES_PER_MB / secs
                } else {
                    0.0
                };

                Self::display_status_line(&snapshot, rate_mbps);

                last_bytes = total;
                last_tick = now;
            }
        });
    }

    /// Renders the activity indicator: busy while data is moving
    fn render_indicator(active: bool) -> String {
        if active {
            "█".green().bold().to_string()
        } else {
            "░".normal().to_string()
        }
    }

    fn display_status_line(stats: &ServerStats, rate_mbps: f64) {
        let active = stats.active_sessions > 0;
        let status = if active { "ACTIVE" } else { "IDLE" };
        print!(
            "\r{} [{}] Sessions: {} ({} open) | In: {:.1} MB | Out: {:.1} MB | {:.1} Mbps | Errors: {}   ",
            Self::render_indicator(active),
            status,
            stats.sessions,
            stats.active_sessions,
            stats.bytes_received as f64 / BYTES_PER_MB,
            stats.bytes_sent as f64 / BYTES_PER_MB,
            rate_mbps,
            stats.errors
        );
        std::io::Write::flush(&mut std::io::stdout()).ok();
    }

    /// Get final statistics.
    pub fn stats(&self) -> ServerStats {
        ServerStats {
            elapsed: self.start_time.elapsed(),
            ..self.counters.snapshot()
        }
    }
}

/// Lock-free counters updated from session threads
#[derive(Clone, Default)]
pub struct ServerCounters {
    sessions: Arc<AtomicU64>,
    active_sessions: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
    bytes_sent: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
}

impl ServerCounters {
    #[inline]
    pub fn session_opened(&self) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn session_closed(&self) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_sent(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ServerStats {
        ServerStats {
            sessions: self.sessions.load(Ordering::Relaxed),
            active_sessions: self.active_sessions.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            elapsed: Duration::ZERO,
        }
    }
}

/// Server statistics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStats {
    pub sessions: u64,
    pub active_sessions: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub errors: u64,
    pub elapsed: Duration,
}
