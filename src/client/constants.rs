//! Constants used throughout the monitor

/// Number of samples kept in the history by default
pub const DEFAULT_HISTORY_LEN: usize = 20;

/// Seconds between cycles in continuous monitoring
pub const DEFAULT_INTERVAL_SECS: u64 = 30;

/// Bits in a byte, for converting byte rates to bit rates
pub const BITS_PER_BYTE: f64 = 8.0;

/// Bits in a megabit (decimal convention, not 2^20)
pub const BITS_PER_MEGABIT: f64 = 1_000_000.0;

/// Nanoseconds in a millisecond
pub const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Default latency probe target (a public resolver, TCP/53)
pub const DEFAULT_PING_HOST: &str = "8.8.8.8:53";

/// Default latency probe timeout in milliseconds
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 2000;

/// Default base URL for the HTTP throughput backend
pub const DEFAULT_HTTP_BASE: &str = "https://speed.cloudflare.com";

/// Chunk size for bulk transfers in bytes
pub const TRANSFER_CHUNK_SIZE: usize = 64 * 1024;

/// Bytes in a megabyte (decimal), for transfer size flags
pub const BYTES_PER_MB: u64 = 1_000_000;

/// Largest per-direction transfer the client will request, in MB
pub const MAX_TRANSFER_MB: u64 = 1024;

/// Longest single sleep while waiting for the next periodic cycle
pub const SLEEP_SLICE_MS: u64 = 100;

/// Spinner tick interval in milliseconds
pub const PROGRESS_TICK_INTERVAL_MS: u64 = 100;

/// Histogram lower bound for latency percentiles in microseconds
pub const HISTOGRAM_LOW_BOUND_US: u64 = 1;

/// Histogram upper bound for latency percentiles in microseconds
pub const HISTOGRAM_HIGH_BOUND_US: u64 = 60_000_000;

/// Histogram significant digits for precision
pub const HISTOGRAM_SIGNIFICANT_DIGITS: u8 = 3;

/// Latency below this is shown in green (milliseconds)
pub const GOOD_LATENCY_MS: f64 = 50.0;

/// Latency below this is shown in yellow, above in red (milliseconds)
pub const FAIR_LATENCY_MS: f64 = 150.0;

/// Width of a sparkline chart in columns
pub const CHART_WIDTH: usize = 40;
