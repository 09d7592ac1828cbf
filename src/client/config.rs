use crate::client::constants::*;
use crate::client::error::{ClientError, Result};
use clap::{Parser, ValueEnum};
use std::time::Duration;
use tracing::debug;

/// How the monitor is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Line commands on stdin: c(heck), m(onitor), x (clear), s(tats), q(uit)
    Interactive,
    /// A single check, then exit
    Once,
    /// Continuous monitoring until Ctrl-C or --cycles
    Watch,
}

/// Where throughput is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Timed bulk transfer against a bandwatch-server
    Tcp,
    /// Timed download/upload against an HTTP speed-test endpoint
    Http,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "bandwatch")]
#[command(about = "Periodic bandwidth and latency monitor")]
pub struct Config {
    /// How the monitor is driven
    #[arg(long, value_enum, default_value_t = Mode::Interactive)]
    pub mode: Mode,

    /// Seconds between cycles in continuous monitoring
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval_secs: u64,

    /// Number of samples kept for charts and statistics
    #[arg(long, default_value_t = DEFAULT_HISTORY_LEN)]
    pub history: usize,

    /// Throughput measurement backend
    #[arg(long, value_enum, default_value_t = Backend::Tcp)]
    pub backend: Backend,

    /// bandwatch-server address for the tcp backend
    #[arg(long, default_value = "127.0.0.1:9090")]
    pub server: String,

    /// Base URL for the http backend
    #[arg(long, default_value = DEFAULT_HTTP_BASE)]
    pub http_base: String,

    /// Megabytes moved in each direction per cycle
    #[arg(long, default_value_t = 10)]
    pub transfer_mb: u64,

    /// host:port the latency probe connects to
    #[arg(long, default_value = DEFAULT_PING_HOST)]
    pub ping_host: String,

    /// Latency probe timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_PING_TIMEOUT_MS)]
    pub ping_timeout_ms: u64,

    /// Socket/HTTP I/O timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Stop watch mode after this many cycles
    #[arg(long)]
    pub cycles: Option<usize>,

    /// Disable the spinner and charts (plain readings only)
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl Config {
    /// Returns the I/O timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Bytes moved in each direction per cycle
    pub fn transfer_bytes(&self) -> u64 {
        self.transfer_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Returns true if JSON format logging is enabled
    pub fn is_json_format(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");
        if self.interval_secs == 0 {
            return Err(ClientError::Config("interval must be > 0".into()));
        }
        if self.history == 0 {
            return Err(ClientError::Config("history must be > 0".into()));
        }
        if self.transfer_mb == 0 {
            return Err(ClientError::Config("transfer size must be > 0".into()));
        }
        if self.transfer_mb > MAX_TRANSFER_MB {
            return Err(ClientError::Config(format!(
                "transfer size must be <= {} MB",
                MAX_TRANSFER_MB
            )));
        }
        if self.timeout_ms == 0 || self.ping_timeout_ms == 0 {
            return Err(ClientError::Config("timeouts must be > 0".into()));
        }
        if self.cycles == Some(0) {
            return Err(ClientError::Config("cycles must be > 0 when given".into()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ClientError::Config(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        debug!("Configuration validated successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> Config {
        Config::parse_from(["bandwatch"])
    }

    #[test]
    fn test_defaults() {
        let config = default_config();
        assert_eq!(config.mode, Mode::Interactive);
        assert_eq!(config.backend, Backend::Tcp);
        assert_eq!(config.history, 20);
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert_eq!(config.ping_timeout(), Duration::from_secs(2));
        assert_eq!(config.transfer_bytes(), 10_000_000);
        assert!(!config.is_json_format());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let config = Config::parse_from([
            "bandwatch",
            "--mode",
            "watch",
            "--backend",
            "http",
            "--cycles",
            "3",
            "--log-format",
            "json",
        ]);
        assert_eq!(config.mode, Mode::Watch);
        assert_eq!(config.backend, Backend::Http);
        assert_eq!(config.cycles, Some(3));
        assert!(config.is_json_format());
    }

    #[test]
    fn test_validation_rejects_zeroes() {
        let mut config = default_config();
        config.interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = default_config();
        config.history = 0;
        assert!(config.validate().is_err());

        let mut config = default_config();
        config.transfer_mb = 0;
        assert!(config.validate().is_err());

        let mut config = default_config();
        config.cycles = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transfer_size_upper_bound() {
        let mut config = default_config();
        config.transfer_mb = MAX_TRANSFER_MB;
        assert!(config.validate().is_ok());

        config.transfer_mb = MAX_TRANSFER_MB + 1;
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        config.transfer_mb = u64::MAX / BYTES_PER_MB;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = default_config();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
