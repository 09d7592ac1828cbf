//! Server configuration module
//!
//! Provides CLI argument parsing and validation for bandwatch-server.

use clap::Parser;
use tracing::debug;

/// Bytes in a mebibyte, for the transfer limit flag
const BYTES_PER_MIB: u64 = 1024 * 1024;

#[derive(Parser, Debug, Clone)]
#[command(name = "bandwatch-server")]
#[command(about = "Throughput test endpoint for the bandwatch tcp backend")]
pub struct ServerConfig {
    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Bind port
    #[arg(long, default_value_t = 9090)]
    pub port: u16,

    /// Monitor update interval in milliseconds
    #[arg(long, default_value_t = 250)]
    pub update_interval: u64,

    /// Largest transfer a client may request, in MiB
    #[arg(long, default_value_t = 1024)]
    pub max_transfer_mb: u64,

    /// Disable terminal UI (useful for Docker/systemd/non-interactive environments)
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl ServerConfig {
    /// Returns the full bind address as a string (bind:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Largest transfer a client may request, in bytes
    pub fn max_transfer_bytes(&self) -> u64 {
        self.max_transfer_mb.saturating_mul(BYTES_PER_MIB)
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<(), String> {
        debug!("Validating server configuration");

        if self.port == 0 {
            return Err("port must be > 0".into());
        }

        if self.update_interval == 0 {
            return Err("update_interval must be > 0".into());
        }

        if self.max_transfer_mb == 0 {
            return Err("max_transfer_mb must be > 0".into());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            ));
        }

        debug!("Server configuration validated successfully");
        Ok(())
    }

    /// Returns true if JSON format logging is enabled
    pub fn is_json_format(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
