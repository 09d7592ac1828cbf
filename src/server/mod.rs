//! Server side of bandwatch: the throughput test endpoint

pub mod config;
pub mod monitor;
pub mod session;

pub use config::ServerConfig;
pub use monitor::{ServerCounters, ServerMonitor, ServerStats};
pub use session::{handle_session, serve, SessionError};
