//! Client side of bandwatch: measurement, history and terminal presentation

pub mod chart;
pub mod config;
pub mod constants;
pub mod error;
pub mod history;
pub mod http;
pub mod logging;
pub mod monitor;
pub mod poller;
pub mod probe;
pub mod progress;
pub mod reporter;
pub mod sample;
pub mod socket;
pub mod statistics;

pub use chart::{sparkline, Chart};
pub use config::{Backend, Config, Mode};
pub use constants::*;
pub use error::{ClientError, FailureKind, MeasurementFailure, Result};
pub use history::BoundedHistory;
pub use http::HttpThroughputMeter;
pub use logging::init_logging_with_config;
pub use monitor::Monitor;
pub use poller::{MonitorEvent, Poller, PollerState, SharedPoller};
pub use probe::{LatencyProbe, TcpConnectProbe, ThroughputMeter};
pub use progress::CycleSpinner;
pub use reporter::{Reporter, Status};
pub use sample::{bytes_per_sec_to_mbps, duration_to_ms, Sample};
pub use socket::TcpThroughputMeter;
pub use statistics::{HistoryStats, Summary};
