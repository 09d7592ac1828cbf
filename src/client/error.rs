use crate::protocol::ProtocolError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Measurement error: {0}")]
    Measurement(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Busy: {0}")]
    Busy(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Which collaborator aborted a measurement cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Throughput,
    Latency,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Throughput => f.write_str("throughput"),
            FailureKind::Latency => f.write_str("latency"),
        }
    }
}

/// A failed measurement cycle, reported to the UI instead of being raised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Network check failed ({kind}): {message}")]
pub struct MeasurementFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl MeasurementFailure {
    pub fn new(kind: FailureKind, error: &ClientError) -> Self {
        Self {
            kind,
            message: error.to_string(),
        }
    }
}
