use thiserror::Error;

/// Protocol-level errors for transfer message encoding/decoding
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid message size: expected {expected}, got {actual}")]
    InvalidMessageSize { expected: usize, actual: usize },

    #[error("Unknown transfer direction: {0:#04x}")]
    UnknownDirection(u8),

    #[error("Transfer of {requested} bytes exceeds the {limit} byte limit")]
    TransferTooLarge { requested: u64, limit: u64 },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
