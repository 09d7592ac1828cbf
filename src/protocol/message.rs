use crate::protocol::error::{ProtocolError, Result};
use tracing::debug;

/// Size of an encoded transfer request in bytes (direction + u64 length)
pub const REQUEST_SIZE: usize = 9;

/// Size of an encoded upload acknowledgement in bytes
pub const ACK_SIZE: usize = 8;

/// Which way the bulk payload flows, seen from the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Download,
    Upload,
}

impl Direction {
    fn to_byte(self) -> u8 {
        match self {
            Direction::Download => 0x01,
            Direction::Upload => 0x02,
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(Direction::Download),
            0x02 => Ok(Direction::Upload),
            other => Err(ProtocolError::UnknownDirection(other)),
        }
    }
}

/// Opening message of every throughput session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub direction: Direction,
    pub bytes: u64,
}

impl TransferRequest {
    pub fn new(direction: Direction, bytes: u64) -> Self {
        Self { direction, bytes }
    }

    pub fn encode(&self) -> [u8; REQUEST_SIZE] {
        let mut buf = [0u8; REQUEST_SIZE];
        buf[0] = self.direction.to_byte();
        buf[1..].copy_from_slice(&self.bytes.to_le_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < REQUEST_SIZE {
            debug!(
                expected = REQUEST_SIZE,
                actual = bytes.len(),
                "Invalid request size"
            );
            return Err(ProtocolError::InvalidMessageSize {
                expected: REQUEST_SIZE,
                actual: bytes.len(),
            });
        }

        let direction = Direction::from_byte(bytes[0])?;
        let mut len = [0u8; 8];
        len.copy_from_slice(&bytes[1..REQUEST_SIZE]);
        let request = Self::new(direction, u64::from_le_bytes(len));

        debug!(direction = ?request.direction, bytes = request.bytes, "Request decoded");
        Ok(request)
    }

    /// Rejects requests larger than the server is willing to move
    pub fn check_limit(&self, limit: u64) -> Result<()> {
        if self.bytes > limit {
            return Err(ProtocolError::TransferTooLarge {
                requested: self.bytes,
                limit,
            });
        }
        Ok(())
    }
}

/// Server reply closing an upload: how many bytes actually arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferAck {
    pub bytes: u64,
}

impl TransferAck {
    pub fn new(bytes: u64) -> Self {
        Self { bytes }
    }

    pub fn encode(&self) -> [u8; ACK_SIZE] {
        self.bytes.to_le_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ACK_SIZE {
            return Err(ProtocolError::InvalidMessageSize {
                expected: ACK_SIZE,
                actual: bytes.len(),
            });
        }
        let mut buf = [0u8; ACK_SIZE];
        buf.copy_from_slice(&bytes[..ACK_SIZE]);
        Ok(Self::new(u64::from_le_bytes(buf)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encode_layout() {
        let encoded = TransferRequest::new(Direction::Upload, 258).encode();
        assert_eq!(encoded[0], 0x02);
        assert_eq!(&encoded[1..3], &[2, 1]);
        assert!(encoded[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_request_invalid_size() {
        let buf = [0x01u8; 4];
        assert_eq!(
            TransferRequest::decode(&buf),
            Err(ProtocolError::InvalidMessageSize {
                expected: REQUEST_SIZE,
                actual: 4
            })
        );
    }

    #[test]
    fn test_request_unknown_direction() {
        let mut buf = TransferRequest::new(Direction::Download, 10).encode();
        buf[0] = 0x7f;
        assert_eq!(
            TransferRequest::decode(&buf),
            Err(ProtocolError::UnknownDirection(0x7f))
        );
    }

    #[test]
    fn test_request_limit() {
        let request = TransferRequest::new(Direction::Download, 2048);
        assert!(request.check_limit(2048).is_ok());
        assert!(request.check_limit(1024).is_err());
    }

    #[test]
    fn test_ack_short_buffer() {
        assert!(TransferAck::decode(&[0u8; 3]).is_err());
        assert_eq!(TransferAck::decode(&7u64.to_le_bytes()), Ok(TransferAck::new(7)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_request_roundtrip(bytes in 0u64..u64::MAX, upload in any::<bool>()) {
            let direction = if upload { Direction::Upload } else { Direction::Download };
            let original = TransferRequest::new(direction, bytes);
            let decoded = TransferRequest::decode(&original.encode()).unwrap();
            prop_assert_eq!(original, decoded);
        }
    }
}
