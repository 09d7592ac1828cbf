//! Transfer protocol spoken between the TCP throughput meter and bandwatch-server

pub mod error;
pub mod message;

pub use error::{ProtocolError, Result as ProtocolResult};
pub use message::{Direction, TransferAck, TransferRequest, ACK_SIZE, REQUEST_SIZE};
