//! Per-connection throughput sessions

use crate::protocol::{Direction, ProtocolError, TransferAck, TransferRequest, REQUEST_SIZE};
use crate::server::monitor::ServerCounters;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Chunk size for streaming payloads in bytes
const CHUNK_SIZE: usize = 64 * 1024;

/// Idle read/write timeout for a session
const SESSION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Client closed after {received} of {expected} bytes")]
    ShortUpload { received: u64, expected: u64 },
}

/// Accepts connections forever, one thread per session
pub fn serve(listener: TcpListener, counters: ServerCounters, max_transfer: u64) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let peer = stream.peer_addr().ok();
                debug!(peer = ?peer, "Client connected");
                let counters = counters.clone();

                thread::spawn(move || {
                    counters.session_opened();
                    if let Err(e) = handle_session(stream, &counters, max_transfer) {
                        counters.increment_error();
                        warn!(error = %e, peer = ?peer, "Session failed");
                    }
                    counters.session_closed();
                });
            }
            Err(e) => {
                counters.increment_error();
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}

/// Runs one transfer: reads the request, then streams or sinks the payload
pub fn handle_session(
    mut stream: TcpStream,
    counters: &ServerCounters,
    max_transfer: u64,
) -> Result<(), SessionError> {
    stream.set_read_timeout(Some(SESSION_TIMEOUT))?;
    stream.set_write_timeout(Some(SESSION_TIMEOUT))?;
    stream.set_nodelay(true)?;

    let mut header = [0u8; REQUEST_SIZE];
    stream.read_exact(&mut header)?;
    let request = TransferRequest::decode(&header)?;
    request.check_limit(max_transfer)?;

    match request.direction {
        Direction::Download => send_payload(&mut stream, request.bytes, counters)?,
        Direction::Upload => {
            let received = sink_payload(&mut stream, request.bytes, counters)?;
            stream.write_all(&TransferAck::new(received).encode())?;
            stream.flush()?;
        }
    }

    info!(
        direction = ?request.direction,
        bytes = request.bytes,
        "Transfer completed"
    );
    Ok(())
}

fn send_payload(
    stream: &mut TcpStream,
    bytes: u64,
    counters: &ServerCounters,
) -> Result<(), SessionError> {
    let buf = vec![0u8; CHUNK_SIZE];
    let mut sent = 0u64;
    while sent < bytes {
        let len = (bytes - sent).min(CHUNK_SIZE as u64) as usize;
        stream.write_all(&buf[..len])?;
        sent += len as u64;
        counters.add_sent(len as u64);
    }
    stream.flush()?;
    Ok(())
}

fn sink_payload(
    stream: &mut TcpStream,
    bytes: u64,
    counters: &ServerCounters,
) -> Result<u64, SessionError> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut received = 0u64;
    while received < bytes {
        let want = (bytes - received).min(CHUNK_SIZE as u64) as usize;
        match stream.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(SessionError::ShortUpload {
                    received,
                    expected: bytes,
                })
            }
            Ok(n) => {
                received += n as u64;
                counters.add_received(n as u64);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SessionError::Io(e)),
        }
    }
    Ok(received)
}
