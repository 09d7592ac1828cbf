use crate::client::constants::TRANSFER_CHUNK_SIZE;
use crate::client::error::{ClientError, Result};
use crate::client::probe::ThroughputMeter;
use crate::protocol::{Direction, TransferAck, TransferRequest, ACK_SIZE};
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Throughput meter running timed bulk transfers against a bandwatch-server
#[derive(Debug, Clone)]
pub struct TcpThroughputMeter {
    server: String,
    transfer_bytes: u64,
    timeout: Duration,
}

impl TcpThroughputMeter {
    pub fn new(server: impl Into<String>, transfer_bytes: u64, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            transfer_bytes,
            timeout,
        }
    }

    /// Opens a fresh connection for one transfer
    fn connect(&self) -> Result<TcpStream> {
        debug!(server = %self.server, "Connecting to throughput server");
        let stream = TcpStream::connect(&self.server).map_err(|e| {
            warn!(server = %self.server, error = %e, "Failed to connect");
            ClientError::Socket(format!("Failed to connect to {}: {}", self.server, e))
        })?;
        stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
            .map_err(|e| ClientError::Socket(format!("Failed to set timeout: {}", e)))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn send_request(&self, stream: &mut TcpStream, direction: Direction) -> Result<()> {
        let request = TransferRequest::new(direction, self.transfer_bytes);
        stream.write_all(&request.encode())?;
        debug!(direction = ?direction, bytes = self.transfer_bytes, "Transfer requested");
        Ok(())
    }
}

/// Bytes per second for `bytes` moved in `elapsed`
fn rate(bytes: u64, elapsed: Duration) -> Result<f64> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return Err(ClientError::Measurement(
            "transfer completed too quickly to time".into(),
        ));
    }
    Ok(bytes as f64 / secs)
}

impl ThroughputMeter for TcpThroughputMeter {
    fn download(&mut self) -> Result<f64> {
        let mut stream = self.connect()?;
        self.send_request(&mut stream, Direction::Download)?;

        let mut buf = vec![0u8; TRANSFER_CHUNK_SIZE];
        let mut received = 0u64;
        let start = Instant::now();

        while received < self.transfer_bytes {
            let want = (self.transfer_bytes - received).min(buf.len() as u64) as usize;
            match stream.read(&mut buf[..want]) {
                Ok(0) => {
                    return Err(ClientError::Measurement(format!(
                        "server closed after {} of {} bytes",
                        received, self.transfer_bytes
                    )));
                }
                Ok(n) => received += n as u64,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ClientError::Io(e)),
            }
        }

        let elapsed = start.elapsed();
        let bytes_per_sec = rate(received, elapsed)?;
        debug!(
            bytes = received,
            elapsed_ms = elapsed.as_millis() as u64,
            bytes_per_sec = bytes_per_sec,
            "Download finished"
        );
        Ok(bytes_per_sec)
    }

    fn upload(&mut self) -> Result<f64> {
        let mut stream = self.connect()?;
        self.send_request(&mut stream, Direction::Upload)?;

        let buf = vec![0u8; TRANSFER_CHUNK_SIZE];
        let mut sent = 0u64;
        let start = Instant::now();

        while sent < self.transfer_bytes {
            let len = (self.transfer_bytes - sent).min(buf.len() as u64) as usize;
            stream.write_all(&buf[..len])?;
            sent += len as u64;
        }
        stream.flush()?;

        let mut ack_buf = [0u8; ACK_SIZE];
        stream.read_exact(&mut ack_buf)?;
        let elapsed = start.elapsed();

        let ack = TransferAck::decode(&ack_buf)?;
        if ack.bytes != sent {
            return Err(ClientError::Measurement(format!(
                "server acknowledged {} of {} bytes",
                ack.bytes, sent
            )));
        }

        let bytes_per_sec = rate(sent, elapsed)?;
        debug!(
            bytes = sent,
            elapsed_ms = elapsed.as_millis() as u64,
            bytes_per_sec = bytes_per_sec,
            "Upload finished"
        );
        Ok(bytes_per_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_rate() {
        assert_eq!(rate(1000, Duration::from_secs(2)).unwrap(), 500.0);
        assert!(rate(1000, Duration::ZERO).is_err());
    }

    #[test]
    fn test_connect_refused() {
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let mut meter = TcpThroughputMeter::new(addr.to_string(), 10, Duration::from_secs(1));
        assert!(matches!(meter.download(), Err(ClientError::Socket(_))));
    }

    #[test]
    fn test_download_short_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; crate::protocol::REQUEST_SIZE];
            stream.read_exact(&mut request).unwrap();
            stream.write_all(&[0u8; 16]).unwrap();
        });

        let mut meter = TcpThroughputMeter::new(addr.to_string(), 1024, Duration::from_secs(2));
        let result = meter.download();
        server.join().unwrap();

        assert!(matches!(result, Err(ClientError::Measurement(_))));
    }
}
