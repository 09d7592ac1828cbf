use crate::client::error::{ClientError, Result};
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Measures raw throughput in bytes per second.
///
/// Implementations block for the duration of the transfer and are never
/// called concurrently; the monitor serializes cycles.
pub trait ThroughputMeter: Send {
    /// Download rate in bytes per second
    fn download(&mut self) -> Result<f64>;

    /// Upload rate in bytes per second
    fn upload(&mut self) -> Result<f64>;
}

/// Measures round-trip latency to a fixed target.
pub trait LatencyProbe: Send {
    /// `Ok(None)` means the target did not answer in time
    fn probe(&mut self) -> Result<Option<Duration>>;
}

impl<T: ThroughputMeter + ?Sized> ThroughputMeter for Box<T> {
    fn download(&mut self) -> Result<f64> {
        (**self).download()
    }

    fn upload(&mut self) -> Result<f64> {
        (**self).upload()
    }
}

impl<T: LatencyProbe + ?Sized> LatencyProbe for Box<T> {
    fn probe(&mut self) -> Result<Option<Duration>> {
        (**self).probe()
    }
}

/// Latency probe timing a TCP handshake to `host:port`.
///
/// A completed or refused handshake both mean the host answered; timeouts
/// and unreachable networks are reported as no answer.
#[derive(Debug, Clone)]
pub struct TcpConnectProbe {
    target: String,
    timeout: Duration,
}

impl TcpConnectProbe {
    pub fn new(target: impl Into<String>, timeout: Duration) -> Self {
        Self {
            target: target.into(),
            timeout,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn resolve(&self) -> Result<SocketAddr> {
        let mut addrs = self.target.to_socket_addrs().map_err(|e| {
            warn!(target = %self.target, error = %e, "Failed to resolve probe target");
            ClientError::Socket(format!("Failed to resolve {}: {}", self.target, e))
        })?;
        addrs
            .next()
            .ok_or_else(|| ClientError::Socket(format!("No address found for {}", self.target)))
    }
}

impl LatencyProbe for TcpConnectProbe {
    fn probe(&mut self) -> Result<Option<Duration>> {
        let addr = self.resolve()?;
        let start = Instant::now();

        match TcpStream::connect_timeout(&addr, self.timeout) {
            Ok(_stream) => {
                let rtt = start.elapsed();
                debug!(%addr, rtt_us = rtt.as_micros() as u64, "Probe connected");
                Ok(Some(rtt))
            }
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                let rtt = start.elapsed();
                debug!(%addr, rtt_us = rtt.as_micros() as u64, "Probe refused, host answered");
                Ok(Some(rtt))
            }
            Err(e) => {
                debug!(%addr, error = %e, "Probe got no answer");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use std::net::TcpListener;

    mock! {
        pub ThroughputMeter {}

        impl ThroughputMeter for ThroughputMeter {
            fn download(&mut self) -> Result<f64>;
            fn upload(&mut self) -> Result<f64>;
        }
    }

    mock! {
        pub LatencyProbe {}

        impl LatencyProbe for LatencyProbe {
            fn probe(&mut self) -> Result<Option<Duration>>;
        }
    }

    #[test]
    fn test_probe_local_listener() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;

        let mut probe = TcpConnectProbe::new(addr.to_string(), Duration::from_secs(1));
        let rtt = probe.probe()?;
        assert!(rtt.is_some());
        Ok(())
    }

    #[test]
    fn test_probe_refused_counts_as_answer() -> Result<()> {
        // Bind then drop to get a port nothing listens on
        let addr = TcpListener::bind("127.0.0.1:0")?.local_addr()?;

        let mut probe = TcpConnectProbe::new(addr.to_string(), Duration::from_secs(1));
        assert!(probe.probe()?.is_some());
        Ok(())
    }

    #[test]
    fn test_probe_unresolvable_target() {
        let mut probe = TcpConnectProbe::new("not a host", Duration::from_millis(100));
        assert!(matches!(probe.probe(), Err(ClientError::Socket(_))));
    }

    #[test]
    fn test_boxed_meter_delegates() {
        let mut mock = MockThroughputMeter::new();
        mock.expect_download().times(1).returning(|| Ok(42.0));

        let mut boxed: Box<dyn ThroughputMeter> = Box::new(mock);
        assert_eq!(boxed.download().unwrap(), 42.0);
    }
}

#[cfg(test)]
pub use tests::{MockLatencyProbe, MockThroughputMeter};
