//! HTTP throughput backend
//!
//! Times a bulk `GET {base}/__down?bytes=N` and `POST {base}/__up` against a
//! speed-test endpoint, using a blocking `ureq` agent so it runs directly on
//! the measurement thread.

use crate::client::error::{ClientError, Result};
use crate::client::probe::ThroughputMeter;
use std::io::{self, Read};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct HttpThroughputMeter {
    base_url: String,
    transfer_bytes: u64,
    agent: ureq::Agent,
}

impl HttpThroughputMeter {
    pub fn new(base_url: impl Into<String>, transfer_bytes: u64, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transfer_bytes,
            agent,
        }
    }

    pub fn download_url(&self) -> String {
        format!("{}/__down?bytes={}", self.base_url, self.transfer_bytes)
    }

    pub fn upload_url(&self) -> String {
        format!("{}/__up", self.base_url)
    }
}

fn http_error(url: &str, e: ureq::Error) -> ClientError {
    warn!(url = url, error = %e, "HTTP request failed");
    ClientError::Http(format!("{}: {}", url, e))
}

impl ThroughputMeter for HttpThroughputMeter {
    fn download(&mut self) -> Result<f64> {
        let url = self.download_url();
        let start = Instant::now();

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| http_error(&url, e))?;
        let received = io::copy(&mut response.into_reader(), &mut io::sink())?;

        let secs = start.elapsed().as_secs_f64();
        if received == 0 || secs <= 0.0 {
            return Err(ClientError::Measurement(format!(
                "download returned {} bytes",
                received
            )));
        }

        debug!(url = %url, bytes = received, secs = secs, "HTTP download finished");
        Ok(received as f64 / secs)
    }

    fn upload(&mut self) -> Result<f64> {
        let url = self.upload_url();
        let start = Instant::now();

        // Zeros are streamed from a reader; the body is never held in memory
        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "application/octet-stream")
            .set("Content-Length", &self.transfer_bytes.to_string())
            .send(io::repeat(0).take(self.transfer_bytes))
            .map_err(|e| http_error(&url, e))?;
        io::copy(&mut response.into_reader(), &mut io::sink())?;

        let secs = start.elapsed().as_secs_f64();
        if secs <= 0.0 {
            return Err(ClientError::Measurement(
                "upload completed too quickly to time".into(),
            ));
        }

        debug!(url = %url, bytes = self.transfer_bytes, secs = secs, "HTTP upload finished");
        Ok(self.transfer_bytes as f64 / secs)
    }
}
