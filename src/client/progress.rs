use crate::client::constants::PROGRESS_TICK_INTERVAL_MS;
use crate::client::error::{ClientError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Indeterminate spinner shown while a measurement cycle is in flight
pub struct CycleSpinner {
    pb: Option<ProgressBar>,
    style: ProgressStyle,
    hidden: bool,
}

impl CycleSpinner {
    /// Create a new spinner; `hidden` suppresses all output (quiet mode)
    pub fn new(hidden: bool) -> Result<Self> {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .map_err(|e| ClientError::Measurement(format!("Failed to create spinner style: {}", e)))?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏✓");

        Ok(Self {
            pb: None,
            style,
            hidden,
        })
    }

    /// Start spinning with `message`; restarts if already running
    pub fn start(&mut self, message: &str) {
        self.stop();
        let pb = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        pb.set_style(self.style.clone());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_INTERVAL_MS));
        self.pb = Some(pb);
    }

    /// Stop and erase the spinner
    pub fn stop(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
    }

    pub fn is_active(&self) -> bool {
        self.pb.is_some()
    }
}

impl Drop for CycleSpinner {
    fn drop(&mut self) {
        self.stop();
    }
}
