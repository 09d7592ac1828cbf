use crate::client::chart::{Chart, DOWNLOAD_COLOR, LATENCY_COLOR, UPLOAD_COLOR};
use crate::client::constants::{FAIR_LATENCY_MS, GOOD_LATENCY_MS};
use crate::client::error::MeasurementFailure;
use crate::client::history::BoundedHistory;
use crate::client::sample::Sample;
use crate::client::statistics::HistoryStats;
use colored::*;
use tracing::{debug, info};

/// Tone of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Success,
    Warning,
    Error,
}

/// Reporter for printing readings, charts and statistics to the terminal
pub struct Reporter {
    ping_host: String,
    quiet: bool,
}

impl Reporter {
    pub fn new(ping_host: impl Into<String>, quiet: bool) -> Self {
        Self {
            ping_host: ping_host.into(),
            quiet,
        }
    }

    /// Current-reading lines for one sample
    pub fn format_reading(&self, sample: &Sample) -> Vec<String> {
        let (dr, dg, db) = DOWNLOAD_COLOR;
        let (ur, ug, ub) = UPLOAD_COLOR;
        let (lr, lg, lb) = LATENCY_COLOR;

        let ping = if sample.probe_answered {
            format!("{:.2} ms", sample.latency_ms)
                .color(latency_color(sample.latency_ms))
                .to_string()
        } else {
            "no answer".yellow().to_string()
        };

        vec![
            format!("Download: {:.2} Mbps", sample.download_mbps)
                .truecolor(dr, dg, db)
                .bold()
                .to_string(),
            format!("Upload: {:.2} Mbps", sample.upload_mbps)
                .truecolor(ur, ug, ub)
                .bold()
                .to_string(),
            format!(
                "{} {}",
                format!("Ping ({}):", self.ping_host)
                    .truecolor(lr, lg, lb)
                    .bold(),
                ping
            ),
        ]
    }

    /// Summary statistics block
    pub fn format_stats(stats: &HistoryStats) -> String {
        let mut lines = vec![
            "=== Network Statistics ===".bold().to_string(),
            String::new(),
            format!("Average Download: {:.2} Mbps", stats.download.avg),
            format!("Average Upload: {:.2} Mbps", stats.upload.avg),
            format!("Average Ping: {:.2} ms", stats.latency.avg),
        ];
        if let (Some(p50), Some(p90)) = (stats.latency_p50, stats.latency_p90) {
            lines.push(format!("Median Ping: {:.2} ms (p90 {:.2} ms)", p50, p90));
        }
        lines.extend([
            String::new(),
            format!("Max Download: {:.2} Mbps", stats.download.max),
            format!("Min Download: {:.2} Mbps", stats.download.min),
            String::new(),
            format!("Best Ping: {:.2} ms", stats.latency.min),
            format!("Worst Ping: {:.2} ms", stats.latency.max),
            String::new(),
            format!("Total Tests: {}", stats.count),
        ]);
        lines.join("\n")
    }

    pub fn print_reading(&self, sample: &Sample) {
        debug!(time = %sample.time_label(), "Printing reading");
        println!();
        for line in self.format_reading(sample) {
            println!("  {}", line);
        }
    }

    /// Print charts and statistics for the retained history
    pub fn print_summary(&self, history: &BoundedHistory) {
        let Some(stats) = history.stats() else {
            self.status("No measurements yet", Status::Info);
            return;
        };

        if !self.quiet {
            println!();
            println!("{}", Chart::speed(history).render());
            println!();
            println!("{}", Chart::latency(history).render());
        }
        println!();
        println!("{}", Self::format_stats(&stats));
        info!(
            count = stats.count,
            avg_download_mbps = stats.download.avg,
            avg_upload_mbps = stats.upload.avg,
            avg_latency_ms = stats.latency.avg,
            "Summary reported"
        );
    }

    pub fn print_failure(&self, failure: &MeasurementFailure) {
        eprintln!(
            "{}",
            format!("Network check failed:\n{}", failure.message)
                .red()
                .bold()
        );
        self.status("Error occurred!", Status::Error);
    }

    /// Placeholder readings after the history is cleared
    pub fn print_cleared(&self) {
        println!("  Download: -");
        println!("  Upload: -");
        println!("  Ping: -");
        self.status("History cleared", Status::Info);
    }

    pub fn status(&self, message: &str, status: Status) {
        let line = match status {
            Status::Info => message.blue(),
            Status::Success => message.green(),
            Status::Warning => message.truecolor(255, 165, 0),
            Status::Error => message.red(),
        };
        println!("{}", line);
    }
}

fn latency_color(latency_ms: f64) -> Color {
    if latency_ms < GOOD_LATENCY_MS {
        Color::Green
    } else if latency_ms < FAIR_LATENCY_MS {
        Color::Yellow
    } else {
        Color::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_reading() {
        let reporter = Reporter::new("8.8.8.8:53", true);
        let lines = reporter.format_reading(&Sample::now(94.5, 12.25, Some(18.0)));

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Download: 94.50 Mbps"));
        assert!(lines[1].contains("Upload: 12.25 Mbps"));
        assert!(lines[2].contains("Ping (8.8.8.8:53):"));
        assert!(lines[2].contains("18.00 ms"));
    }

    #[test]
    fn test_format_reading_no_answer() {
        let reporter = Reporter::new("8.8.8.8:53", true);
        let lines = reporter.format_reading(&Sample::now(1.0, 1.0, None));
        assert!(lines[2].contains("no answer"));
    }

    #[test]
    fn test_format_stats() {
        let mut history = BoundedHistory::new(5);
        for (d, l) in [(10.0, 30.0), (20.0, 10.0), (30.0, 20.0)] {
            history.add(Sample::now(d, d / 2.0, Some(l)));
        }
        let text = Reporter::format_stats(&history.stats().unwrap());

        assert!(text.contains("=== Network Statistics ==="));
        assert!(text.contains("Average Download: 20.00 Mbps"));
        assert!(text.contains("Average Upload: 10.00 Mbps"));
        assert!(text.contains("Max Download: 30.00 Mbps"));
        assert!(text.contains("Min Download: 10.00 Mbps"));
        assert!(text.contains("Best Ping: 10.00 ms"));
        assert!(text.contains("Worst Ping: 30.00 ms"));
        assert!(text.contains("Total Tests: 3"));
    }

    #[test]
    fn test_latency_color() {
        assert_eq!(latency_color(10.0), Color::Green);
        assert_eq!(latency_color(100.0), Color::Yellow);
        assert_eq!(latency_color(500.0), Color::Red);
    }

    #[test]
    fn test_print_summary_empty_history() {
        let reporter = Reporter::new("host", true);
        reporter.print_summary(&BoundedHistory::new(3));
    }
}
