use crate::client::constants::CHART_WIDTH;
use crate::client::history::BoundedHistory;
use colored::*;

/// Eight bar heights, lowest first
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

// Series colors (RGB), matching the reading labels
pub const DOWNLOAD_COLOR: (u8, u8, u8) = (39, 174, 96);
pub const UPLOAD_COLOR: (u8, u8, u8) = (231, 76, 60);
pub const LATENCY_COLOR: (u8, u8, u8) = (52, 152, 219);

const LABEL_WIDTH: usize = 10;

/// Renders the last `width` values as a sparkline scaled from zero to the max.
///
/// Non-finite and negative values render as the lowest bar.
pub fn sparkline(values: &[f64], width: usize) -> String {
    let start = values.len().saturating_sub(width);
    let window = &values[start..];
    let max = window
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);

    window
        .iter()
        .map(|&v| {
            if max <= 0.0 || !v.is_finite() || v <= 0.0 {
                return LEVELS[0];
            }
            let level = ((v / max) * (LEVELS.len() - 1) as f64).round() as usize;
            LEVELS[level.min(LEVELS.len() - 1)]
        })
        .collect()
}

/// One line of a chart
pub struct Series<'a> {
    pub label: &'a str,
    pub unit: &'a str,
    pub values: Vec<f64>,
    pub color: (u8, u8, u8),
}

impl Series<'_> {
    fn render(&self, width: usize) -> String {
        let (r, g, b) = self.color;
        let last = self.values.last().copied().unwrap_or(0.0);
        let max = self.values.iter().copied().fold(0.0f64, f64::max);
        format!(
            "  {:<label$}{}  now {:.2} {} / max {:.2} {}",
            self.label,
            sparkline(&self.values, width).truecolor(r, g, b),
            last,
            self.unit,
            max,
            self.unit,
            label = LABEL_WIDTH
        )
    }
}

/// A titled group of sparklines sharing one time axis
pub struct Chart<'a> {
    pub title: &'a str,
    pub series: Vec<Series<'a>>,
    pub time_labels: Vec<String>,
    pub width: usize,
}

impl<'a> Chart<'a> {
    /// Download and upload throughput over the retained history
    pub fn speed(history: &BoundedHistory) -> Self {
        Self {
            title: "Speed History",
            series: vec![
                Series {
                    label: "Download",
                    unit: "Mbps",
                    values: history.downloads(),
                    color: DOWNLOAD_COLOR,
                },
                Series {
                    label: "Upload",
                    unit: "Mbps",
                    values: history.uploads(),
                    color: UPLOAD_COLOR,
                },
            ],
            time_labels: history.time_labels(),
            width: CHART_WIDTH,
        }
    }

    /// Latency over the retained history
    pub fn latency(history: &BoundedHistory) -> Self {
        Self {
            title: "Latency History",
            series: vec![Series {
                label: "Ping",
                unit: "ms",
                values: history.latencies(),
                color: LATENCY_COLOR,
            }],
            time_labels: history.time_labels(),
            width: CHART_WIDTH,
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![self.title.bold().to_string()];
        lines.extend(self.series.iter().map(|s| s.render(self.width)));

        // Time axis: first and last visible timestamps
        let start = self.time_labels.len().saturating_sub(self.width);
        let visible = &self.time_labels[start..];
        if let (Some(first), Some(last)) = (visible.first(), visible.last()) {
            let span = visible.len();
            let gap = span.saturating_sub(first.len() + last.len()).max(1);
            let axis = if span > 1 {
                format!("{}{}{}", first, " ".repeat(gap), last)
            } else {
                first.clone()
            };
            lines.push(format!("  {:<label$}{}", "", axis.dimmed(), label = LABEL_WIDTH));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::sample::Sample;

    #[test]
    fn test_sparkline_scales_to_max() {
        assert_eq!(sparkline(&[0.0, 50.0, 100.0], 10), "▁▅█");
    }

    #[test]
    fn test_sparkline_window() {
        assert_eq!(sparkline(&[100.0, 1.0, 2.0], 2), "▅█");
    }

    #[test]
    fn test_sparkline_all_zero() {
        assert_eq!(sparkline(&[0.0, 0.0], 10), "▁▁");
        assert_eq!(sparkline(&[], 10), "");
    }

    #[test]
    fn test_sparkline_ignores_nan() {
        assert_eq!(sparkline(&[f64::NAN, 10.0], 10), "▁█");
    }

    #[test]
    fn test_chart_render() {
        let mut history = BoundedHistory::new(5);
        history.add(Sample::now(10.0, 2.0, Some(20.0)));
        history.add(Sample::now(20.0, 4.0, Some(40.0)));

        let speed = Chart::speed(&history).render();
        assert!(speed.contains("Speed History"));
        assert!(speed.contains("Download"));
        assert!(speed.contains("▅█"));
        assert!(speed.contains("max 20.00 Mbps"));

        let latency = Chart::latency(&history).render();
        assert!(latency.contains("Latency History"));
        assert!(latency.contains("now 40.00 ms"));
    }

    #[test]
    fn test_empty_chart_has_no_axis() {
        let history = BoundedHistory::new(5);
        let rendered = Chart::speed(&history).render();
        assert_eq!(rendered.lines().count(), 3);
    }
}
