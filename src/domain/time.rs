// Time units, ranges and display formatting for the plot view
use super::csv_data::CellValue;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Canonical elapsed-time column, always in milliseconds.
pub const ELAPSED_MS_COLUMN: &str = "elapsed_ms";
/// Wall-clock fallback time column.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeResolution {
    #[default]
    Milliseconds,
    Seconds,
    Minutes,
}

impl TimeResolution {
    /// Milliseconds per display unit.
    pub fn factor(self) -> f64 {
        match self {
            TimeResolution::Milliseconds => 1.0,
            TimeResolution::Seconds => 1_000.0,
            TimeResolution::Minutes => 60_000.0,
        }
    }

    pub fn unit_label(self) -> &'static str {
        match self {
            TimeResolution::Milliseconds => "Time (ms)",
            TimeResolution::Seconds => "Time (sec)",
            TimeResolution::Minutes => "Time (min)",
        }
    }
}

/// Raw milliseconds expressed in the given resolution
pub fn convert(ms: f64, resolution: TimeResolution) -> f64 {
    ms / resolution.factor()
}

/// Format a time axis value for display.
///
/// `value` is expected to be already converted to `resolution` when the
/// time column is the elapsed-time column. Timestamps are rendered as a
/// wall-clock time; anything unrecognised falls back to its plain text.
pub fn format_time_value(value: &CellValue, time_column: &str, resolution: TimeResolution) -> String {
    match (time_column, value) {
        (TIMESTAMP_COLUMN, CellValue::Text(text)) => {
            parse_timestamp(text).unwrap_or_else(|| text.clone())
        }
        (ELAPSED_MS_COLUMN, CellValue::Number(v)) => match resolution {
            TimeResolution::Milliseconds => format!("{:.0} ms", v),
            TimeResolution::Seconds => format!("{:.2} s", v),
            TimeResolution::Minutes => {
                let minutes = (v / 60.0).floor();
                let seconds = v % 60.0;
                format!("{}:{:04.1}", minutes, seconds)
            }
        },
        _ => value.to_string(),
    }
}

fn parse_timestamp(text: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.format("%H:%M:%S").to_string());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.format("%H:%M:%S").to_string())
}

/// A window over the elapsed-time axis, in raw milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.start && value <= self.end
    }
}
