// Live vehicle telemetry and recorded log models
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest value per signal key, e.g. `BMS_TX_STATE_7.Cell_Temp_Max_degC`.
pub type SignalSnapshot = HashMap<String, f64>;

/// A finished recording held by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogFile {
    pub id: i64,
    pub filename: String,
    pub size_bytes: u64,
    pub created: String,
}

impl LogFile {
    pub fn display_size(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
