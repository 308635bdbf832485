// Tabular data loaded from an uploaded CSV log
use super::column::ColumnInfo;
use super::time::{ELAPSED_MS_COLUMN, TimeRange};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field after type coercion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Null,
}

impl CellValue {
    /// Coerce a raw field: empty is absent, plain decimal literals are numeric,
    /// the rest is text.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            return CellValue::Null;
        }
        if !is_decimal_literal(field) {
            return CellValue::Text(field.to_string());
        }
        match field.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(field.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// `-?(digits[.digits]|.digits)([eE][+-]?digits)?`, no leading `+`, no
/// special values.
fn is_decimal_literal(field: &str) -> bool {
    let bytes = field.as_bytes();
    let mut i = 0;
    let digits = |i: &mut usize| {
        let start = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i - start
    };

    if bytes.first() == Some(&b'-') {
        i += 1;
    }
    let int_digits = digits(&mut i);
    let mut frac_digits = 0;
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        frac_digits = digits(&mut i);
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        if digits(&mut i) == 0 {
            return false;
        }
    }
    i == bytes.len()
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Null => Ok(()),
        }
    }
}

/// Column name to value, in header order.
pub type Row = IndexMap<String, CellValue>;

/// Result of a successful CSV ingestion.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
    pub column_info: IndexMap<String, ColumnInfo>,
    pub default_time_column: String,
}

impl Dataset {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Extent of the elapsed-time axis, from the first and last rows that
    /// carry a numeric elapsed time.
    ///
    /// Only defined when `time_column` is the elapsed-time column and at
    /// least one row has a numeric value.
    pub fn global_range(&self, time_column: &str) -> Option<TimeRange> {
        if time_column != ELAPSED_MS_COLUMN {
            return None;
        }
        let elapsed = |row: &Row| row.get(ELAPSED_MS_COLUMN).and_then(CellValue::as_f64);
        let start = self.rows.iter().find_map(elapsed)?;
        let end = self.rows.iter().rev().find_map(elapsed)?;
        Some(TimeRange::new(start, end))
    }
}
