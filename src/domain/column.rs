// Per-column statistics for an ingested dataset
use super::csv_data::{CellValue, Row};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Text,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnInfo {
    fn non_numeric(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            min: 0.0,
            max: 0.0,
            avg: 0.0,
            column_type,
        }
    }
}

/// Compute statistics for every column, keyed and ordered by `columns`.
pub fn calculate_column_stats(rows: &[Row], columns: &[String]) -> IndexMap<String, ColumnInfo> {
    columns
        .iter()
        .map(|col| (col.clone(), column_info(rows, col)))
        .collect()
}

/// Statistics for a single column.
///
/// Only numeric values contribute to min/max/avg; text in an otherwise
/// numeric column is skipped rather than coerced. A column with no numeric
/// values is typed from its first non-null value.
pub fn column_info(rows: &[Row], name: &str) -> ColumnInfo {
    let values: Vec<&CellValue> = rows
        .iter()
        .filter_map(|row| row.get(name))
        .filter(|v| !v.is_null())
        .collect();

    let numeric: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    if numeric.is_empty() {
        let column_type = match values.first() {
            Some(CellValue::Text(_)) => ColumnType::Text,
            _ => ColumnType::Unknown,
        };
        return ColumnInfo::non_numeric(name, column_type);
    }

    let min = numeric.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = numeric.iter().sum::<f64>() / numeric.len() as f64;

    ColumnInfo {
        name: name.to_string(),
        min: round2(min),
        max: round2(max),
        avg: round2(avg),
        column_type: ColumnType::Numeric,
    }
}

/// Round to two fractional digits, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
