// Projection of ingested rows into the series a chart renders
use super::column::ColumnInfo;
use super::csv_data::{CellValue, Row};
use super::time::{ELAPSED_MS_COLUMN, TimeRange, TimeResolution, convert};
use indexmap::IndexMap;
use serde::Serialize;

const Y_PADDING_FRACTION: f64 = 0.1;
const Y_PADDING_MIN: f64 = 0.1;
const DEFAULT_Y_DOMAIN: [f64; 2] = [0.0, 100.0];
/// Serialized name of [`ProjectedRow::original_ms`].
pub const ORIGINAL_MS_FIELD: &str = "original_ms";

/// A row re-expressed for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedRow {
    #[serde(flatten)]
    pub values: IndexMap<String, CellValue>,
    /// Raw elapsed milliseconds, kept when the time column was rescaled and
    /// no projected column already uses the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_ms: Option<f64>,
}

/// Filter rows to the visible window and rescale the time column.
///
/// Range filtering only applies to the elapsed-time column; any other time
/// column passes every row through untouched.
pub fn project_chart_data(
    rows: &[Row],
    selected_columns: &[String],
    time_column: &str,
    range: TimeRange,
    resolution: TimeResolution,
) -> Vec<ProjectedRow> {
    if rows.is_empty() || selected_columns.is_empty() {
        return Vec::new();
    }

    let elapsed_axis = time_column == ELAPSED_MS_COLUMN;
    let keep_original = !selected_columns.iter().any(|c| c == ORIGINAL_MS_FIELD);

    rows.iter()
        .filter_map(|row| {
            let time_value = row.get(time_column).cloned().unwrap_or_default();
            let raw_ms = time_value.as_f64();
            if elapsed_axis && !raw_ms.is_some_and(|ms| range.contains(ms)) {
                return None;
            }

            let mut values = IndexMap::with_capacity(selected_columns.len() + 1);
            let original_ms = match (elapsed_axis, raw_ms) {
                (true, Some(ms)) => {
                    values.insert(time_column.to_string(), CellValue::Number(convert(ms, resolution)));
                    keep_original.then_some(ms)
                }
                _ => {
                    values.insert(time_column.to_string(), time_value);
                    None
                }
            };

            for col in selected_columns {
                values.insert(col.clone(), row.get(col).cloned().unwrap_or_default());
            }

            Some(ProjectedRow { values, original_ms })
        })
        .collect()
}

/// Y axis bounds covering every selected column, padded by 10% and floored at 0.
pub fn y_domain(selected_columns: &[String], column_info: &IndexMap<String, ColumnInfo>) -> [f64; 2] {
    let bounds = selected_columns
        .iter()
        .filter_map(|col| column_info.get(col))
        .fold(None, |acc: Option<(f64, f64)>, info| match acc {
            Some((min, max)) => Some((min.min(info.min), max.max(info.max))),
            None => Some((info.min, info.max)),
        });

    match bounds {
        Some((min, max)) => {
            let padding = ((max - min) * Y_PADDING_FRACTION).max(Y_PADDING_MIN);
            [(min - padding).max(0.0), max + padding]
        }
        None => DEFAULT_Y_DOMAIN,
    }
}

/// How much of the dataset is on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    pub visible_range_ms: f64,
    pub total_range_ms: f64,
    pub percent_visible: f64,
    pub total_points: usize,
    pub visible_points: usize,
}

impl TimeStats {
    pub fn compute(rows: &[Row], range: TimeRange, visible_points: usize) -> Self {
        let elapsed = |row: &Row| row.get(ELAPSED_MS_COLUMN).and_then(CellValue::as_f64);
        let first = rows.iter().find_map(elapsed);
        let last = rows.iter().rev().find_map(elapsed);
        let total_range_ms = match (first, last) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        };
        let visible_range_ms = range.width();
        let percent_visible = if total_range_ms > 0.0 {
            (visible_range_ms / total_range_ms * 100.0).round()
        } else {
            100.0
        };

        Self {
            visible_range_ms,
            total_range_ms,
            percent_visible,
            total_points: rows.len(),
            visible_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::column::ColumnType;

    fn sample_rows() -> Vec<Row> {
        [(0.0, 10.0), (1000.0, 20.0), (2000.0, 15.0)]
            .iter()
            .map(|(ms, temp)| {
                [
                    (ELAPSED_MS_COLUMN.to_string(), CellValue::Number(*ms)),
                    ("temp".to_string(), CellValue::Number(*temp)),
                    ("mode".to_string(), CellValue::Text("drive".to_string())),
                ]
                .into_iter()
                .collect()
            })
            .collect()
    }

    fn info(name: &str, min: f64, max: f64) -> (String, ColumnInfo) {
        (
            name.to_string(),
            ColumnInfo {
                name: name.to_string(),
                min,
                max,
                avg: (min + max) / 2.0,
                column_type: ColumnType::Numeric,
            },
        )
    }

    #[test]
    fn test_full_range_in_seconds() {
        let rows = sample_rows();
        let projected = project_chart_data(
            &rows,
            &["temp".to_string()],
            ELAPSED_MS_COLUMN,
            TimeRange::new(0.0, 2000.0),
            TimeResolution::Seconds,
        );
        let times: Vec<f64> = projected.iter().map(|r| r.values[ELAPSED_MS_COLUMN].as_f64().unwrap()).collect();
        let temps: Vec<f64> = projected.iter().map(|r| r.values["temp"].as_f64().unwrap()).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(temps, vec![10.0, 20.0, 15.0]);
        assert_eq!(projected[2].original_ms, Some(2000.0));
        assert!(!projected[0].values.contains_key("mode"));
    }

    #[test]
    fn test_range_filter_is_inclusive() {
        let rows = sample_rows();
        let selected = vec!["temp".to_string()];
        let projected = project_chart_data(&rows, &selected, ELAPSED_MS_COLUMN, TimeRange::new(500.0, 1500.0), TimeResolution::Milliseconds);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].original_ms, Some(1000.0));

        let projected = project_chart_data(&rows, &selected, ELAPSED_MS_COLUMN, TimeRange::new(1000.0, 2000.0), TimeResolution::Milliseconds);
        assert_eq!(projected.len(), 2);
    }

    #[test]
    fn test_other_time_column_bypasses_filter() {
        let rows = sample_rows();
        let projected = project_chart_data(&rows, &["temp".to_string()], "mode", TimeRange::new(0.0, 0.0), TimeResolution::Seconds);
        assert_eq!(projected.len(), 3);
        assert_eq!(projected[0].values["mode"], CellValue::Text("drive".to_string()));
        assert_eq!(projected[0].original_ms, None);
    }

    #[test]
    fn test_empty_inputs() {
        let rows = sample_rows();
        assert!(project_chart_data(&rows, &[], ELAPSED_MS_COLUMN, TimeRange::new(0.0, 2000.0), TimeResolution::Seconds).is_empty());
        assert!(project_chart_data(&[], &["temp".to_string()], ELAPSED_MS_COLUMN, TimeRange::new(0.0, 2000.0), TimeResolution::Seconds).is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let rows = sample_rows();
        let projected = project_chart_data(&rows, &["temp".to_string()], ELAPSED_MS_COLUMN, TimeRange::new(1000.0, 1000.0), TimeResolution::Seconds);
        let json = serde_json::to_string(&projected).unwrap();
        assert_eq!(json, r#"[{"elapsed_ms":1.0,"temp":20.0,"original_ms":1000.0}]"#);
    }

    #[test]
    fn test_original_ms_column_is_not_duplicated() {
        let rows: Vec<Row> = vec![
            [
                (ELAPSED_MS_COLUMN.to_string(), CellValue::Number(1000.0)),
                (ORIGINAL_MS_FIELD.to_string(), CellValue::Number(7.0)),
            ]
            .into_iter()
            .collect(),
        ];
        let projected = project_chart_data(
            &rows,
            &[ORIGINAL_MS_FIELD.to_string()],
            ELAPSED_MS_COLUMN,
            TimeRange::new(0.0, 2000.0),
            TimeResolution::Seconds,
        );
        assert_eq!(projected[0].original_ms, None);
        let json = serde_json::to_string(&projected).unwrap();
        assert_eq!(json, r#"[{"elapsed_ms":1.0,"original_ms":7.0}]"#);
    }

    #[test]
    fn test_y_domain() {
        let infos: IndexMap<String, ColumnInfo> = [info("temp", 10.0, 20.0), info("volt", 300.0, 400.0)].into_iter().collect();
        assert_eq!(y_domain(&[], &infos), [0.0, 100.0]);

        let [lo, hi] = y_domain(&["temp".to_string()], &infos);
        assert!((lo - 9.0).abs() < 1e-9 && (hi - 21.0).abs() < 1e-9);

        let [lo, hi] = y_domain(&["temp".to_string(), "volt".to_string()], &infos);
        assert_eq!(lo, 0.0);
        assert!((hi - 439.0).abs() < 1e-9);
    }

    #[test]
    fn test_y_domain_minimum_padding() {
        let infos: IndexMap<String, ColumnInfo> = [info("flat", 5.0, 5.0)].into_iter().collect();
        let [lo, hi] = y_domain(&["flat".to_string()], &infos);
        assert!((lo - 4.9).abs() < 1e-9 && (hi - 5.1).abs() < 1e-9);
    }

    #[test]
    fn test_time_stats() {
        let rows = sample_rows();
        let stats = TimeStats::compute(&rows, TimeRange::new(500.0, 1500.0), 1);
        assert_eq!(stats.total_range_ms, 2000.0);
        assert_eq!(stats.visible_range_ms, 1000.0);
        assert_eq!(stats.percent_visible, 50.0);
        assert_eq!(stats.total_points, 3);
        assert_eq!(stats.visible_points, 1);

        let stats = TimeStats::compute(&[], TimeRange::default(), 0);
        assert_eq!(stats.percent_visible, 100.0);
    }

    #[test]
    fn test_time_stats_ignore_trailing_blank_elapsed() {
        let mut rows = sample_rows();
        rows.push([(ELAPSED_MS_COLUMN.to_string(), CellValue::Null)].into_iter().collect());
        let stats = TimeStats::compute(&rows, TimeRange::new(0.0, 2000.0), 3);
        assert_eq!(stats.total_range_ms, 2000.0);
        assert_eq!(stats.percent_visible, 100.0);
        assert_eq!(stats.total_points, 4);
    }
}
