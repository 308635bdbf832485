// CSV ingestion - Parses an uploaded log into typed rows with column statistics
use crate::domain::column::calculate_column_stats;
use crate::domain::csv_data::{CellValue, Dataset, Row};
use crate::domain::time::{ELAPSED_MS_COLUMN, TIMESTAMP_COLUMN};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IngestError {
    #[error("Error parsing CSV: {0}")]
    Parse(String),
    #[error("CSV file contains no data rows")]
    EmptyData,
}

/// Parse delimited text with a header row.
///
/// Every field is coerced independently: finite numbers become numeric,
/// empty fields become null, everything else stays text. Blank lines are
/// skipped. The first record whose field count differs from the header
/// aborts the parse.
pub fn parse_csv(input: &[u8]) -> Result<Dataset, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<Row> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IngestError::Parse(e.to_string()))?;
        if let Some(message) = field_count_error(headers.len(), record.len()) {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            tracing::debug!("Rejecting CSV at line {}: {}", line, message);
            return Err(IngestError::Parse(message));
        }

        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = record.get(i).map(CellValue::from_field).unwrap_or_default();
                (name.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(IngestError::EmptyData);
    }

    let columns: Vec<String> = rows[0].keys().cloned().collect();
    let column_info = calculate_column_stats(&rows, &columns);
    let default_time_column = default_time_column(&columns);

    if default_time_column == ELAPSED_MS_COLUMN {
        sort_by_elapsed(&mut rows);
    }

    tracing::debug!(
        "Parsed {} rows across {} columns, time column {}",
        rows.len(),
        columns.len(),
        default_time_column
    );

    Ok(Dataset {
        rows,
        columns,
        column_info,
        default_time_column: default_time_column.to_string(),
    })
}

fn field_count_error(expected: usize, parsed: usize) -> Option<String> {
    let kind = match parsed.cmp(&expected) {
        Ordering::Less => "Too few fields",
        Ordering::Greater => "Too many fields",
        Ordering::Equal => return None,
    };
    Some(format!("{}: expected {} fields but parsed {}", kind, expected, parsed))
}

/// `elapsed_ms` when present, else `timestamp`, else `elapsed_ms` even though absent.
fn default_time_column(columns: &[String]) -> &'static str {
    let has = |name: &str| columns.iter().any(|c| c == name);
    if has(ELAPSED_MS_COLUMN) {
        ELAPSED_MS_COLUMN
    } else if has(TIMESTAMP_COLUMN) {
        TIMESTAMP_COLUMN
    } else {
        ELAPSED_MS_COLUMN
    }
}

/// Stable ascending sort; rows without a numeric elapsed time go last.
fn sort_by_elapsed(rows: &mut [Row]) {
    let key = |row: &Row| row.get(ELAPSED_MS_COLUMN).and_then(CellValue::as_f64);
    rows.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::column::ColumnType;
    use crate::domain::time::TimeRange;

    #[test]
    fn test_parse_basic_log() {
        let csv = b"elapsed_ms,temp\n0,10.0\n1000,20.0\n2000,15.0\n";
        let dataset = parse_csv(csv).unwrap();

        assert_eq!(dataset.default_time_column, "elapsed_ms");
        assert_eq!(dataset.columns, vec!["elapsed_ms", "temp"]);
        assert_eq!(dataset.rows.len(), 3);

        let temp = &dataset.column_info["temp"];
        assert_eq!(temp.column_type, ColumnType::Numeric);
        assert_eq!((temp.min, temp.max, temp.avg), (10.0, 20.0, 15.0));
        assert_eq!(dataset.global_range("elapsed_ms"), Some(TimeRange::new(0.0, 2000.0)));
    }

    #[test]
    fn test_rows_sorted_by_elapsed() {
        let csv = b"elapsed_ms,tag\n300,a\n100,b\n200,c\n100,d\n";
        let dataset = parse_csv(csv).unwrap();
        let tags: Vec<String> = dataset.rows.iter().map(|r| r["tag"].to_string()).collect();
        assert_eq!(tags, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_timestamp_fallback_is_not_sorted() {
        let csv = b"timestamp,speed\n2024-01-01 10:00:02,5\n2024-01-01 10:00:01,4\n";
        let dataset = parse_csv(csv).unwrap();
        assert_eq!(dataset.default_time_column, "timestamp");
        assert_eq!(dataset.rows[0]["speed"], CellValue::Number(5.0));
        assert_eq!(dataset.column_info["timestamp"].column_type, ColumnType::Text);
    }

    #[test]
    fn test_missing_time_column_defaults_to_elapsed() {
        let dataset = parse_csv(b"a,b\n1,2\n").unwrap();
        assert_eq!(dataset.default_time_column, "elapsed_ms");
        assert!(!dataset.has_column("elapsed_ms"));
        assert_eq!(dataset.global_range("elapsed_ms"), None);
    }

    #[test]
    fn test_trims_and_skips_blank_lines() {
        let csv = b" elapsed_ms , volt \n\n0, 3.7\n\n5,\n";
        let dataset = parse_csv(csv).unwrap();
        assert_eq!(dataset.columns, vec!["elapsed_ms", "volt"]);
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.rows[0]["volt"], CellValue::Number(3.7));
        assert_eq!(dataset.rows[1]["volt"], CellValue::Null);
    }

    #[test]
    fn test_short_rows_are_parse_error() {
        let err = parse_csv(b"elapsed_ms,temp,volt\n0,10,3.7\n1000,20\n").unwrap_err();
        assert_eq!(
            err,
            IngestError::Parse("Too few fields: expected 3 fields but parsed 2".to_string())
        );
        assert_eq!(
            err.to_string(),
            "Error parsing CSV: Too few fields: expected 3 fields but parsed 2"
        );
    }

    #[test]
    fn test_header_only_is_empty_data() {
        assert_eq!(parse_csv(b"elapsed_ms,temp\n").unwrap_err(), IngestError::EmptyData);
        assert_eq!(parse_csv(b"").unwrap_err(), IngestError::EmptyData);
        assert_eq!(IngestError::EmptyData.to_string(), "CSV file contains no data rows");
    }

    #[test]
    fn test_extra_fields_are_parse_error() {
        let err = parse_csv(b"a,b\n1,2\n1,2,3\n").unwrap_err();
        assert_eq!(
            err,
            IngestError::Parse("Too many fields: expected 2 fields but parsed 3".to_string())
        );
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = parse_csv(b"a,b\n1,\xff\n").unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
        assert!(err.to_string().starts_with("Error parsing CSV: "));
    }
}
