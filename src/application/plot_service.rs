// Plot service - Session state for exploring an uploaded CSV log
use crate::application::csv_ingestion::{IngestError, parse_csv};
use crate::domain::chart::{ProjectedRow, TimeStats, project_chart_data, y_domain};
use crate::domain::column::ColumnInfo;
use crate::domain::csv_data::{CellValue, Dataset};
use crate::domain::time::{ELAPSED_MS_COLUMN, TimeRange, TimeResolution, convert, format_time_value};
use crate::domain::time_window::{Edge, PanDirection, TimeRangeController};
use bytes::Bytes;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("Only .csv files are supported, got {0}")]
    UnsupportedFile(String),
    #[error("No CSV file has been loaded")]
    NoDataset,
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
    #[error("Upload superseded by a newer upload")]
    Superseded,
    #[error("CSV parse task failed: {0}")]
    Task(String),
}

#[derive(Debug)]
struct LoadedFile {
    filename: String,
    dataset: Dataset,
}

#[derive(Debug, Default)]
struct PlotSession {
    file: Option<LoadedFile>,
    selected_columns: Vec<String>,
    time_column: String,
    resolution: TimeResolution,
    controller: TimeRangeController,
    last_error: Option<String>,
}

impl PlotSession {
    fn load(&mut self, filename: String, dataset: Dataset) {
        self.time_column = dataset.default_time_column.clone();
        self.selected_columns.clear();
        self.last_error = None;
        self.file = Some(LoadedFile { filename, dataset });
        self.reseed();
    }

    /// Reset the window to the full extent of the current time axis.
    fn reseed(&mut self) {
        let global = self
            .file
            .as_ref()
            .and_then(|f| f.dataset.global_range(&self.time_column))
            .unwrap_or_default();
        self.controller = TimeRangeController::new(global);
    }

    fn dataset(&self) -> Result<&Dataset, PlotError> {
        self.file.as_ref().map(|f| &f.dataset).ok_or(PlotError::NoDataset)
    }

    fn has_time_axis(&self) -> bool {
        self.file
            .as_ref()
            .is_some_and(|f| self.time_column == ELAPSED_MS_COLUMN && f.dataset.has_column(ELAPSED_MS_COLUMN))
    }

    fn range_view(&self) -> RangeView {
        RangeView {
            range: self.controller.current(),
            global: self.controller.global(),
            slider: self.controller.normalized_slider(),
        }
    }

    fn summary(&self) -> DatasetSummary {
        let (filename, columns, column_info, total_rows) = match &self.file {
            Some(f) => (
                Some(f.filename.clone()),
                f.dataset.columns.clone(),
                f.dataset.column_info.clone(),
                f.dataset.rows.len(),
            ),
            None => (None, Vec::new(), IndexMap::new(), 0),
        };
        DatasetSummary {
            filename,
            columns,
            column_info,
            total_rows,
            selected_columns: self.selected_columns.clone(),
            time_column: self.time_column.clone(),
            resolution: self.resolution,
            has_time_axis: self.has_time_axis(),
            last_error: self.last_error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub filename: Option<String>,
    pub columns: Vec<String>,
    pub column_info: IndexMap<String, ColumnInfo>,
    pub total_rows: usize,
    pub selected_columns: Vec<String>,
    pub time_column: String,
    pub resolution: TimeResolution,
    pub has_time_axis: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeView {
    pub range: TimeRange,
    pub global: TimeRange,
    pub slider: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub rows: Vec<ProjectedRow>,
    pub selected_columns: Vec<String>,
    pub time_column: String,
    pub resolution: TimeResolution,
    pub axis_label: &'static str,
    /// Display text for the window edges, empty without a time axis.
    pub range_labels: [String; 2],
    pub y_domain: [f64; 2],
    pub time_stats: TimeStats,
    pub range: RangeView,
}

/// A range operation requested by the client.
#[derive(Debug, Clone, Copy)]
pub enum RangeCommand {
    ZoomIn,
    ZoomOut,
    Reset,
    Pan(PanDirection),
    JumpTo(Edge),
    Normalized { start_pct: f64, end_pct: f64 },
    Set(TimeRange),
}

#[derive(Clone, Default)]
pub struct PlotService {
    session: Arc<RwLock<PlotSession>>,
    generation: Arc<AtomicU64>,
}

impl PlotService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and load a CSV upload, replacing the current dataset.
    ///
    /// Parsing runs on the blocking pool. If another upload starts before
    /// this one finishes, this result is dropped and `Superseded` returned.
    /// A failed parse leaves the previously loaded dataset in place.
    pub async fn upload(&self, filename: String, bytes: Bytes) -> Result<DatasetSummary, PlotError> {
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(PlotError::UnsupportedFile(filename));
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!("Parsing {} ({} bytes), upload #{}", filename, bytes.len(), generation);

        let parsed = tokio::task::spawn_blocking(move || parse_csv(&bytes))
            .await
            .map_err(|e| PlotError::Task(e.to_string()))?;

        let mut session = self.session.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding stale parse result for upload #{}", generation);
            return Err(PlotError::Superseded);
        }

        match parsed {
            Ok(dataset) => {
                tracing::info!(
                    "Loaded {}: {} rows, {} columns",
                    filename,
                    dataset.rows.len(),
                    dataset.columns.len()
                );
                session.load(filename, dataset);
                Ok(session.summary())
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", filename, e);
                session.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub async fn summary(&self) -> DatasetSummary {
        self.session.read().await.summary()
    }

    pub async fn select_columns(&self, columns: Vec<String>) -> Result<DatasetSummary, PlotError> {
        let mut session = self.session.write().await;
        let dataset = session.dataset()?;
        if let Some(unknown) = columns.iter().find(|c| !dataset.has_column(c)) {
            return Err(PlotError::UnknownColumn(unknown.clone()));
        }
        session.selected_columns = columns;
        Ok(session.summary())
    }

    /// Switch the time axis. Choosing the elapsed-time column re-enables windowing.
    pub async fn set_time_column(&self, column: String) -> Result<DatasetSummary, PlotError> {
        let mut session = self.session.write().await;
        if !session.dataset()?.has_column(&column) {
            return Err(PlotError::UnknownColumn(column));
        }
        session.time_column = column;
        session.reseed();
        Ok(session.summary())
    }

    pub async fn set_resolution(&self, resolution: TimeResolution) -> DatasetSummary {
        let mut session = self.session.write().await;
        session.resolution = resolution;
        session.summary()
    }

    pub async fn range(&self) -> RangeView {
        self.session.read().await.range_view()
    }

    pub async fn apply_range(&self, command: RangeCommand) -> RangeView {
        let mut session = self.session.write().await;
        let controller = &mut session.controller;
        match command {
            RangeCommand::ZoomIn => controller.zoom_in(),
            RangeCommand::ZoomOut => controller.zoom_out(),
            RangeCommand::Reset => controller.reset_zoom(),
            RangeCommand::Pan(direction) => controller.pan(direction),
            RangeCommand::JumpTo(edge) => controller.jump_to_edge(edge),
            RangeCommand::Normalized { start_pct, end_pct } => controller.set_from_normalized(start_pct, end_pct),
            RangeCommand::Set(range) => controller.set_range(range),
        };
        session.range_view()
    }

    /// Rows, axis bounds and statistics for the current selection and window.
    pub async fn chart(&self) -> ChartView {
        let session = self.session.read().await;
        let range = session.controller.current();
        let (rows, y_domain, time_stats) = match session.dataset() {
            Ok(dataset) => {
                let rows = project_chart_data(
                    &dataset.rows,
                    &session.selected_columns,
                    &session.time_column,
                    range,
                    session.resolution,
                );
                let domain = y_domain(&session.selected_columns, &dataset.column_info);
                let stats = TimeStats::compute(&dataset.rows, range, rows.len());
                (rows, domain, stats)
            }
            Err(_) => (
                Vec::new(),
                y_domain(&[], &IndexMap::new()),
                TimeStats::compute(&[], range, 0),
            ),
        };

        let range_labels = if session.has_time_axis() {
            [range.start, range.end].map(|ms| {
                let value = CellValue::Number(convert(ms, session.resolution));
                format_time_value(&value, ELAPSED_MS_COLUMN, session.resolution)
            })
        } else {
            [String::new(), String::new()]
        };

        ChartView {
            rows,
            selected_columns: session.selected_columns.clone(),
            time_column: session.time_column.clone(),
            resolution: session.resolution,
            axis_label: session.resolution.unit_label(),
            range_labels,
            y_domain,
            time_stats,
            range: session.range_view(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"elapsed_ms,temp\n0,10.0\n1000,20.0\n2000,15.0\n";

    async fn loaded() -> PlotService {
        let service = PlotService::new();
        service
            .upload("drive.csv".to_string(), Bytes::from_static(SAMPLE))
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_upload_seeds_session() {
        let service = loaded().await;
        let summary = service.summary().await;
        assert_eq!(summary.filename.as_deref(), Some("drive.csv"));
        assert_eq!(summary.time_column, "elapsed_ms");
        assert!(summary.has_time_axis);
        assert!(summary.selected_columns.is_empty());

        let range = service.range().await;
        assert_eq!(range.range, TimeRange::new(0.0, 2000.0));
        assert_eq!(range.global, TimeRange::new(0.0, 2000.0));
    }

    #[tokio::test]
    async fn test_chart_in_seconds() {
        let service = loaded().await;
        service.select_columns(vec!["temp".to_string()]).await.unwrap();
        service.set_resolution(TimeResolution::Seconds).await;

        let chart = service.chart().await;
        let times: Vec<f64> = chart.rows.iter().map(|r| r.values["elapsed_ms"].as_f64().unwrap()).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(chart.axis_label, "Time (sec)");
        assert_eq!(chart.range_labels, ["0.00 s".to_string(), "2.00 s".to_string()]);
        assert_eq!(chart.time_stats.visible_points, 3);
    }

    #[tokio::test]
    async fn test_windowed_chart() {
        let service = loaded().await;
        service.select_columns(vec!["temp".to_string()]).await.unwrap();
        service.apply_range(RangeCommand::Set(TimeRange::new(500.0, 1500.0))).await;

        let chart = service.chart().await;
        assert_eq!(chart.rows.len(), 1);
        assert_eq!(chart.rows[0].original_ms, Some(1000.0));
        assert_eq!(chart.time_stats.percent_visible, 50.0);
    }

    #[tokio::test]
    async fn test_jump_to_end() {
        let service = loaded().await;
        service.apply_range(RangeCommand::Set(TimeRange::new(200.0, 700.0))).await;
        let view = service.apply_range(RangeCommand::JumpTo(Edge::End)).await;
        assert_eq!(view.range, TimeRange::new(1500.0, 2000.0));
        assert_eq!(view.slider, [75.0, 100.0]);
    }

    #[tokio::test]
    async fn test_empty_upload_keeps_previous_dataset() {
        let service = loaded().await;
        let err = service
            .upload("empty.csv".to_string(), Bytes::from_static(b"elapsed_ms,temp\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlotError::Ingest(IngestError::EmptyData)));

        let summary = service.summary().await;
        assert_eq!(summary.filename.as_deref(), Some("drive.csv"));
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.last_error.as_deref(), Some("CSV file contains no data rows"));
    }

    #[tokio::test]
    async fn test_rejects_non_csv() {
        let service = PlotService::new();
        let err = service
            .upload("notes.txt".to_string(), Bytes::from_static(SAMPLE))
            .await
            .unwrap_err();
        assert!(matches!(err, PlotError::UnsupportedFile(_)));
    }

    #[tokio::test]
    async fn test_unknown_columns_rejected() {
        let service = loaded().await;
        let err = service.select_columns(vec!["speed".to_string()]).await.unwrap_err();
        assert!(matches!(err, PlotError::UnknownColumn(c) if c == "speed"));
        assert!(matches!(
            PlotService::new().select_columns(vec![]).await.unwrap_err(),
            PlotError::NoDataset
        ));
    }

    #[tokio::test]
    async fn test_switching_time_column_disables_window() {
        let service = PlotService::new();
        service
            .upload(
                "mixed.csv".to_string(),
                Bytes::from_static(b"elapsed_ms,timestamp,temp\n0,10:00:00,1\n500,10:00:01,2\n"),
            )
            .await
            .unwrap();
        let summary = service.set_time_column("timestamp".to_string()).await.unwrap();
        assert!(!summary.has_time_axis);
        assert_eq!(service.range().await.global, TimeRange::default());

        service.select_columns(vec!["temp".to_string()]).await.unwrap();
        assert_eq!(service.chart().await.rows.len(), 2);

        service.set_time_column("elapsed_ms".to_string()).await.unwrap();
        assert_eq!(service.range().await.global, TimeRange::new(0.0, 500.0));
    }

    #[tokio::test]
    async fn test_trailing_blank_elapsed_keeps_full_window() {
        let service = PlotService::new();
        service
            .upload(
                "partial.csv".to_string(),
                Bytes::from_static(b"elapsed_ms,temp\n0,10\n1000,20\n2000,15\n,16\n"),
            )
            .await
            .unwrap();
        service.select_columns(vec!["temp".to_string()]).await.unwrap();

        let summary = service.summary().await;
        assert!(summary.has_time_axis);
        let range = service.range().await;
        assert_eq!(range.global, TimeRange::new(0.0, 2000.0));
        assert_eq!(range.range, TimeRange::new(0.0, 2000.0));
        assert_eq!(service.chart().await.rows.len(), 3);
    }

    #[tokio::test]
    async fn test_chart_without_dataset() {
        let chart = PlotService::new().chart().await;
        assert!(chart.rows.is_empty());
        assert_eq!(chart.y_domain, [0.0, 100.0]);
    }
}
