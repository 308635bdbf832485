// HTTP request handlers
use crate::application::plot_service::RangeCommand;
use crate::domain::telemetry::LogFile;
use crate::domain::time::{TimeRange, TimeResolution};
use crate::domain::time_window::{Edge, PanDirection};
use crate::infrastructure::http_response::{accepts_brotli, csv_response, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct SelectionRequest {
    pub columns: Option<Vec<String>>,
    pub time_column: Option<String>,
    pub resolution: Option<TimeResolution>,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum RangeRequest {
    Normalized { start_pct: f64, end_pct: f64 },
    Absolute { start: f64, end: f64 },
}

#[derive(Serialize)]
pub struct LogFileView {
    #[serde(flatten)]
    pub file: LogFile,
    pub size: String,
}

#[derive(Deserialize, Default)]
pub struct RecordingRequest {
    #[serde(default)]
    pub keys: Vec<String>,
}

async fn respond<T: Serialize>(headers: &HeaderMap, result: Result<T, ApiError>) -> Response {
    match result {
        Ok(data) => match json_response(StatusCode::OK, &data, accepts_brotli(headers)).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => e.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Load a CSV file sent as the raw request body
pub async fn upload_csv(
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let filename = query.filename.unwrap_or_else(|| "upload.csv".to_string());
    let result = state.plot_service.upload(filename, body).await;
    respond(&headers, result.map_err(ApiError::from)).await
}

pub async fn get_summary(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let summary = state.plot_service.summary().await;
    respond(&headers, Ok(summary)).await
}

/// Update column selection, time column and display resolution in one call
pub async fn update_selection(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectionRequest>,
) -> Response {
    let result = async move {
        let service = &state.plot_service;
        if let Some(time_column) = request.time_column {
            service.set_time_column(time_column).await?;
        }
        if let Some(columns) = request.columns {
            service.select_columns(columns).await?;
        }
        if let Some(resolution) = request.resolution {
            service.set_resolution(resolution).await;
        }
        Ok::<_, ApiError>(service.summary().await)
    }
    .await;
    respond(&headers, result).await
}

pub async fn get_range(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state.plot_service.range().await;
    respond(&headers, Ok(view)).await
}

pub async fn set_range(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<RangeRequest>,
) -> Response {
    let command = match request {
        RangeRequest::Normalized { start_pct, end_pct } => RangeCommand::Normalized { start_pct, end_pct },
        RangeRequest::Absolute { start, end } => RangeCommand::Set(TimeRange::new(start, end)),
    };
    let view = state.plot_service.apply_range(command).await;
    respond(&headers, Ok(view)).await
}

pub async fn zoom_in(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state.plot_service.apply_range(RangeCommand::ZoomIn).await;
    respond(&headers, Ok(view)).await
}

pub async fn zoom_out(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state.plot_service.apply_range(RangeCommand::ZoomOut).await;
    respond(&headers, Ok(view)).await
}

pub async fn reset_zoom(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state.plot_service.apply_range(RangeCommand::Reset).await;
    respond(&headers, Ok(view)).await
}

pub async fn pan(
    Path(direction): Path<PanDirection>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let view = state.plot_service.apply_range(RangeCommand::Pan(direction)).await;
    respond(&headers, Ok(view)).await
}

pub async fn jump_to_edge(
    Path(edge): Path<Edge>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let view = state.plot_service.apply_range(RangeCommand::JumpTo(edge)).await;
    respond(&headers, Ok(view)).await
}

/// Projected rows and axis data for the current window
pub async fn get_chart(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let chart = state.plot_service.chart().await;
    respond(&headers, Ok(chart)).await
}

pub async fn get_extrema(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state.extremum_service.view().await;
    respond(&headers, Ok(view)).await
}

pub async fn reset_extrema(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state.extremum_service.reset().await;
    respond(&headers, Ok(view)).await
}

pub async fn get_charging(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state.extremum_service.charging().await;
    respond(&headers, Ok(view)).await
}

pub async fn restart_charging(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state.extremum_service.restart_charging().await;
    respond(&headers, Ok(view)).await
}

pub async fn get_battery_temperatures(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let temps = state.extremum_service.battery_temperatures().await;
    respond(&headers, Ok(temps)).await
}

pub async fn list_logs(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let result = state
        .log_service
        .list_logs()
        .await
        .map(|logs| {
            logs.into_iter()
                .map(|file| LogFileView {
                    size: file.display_size(),
                    file,
                })
                .collect::<Vec<_>>()
        })
        .map_err(|e| {
            tracing::warn!("Error fetching logs: {:#}", e);
            ApiError::from(e)
        });
    respond(&headers, result).await
}

pub async fn get_recording(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let status = state.log_service.status().await;
    respond(&headers, Ok(status)).await
}

/// Start or stop recording. Without explicit keys, every tracked signal is recorded.
pub async fn toggle_recording(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    request: Option<Json<RecordingRequest>>,
) -> Response {
    let mut keys = request.map(|Json(r)| r.keys).unwrap_or_default();
    if keys.is_empty() {
        keys = state.extremum_service.tracked_keys().await;
    }
    let result = state.log_service.toggle_recording(keys).await.map_err(ApiError::from);
    respond(&headers, result).await
}

pub async fn download_log(Path(id): Path<i64>, State(state): State<Arc<AppState>>) -> Response {
    match state.log_service.download(id).await {
        Ok(content) => match csv_response(&format!("keymetrics-{}.csv", id), content) {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Fetch a recorded log from the backend and load it into the plot view
pub async fn open_log(
    Path(id): Path<i64>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let result = async move {
        let content = state.log_service.download(id).await?;
        let summary = state
            .plot_service
            .upload(format!("keymetrics-{}.csv", id), content)
            .await?;
        Ok::<_, ApiError>(summary)
    }
    .await;
    respond(&headers, result).await
}
