// Mapping of service errors onto HTTP responses
use crate::application::csv_ingestion::IngestError;
use crate::application::plot_service::PlotError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Plot(PlotError),
    Backend(anyhow::Error),
}

impl From<PlotError> for ApiError {
    fn from(e: PlotError) -> Self {
        ApiError::Plot(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Backend(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Plot(PlotError::Ingest(IngestError::Parse(_)))
            | ApiError::Plot(PlotError::Ingest(IngestError::EmptyData))
            | ApiError::Plot(PlotError::UnsupportedFile(_))
            | ApiError::Plot(PlotError::UnknownColumn(_)) => StatusCode::BAD_REQUEST,
            ApiError::Plot(PlotError::NoDataset) | ApiError::Plot(PlotError::Superseded) => StatusCode::CONFLICT,
            ApiError::Plot(PlotError::Task(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Plot(e) => e.to_string(),
            ApiError::Backend(e) => format!("{:#}", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.message());
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(PlotError::Ingest(IngestError::EmptyData)).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(PlotError::NoDataset).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(anyhow::anyhow!("down")).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::from(PlotError::Ingest(IngestError::Parse("bad quote".to_string()))).message(),
            "Error parsing CSV: bad quote"
        );
    }
}
