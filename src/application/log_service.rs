// Log service - Use case for recording and retrieving telemetry logs
use crate::application::vehicle_repository::VehicleRepository;
use crate::domain::telemetry::LogFile;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordingStatus {
    pub recording: bool,
    pub log_id: Option<i64>,
    pub signal_count: usize,
}

#[derive(Clone)]
pub struct LogService {
    repository: Arc<dyn VehicleRepository>,
    status: Arc<Mutex<RecordingStatus>>,
}

impl LogService {
    pub fn new(repository: Arc<dyn VehicleRepository>) -> Self {
        Self {
            repository,
            status: Arc::new(Mutex::new(RecordingStatus {
                recording: false,
                log_id: None,
                signal_count: 0,
            })),
        }
    }

    pub async fn list_logs(&self) -> anyhow::Result<Vec<LogFile>> {
        self.repository.list_logs().await
    }

    pub async fn status(&self) -> RecordingStatus {
        self.status.lock().await.clone()
    }

    /// Stop the active recording, or start one over `keys` (deduplicated, order kept).
    pub async fn toggle_recording(&self, keys: Vec<String>) -> anyhow::Result<RecordingStatus> {
        let mut status = self.status.lock().await;
        if status.recording {
            let id = self.repository.stop_logging().await?;
            tracing::info!("Stopped logging, saved keymetrics-{}.csv", id);
            *status = RecordingStatus {
                recording: false,
                log_id: Some(id),
                signal_count: 0,
            };
        } else {
            let mut unique = Vec::with_capacity(keys.len());
            for key in keys {
                if !unique.contains(&key) {
                    unique.push(key);
                }
            }
            let id = self.repository.start_logging(&unique).await?;
            tracing::info!("Started logging {} signals with id {}", unique.len(), id);
            *status = RecordingStatus {
                recording: true,
                log_id: Some(id),
                signal_count: unique.len(),
            };
        }
        Ok(status.clone())
    }

    pub async fn download(&self, id: i64) -> anyhow::Result<Bytes> {
        self.repository.download_log(id).await
    }
}
