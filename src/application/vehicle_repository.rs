// Repository trait for the vehicle backend
use crate::domain::telemetry::{LogFile, SignalSnapshot};
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Latest value of every signal the backend currently knows about
    async fn snapshot(&self) -> anyhow::Result<SignalSnapshot>;

    /// Finished recordings, newest last
    async fn list_logs(&self) -> anyhow::Result<Vec<LogFile>>;

    /// Start recording the given signal keys, returning the new log id
    async fn start_logging(&self, keys: &[String]) -> anyhow::Result<i64>;

    /// Stop the active recording, returning the id of the saved log
    async fn stop_logging(&self) -> anyhow::Result<i64>;

    /// Raw CSV content of a finished recording
    async fn download_log(&self, id: i64) -> anyhow::Result<Bytes>;
}
