// HTTP client for the vehicle backend process
use crate::application::vehicle_repository::VehicleRepository;
use crate::domain::telemetry::{LogFile, SignalSnapshot};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct StartLoggingRequest<'a> {
    keys: &'a [String],
}

#[derive(Debug, Deserialize)]
struct LogIdResponse {
    log_id: i64,
}

#[derive(Debug, Deserialize)]
struct LogListResponse {
    #[serde(default)]
    logs: Vec<LogFile>,
}

impl BackendClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build backend HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Backend request failed with status {}: {}", status, body);
        }
        Ok(response)
    }
}

/// Keep numeric signals only; the backend may mix in status strings.
fn numeric_signals(raw: HashMap<String, serde_json::Value>) -> SignalSnapshot {
    raw.into_iter()
        .filter_map(|(key, value)| value.as_f64().map(|v| (key, v)))
        .collect()
}

#[async_trait]
impl VehicleRepository for BackendClient {
    async fn snapshot(&self) -> Result<SignalSnapshot> {
        let response = self
            .client
            .get(self.url("/vehicle_data"))
            .send()
            .await
            .context("Failed to reach backend for vehicle data")?;
        let raw = Self::check(response)
            .await?
            .json::<HashMap<String, serde_json::Value>>()
            .await
            .context("Failed to parse vehicle data")?;
        Ok(numeric_signals(raw))
    }

    async fn list_logs(&self) -> Result<Vec<LogFile>> {
        let response = self
            .client
            .get(self.url("/logs"))
            .send()
            .await
            .context("Failed to reach backend for log list")?;
        let list = Self::check(response)
            .await?
            .json::<LogListResponse>()
            .await
            .context("Failed to parse log list")?;
        tracing::debug!("Backend reported {} log files", list.logs.len());
        Ok(list.logs)
    }

    async fn start_logging(&self, keys: &[String]) -> Result<i64> {
        let response = self
            .client
            .post(self.url("/logs/start"))
            .json(&StartLoggingRequest { keys })
            .send()
            .await
            .context("Failed to start logging")?;
        let body = Self::check(response).await?.json::<LogIdResponse>().await?;
        Ok(body.log_id)
    }

    async fn stop_logging(&self) -> Result<i64> {
        let response = self
            .client
            .post(self.url("/logs/stop"))
            .send()
            .await
            .context("Failed to stop logging")?;
        let body = Self::check(response).await?.json::<LogIdResponse>().await?;
        Ok(body.log_id)
    }

    async fn download_log(&self, id: i64) -> Result<Bytes> {
        let response = self
            .client
            .get(self.url(&format!("/logs/{}", id)))
            .send()
            .await
            .with_context(|| format!("Failed to download log {}", id))?;
        Ok(Self::check(response).await?.bytes().await?)
    }
}
