use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub request_timeout_ms: u64,
    /// Executable to launch alongside the service, if any.
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    pub poll_interval_ms: u64,
    pub dc_bus_current_key: Option<String>,
    /// Pack voltage sampled into the charging history.
    pub charging_voltage_key: String,
    pub charging_history_len: usize,
    #[serde(default)]
    pub signals: Vec<SignalConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SignalConfig {
    pub key: String,
    pub label: Option<String>,
    pub unit: Option<String>,
    /// One of `min`, `max` or `current`.
    pub mode: String,
    pub warn_below: Option<f64>,
    pub warn_above: Option<f64>,
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8000")?
        .set_default("server.max_upload_bytes", 64 * 1024 * 1024)?
        .set_default("backend.base_url", "http://127.0.0.1:8001")?
        .set_default("backend.request_timeout_ms", 2000)?
        .set_default("telemetry.poll_interval_ms", 1000)?
        .set_default("telemetry.charging_voltage_key", "BMS_TX_STATE_1.VOLT_1")?
        .set_default("telemetry.charging_history_len", 120)?)
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// The configuration shipped in `config/dashboard.toml`, over the built-in defaults.
#[cfg(test)]
pub(crate) fn shipped_config() -> AppConfig {
    builder()
        .unwrap()
        .add_source(config::File::from_str(
            include_str!("../../config/dashboard.toml"),
            config::FileFormat::Toml,
        ))
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}
