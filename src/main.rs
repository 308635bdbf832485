// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::extremum_service::ExtremumService;
use crate::application::log_service::LogService;
use crate::application::plot_service::PlotService;
use crate::infrastructure::backend_client::BackendClient;
use crate::infrastructure::backend_process::BackendProcess;
use crate::infrastructure::config::load_config;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    download_log, get_battery_temperatures, get_charging, get_chart, get_extrema, get_range,
    get_recording, get_summary, health_check, jump_to_edge, list_logs, open_log, pan,
    reset_extrema, reset_zoom, restart_charging, set_range, toggle_recording, update_selection,
    upload_csv, zoom_in, zoom_out,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_config()?;

    // Launch the backend before anything starts polling it
    let backend = match BackendProcess::spawn(&config.backend) {
        Ok(process) => process,
        Err(e) => {
            tracing::error!("Backend not started: {:#}", e);
            None
        }
    };

    // Create repository (infrastructure layer)
    let repository = Arc::new(BackendClient::new(
        config.backend.base_url.clone(),
        Duration::from_millis(config.backend.request_timeout_ms),
    )?);

    // Create services (application layer)
    let plot_service = PlotService::new();
    let extremum_service = ExtremumService::new(repository.clone(), &config.telemetry);
    let log_service = LogService::new(repository.clone());

    let poller = extremum_service.spawn_polling(Duration::from_millis(config.telemetry.poll_interval_ms));

    // Create application state
    let state = Arc::new(AppState {
        plot_service,
        extremum_service,
        log_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/plot", get(get_summary))
        .route("/plot/upload", post(upload_csv))
        .route("/plot/selection", put(update_selection))
        .route("/plot/range", get(get_range).put(set_range))
        .route("/plot/range/zoom-in", post(zoom_in))
        .route("/plot/range/zoom-out", post(zoom_out))
        .route("/plot/range/reset", post(reset_zoom))
        .route("/plot/range/pan/:direction", post(pan))
        .route("/plot/range/jump/:edge", post(jump_to_edge))
        .route("/plot/chart", get(get_chart))
        .route("/vehicle/extrema", get(get_extrema))
        .route("/vehicle/extrema/reset", post(reset_extrema))
        .route("/vehicle/charging", get(get_charging))
        .route("/vehicle/charging/restart", post(restart_charging))
        .route("/vehicle/battery-temperatures", get(get_battery_temperatures))
        .route("/logs", get(list_logs))
        .route("/logs/recording", get(get_recording).post(toggle_recording))
        .route("/logs/:id", get(download_log))
        .route("/logs/:id/open", post(open_log))
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting vehicle-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    poller.abort();
    if let Some(backend) = backend {
        backend.shutdown().await;
    }

    Ok(())
}
