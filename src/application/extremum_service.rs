// Extremum service - Polls live telemetry and folds it into the dashboard views
use crate::application::vehicle_repository::VehicleRepository;
use crate::domain::battery_temp::BatteryTemperatures;
use crate::domain::charging::{ChargingHistory, VoltageSample};
use crate::domain::extremum::{CurrentPeaks, ExtremumMode, ExtremumTracker, SignalReading, Threshold, TrackedSignal};
use crate::domain::telemetry::SignalSnapshot;
use crate::infrastructure::config::{SignalConfig, TelemetrySettings};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct ExtremaView {
    pub signals: Vec<SignalReading>,
    pub dc_bus_peaks: CurrentPeaks,
    pub faults: Vec<String>,
    pub fault_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChargingView {
    pub voltage: Option<f64>,
    pub history: Vec<VoltageSample>,
    pub y_domain: [f64; 2],
    pub elapsed_secs: u64,
}

/// Everything folded from the live feed, behind one lock so a tick is atomic.
struct LiveState {
    extrema: ExtremumTracker,
    charging: ChargingHistory,
    charging_started: Instant,
    battery: BatteryTemperatures,
}

impl LiveState {
    fn fold(&mut self, snapshot: &SignalSnapshot) {
        self.extrema.update(snapshot);
        let elapsed = self.charging_started.elapsed().as_secs();
        self.charging.record(elapsed, snapshot);
        self.battery = BatteryTemperatures::from_snapshot(snapshot);
    }
}

#[derive(Clone)]
pub struct ExtremumService {
    repository: Arc<dyn VehicleRepository>,
    state: Arc<RwLock<LiveState>>,
}

impl ExtremumService {
    pub fn new(repository: Arc<dyn VehicleRepository>, settings: &TelemetrySettings) -> Self {
        let signals = settings.signals.iter().map(tracked_signal).collect();
        let state = LiveState {
            extrema: ExtremumTracker::new(signals, settings.dc_bus_current_key.clone()),
            charging: ChargingHistory::new(settings.charging_voltage_key.clone(), settings.charging_history_len),
            charging_started: Instant::now(),
            battery: BatteryTemperatures::default(),
        };
        Self {
            repository,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Fetch one snapshot and fold it in. Feed failures skip the tick.
    pub async fn poll_once(&self) {
        match self.repository.snapshot().await {
            Ok(snapshot) => {
                self.state.write().await.fold(&snapshot);
                tracing::trace!("Folded snapshot with {} signals", snapshot.len());
            }
            Err(e) => {
                tracing::warn!("Skipping telemetry tick: {:#}", e);
            }
        }
    }

    /// Poll the backend forever at a fixed cadence.
    pub fn spawn_polling(&self, interval: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                service.poll_once().await;
            }
        })
    }

    pub async fn view(&self) -> ExtremaView {
        let state = self.state.read().await;
        let tracker = &state.extrema;
        let faults = tracker.active_faults();
        ExtremaView {
            signals: tracker.readings().to_vec(),
            dc_bus_peaks: tracker.peaks(),
            fault_active: !faults.is_empty(),
            faults,
        }
    }

    pub async fn reset(&self) -> ExtremaView {
        self.state.write().await.extrema.reset();
        self.view().await
    }

    pub async fn charging(&self) -> ChargingView {
        let state = self.state.read().await;
        ChargingView {
            voltage: state.charging.latest(),
            history: state.charging.samples(),
            y_domain: state.charging.y_domain(),
            elapsed_secs: state.charging_started.elapsed().as_secs(),
        }
    }

    /// Start a new charging session: empty history, clock back at zero.
    pub async fn restart_charging(&self) -> ChargingView {
        {
            let mut state = self.state.write().await;
            state.charging.clear();
            state.charging_started = Instant::now();
        }
        self.charging().await
    }

    pub async fn battery_temperatures(&self) -> BatteryTemperatures {
        self.state.read().await.battery.clone()
    }

    /// Every signal key the tracker cares about, used as the default recording set
    pub async fn tracked_keys(&self) -> Vec<String> {
        self.state.read().await.extrema.keys()
    }
}

fn tracked_signal(config: &SignalConfig) -> TrackedSignal {
    let mode = match config.mode.as_str() {
        "min" => ExtremumMode::Min,
        "max" => ExtremumMode::Max,
        _ => ExtremumMode::Current,
    };
    TrackedSignal {
        key: config.key.clone(),
        label: config.label.clone().unwrap_or_else(|| config.key.clone()),
        unit: config.unit.clone().unwrap_or_default(),
        mode,
        threshold: Threshold {
            below: config.warn_below,
            above: config.warn_above,
        },
    }
}
