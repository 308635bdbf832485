// Running extremes for live telemetry signals
use super::telemetry::SignalSnapshot;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremumMode {
    /// Track the lowest value seen.
    Min,
    /// Track the highest value seen.
    Max,
    /// Report the live value only.
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Threshold {
    pub below: Option<f64>,
    pub above: Option<f64>,
}

impl Threshold {
    pub fn is_exceeded_by(&self, value: f64) -> bool {
        self.below.is_some_and(|b| value < b) || self.above.is_some_and(|a| value > a)
    }
}

#[derive(Debug, Clone)]
pub struct TrackedSignal {
    pub key: String,
    pub label: String,
    pub unit: String,
    pub mode: ExtremumMode,
    pub threshold: Threshold,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReading {
    pub key: String,
    pub label: String,
    pub unit: String,
    pub mode: ExtremumMode,
    pub current: Option<f64>,
    pub extreme: Option<f64>,
    pub exceeding: bool,
}

/// Peak DC bus current in each direction. Both start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CurrentPeaks {
    /// Largest positive (drive) current.
    pub drive: f64,
    /// Most negative (regen) current.
    pub regen: f64,
}

#[derive(Debug, Clone)]
pub struct ExtremumTracker {
    signals: Vec<TrackedSignal>,
    readings: Vec<SignalReading>,
    dc_bus_key: Option<String>,
    peaks: CurrentPeaks,
}

impl ExtremumTracker {
    pub fn new(signals: Vec<TrackedSignal>, dc_bus_key: Option<String>) -> Self {
        let readings = signals
            .iter()
            .map(|s| SignalReading {
                key: s.key.clone(),
                label: s.label.clone(),
                unit: s.unit.clone(),
                mode: s.mode,
                current: None,
                extreme: None,
                exceeding: false,
            })
            .collect();
        Self {
            signals,
            readings,
            dc_bus_key,
            peaks: CurrentPeaks::default(),
        }
    }

    /// Fold one snapshot into the tracked state.
    pub fn update(&mut self, snapshot: &SignalSnapshot) {
        for (signal, reading) in self.signals.iter().zip(self.readings.iter_mut()) {
            let value = snapshot.get(&signal.key).copied();
            reading.current = value;
            reading.exceeding = value.is_some_and(|v| signal.threshold.is_exceeded_by(v));

            let Some(v) = value else { continue };
            reading.extreme = match (signal.mode, reading.extreme) {
                (ExtremumMode::Current, _) => None,
                (_, None) => Some(v),
                (ExtremumMode::Min, Some(e)) => Some(e.min(v)),
                (ExtremumMode::Max, Some(e)) => Some(e.max(v)),
            };
        }

        if let Some(current) = self.dc_bus_key.as_ref().and_then(|k| snapshot.get(k)).copied() {
            if current > self.peaks.drive {
                self.peaks.drive = current;
            }
            if current < self.peaks.regen {
                self.peaks.regen = current;
            }
        }
    }

    /// Forget all-time extremes; live values are kept.
    pub fn reset(&mut self) {
        for reading in &mut self.readings {
            reading.extreme = None;
        }
        self.peaks = CurrentPeaks::default();
    }

    pub fn readings(&self) -> &[SignalReading] {
        &self.readings
    }

    pub fn peaks(&self) -> CurrentPeaks {
        self.peaks
    }

    /// Whether `value` is outside the configured threshold for `key`.
    /// Signals without a threshold never exceed.
    pub fn is_exceeding_threshold(&self, key: &str, value: f64) -> bool {
        self.signals
            .iter()
            .find(|s| s.key == key)
            .is_some_and(|s| s.threshold.is_exceeded_by(value))
    }

    /// Keys whose latest value is out of range.
    pub fn active_faults(&self) -> Vec<String> {
        self.readings
            .iter()
            .filter(|r| r.current.is_some_and(|v| self.is_exceeding_threshold(&r.key, v)))
            .map(|r| r.key.clone())
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.signals.iter().map(|s| s.key.clone()).collect();
        if let Some(k) = &self.dc_bus_key {
            if !keys.contains(k) {
                keys.push(k.clone());
            }
        }
        keys
    }
}
