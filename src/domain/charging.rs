// Rolling pack voltage history for the charging view
use super::telemetry::SignalSnapshot;
use serde::Serialize;
use std::collections::VecDeque;

const DOMAIN_LOW_FACTOR: f64 = 0.95;
const DOMAIN_HIGH_FACTOR: f64 = 1.05;
const DEFAULT_DOMAIN_HIGH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoltageSample {
    /// Whole seconds since charging started.
    pub time: u64,
    pub voltage: f64,
}

#[derive(Debug, Clone)]
pub struct ChargingHistory {
    voltage_key: String,
    capacity: usize,
    samples: VecDeque<VoltageSample>,
    latest: Option<f64>,
}

impl ChargingHistory {
    pub fn new(voltage_key: String, capacity: usize) -> Self {
        Self {
            voltage_key,
            capacity: capacity.max(1),
            samples: VecDeque::with_capacity(capacity),
            latest: None,
        }
    }

    /// Append the voltage from `snapshot`, dropping the oldest sample once full.
    /// Snapshots without the voltage key add nothing.
    pub fn record(&mut self, elapsed_secs: u64, snapshot: &SignalSnapshot) {
        self.latest = snapshot.get(&self.voltage_key).copied();
        let Some(voltage) = self.latest else { return };
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(VoltageSample {
            time: elapsed_secs,
            voltage,
        });
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.latest = None;
    }

    pub fn latest(&self) -> Option<f64> {
        self.latest
    }

    pub fn samples(&self) -> Vec<VoltageSample> {
        self.samples.iter().copied().collect()
    }

    /// History and live value widened by 5% either way.
    ///
    /// With nothing recorded the low end is 0 and the high end 100.
    pub fn y_domain(&self) -> [f64; 2] {
        let voltages = self.samples.iter().map(|s| s.voltage);
        let low = voltages
            .clone()
            .chain(self.latest)
            .fold(f64::INFINITY, f64::min)
            * DOMAIN_LOW_FACTOR;
        let high = voltages
            .chain(Some(self.latest.unwrap_or(0.0)))
            .fold(f64::NEG_INFINITY, f64::max)
            * DOMAIN_HIGH_FACTOR;
        [
            if low.is_finite() { low } else { 0.0 },
            if high > 0.0 { high } else { DEFAULT_DOMAIN_HIGH },
        ]
    }
}
