// Per-module cell temperature extremes
use super::telemetry::SignalSnapshot;
use serde::Serialize;

pub const MODULE_COUNT: usize = 15;
pub const CELLS_PER_MODULE: usize = 4;

pub const PACK_TEMP_MIN_KEY: &str = "BMS_TX_STATE_7.Cell_Temp_Min_degC";
pub const PACK_TEMP_AVG_KEY: &str = "BMS_TX_STATE_7.Cell_Temp_Avg_degC";
pub const PACK_TEMP_MAX_KEY: &str = "BMS_TX_STATE_7.Cell_Temp_Max_degC";

/// Signal key of one cell sensor; modules and cells are 1-based.
pub fn cell_temp_key(module: usize, cell: usize) -> String {
    format!("BMS_TX_CMD_{}.CellTemp{}", module, cell)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellTemp {
    pub cell: usize,
    pub temp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleTemperatures {
    pub module: usize,
    pub min: Option<CellTemp>,
    pub max: Option<CellTemp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PackTemperatures {
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryTemperatures {
    pub pack: PackTemperatures,
    pub modules: Vec<ModuleTemperatures>,
}

impl Default for BatteryTemperatures {
    fn default() -> Self {
        Self::from_snapshot(&SignalSnapshot::new())
    }
}

impl BatteryTemperatures {
    /// Coolest and hottest cell of every module in `snapshot`.
    ///
    /// Ties go to the higher-numbered cell. A module with no readings has
    /// neither extreme.
    pub fn from_snapshot(snapshot: &SignalSnapshot) -> Self {
        let modules = (1..=MODULE_COUNT)
            .map(|module| {
                let temps: Vec<CellTemp> = (1..=CELLS_PER_MODULE)
                    .filter_map(|cell| {
                        let temp = *snapshot.get(&cell_temp_key(module, cell))?;
                        Some(CellTemp { cell, temp })
                    })
                    .collect();
                ModuleTemperatures {
                    module,
                    min: temps
                        .iter()
                        .copied()
                        .reduce(|prev, curr| if prev.temp < curr.temp { prev } else { curr }),
                    max: temps
                        .iter()
                        .copied()
                        .reduce(|prev, curr| if prev.temp > curr.temp { prev } else { curr }),
                }
            })
            .collect();

        Self {
            pack: PackTemperatures {
                min: snapshot.get(PACK_TEMP_MIN_KEY).copied(),
                avg: snapshot.get(PACK_TEMP_AVG_KEY).copied(),
                max: snapshot.get(PACK_TEMP_MAX_KEY).copied(),
            },
            modules,
        }
    }
}
