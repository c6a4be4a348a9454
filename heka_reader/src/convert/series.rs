//! Normalized time series handed to export sinks.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClampMode {
    VoltageClamp,
    CurrentClamp,
}

/// Voltage-clamp amplifier settings. Absent values were not recorded or do
/// not apply to the active compensation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VoltageClampFields {
    pub capacitance_fast: Option<f64>,
    pub capacitance_slow: Option<f64>,
    pub resistance_comp_correction: Option<f64>,
    pub resistance_comp_bandwidth: Option<f64>,
    pub resistance_comp_prediction: Option<f64>,
    pub whole_cell_capacitance_comp: Option<f64>,
    pub whole_cell_series_resistance_comp: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentClampFields {
    pub bias_current: Option<f64>,
    pub bridge_balance: Option<f64>,
    pub capacitance_compensation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeriesExtras {
    VoltageClamp(VoltageClampFields),
    CurrentClamp(CurrentClampFields),
    /// Stimulus series carry no amplifier calibration.
    Stimulus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSeries {
    pub name: String,
    #[serde(skip)]
    pub data: Vec<f64>,
    pub samples: usize,
    pub cycle_id: u64,
    pub unit: String,
    pub conversion: f64,
    pub electrode: usize,
    pub gain: Option<f64>,
    pub resolution: Option<f64>,
    pub rate: f64,
    pub starting_time: f64,
    pub stimulus_description: String,
    pub description: String,
    pub clamp_mode: ClampMode,
    pub extras: SeriesExtras,
}

/// Split a unit like `mV` or `pA` into its SI scale and base unit.
///
/// Single-letter units and unknown prefixes are taken as base units.
pub fn parse_unit(unit: &str) -> (f64, String) {
    let mut chars = unit.chars();
    let (Some(prefix), rest) = (chars.next(), chars.as_str()) else {
        return (1.0, String::new());
    };
    if rest.is_empty() {
        return (1.0, unit.to_string());
    }

    let scale = match prefix {
        'p' => 1e-12,
        'n' => 1e-9,
        'u' | 'µ' | 'μ' => 1e-6,
        'm' => 1e-3,
        'k' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        _ => return (1.0, unit.to_string()),
    };
    (scale, rest.to_string())
}

/// Series name `index_NNN`, zero-padded to the digit count of `total`.
pub fn series_name(counter: usize, total: usize) -> String {
    let width = total.max(1).to_string().len();
    format!("index_{counter:0width$}")
}
