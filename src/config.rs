use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming an optional JSON settings file.
pub const CONFIG_ENV: &str = "PV_CALC_CONFIG";

pub const AREA_MM2_RANGE: (f64, f64) = (1.0, 1000.0);
pub const INPUT_POWER_RANGE: (f64, f64) = (1.0, 150.0);

fn default_area_mm2() -> f64 { 6.0 }
fn default_input_power() -> f64 { 100.0 }

/// Start-up values for the device parameter widgets. The resampling grid
/// is fixed and not configurable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_area_mm2")]
    pub area_mm2: f64,
    #[serde(default = "default_input_power")]
    pub input_power_mw_cm2: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            area_mm2: default_area_mm2(),
            input_power_mw_cm2: default_input_power(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("parsing settings {}", path.display()))?;
        Ok(settings.clamped())
    }

    /// Settings from `$PV_CALC_CONFIG`, falling back to defaults when the
    /// variable is unset or the file cannot be used.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::load(Path::new(&path)) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", Path::new(&path).display());
                settings
            }
            Err(e) => {
                log::error!("Ignoring settings: {e:#}");
                Self::default()
            }
        }
    }

    /// Pull values back into the ranges the input widgets accept.
    pub fn clamped(self) -> Self {
        Self {
            area_mm2: clamp_or_default(self.area_mm2, AREA_MM2_RANGE, default_area_mm2()),
            input_power_mw_cm2: clamp_or_default(
                self.input_power_mw_cm2,
                INPUT_POWER_RANGE,
                default_input_power(),
            ),
        }
    }
}

fn clamp_or_default(value: f64, (lo, hi): (f64, f64), default: f64) -> f64 {
    if value.is_nan() {
        default
    } else {
        value.clamp(lo, hi)
    }
}
