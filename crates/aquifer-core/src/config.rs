//! Simulation configuration.
//!
//! The full input description for one forward run: domain geometry,
//! time stepping, layered material properties and forcing terms.
//! There is no process-wide default; every call receives an explicit
//! [`Config`], loaded from YAML on the server side or supplied inline
//! by the remote caller as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Complete configuration for one forward-model evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub meta: Meta,
    pub domain: Domain,
    pub timestepping: TimeStepping,
    pub layers: Layers,
    pub precipitation: Precipitation,
}

/// Model name and the ordered list of parameter paths exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Base name for the model instance and its artifact files.
    pub name: String,
    /// Dotted paths addressing the tunable leaves of this configuration,
    /// e.g. `"layers.conductivity"`.
    pub params: Vec<String>,
}

/// Horizontal extent and vertical datum of the modeled domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    /// Extent per horizontal axis, in meters.
    pub lengths: Vec<f64>,
    /// Top elevation, in meters above sea level.
    pub ztop: f64,
    /// Finite-difference cell counts per horizontal axis.
    pub divisions: Vec<u32>,
}

/// Stress-period schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeStepping {
    pub n_periods: u32,
    /// Time steps per stress period.
    pub n_steps: u32,
    /// Stress-period length, in days.
    pub period_length: f64,
    /// Steady-state when true, transient otherwise; applies uniformly
    /// to every stress period.
    pub steady: bool,
}

/// Per-layer material properties, one entry per layer, top down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layers {
    pub material: Vec<String>,
    /// Layer thickness, in meters.
    pub thickness: Vec<f64>,
    /// Horizontal hydraulic conductivity, in meters per day.
    pub conductivity: Vec<f64>,
    /// Specific storage, per meter.
    pub storage: Vec<f64>,
    /// Layer type flag: 0 confined, 1 convertible (unconfined).
    pub laytype: Vec<i32>,
}

/// Areal forcing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Precipitation {
    /// Average recharge, in millimeters per year.
    pub avg_recharge: f64,
}

impl Config {
    /// Load a configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&text).map_err(|e| {
            ModelError::Configuration(format!("parsing {}: {e}", path.display()))
        })
    }

    /// Build a configuration from an inline JSON value (wire requests).
    pub fn from_json(value: serde_json::Value) -> Result<Self, ModelError> {
        serde_json::from_value(value)
            .map_err(|e| ModelError::Configuration(format!("parsing request config: {e}")))
    }

    /// Number of layers, after checking that all per-layer arrays agree.
    pub fn layer_count(&self) -> Result<usize, ModelError> {
        let n = self.layers.thickness.len();
        if n == 0 {
            return Err(ModelError::Configuration(
                "layers.thickness must not be empty".into(),
            ));
        }
        for (field, len) in [
            ("layers.material", self.layers.material.len()),
            ("layers.conductivity", self.layers.conductivity.len()),
            ("layers.storage", self.layers.storage.len()),
            ("layers.laytype", self.layers.laytype.len()),
        ] {
            if len != n {
                return Err(ModelError::Configuration(format!(
                    "{field} has {len} entries, expected {n} to match layers.thickness"
                )));
            }
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORWARD_YAML: &str = r#"
meta:
  name: layprops
  params:
    - layers.conductivity
    - layers.storage
    - precipitation.avg_recharge
domain:
  lengths: [1000, 1000]
  ztop: 900
  divisions: [32, 32]
timestepping:
  n_periods: 8
  n_steps: 2
  period_length: 365
  steady: false
layers:
  material: [soil, saprolite, "fractured bedrock"]
  thickness: [40, 30, 120]
  conductivity: [8.64, 0.864, 0.00864]
  storage: [1.0e-1, 1.0e-3, 1.0e-4]
  laytype: [1, 0, 0]
precipitation:
  avg_recharge: 120
"#;

    #[test]
    fn parses_reference_yaml() {
        let cfg: Config = serde_yaml::from_str(FORWARD_YAML).unwrap();
        assert_eq!(cfg.meta.name, "layprops");
        assert_eq!(cfg.meta.params.len(), 3);
        assert_eq!(cfg.domain.divisions, vec![32, 32]);
        assert!(!cfg.timestepping.steady);
        assert_eq!(cfg.layer_count().unwrap(), 3);
    }

    #[test]
    fn layer_count_rejects_mismatched_arrays() {
        let mut cfg: Config = serde_yaml::from_str(FORWARD_YAML).unwrap();
        cfg.layers.conductivity.pop();
        let err = cfg.layer_count().unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
        assert!(err.to_string().contains("layers.conductivity"));
    }
}
