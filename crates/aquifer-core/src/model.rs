//! The remote-callable model contract and its forward-model
//! implementation.
//!
//! [`Model`] is the seam the protocol layer talks to: cardinality
//! introspection, one end-to-end evaluation per call, and capability
//! flags. [`ForwardModel`] is the single model this service exposes,
//! registered under the fixed name `"forward"`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::Config;
use crate::error::ModelError;
use crate::materialize::materialize;
use crate::output::collect_scalar;
use crate::params::param_sizes;
use crate::run::run_instances;

/// Remote-callable model surface.
#[async_trait]
pub trait Model: Send + Sync {
    /// Name the model is registered under.
    fn name(&self) -> &str;

    /// Per declared parameter path, its element count. Pure.
    fn input_sizes(&self, config: &Config) -> Result<Vec<usize>, ModelError>;

    /// Output cardinality. Pure.
    fn output_sizes(&self, config: &Config) -> Vec<usize>;

    /// One end-to-end evaluation. The only operation with side effects.
    async fn evaluate(&self, config: &Config) -> Result<Vec<f64>, ModelError>;

    /// Whether [`Model::evaluate`] is available.
    fn supports_evaluate(&self) -> bool {
        false
    }

    /// Whether derivative information is available. Callers must fall
    /// back to finite differences or gradient-free methods when false.
    fn supports_gradient(&self) -> bool {
        false
    }
}

/// Forward groundwater-flow model: materialize, execute, extract.
///
/// Stateless across calls; holds only the simulator executable path
/// and the directory under which per-evaluation workspaces are
/// created. Each evaluation uses a fresh, uniquely named instance, so
/// concurrent evaluations do not interfere.
#[derive(Debug, Clone)]
pub struct ForwardModel {
    exe: PathBuf,
    run_root: PathBuf,
}

impl ForwardModel {
    /// Fixed registration name.
    pub const NAME: &'static str = "forward";

    pub fn new(exe: impl Into<PathBuf>, run_root: impl Into<PathBuf>) -> Self {
        Self {
            exe: exe.into(),
            run_root: run_root.into(),
        }
    }

    /// Path to the simulator executable this model invokes.
    pub fn exe(&self) -> &Path {
        &self.exe
    }
}

#[async_trait]
impl Model for ForwardModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn input_sizes(&self, config: &Config) -> Result<Vec<usize>, ModelError> {
        param_sizes(config)
    }

    fn output_sizes(&self, _config: &Config) -> Vec<usize> {
        vec![1]
    }

    async fn evaluate(&self, config: &Config) -> Result<Vec<f64>, ModelError> {
        let instance = materialize(config, &self.exe, &self.run_root)?;
        run_instances(std::slice::from_ref(&instance)).await?;
        let scalar = collect_scalar(&instance)?;
        Ok(vec![scalar])
    }

    fn supports_evaluate(&self) -> bool {
        true
    }

    fn supports_gradient(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        serde_yaml::from_str(include_str!("../tests/data/forward.yaml")).unwrap()
    }

    #[test]
    fn reports_sizes_and_capabilities() {
        let model = ForwardModel::new("bin/mf2005", "runs");
        let cfg = config();
        assert_eq!(model.name(), "forward");
        assert_eq!(model.input_sizes(&cfg).unwrap(), vec![3, 3, 1]);
        assert_eq!(model.output_sizes(&cfg), vec![1]);
        assert!(model.supports_evaluate());
        assert!(!model.supports_gradient());
    }

    #[tokio::test]
    async fn evaluate_with_missing_executable_is_configuration_error() {
        let tmp = tempfile::tempdir().unwrap();
        let model = ForwardModel::new(tmp.path().join("absent"), tmp.path().join("runs"));
        let err = model.evaluate(&config()).await.unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
    }
}
