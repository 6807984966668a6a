//! Input materialization.
//!
//! Turns a validated [`Config`] into a ready-to-run [`ModelInstance`]:
//! derives the spatial and temporal discretization, validates the
//! geometry, and persists the full simulator input deck into a fresh
//! working directory. All validation happens before the working
//! directory is touched, so a rejected configuration has no observable
//! side effect.

use std::path::Path;

use crate::config::Config;
use crate::error::ModelError;
use crate::instance::ModelInstance;
use crate::mf2005;

/// Days per year, used to convert annual recharge to a daily rate.
const DAYS_PER_YEAR: f64 = 365.0;

/// Derived finite-difference discretization.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub nlay: usize,
    pub nrow: usize,
    pub ncol: usize,
    /// Cell spacing along rows, in meters.
    pub delr: f64,
    /// Cell spacing along columns, in meters.
    pub delc: f64,
    /// Top elevation, in meters.
    pub top: f64,
    /// Bottom elevation per layer, top down, in meters.
    pub botm: Vec<f64>,
}

impl Grid {
    /// Derive the grid from the configured domain and layer stack.
    ///
    /// Layer bottoms are the top elevation minus the cumulative layer
    /// thickness; per-axis spacing is extent divided by cell count.
    pub fn derive(config: &Config) -> Result<Self, ModelError> {
        let nlay = config.layer_count()?;

        let domain = &config.domain;
        if domain.lengths.len() != 2 || domain.divisions.len() != 2 {
            return Err(ModelError::Configuration(format!(
                "domain.lengths and domain.divisions must each have 2 entries, got {} and {}",
                domain.lengths.len(),
                domain.divisions.len()
            )));
        }
        for (axis, (&len, &div)) in domain
            .lengths
            .iter()
            .zip(&domain.divisions)
            .enumerate()
        {
            if div == 0 || len <= 0.0 {
                return Err(ModelError::Configuration(format!(
                    "domain axis {axis}: length {len} over {div} divisions is not a valid grid"
                )));
            }
        }

        let mut botm = Vec::with_capacity(nlay);
        let mut depth = 0.0;
        for (i, &thickness) in config.layers.thickness.iter().enumerate() {
            if thickness <= 0.0 {
                return Err(ModelError::Configuration(format!(
                    "layers.thickness[{i}] must be positive, got {thickness}"
                )));
            }
            depth += thickness;
            botm.push(domain.ztop - depth);
        }

        Ok(Self {
            nlay,
            nrow: domain.divisions[0] as usize,
            ncol: domain.divisions[1] as usize,
            delr: domain.lengths[0] / f64::from(domain.divisions[0]),
            delc: domain.lengths[1] / f64::from(domain.divisions[1]),
            top: domain.ztop,
            botm,
        })
    }
}

/// Uniform recharge rate in meters per day, from the configured
/// millimeters per year.
pub(crate) fn recharge_rate(config: &Config) -> f64 {
    config.precipitation.avg_recharge / DAYS_PER_YEAR / 1000.0
}

fn check_schedule(config: &Config) -> Result<(), ModelError> {
    let ts = &config.timestepping;
    if ts.n_periods == 0 || ts.n_steps == 0 || ts.period_length <= 0.0 {
        return Err(ModelError::Configuration(format!(
            "timestepping requires n_periods >= 1, n_steps >= 1 and a positive \
             period_length; got {} periods of {} steps over {} days",
            ts.n_periods, ts.n_steps, ts.period_length
        )));
    }
    Ok(())
}

/// Produce a ready-to-run model instance for one evaluation.
///
/// Creates a fresh, exclusively-owned working directory under
/// `run_root` and writes the complete simulator input deck into it.
pub fn materialize(
    config: &Config,
    exe: &Path,
    run_root: &Path,
) -> Result<ModelInstance, ModelError> {
    let grid = Grid::derive(config)?;
    check_schedule(config)?;

    let instance = ModelInstance::create(&config.meta.name, run_root, exe)?;
    mf2005::write::write_input_deck(&instance, config, &grid)?;

    tracing::debug!(
        name = %instance.name,
        workspace = %instance.workspace.display(),
        nlay = grid.nlay,
        nrow = grid.nrow,
        ncol = grid.ncol,
        "materialized simulator input deck"
    );
    Ok(instance)
}
