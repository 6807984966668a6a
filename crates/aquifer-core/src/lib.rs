//! Forward-model evaluation core for a finite-difference
//! groundwater-flow simulator.
//!
//! Turns a flat parameter description into a runnable simulator
//! instance, executes one or more instances concurrently with failure
//! detection, reduces the binary output to a single scalar, and
//! exposes the whole pipeline behind the remote-callable [`Model`]
//! contract.
//!
//! Pipeline per evaluation:
//!
//! ```text
//! Config -> materialize -> ModelInstance -> run_instances -> collect_scalar -> f64
//! ```
//!
//! The simulator itself is an external MODFLOW-2005 executable; its
//! input deck and binary output formats live in [`mf2005`].

pub mod config;
pub mod error;
pub mod instance;
pub mod materialize;
pub mod mf2005;
pub mod model;
pub mod output;
pub mod params;
pub mod run;

pub use config::Config;
pub use error::ModelError;
pub use instance::ModelInstance;
pub use materialize::materialize;
pub use model::{ForwardModel, Model};
pub use output::collect_scalar;
pub use params::{apply_params, extract_params, param_sizes};
pub use run::run_instances;
