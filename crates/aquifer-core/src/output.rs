//! Output extraction.
//!
//! Reduces a finished instance's raw output artifacts to the single
//! scalar the caller asked for: the head field at the final simulated
//! time, summed over every cell of every layer.

use crate::error::ModelError;
use crate::instance::ModelInstance;
use crate::mf2005::binary::{BudgetFile, HeadFile};

/// Extract the scalar observable from a finished instance.
///
/// Both output artifacts must be present and well-formed; a simulator
/// that crashed after claiming success surfaces here as
/// [`ModelError::OutputCorrupt`].
pub fn collect_scalar(instance: &ModelInstance) -> Result<f64, ModelError> {
    let heads = HeadFile::open(&instance.head_path())?;
    let budget = BudgetFile::open(&instance.budget_path())?;

    let times = heads.times();
    let end_time = *times.last().ok_or_else(|| ModelError::OutputCorrupt {
        path: instance.head_path().display().to_string(),
        reason: "no output times recorded".into(),
    })?;
    let scalar = heads.sum_at(end_time)?;

    tracing::debug!(
        instance = %instance.name,
        end_time,
        scalar,
        budget_label = %budget.label,
        "collected scalar observable"
    );
    Ok(scalar)
}
