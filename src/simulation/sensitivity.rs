//! Single-parameter sensitivity sweeps.

use crate::core::fields::{self, ValidationError};
use crate::core::params::InputParameters;
use crate::finance::engine::TeaEngine;
use crate::finance::metrics::ResultMetrics;
use serde::{Deserialize, Serialize};

/// Metrics at one point of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub value: f64,
    pub metrics: ResultMetrics,
}

/// Recompute the metrics of `base` with `field` set to each of `values`.
///
/// Fails on the first value outside the field's range, or if `base`
/// itself is invalid.
pub fn sweep(
    engine: &TeaEngine,
    base: &InputParameters,
    field: &str,
    values: &[f64],
) -> Result<Vec<SweepPoint>, ValidationError> {
    let entry = fields::lookup(field).ok_or_else(|| ValidationError::UnknownField(field.to_string()))?;
    let mut points = Vec::with_capacity(values.len());
    for &value in values {
        entry.check(value)?;
        let mut params = base.clone();
        entry.set(&mut params, value);
        points.push(SweepPoint {
            value,
            metrics: engine.compute_metrics(&params)?,
        });
    }
    log::debug!("swept {} over {} values", field, points.len());
    Ok(points)
}

/// `steps` evenly spaced values from `from` to `to` inclusive.
pub fn linspace(from: f64, to: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![from],
        n => (0..n)
            .map(|i| from + (to - from) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}
