//! Random scenario generation.
//!
//! Samples every registry field uniformly inside its valid range, so the
//! generated parameters always pass validation. Useful for stress testing
//! the engine and for exploring the parameter space.

use crate::core::fields::{FieldKind, FIELDS};
use crate::core::params::{CapexSchedule, InputParameters, MAX_CONSTRUCTION_YEARS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Configuration for generating random scenarios.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Number of scenarios to generate.
    pub count: usize,
    /// Seed for reproducible output; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Also randomise the capex schedule.
    pub vary_schedule: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            count: 10,
            seed: None,
            vary_schedule: true,
        }
    }
}

/// Generate `config.count` valid parameter sets.
pub fn generate_random_scenarios(config: &ScenarioConfig) -> Vec<InputParameters> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    (0..config.count)
        .map(|_| random_scenario(&mut rng, config.vary_schedule))
        .collect()
}

fn random_scenario<R: Rng>(rng: &mut R, vary_schedule: bool) -> InputParameters {
    let mut params = InputParameters::default();
    for field in FIELDS {
        let range = field.range;
        let value = match field.kind {
            // Count ranges are closed
            FieldKind::Count => rng.gen_range(range.min as u32..=range.max as u32) as f64,
            FieldKind::Real => {
                let mut v = rng.gen_range(range.min..=range.max);
                // Resample the rare draw that lands on an excluded endpoint
                while !range.contains(v) {
                    v = rng.gen_range(range.min..=range.max);
                }
                v
            }
        };
        field.set(&mut params, value);
    }
    if vary_schedule {
        params.financial.capex_schedule = if rng.gen_bool(0.5) {
            CapexSchedule::Upfront
        } else {
            CapexSchedule::EvenlyPhased {
                years: rng.gen_range(1..=MAX_CONSTRUCTION_YEARS),
            }
        };
    }
    params
}
