use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A numerical condition the engine recovered from.
///
/// The affected metric is reported as undefined; every other metric is
/// still computed.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NumericalError {
    #[error("no IRR root in [{lower}, {upper}]")]
    NoIrrRoot { lower: f64, upper: f64 },
    #[error("discounted generation is zero; LCOE undefined")]
    ZeroGeneration,
    #[error("discounted costs or generation are not finite; LCOE undefined")]
    NonFiniteLcoe,
}

/// Bracket and iteration caps for the IRR search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrSearch {
    /// Lowest rate considered. Must be greater than -1.
    pub lower: f64,
    pub upper: f64,
    /// Number of equal intervals the bracket is scanned in for sign changes.
    pub grid_intervals: usize,
    /// Bisection steps per bracketed root.
    pub max_iterations: usize,
    /// Bisection stops once the bracket is narrower than this.
    pub tolerance: f64,
}

impl Default for IrrSearch {
    fn default() -> Self {
        Self {
            lower: -0.99,
            upper: 10.0,
            grid_intervals: 2000,
            max_iterations: 200,
            tolerance: 1e-13,
        }
    }
}

/// Net present value of `flows` at `rate`, with `flows[0]` undiscounted.
pub fn npv(rate: f64, flows: &[f64]) -> f64 {
    let base = 1.0 + rate;
    flows
        .iter()
        .enumerate()
        .map(|(t, flow)| flow / base.powi(t as i32))
        .sum()
}

/// Internal rate of return with the default search bracket.
///
/// # Examples
///
/// ```
/// use dualwell_tea::finance::irr::irr;
///
/// // Pay 100 today, receive 110 in a year: 10%.
/// let rate = irr(&[-100.0, 110.0]).unwrap();
/// assert!((rate - 0.10).abs() < 1e-9);
/// ```
pub fn irr(flows: &[f64]) -> Result<f64, NumericalError> {
    irr_with(flows, &IrrSearch::default())
}

/// Internal rate of return within `search`.
///
/// # Algorithm
///
/// 1. Evaluate NPV on an even grid over `[lower, upper]`.
/// 2. Bisect every interval whose endpoints differ in sign, for at most
///    `max_iterations` steps.
/// 3. Return the root closest to zero.
///
/// Terminates after at most `grid_intervals + 1 + roots * max_iterations`
/// NPV evaluations. Double roots that do not change sign are not found.
pub fn irr_with(flows: &[f64], search: &IrrSearch) -> Result<f64, NumericalError> {
    let no_root = NumericalError::NoIrrRoot {
        lower: search.lower,
        upper: search.upper,
    };
    if flows.len() < 2
        || search.grid_intervals == 0
        || search.lower <= -1.0
        || flows.iter().any(|f| !f.is_finite())
    {
        return Err(no_root);
    }

    let step = (search.upper - search.lower) / search.grid_intervals as f64;
    let mut roots = Vec::new();

    let mut lo = search.lower;
    let mut f_lo = npv(lo, flows);
    if f_lo == 0.0 {
        roots.push(lo);
    }
    for i in 1..=search.grid_intervals {
        let hi = if i == search.grid_intervals {
            search.upper
        } else {
            search.lower + step * i as f64
        };
        let f_hi = npv(hi, flows);
        if f_hi == 0.0 {
            roots.push(hi);
        } else if f_lo.is_finite()
            && f_hi.is_finite()
            && f_lo != 0.0
            && f_lo.signum() != f_hi.signum()
        {
            roots.push(bisect(flows, lo, f_lo, hi, search));
        }
        lo = hi;
        f_lo = f_hi;
    }

    roots
        .into_iter()
        .filter(|r| r.is_finite())
        .min_by(|a, b| a.abs().total_cmp(&b.abs()))
        .ok_or(no_root)
}

fn bisect(flows: &[f64], mut lo: f64, mut f_lo: f64, mut hi: f64, search: &IrrSearch) -> f64 {
    for _ in 0..search.max_iterations {
        if hi - lo < search.tolerance {
            break;
        }
        let mid = 0.5 * (lo + hi);
        let f_mid = npv(mid, flows);
        if f_mid == 0.0 {
            return mid;
        }
        if !f_mid.is_finite() {
            break;
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}
