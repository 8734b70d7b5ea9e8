use crate::core::cashflow::CashFlowSeries;
use crate::finance::irr::{self, IrrSearch, NumericalError};
use serde::{Deserialize, Serialize};

/// Headline results of one TEA run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetrics {
    /// Levelized cost of energy, $/MWh. `None` when nothing is generated.
    pub lcoe_usd_mwh: Option<f64>,
    /// Net present value, $M.
    pub npv_musd: f64,
    /// Internal rate of return as a fraction. `None` when no root exists.
    pub irr: Option<f64>,
    /// First period in which cumulative net cash flow turns non-negative.
    pub payback_period_years: Option<u32>,
    /// Conditions that left a metric undefined.
    pub warnings: Vec<NumericalError>,
}

impl ResultMetrics {
    /// Compute every metric from a cash-flow series.
    pub fn from_series(series: &CashFlowSeries, search: &IrrSearch) -> Self {
        let mut warnings = Vec::new();

        let npv_musd = npv(series);

        let lcoe_usd_mwh = match lcoe(series) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("{}", e);
                warnings.push(e);
                None
            }
        };

        let irr = match irr::irr_with(&series.net_flows(), search) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("{}", e);
                warnings.push(e);
                None
            }
        };

        Self {
            lcoe_usd_mwh,
            npv_musd,
            irr,
            payback_period_years: payback_period(series),
            warnings,
        }
    }

    /// IRR in percent, as displayed.
    pub fn irr_percent(&self) -> Option<f64> {
        self.irr.map(|r| r * 100.0)
    }
}

impl std::fmt::Display for ResultMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Results ===")?;
        match self.lcoe_usd_mwh {
            Some(v) => writeln!(f, "LCOE:     ${:.2} /MWh", v)?,
            None => writeln!(f, "LCOE:     N/A")?,
        }
        writeln!(f, "NPV:      ${:.2} M", self.npv_musd)?;
        match self.irr_percent() {
            Some(v) => writeln!(f, "IRR:      {:.2}%", v)?,
            None => writeln!(f, "IRR:      N/A")?,
        }
        match self.payback_period_years {
            Some(v) => writeln!(f, "Payback:  year {}", v)?,
            None => writeln!(f, "Payback:  never")?,
        }
        for w in &self.warnings {
            writeln!(f, "Warning:  {}", w)?;
        }
        Ok(())
    }
}

/// Discounted sum of net cash flow, $M.
pub fn npv(series: &CashFlowSeries) -> f64 {
    series.periods().iter().map(|p| p.discounted_net()).sum()
}

/// Levelized cost of energy, $/MWh.
///
/// Discounted costs (capex, opex, CO2 purchases) net of discounted
/// non-electricity revenue (45Q and carbon credits), over discounted
/// generation. Equivalently, the power price at which NPV is zero.
pub fn lcoe(series: &CashFlowSeries) -> Result<f64, NumericalError> {
    let mut net_cost = 0.0;
    let mut generation = 0.0;
    for p in series.periods() {
        let credits = p.revenue_tax_credit + p.revenue_carbon_credit;
        net_cost += (p.total_cost() - credits) * p.discount_factor;
        generation += p.generation_mwh * p.discount_factor;
    }
    if !generation.is_finite() || !net_cost.is_finite() {
        return Err(NumericalError::NonFiniteLcoe);
    }
    if generation <= 0.0 {
        return Err(NumericalError::ZeroGeneration);
    }
    Ok(net_cost * 1e6 / generation)
}

/// First period index at which cumulative undiscounted net cash flow is
/// non-negative.
pub fn payback_period(series: &CashFlowSeries) -> Option<u32> {
    series
        .cumulative_net()
        .iter()
        .position(|c| *c >= 0.0)
        .map(|i| i as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cashflow::PlantSizing;
    use crate::core::params::{InputParameters, OutputBasis};
    use approx::assert_relative_eq;

    fn series_for(params: &InputParameters) -> CashFlowSeries {
        CashFlowSeries::build(params, &PlantSizing::from_params(params).unwrap())
    }

    #[test]
    fn test_lcoe_is_break_even_price() {
        let mut params = InputParameters::default();
        let lcoe = lcoe(&series_for(&params)).unwrap();
        params.financial.power_price_usd_mwh = lcoe;
        assert!(npv(&series_for(&params)).abs() < 1e-9);
    }

    #[test]
    fn test_lcoe_independent_of_power_price() {
        let mut params = InputParameters::default();
        let a = lcoe(&series_for(&params)).unwrap();
        params.financial.power_price_usd_mwh = 300.0;
        let b = lcoe(&series_for(&params)).unwrap();
        assert_relative_eq!(a, b, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_generation() {
        let mut params = InputParameters::default();
        params.operations.output_basis = OutputBasis::Nameplate {
            annual_output_mwh: 0.0,
        };
        let metrics = ResultMetrics::from_series(&series_for(&params), &IrrSearch::default());
        assert!(metrics.lcoe_usd_mwh.is_none());
        assert!(metrics.warnings.contains(&NumericalError::ZeroGeneration));
        assert!(metrics.npv_musd.is_finite());
    }

    #[test]
    fn test_non_finite_generation_leaves_lcoe_undefined() {
        let params = InputParameters::default();
        let mut sizing = PlantSizing::from_params(&params).unwrap();
        sizing.annual_energy_mwh = f64::INFINITY;
        let series = CashFlowSeries::build(&params, &sizing);

        assert_eq!(lcoe(&series), Err(NumericalError::NonFiniteLcoe));
        let metrics = ResultMetrics::from_series(&series, &IrrSearch::default());
        assert!(metrics.lcoe_usd_mwh.is_none());
        assert!(metrics.irr.is_none());
        assert!(metrics.warnings.contains(&NumericalError::NonFiniteLcoe));
    }

    #[test]
    fn test_payback_never() {
        let mut params = InputParameters::default();
        params.financial.power_price_usd_mwh = 0.0;
        params.co2.tax_credit_45q_per_tonne = 0.0;
        params.co2.carbon_price_above_45q = 0.0;
        let metrics = ResultMetrics::from_series(&series_for(&params), &IrrSearch::default());
        assert_eq!(metrics.payback_period_years, None);
        assert!(metrics.irr.is_none());
        assert!(metrics
            .warnings
            .iter()
            .any(|w| matches!(w, NumericalError::NoIrrRoot { .. })));
    }

    #[test]
    fn test_display_undefined_metrics() {
        let metrics = ResultMetrics {
            lcoe_usd_mwh: None,
            npv_musd: -12.5,
            irr: None,
            payback_period_years: None,
            warnings: vec![NumericalError::ZeroGeneration],
        };
        let text = metrics.to_string();
        assert!(text.contains("LCOE:     N/A"));
        assert!(text.contains("IRR:      N/A"));
        assert!(text.contains("$-12.50 M"));
    }
}
