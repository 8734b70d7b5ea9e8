use crate::core::cashflow::{CashFlowSeries, PlantSizing};
use crate::core::fields::ValidationError;
use crate::core::params::InputParameters;
use crate::finance::irr::IrrSearch;
use crate::finance::metrics::ResultMetrics;
use serde::{Deserialize, Serialize};

/// Everything one run produces: plant sizing, cash flows and metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeaResult {
    sizing: PlantSizing,
    series: CashFlowSeries,
    metrics: ResultMetrics,
}

impl TeaResult {
    pub fn sizing(&self) -> &PlantSizing {
        &self.sizing
    }

    pub fn series(&self) -> &CashFlowSeries {
        &self.series
    }

    pub fn metrics(&self) -> &ResultMetrics {
        &self.metrics
    }

    pub fn into_metrics(self) -> ResultMetrics {
        self.metrics
    }
}

impl std::fmt::Display for TeaResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Plant ===")?;
        writeln!(f, "Injected CO2:     {:.2} Mtpa", self.sizing.injected_co2_mtpa)?;
        writeln!(f, "Injection rate:   {:.1} kg/s", self.sizing.injection_rate_kgs)?;
        writeln!(
            f,
            "Wells:            {} ({} injection)",
            self.sizing.total_wells, self.sizing.injection_wells
        )?;
        writeln!(f, "Total capex:      ${:.2} M", self.sizing.total_capex_musd)?;
        writeln!(f, "Net power:        {:.2} MW", self.sizing.power_mw)?;
        writeln!(f, "Annual energy:    {:.0} MWh", self.sizing.annual_energy_mwh)?;
        writeln!(f)?;
        write!(f, "{}", self.metrics)
    }
}

/// The cash-flow and metrics engine.
///
/// Stateless apart from the IRR search settings: the same inputs always
/// produce bit-identical results.
///
/// # Examples
///
/// ```
/// use dualwell_tea::prelude::*;
///
/// let result = TeaEngine::new().compute(&InputParameters::default()).unwrap();
/// assert_eq!(result.series().len(), 18);
/// assert!(result.metrics().npv_musd.is_finite());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TeaEngine {
    irr_search: IrrSearch,
}

impl TeaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_irr_search(irr_search: IrrSearch) -> Self {
        Self { irr_search }
    }

    /// Validate `params` and run the full model.
    ///
    /// Nothing is computed if validation fails, including when in-range
    /// inputs size a well field too large to represent. Numerical problems do not
    /// fail the run; they leave the affected metric `None` and are listed
    /// in [`ResultMetrics::warnings`].
    pub fn compute(&self, params: &InputParameters) -> Result<TeaResult, ValidationError> {
        params.validate()?;

        let sizing = PlantSizing::from_params(params)?;
        log::debug!(
            "sized plant: {:.1} kg/s, {} wells, {:.2} $M capex, {:.0} MWh/yr",
            sizing.injection_rate_kgs,
            sizing.total_wells,
            sizing.total_capex_musd,
            sizing.annual_energy_mwh
        );

        let series = CashFlowSeries::build(params, &sizing);
        let metrics = ResultMetrics::from_series(&series, &self.irr_search);

        Ok(TeaResult {
            sizing,
            series,
            metrics,
        })
    }

    /// Shorthand for `compute(params)?.into_metrics()`.
    pub fn compute_metrics(&self, params: &InputParameters) -> Result<ResultMetrics, ValidationError> {
        Ok(self.compute(params)?.into_metrics())
    }
}
