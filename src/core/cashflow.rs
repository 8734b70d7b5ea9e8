use crate::core::fields::ValidationError;
use crate::core::params::{InputParameters, OutputBasis};
use serde::{Deserialize, Serialize};

/// Operating hours in a year at full availability.
pub const BASE_OPERATING_HOURS: f64 = 8160.0;

/// Injection capacity of a single well, kg/s.
pub const WELL_INJECTION_CAPACITY_KGS: f64 = 100.0;

/// Largest injection well field the model will size. Keeps the paired
/// well count representable as a `u32`.
pub const MAX_INJECTION_WELLS: u32 = u32::MAX / 2;

/// Physical sizing of the plant, derived from the inputs.
///
/// Every injection well is paired with a production well, so the well
/// count is always even.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantSizing {
    pub operating_hours: f64,
    /// CO2 injected per year, Mtpa (stored / fraction sequestered).
    pub injected_co2_mtpa: f64,
    /// Total injection mass flow, kg/s.
    pub injection_rate_kgs: f64,
    pub injection_wells: u32,
    pub total_wells: u32,
    pub geo_capex_musd: f64,
    pub total_capex_musd: f64,
    pub heat_mwt: f64,
    pub power_mw: f64,
    /// Energy generated in the first operating year, MWh.
    pub annual_energy_mwh: f64,
}

impl PlantSizing {
    /// Size the plant. Assumes `params` has been validated.
    ///
    /// In-range inputs can still combine into a well field too large to
    /// represent (tiny sequestered fraction and capacity factor against a
    /// large captured volume); that is rejected rather than saturated.
    pub fn from_params(params: &InputParameters) -> Result<Self, ValidationError> {
        let co2 = &params.co2;
        let ops = &params.operations;

        let operating_hours = BASE_OPERATING_HOURS * ops.capacity_factor;
        let injected_co2_mtpa = co2.captured_and_stored_mtpa / co2.percent_sequestered;
        let injection_rate_kgs =
            (injected_co2_mtpa * 1e9) / (operating_hours * 3600.0) / co2.co2_water_ratio;

        let wells_needed = (injection_rate_kgs / WELL_INJECTION_CAPACITY_KGS).ceil();
        if !wells_needed.is_finite() || wells_needed > MAX_INJECTION_WELLS as f64 {
            return Err(ValidationError::Malformed {
                field: "captured_and_stored_mtpa".to_string(),
                reason: format!(
                    "injection rate of {} kg/s needs more than {} injection wells",
                    injection_rate_kgs, MAX_INJECTION_WELLS
                ),
            });
        }
        let injection_wells = wells_needed as u32;
        let total_wells = 2 * injection_wells;
        let geo_capex_musd = total_wells as f64 * params.financial.geo_capex_per_well_musd;
        let total_capex_musd = params.financial.sco2_capex_musd + geo_capex_musd;

        let heat_mwt = injection_rate_kgs * ops.thermal_extraction_mwt_per_kgs;
        let power_mw = heat_mwt * ops.thermal_efficiency;
        let annual_energy_mwh = match ops.output_basis {
            OutputBasis::DualWell => power_mw * operating_hours,
            OutputBasis::Nameplate { annual_output_mwh } => annual_output_mwh * ops.capacity_factor,
        };
        if !total_capex_musd.is_finite() || !annual_energy_mwh.is_finite() {
            return Err(ValidationError::Malformed {
                field: "captured_and_stored_mtpa".to_string(),
                reason: "plant sizing is not finite".to_string(),
            });
        }

        Ok(Self {
            operating_hours,
            injected_co2_mtpa,
            injection_rate_kgs,
            injection_wells,
            total_wells,
            geo_capex_musd,
            total_capex_musd,
            heat_mwt,
            power_mw,
            annual_energy_mwh,
        })
    }
}

/// Cash flows for one year of the project horizon.
///
/// Monetary fields are in $M. Costs are stored as positive magnitudes;
/// `net` carries the sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowPeriod {
    /// Period index; 0 is the first construction year.
    pub year: u32,
    /// Whether the plant runs in this period.
    pub operating: bool,
    pub capex: f64,
    pub generation_mwh: f64,
    pub revenue_electricity: f64,
    pub revenue_tax_credit: f64,
    pub revenue_carbon_credit: f64,
    pub opex: f64,
    pub co2_cost: f64,
    pub net: f64,
    pub discount_factor: f64,
}

impl CashFlowPeriod {
    pub fn total_revenue(&self) -> f64 {
        self.revenue_electricity + self.revenue_tax_credit + self.revenue_carbon_credit
    }

    pub fn total_cost(&self) -> f64 {
        self.capex + self.opex + self.co2_cost
    }

    pub fn discounted_net(&self) -> f64 {
        self.net * self.discount_factor
    }
}

/// The project's yearly cash flows over construction and operation.
///
/// The horizon is the construction periods followed by the operating
/// life, so a 20-year project with upfront capex has 21 periods.
///
/// Built once from validated inputs and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSeries {
    periods: Vec<CashFlowPeriod>,
    construction_years: u32,
}

impl CashFlowSeries {
    /// Build the series. Assumes `params` has been validated.
    ///
    /// # Algorithm
    ///
    /// 1. Spread total capex over the construction periods per the schedule.
    /// 2. For each operating year k (1-based), degrade generation by
    ///    `(1 - d)^(k-1)`, book electricity and carbon revenues, fixed and
    ///    variable opex, CO2 purchase cost, and any reinvestment.
    /// 3. Discount each period end-of-period at `1 / (1 + r)^t`.
    pub fn build(params: &InputParameters, sizing: &PlantSizing) -> Self {
        let co2 = &params.co2;
        let fin = &params.financial;
        let ops = &params.operations;

        let shares = fin.capex_schedule.shares();
        let construction_years = shares.len() as u32;
        let horizon = construction_years + fin.operating_life_years;
        let mut periods = Vec::with_capacity(horizon as usize);

        for year in 0..horizon {
            let mut period = CashFlowPeriod {
                year,
                operating: year >= construction_years,
                capex: 0.0,
                generation_mwh: 0.0,
                revenue_electricity: 0.0,
                revenue_tax_credit: 0.0,
                revenue_carbon_credit: 0.0,
                opex: 0.0,
                co2_cost: 0.0,
                net: 0.0,
                discount_factor: 1.0 / (1.0 + fin.discount_rate).powi(year as i32),
            };

            if let Some(share) = shares.get(year as usize) {
                period.capex = share * sizing.total_capex_musd;
            }

            if period.operating {
                let op_year = year - construction_years + 1;
                let degradation = (1.0 - ops.degradation_rate).powi(op_year as i32 - 1);
                period.generation_mwh = sizing.annual_energy_mwh * degradation;
                period.revenue_electricity =
                    period.generation_mwh * fin.power_price_usd_mwh / 1e6;
                if op_year <= co2.tax_credit_duration_years {
                    period.revenue_tax_credit =
                        co2.captured_and_stored_mtpa * co2.tax_credit_45q_per_tonne;
                }
                period.revenue_carbon_credit =
                    co2.captured_and_stored_mtpa * co2.carbon_price_above_45q;
                period.opex =
                    ops.annual_opex_musd + period.generation_mwh * ops.variable_opex_usd_mwh / 1e6;
                period.co2_cost = co2.captured_and_stored_mtpa * co2.co2_cost_per_tonne;

                if let Some(reinvestment) = &fin.reinvestment {
                    if reinvestment.applies_in(op_year, fin.operating_life_years) {
                        period.capex += reinvestment.capex_fraction * sizing.total_capex_musd;
                    }
                }
            }

            period.net = period.total_revenue() - period.total_cost();
            periods.push(period);
        }

        log::debug!(
            "built cash-flow series: {} construction + {} operating periods",
            construction_years,
            fin.operating_life_years
        );

        Self {
            periods,
            construction_years,
        }
    }

    pub fn periods(&self) -> &[CashFlowPeriod] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn construction_years(&self) -> u32 {
        self.construction_years
    }

    /// Undiscounted net cash flow per period.
    pub fn net_flows(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.net).collect()
    }

    /// Running total of undiscounted net cash flow.
    pub fn cumulative_net(&self) -> Vec<f64> {
        self.periods
            .iter()
            .scan(0.0, |acc, p| {
                *acc += p.net;
                Some(*acc)
            })
            .collect()
    }

    pub fn total_capex(&self) -> f64 {
        self.periods.iter().map(|p| p.capex).sum()
    }
}

impl std::fmt::Display for CashFlowSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Cash Flow Series ($M) ===")?;
        writeln!(
            f,
            "{:>4} {:>10} {:>12} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "Year", "Capex", "Gen (MWh)", "Elec", "Credits", "Opex", "CO2", "Net"
        )?;
        for p in &self.periods {
            writeln!(
                f,
                "{:>4} {:>10.2} {:>12.0} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
                p.year,
                p.capex,
                p.generation_mwh,
                p.revenue_electricity,
                p.revenue_tax_credit + p.revenue_carbon_credit,
                p.opex,
                p.co2_cost,
                p.net
            )?;
        }
        Ok(())
    }
}
