use crate::core::fields::{self, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest construction period a capex schedule may span, in years.
pub const MAX_CONSTRUCTION_YEARS: u32 = 10;

/// Largest nameplate output accepted, in MWh per year.
pub const MAX_NAMEPLATE_OUTPUT_MWH: f64 = 1e9;

/// Tolerance on the sum of custom capex shares.
const SHARE_SUM_TOLERANCE: f64 = 1e-9;

/// CO2 handling and carbon-market parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Co2Parameters {
    /// CO2 permanently sequestered, in million tonnes per annum.
    pub captured_and_stored_mtpa: f64,
    /// Fraction of injected CO2 that stays sequestered per pass.
    pub percent_sequestered: f64,
    /// Mass ratio of CO2 to water in the injection stream.
    pub co2_water_ratio: f64,
    /// Cost of sourcing CO2, $/tonne.
    pub co2_cost_per_tonne: f64,
    /// Voluntary carbon price earned on top of 45Q, $/tonne.
    pub carbon_price_above_45q: f64,
    /// 45Q tax credit, $/tonne.
    pub tax_credit_45q_per_tonne: f64,
    /// Number of operating years the 45Q credit is paid.
    pub tax_credit_duration_years: u32,
}

impl Default for Co2Parameters {
    fn default() -> Self {
        Self {
            captured_and_stored_mtpa: 0.2,
            percent_sequestered: 0.01,
            co2_water_ratio: 1.0,
            co2_cost_per_tonne: 100.0,
            carbon_price_above_45q: 40.0,
            tax_credit_45q_per_tonne: 85.0,
            tax_credit_duration_years: 12,
        }
    }
}

/// Capital, pricing and project-horizon parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialParameters {
    /// Cost of capital used for discounting, as a fraction.
    pub discount_rate: f64,
    /// Capital cost of the sCO2 power block, $M.
    pub sco2_capex_musd: f64,
    /// Capital cost of each geothermal well, $M.
    pub geo_capex_per_well_musd: f64,
    /// Realised electricity price, $/MWh.
    pub power_price_usd_mwh: f64,
    /// Years of operation after construction.
    pub operating_life_years: u32,
    pub capex_schedule: CapexSchedule,
    pub reinvestment: Option<Reinvestment>,
}

impl Default for FinancialParameters {
    fn default() -> Self {
        Self {
            discount_rate: 0.08,
            sco2_capex_musd: 70.0,
            geo_capex_per_well_musd: 10.0,
            power_price_usd_mwh: 95.4,
            operating_life_years: 15,
            capex_schedule: CapexSchedule::default(),
            reinvestment: None,
        }
    }
}

/// Plant performance and operating-cost parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationsParameters {
    /// Fraction of the 8160 base operating hours the plant runs.
    pub capacity_factor: f64,
    /// Heat-to-power conversion efficiency.
    pub thermal_efficiency: f64,
    /// Heat extracted per unit of injection mass flow, MWt/(kg/s).
    pub thermal_extraction_mwt_per_kgs: f64,
    /// Fixed operating cost, $M per year.
    pub annual_opex_musd: f64,
    /// Variable operating cost, $/MWh generated.
    pub variable_opex_usd_mwh: f64,
    /// Fractional output loss per operating year, compounding.
    pub degradation_rate: f64,
    pub output_basis: OutputBasis,
}

impl Default for OperationsParameters {
    fn default() -> Self {
        Self {
            capacity_factor: 1.0,
            thermal_efficiency: 0.19,
            thermal_extraction_mwt_per_kgs: 52.88 / 74.38,
            annual_opex_musd: 30.0,
            variable_opex_usd_mwh: 0.0,
            degradation_rate: 0.0,
            output_basis: OutputBasis::DualWell,
        }
    }
}

/// The full set of inputs for one TEA run.
///
/// `Default` is the DualWell base case. Every numeric field has a
/// documented range (see [`crate::core::fields::FIELDS`]); call
/// [`InputParameters::validate`] before handing the parameters to anything
/// that assumes they are in range. [`crate::finance::engine::TeaEngine`]
/// does this itself.
///
/// # Examples
///
/// ```
/// use dualwell_tea::core::params::InputParameters;
///
/// let mut params = InputParameters::default();
/// params.set("power_price_usd_mwh", "120").unwrap();
/// assert_eq!(params.financial.power_price_usd_mwh, 120.0);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputParameters {
    pub co2: Co2Parameters,
    pub financial: FinancialParameters,
    pub operations: OperationsParameters,
}

impl InputParameters {
    /// Check every field against its documented range.
    ///
    /// Returns the first offending field. Registry fields are checked in
    /// registry order, then the enumerated fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for field in fields::FIELDS {
            field.check(field.get(self))?;
        }
        self.financial.capex_schedule.validate()?;
        self.operations.output_basis.validate()?;
        if let Some(reinvestment) = &self.financial.reinvestment {
            reinvestment.validate(self.financial.operating_life_years)?;
        }
        Ok(())
    }

    /// Set a field by its machine name from its text form.
    ///
    /// Numeric values are range-checked immediately; the enumerated fields
    /// (`capex_schedule`, `output_basis`, `reinvestment`) take the text
    /// forms their `FromStr` impls accept.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ValidationError> {
        match name {
            "capex_schedule" => {
                let schedule: CapexSchedule = value.parse()?;
                schedule.validate()?;
                self.financial.capex_schedule = schedule;
            }
            "output_basis" => {
                let basis: OutputBasis = value.parse()?;
                basis.validate()?;
                self.operations.output_basis = basis;
            }
            "reinvestment" => {
                let reinvestment = parse_reinvestment(value)?;
                if let Some(r) = &reinvestment {
                    r.validate(self.financial.operating_life_years)?;
                }
                self.financial.reinvestment = reinvestment;
            }
            _ => {
                let field = fields::lookup(name)
                    .ok_or_else(|| ValidationError::UnknownField(name.to_string()))?;
                let parsed: f64 = value.trim().parse().map_err(|_| ValidationError::Malformed {
                    field: field.name.to_string(),
                    reason: format!("'{}' is not a number", value),
                })?;
                field.check(parsed)?;
                field.set(self, parsed);
            }
        }
        Ok(())
    }

    /// Number of construction periods before operations start.
    pub fn construction_years(&self) -> u32 {
        self.financial.capex_schedule.shares().len() as u32
    }

    /// Total length of the cash-flow horizon, construction included.
    pub fn horizon_years(&self) -> u32 {
        self.construction_years() + self.financial.operating_life_years
    }
}

/// How the initial capital outlay is spread over the construction period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapexSchedule {
    /// All capex in period 0; operations start in period 1.
    Upfront,
    /// Equal shares over the first `years` periods.
    EvenlyPhased { years: u32 },
    /// Explicit per-period shares, summing to one.
    Custom { shares: Vec<f64> },
}

impl Default for CapexSchedule {
    fn default() -> Self {
        CapexSchedule::EvenlyPhased { years: 3 }
    }
}

impl CapexSchedule {
    /// Fraction of total capex spent in each construction period.
    pub fn shares(&self) -> Vec<f64> {
        match self {
            CapexSchedule::Upfront => vec![1.0],
            CapexSchedule::EvenlyPhased { years } => {
                let n = (*years).max(1);
                vec![1.0 / n as f64; n as usize]
            }
            CapexSchedule::Custom { shares } => shares.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            CapexSchedule::Upfront => Ok(()),
            CapexSchedule::EvenlyPhased { years } => {
                if *years == 0 || *years > MAX_CONSTRUCTION_YEARS {
                    return Err(ValidationError::Malformed {
                        field: "capex_schedule".to_string(),
                        reason: format!(
                            "phasing must span 1 to {} years, got {}",
                            MAX_CONSTRUCTION_YEARS, years
                        ),
                    });
                }
                Ok(())
            }
            CapexSchedule::Custom { shares } => {
                if shares.is_empty() || shares.len() > MAX_CONSTRUCTION_YEARS as usize {
                    return Err(ValidationError::Malformed {
                        field: "capex_schedule".to_string(),
                        reason: format!(
                            "custom schedule needs 1 to {} shares, got {}",
                            MAX_CONSTRUCTION_YEARS,
                            shares.len()
                        ),
                    });
                }
                if let Some(bad) = shares
                    .iter()
                    .find(|s| !s.is_finite() || **s < 0.0 || **s > 1.0)
                {
                    return Err(ValidationError::Malformed {
                        field: "capex_schedule".to_string(),
                        reason: format!("share {} is outside [0, 1]", bad),
                    });
                }
                let sum: f64 = shares.iter().sum();
                if (sum - 1.0).abs() > SHARE_SUM_TOLERANCE {
                    return Err(ValidationError::Malformed {
                        field: "capex_schedule".to_string(),
                        reason: format!("shares must sum to 1, got {}", sum),
                    });
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for CapexSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapexSchedule::Upfront => write!(f, "upfront"),
            CapexSchedule::EvenlyPhased { years } => write!(f, "even:{}", years),
            CapexSchedule::Custom { shares } => {
                let parts: Vec<String> = shares.iter().map(|s| s.to_string()).collect();
                write!(f, "custom:{}", parts.join("/"))
            }
        }
    }
}

impl FromStr for CapexSchedule {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: String| ValidationError::Malformed {
            field: "capex_schedule".to_string(),
            reason,
        };
        let s = s.trim();
        if s == "upfront" {
            return Ok(CapexSchedule::Upfront);
        }
        match s.split_once(':') {
            Some(("even", years)) => {
                let years = years
                    .trim()
                    .parse()
                    .map_err(|_| malformed(format!("'{}' is not a year count", years)))?;
                Ok(CapexSchedule::EvenlyPhased { years })
            }
            Some(("custom", shares)) => {
                let shares = shares
                    .split('/')
                    .map(|p| {
                        p.trim()
                            .parse::<f64>()
                            .map_err(|_| malformed(format!("'{}' is not a share", p)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CapexSchedule::Custom { shares })
            }
            _ => Err(malformed(format!(
                "expected 'upfront', 'even:<years>' or 'custom:<a>/<b>/...', got '{}'",
                s
            ))),
        }
    }
}

/// Where the plant's annual energy output comes from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputBasis {
    /// Derived from the CO2 injection rate through the well field.
    #[default]
    DualWell,
    /// Fixed output at full availability, scaled by the capacity factor.
    Nameplate { annual_output_mwh: f64 },
}

impl OutputBasis {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let OutputBasis::Nameplate { annual_output_mwh } = self {
            if !annual_output_mwh.is_finite()
                || *annual_output_mwh < 0.0
                || *annual_output_mwh > MAX_NAMEPLATE_OUTPUT_MWH
            {
                return Err(ValidationError::Malformed {
                    field: "output_basis".to_string(),
                    reason: format!(
                        "nameplate output must be within [0, {}] MWh, got {}",
                        MAX_NAMEPLATE_OUTPUT_MWH, annual_output_mwh
                    ),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for OutputBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputBasis::DualWell => write!(f, "dual_well"),
            OutputBasis::Nameplate { annual_output_mwh } => {
                write!(f, "nameplate:{}", annual_output_mwh)
            }
        }
    }
}

impl FromStr for OutputBasis {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "dual_well" {
            return Ok(OutputBasis::DualWell);
        }
        match s.split_once(':') {
            Some(("nameplate", mwh)) => {
                let annual_output_mwh =
                    mwh.trim().parse().map_err(|_| ValidationError::Malformed {
                        field: "output_basis".to_string(),
                        reason: format!("'{}' is not an output in MWh", mwh),
                    })?;
                Ok(OutputBasis::Nameplate { annual_output_mwh })
            }
            _ => Err(ValidationError::Malformed {
                field: "output_basis".to_string(),
                reason: format!("expected 'dual_well' or 'nameplate:<mwh>', got '{}'", s),
            }),
        }
    }
}

/// Periodic reinvestment (e.g. well workovers, turbine overhauls).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reinvestment {
    /// Interval between reinvestments, in operating years.
    pub every_years: u32,
    /// Cost of each reinvestment as a fraction of total initial capex.
    pub capex_fraction: f64,
}

impl Reinvestment {
    pub fn validate(&self, operating_life_years: u32) -> Result<(), ValidationError> {
        if self.every_years == 0 || self.every_years > operating_life_years {
            return Err(ValidationError::Malformed {
                field: "reinvestment".to_string(),
                reason: format!(
                    "interval must be 1 to {} years, got {}",
                    operating_life_years, self.every_years
                ),
            });
        }
        if !self.capex_fraction.is_finite() || !(0.0..=1.0).contains(&self.capex_fraction) {
            return Err(ValidationError::Malformed {
                field: "reinvestment".to_string(),
                reason: format!("capex fraction {} is outside [0, 1]", self.capex_fraction),
            });
        }
        Ok(())
    }

    /// Whether operating year `year` (1-based) carries a reinvestment.
    pub fn applies_in(&self, year: u32, operating_life_years: u32) -> bool {
        self.every_years > 0 && year % self.every_years == 0 && year < operating_life_years
    }
}

impl fmt::Display for Reinvestment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.every_years, self.capex_fraction)
    }
}

/// Parse `none` or `<every_years>:<capex_fraction>`.
pub fn parse_reinvestment(s: &str) -> Result<Option<Reinvestment>, ValidationError> {
    let s = s.trim();
    if s == "none" {
        return Ok(None);
    }
    let malformed = || ValidationError::Malformed {
        field: "reinvestment".to_string(),
        reason: format!("expected 'none' or '<years>:<fraction>', got '{}'", s),
    };
    let (years, fraction) = s.split_once(':').ok_or_else(malformed)?;
    Ok(Some(Reinvestment {
        every_years: years.trim().parse().map_err(|_| malformed())?,
        capex_fraction: fraction.trim().parse().map_err(|_| malformed())?,
    }))
}

/// Text form of an optional reinvestment, as used in exports.
pub fn reinvestment_label(reinvestment: &Option<Reinvestment>) -> String {
    match reinvestment {
        Some(r) => r.to_string(),
        None => "none".to_string(),
    }
}
