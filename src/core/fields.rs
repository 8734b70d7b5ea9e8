//! Registry of the numeric input fields.
//!
//! Each entry carries the machine name used by `--set` and scenario files,
//! the label shown in tables and exports, the valid range, and accessors
//! into [`InputParameters`]. Validation, random scenario generation and
//! the CSV export columns are all driven from [`FIELDS`].

use crate::core::params::InputParameters;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Input that failed validation. Always names the offending field.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("{field} = {value} is outside the valid range {range}")]
    OutOfRange {
        field: String,
        value: f64,
        range: ValueRange,
    },
    #[error("{field} must be a finite number")]
    NotFinite { field: String },
    #[error("{field} must be a whole number, got {value}")]
    NotWholeNumber { field: String, value: f64 },
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("{field}: {reason}")]
    Malformed { field: String, reason: String },
}

impl ValidationError {
    /// Name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::OutOfRange { field, .. }
            | ValidationError::NotFinite { field }
            | ValidationError::NotWholeNumber { field, .. }
            | ValidationError::Malformed { field, .. } => field,
            ValidationError::UnknownField(field) => field,
        }
    }
}

/// A closed, half-open or open interval of valid values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub min_exclusive: bool,
    pub max_exclusive: bool,
}

impl ValueRange {
    pub const fn closed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: false,
            max_exclusive: false,
        }
    }

    pub const fn left_open(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: true,
            max_exclusive: false,
        }
    }

    pub const fn right_open(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: false,
            max_exclusive: true,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let above = if self.min_exclusive {
            value > self.min
        } else {
            value >= self.min
        };
        let below = if self.max_exclusive {
            value < self.max
        } else {
            value <= self.max
        };
        above && below
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}, {}{}",
            if self.min_exclusive { "(" } else { "[" },
            self.min,
            self.max,
            if self.max_exclusive { ")" } else { "]" }
        )
    }
}

/// Whether a field holds a real number or a whole count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Real,
    Count,
}

/// Conceptual grouping, matching the three columns of the input form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    Co2,
    Financial,
    Operations,
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldGroup::Co2 => write!(f, "CO2 Parameters"),
            FieldGroup::Financial => write!(f, "Financial"),
            FieldGroup::Operations => write!(f, "Operations"),
        }
    }
}

/// Description of one numeric input field.
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub group: FieldGroup,
    pub kind: FieldKind,
    pub range: ValueRange,
    /// Multiplier from the stored value to the displayed value
    /// (100 for fractions shown as percentages).
    pub display_scale: f64,
    getter: fn(&InputParameters) -> f64,
    setter: fn(&mut InputParameters, f64),
}

impl FieldSpec {
    pub fn get(&self, params: &InputParameters) -> f64 {
        (self.getter)(params)
    }

    /// Store `value` without checking it; pair with [`FieldSpec::check`].
    pub fn set(&self, params: &mut InputParameters, value: f64) {
        (self.setter)(params, value)
    }

    /// Value as displayed in tables and exports.
    pub fn display_value(&self, params: &InputParameters) -> f64 {
        self.get(params) * self.display_scale
    }

    /// Column header, e.g. `Cost of capital (%)`.
    pub fn header(&self) -> String {
        if self.unit.is_empty() {
            self.label.to_string()
        } else {
            format!("{} ({})", self.label, self.unit)
        }
    }

    pub fn check(&self, value: f64) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite {
                field: self.name.to_string(),
            });
        }
        if self.kind == FieldKind::Count && value.fract() != 0.0 {
            return Err(ValidationError::NotWholeNumber {
                field: self.name.to_string(),
                value,
            });
        }
        if !self.range.contains(value) {
            return Err(ValidationError::OutOfRange {
                field: self.name.to_string(),
                value,
                range: self.range,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("range", &self.range)
            .finish()
    }
}

/// Look up a field by machine name.
pub fn lookup(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Every numeric input field, in form order.
pub static FIELDS: &[FieldSpec] = &[
    // --- CO2 ---
    FieldSpec {
        name: "captured_and_stored_mtpa",
        label: "Captured and stored",
        unit: "Mtpa",
        group: FieldGroup::Co2,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.0, 10.0),
        display_scale: 1.0,
        getter: |p| p.co2.captured_and_stored_mtpa,
        setter: |p, v| p.co2.captured_and_stored_mtpa = v,
    },
    FieldSpec {
        name: "percent_sequestered",
        label: "Injection CO2 % sequestered",
        unit: "%",
        group: FieldGroup::Co2,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.001, 1.0),
        display_scale: 100.0,
        getter: |p| p.co2.percent_sequestered,
        setter: |p, v| p.co2.percent_sequestered = v,
    },
    FieldSpec {
        name: "co2_water_ratio",
        label: "CO2/Water ratio",
        unit: "",
        group: FieldGroup::Co2,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.1, 5.0),
        display_scale: 1.0,
        getter: |p| p.co2.co2_water_ratio,
        setter: |p, v| p.co2.co2_water_ratio = v,
    },
    FieldSpec {
        name: "co2_cost_per_tonne",
        label: "CO2 cost",
        unit: "$/tonne",
        group: FieldGroup::Co2,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.0, 300.0),
        display_scale: 1.0,
        getter: |p| p.co2.co2_cost_per_tonne,
        setter: |p, v| p.co2.co2_cost_per_tonne = v,
    },
    FieldSpec {
        name: "carbon_price_above_45q",
        label: "Carbon price above 45Q",
        unit: "$/tonne",
        group: FieldGroup::Co2,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.0, 200.0),
        display_scale: 1.0,
        getter: |p| p.co2.carbon_price_above_45q,
        setter: |p, v| p.co2.carbon_price_above_45q = v,
    },
    FieldSpec {
        name: "tax_credit_45q_per_tonne",
        label: "45Q tax credit",
        unit: "$/tonne",
        group: FieldGroup::Co2,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.0, 500.0),
        display_scale: 1.0,
        getter: |p| p.co2.tax_credit_45q_per_tonne,
        setter: |p, v| p.co2.tax_credit_45q_per_tonne = v,
    },
    FieldSpec {
        name: "tax_credit_duration_years",
        label: "45Q credit duration",
        unit: "years",
        group: FieldGroup::Co2,
        kind: FieldKind::Count,
        range: ValueRange::closed(0.0, 100.0),
        display_scale: 1.0,
        getter: |p| p.co2.tax_credit_duration_years as f64,
        setter: |p, v| p.co2.tax_credit_duration_years = v as u32,
    },
    // --- Financial ---
    FieldSpec {
        name: "discount_rate",
        label: "Cost of capital",
        unit: "%",
        group: FieldGroup::Financial,
        kind: FieldKind::Real,
        range: ValueRange::right_open(0.0, 1.0),
        display_scale: 100.0,
        getter: |p| p.financial.discount_rate,
        setter: |p, v| p.financial.discount_rate = v,
    },
    FieldSpec {
        name: "sco2_capex_musd",
        label: "sCO2 Capex",
        unit: "$M",
        group: FieldGroup::Financial,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.0, 5000.0),
        display_scale: 1.0,
        getter: |p| p.financial.sco2_capex_musd,
        setter: |p, v| p.financial.sco2_capex_musd = v,
    },
    FieldSpec {
        name: "geo_capex_per_well_musd",
        label: "Geothermal capex per well",
        unit: "$M",
        group: FieldGroup::Financial,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.0, 50.0),
        display_scale: 1.0,
        getter: |p| p.financial.geo_capex_per_well_musd,
        setter: |p, v| p.financial.geo_capex_per_well_musd = v,
    },
    FieldSpec {
        name: "power_price_usd_mwh",
        label: "Power price",
        unit: "$/MWh",
        group: FieldGroup::Financial,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.0, 1000.0),
        display_scale: 1.0,
        getter: |p| p.financial.power_price_usd_mwh,
        setter: |p, v| p.financial.power_price_usd_mwh = v,
    },
    FieldSpec {
        name: "operating_life_years",
        label: "Operating life",
        unit: "years",
        group: FieldGroup::Financial,
        kind: FieldKind::Count,
        range: ValueRange::closed(1.0, 100.0),
        display_scale: 1.0,
        getter: |p| p.financial.operating_life_years as f64,
        setter: |p, v| p.financial.operating_life_years = v as u32,
    },
    // --- Operations ---
    FieldSpec {
        name: "capacity_factor",
        label: "Capacity factor",
        unit: "%",
        group: FieldGroup::Operations,
        kind: FieldKind::Real,
        range: ValueRange::left_open(0.0, 1.0),
        display_scale: 100.0,
        getter: |p| p.operations.capacity_factor,
        setter: |p, v| p.operations.capacity_factor = v,
    },
    FieldSpec {
        name: "thermal_efficiency",
        label: "Thermal efficiency",
        unit: "%",
        group: FieldGroup::Operations,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.05, 0.5),
        display_scale: 100.0,
        getter: |p| p.operations.thermal_efficiency,
        setter: |p, v| p.operations.thermal_efficiency = v,
    },
    FieldSpec {
        name: "thermal_extraction_mwt_per_kgs",
        label: "Thermal extraction",
        unit: "MWt/(kg/s)",
        group: FieldGroup::Operations,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.1, 2.0),
        display_scale: 1.0,
        getter: |p| p.operations.thermal_extraction_mwt_per_kgs,
        setter: |p, v| p.operations.thermal_extraction_mwt_per_kgs = v,
    },
    FieldSpec {
        name: "annual_opex_musd",
        label: "Annual opex",
        unit: "$M/year",
        group: FieldGroup::Operations,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.0, 200.0),
        display_scale: 1.0,
        getter: |p| p.operations.annual_opex_musd,
        setter: |p, v| p.operations.annual_opex_musd = v,
    },
    FieldSpec {
        name: "variable_opex_usd_mwh",
        label: "Variable opex",
        unit: "$/MWh",
        group: FieldGroup::Operations,
        kind: FieldKind::Real,
        range: ValueRange::closed(0.0, 500.0),
        display_scale: 1.0,
        getter: |p| p.operations.variable_opex_usd_mwh,
        setter: |p, v| p.operations.variable_opex_usd_mwh = v,
    },
    FieldSpec {
        name: "degradation_rate",
        label: "Output degradation",
        unit: "%/year",
        group: FieldGroup::Operations,
        kind: FieldKind::Real,
        range: ValueRange::right_open(0.0, 0.5),
        display_scale: 100.0,
        getter: |p| p.operations.degradation_rate,
        setter: |p, v| p.operations.degradation_rate = v,
    },
];
