//! # dualwell-tea
//!
//! Technoeconomic analysis for combined geothermal power and CO2
//! sequestration projects.
//!
//! Given a set of CO2, financial and operations parameters, the engine
//! sizes the well field, builds a yearly cash-flow series and computes
//! LCOE, NPV, IRR and payback. Each run can be kept in a session's run
//! history and exported as CSV.
//!
//! ## Architecture
//!
//! - **core** — Input parameters, the field registry, plant sizing and cash flows
//! - **finance** — NPV/LCOE/IRR metrics and the engine that composes them
//! - **history** — Run ledger and CSV export
//! - **session** — Session-scoped context owning one ledger
//! - **simulation** — Random scenarios and sensitivity sweeps

pub mod core;
pub mod finance;
pub mod history;
pub mod session;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::cashflow::{CashFlowPeriod, CashFlowSeries, PlantSizing};
    pub use crate::core::fields::{ValidationError, FIELDS};
    pub use crate::core::params::{
        CapexSchedule, Co2Parameters, FinancialParameters, InputParameters, OperationsParameters,
        OutputBasis, Reinvestment,
    };
    pub use crate::finance::engine::{TeaEngine, TeaResult};
    pub use crate::finance::irr::{IrrSearch, NumericalError};
    pub use crate::finance::metrics::ResultMetrics;
    pub use crate::history::export::{ExportError, ExportLayout};
    pub use crate::history::ledger::{RunLedger, RunRecord};
    pub use crate::session::Session;
}
