pub mod cashflow;
pub mod fields;
pub mod params;
