pub mod engine;
pub mod irr;
pub mod metrics;
