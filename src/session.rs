//! Session-scoped context tying the engine to a run history.

use crate::core::fields::ValidationError;
use crate::core::params::InputParameters;
use crate::finance::engine::{TeaEngine, TeaResult};
use crate::history::ledger::{RunLedger, RunRecord};
use uuid::Uuid;

/// One user's working context: an engine and the ledger of runs made
/// through it.
///
/// Sessions share nothing; create one per user and pass it explicitly.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    engine: TeaEngine,
    ledger: RunLedger,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_engine(TeaEngine::new())
    }

    pub fn with_engine(engine: TeaEngine) -> Self {
        let id = Uuid::new_v4();
        log::debug!("opened session {}", id);
        Self {
            id,
            engine,
            ledger: RunLedger::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn engine(&self) -> &TeaEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &RunLedger {
        &self.ledger
    }

    /// Compute `params` and append the run to the ledger.
    ///
    /// On a validation failure nothing is recorded.
    pub fn run(&mut self, params: InputParameters) -> Result<&RunRecord, ValidationError> {
        let result = self.engine.compute(&params)?;
        Ok(self.ledger.record(params, result.into_metrics()))
    }

    /// Like [`Session::run`], but also hands back the full result
    /// (sizing and cash-flow series) alongside the sequence number.
    pub fn run_detailed(&mut self, params: InputParameters) -> Result<(u64, TeaResult), ValidationError> {
        let result = self.engine.compute(&params)?;
        let sequence = self.ledger.record(params, result.metrics().clone()).sequence();
        Ok((sequence, result))
    }

    pub fn clear(&mut self) {
        self.ledger.clear();
    }
}
