use crate::core::params::InputParameters;
use crate::finance::metrics::ResultMetrics;
use crate::history::export::{self, ExportError, ExportLayout};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// One completed run: the inputs it was given and the metrics it produced.
///
/// Records are immutable once created and leave the ledger only when the
/// whole ledger is cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    id: Uuid,
    /// Position in the session's run sequence, starting at 1.
    sequence: u64,
    created_at: DateTime<Utc>,
    inputs: InputParameters,
    metrics: ResultMetrics,
}

impl RunRecord {
    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn inputs(&self) -> &InputParameters {
        &self.inputs
    }

    pub fn metrics(&self) -> &ResultMetrics {
        &self.metrics
    }

    /// Column label used in tables and exports, e.g. `Run_3`.
    pub fn label(&self) -> String {
        format!("Run_{}", self.sequence)
    }
}

/// The ordered history of runs in one session.
///
/// Insertion order is display order. Sequence numbers keep increasing
/// across [`RunLedger::clear`], so a number is never reused within a
/// session.
///
/// # Examples
///
/// ```
/// use dualwell_tea::prelude::*;
///
/// let params = InputParameters::default();
/// let metrics = TeaEngine::new().compute_metrics(&params).unwrap();
///
/// let mut ledger = RunLedger::new();
/// ledger.record(params, metrics);
/// assert_eq!(ledger.len(), 1);
///
/// ledger.clear();
/// assert!(ledger.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLedger {
    records: Vec<RunRecord>,
    next_sequence: u64,
}

impl Default for RunLedger {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_sequence: 1,
        }
    }
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run, stamping it with the next sequence number and the
    /// current time.
    pub fn record(&mut self, inputs: InputParameters, metrics: ResultMetrics) -> &RunRecord {
        let record = RunRecord {
            id: Uuid::new_v4(),
            sequence: self.next_sequence,
            created_at: Utc::now(),
            inputs,
            metrics,
        };
        self.next_sequence += 1;
        log::info!("recorded {} ({})", record.label(), record.id);
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// All records in insertion order.
    pub fn list(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RunRecord> {
        self.records.iter()
    }

    pub fn get(&self, sequence: u64) -> Option<&RunRecord> {
        self.records.iter().find(|r| r.sequence == sequence)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sequence number the next recorded run will receive.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Remove every record. Idempotent.
    pub fn clear(&mut self) {
        if !self.records.is_empty() {
            log::info!("cleared {} runs", self.records.len());
        }
        self.records.clear();
    }

    /// Serialize every record as CSV.
    pub fn export(&self, layout: ExportLayout) -> Result<Vec<u8>, ExportError> {
        export::export_records(&self.records, layout)
    }

    /// Write every record as CSV to `path`. The ledger is unaffected if
    /// the write fails.
    pub fn export_to_path(&self, path: &Path, layout: ExportLayout) -> Result<(), ExportError> {
        export::export_to_path(&self.records, path, layout)
    }
}

impl<'a> IntoIterator for &'a RunLedger {
    type Item = &'a RunRecord;
    type IntoIter = std::slice::Iter<'a, RunRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn fmt_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "N/A".to_string(),
    }
}

impl std::fmt::Display for RunLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Run History ===")?;
        if self.records.is_empty() {
            return writeln!(f, "No runs yet.");
        }
        writeln!(
            f,
            "{:<8} {:<20} {:>12} {:>14} {:>12} {:>10} {:>9}",
            "Run", "Timestamp", "Power $/MWh", "LCOE $/MWh", "NPV $M", "IRR %", "Payback"
        )?;
        for r in &self.records {
            let m = &r.metrics;
            writeln!(
                f,
                "{:<8} {:<20} {:>12.2} {:>14} {:>12.2} {:>10} {:>9}",
                r.label(),
                r.created_at.format("%Y-%m-%d %H:%M:%S"),
                r.inputs.financial.power_price_usd_mwh,
                fmt_optional(m.lcoe_usd_mwh, 2),
                m.npv_musd,
                fmt_optional(m.irr_percent(), 2),
                m.payback_period_years
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "never".to_string()),
            )?;
        }
        Ok(())
    }
}
