//! Spreadsheet-compatible CSV export of the run history.

use crate::core::fields::FIELDS;
use crate::core::params::reinvestment_label;
use crate::history::ledger::RunRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Failure producing an export. The ledger is never modified by an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing export: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Orientation of the exported table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportLayout {
    /// One row per run; inputs and metrics are columns.
    #[default]
    RowPerRun,
    /// One column per run (`Run_1`, `Run_2`, ...); parameters are rows.
    ColumnPerRun,
}

impl FromStr for ExportLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rows" | "row_per_run" => Ok(ExportLayout::RowPerRun),
            "columns" | "column_per_run" => Ok(ExportLayout::ColumnPerRun),
            _ => Err(format!("unknown layout '{}': expected 'rows' or 'columns'", s)),
        }
    }
}

/// Names of the exported parameters and metrics, in column order.
pub fn headers() -> Vec<String> {
    let mut headers = vec!["Timestamp".to_string()];
    headers.extend(FIELDS.iter().map(|f| f.header()));
    headers.extend(
        [
            "Capex schedule",
            "Output basis",
            "Reinvestment",
            "LCOE ($/MWh)",
            "NPV ($M)",
            "IRR (%)",
            "Payback (years)",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    headers
}

fn optional_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// The exported values of one record, aligned with [`headers`].
///
/// Percentage fields are written in percent; undefined metrics are empty.
fn cells(record: &RunRecord) -> Vec<String> {
    let inputs = record.inputs();
    let metrics = record.metrics();

    let mut cells = vec![record.created_at().to_rfc3339()];
    cells.extend(FIELDS.iter().map(|f| f.display_value(inputs).to_string()));
    cells.push(inputs.financial.capex_schedule.to_string());
    cells.push(inputs.operations.output_basis.to_string());
    cells.push(reinvestment_label(&inputs.financial.reinvestment));
    cells.push(optional_cell(metrics.lcoe_usd_mwh));
    cells.push(metrics.npv_musd.to_string());
    cells.push(optional_cell(metrics.irr_percent()));
    cells.push(optional_cell(metrics.payback_period_years));
    cells
}

/// Serialize `records` as CSV bytes.
///
/// An empty slice yields a header-only file.
pub fn export_records(records: &[RunRecord], layout: ExportLayout) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let headers = headers();

    match layout {
        ExportLayout::RowPerRun => {
            let mut header_row = vec!["Run".to_string()];
            header_row.extend(headers);
            writer.write_record(&header_row)?;
            for record in records {
                let mut row = vec![record.label()];
                row.extend(cells(record));
                writer.write_record(&row)?;
            }
        }
        ExportLayout::ColumnPerRun => {
            let mut header_row = vec!["Parameter".to_string()];
            header_row.extend(records.iter().map(|r| r.label()));
            writer.write_record(&header_row)?;
            if !records.is_empty() {
                let table: Vec<Vec<String>> = records.iter().map(cells).collect();
                for (i, name) in headers.into_iter().enumerate() {
                    let mut row = vec![name];
                    row.extend(table.iter().map(|c| c[i].clone()));
                    writer.write_record(&row)?;
                }
            }
        }
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    log::info!("exported {} runs ({} bytes)", records.len(), bytes.len());
    Ok(bytes)
}

/// Serialize `records` and write them to `path`.
pub fn export_to_path(
    records: &[RunRecord],
    path: &Path,
    layout: ExportLayout,
) -> Result<(), ExportError> {
    let bytes = export_records(records, layout)?;
    fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::InputParameters;
    use crate::finance::metrics::ResultMetrics;
    use crate::history::ledger::RunLedger;

    fn metrics(irr: Option<f64>) -> ResultMetrics {
        ResultMetrics {
            lcoe_usd_mwh: Some(75.5),
            npv_musd: 10.0,
            irr,
            payback_period_years: None,
            warnings: Vec::new(),
        }
    }

    fn parse(bytes: &[u8]) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes);
        reader
            .records()
            .map(|r| r.unwrap().iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let rows = parse(&export_records(&[], ExportLayout::RowPerRun).unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "Run");
        assert_eq!(rows[0].len(), headers().len() + 1);

        let rows = parse(&export_records(&[], ExportLayout::ColumnPerRun).unwrap());
        assert_eq!(rows, vec![vec!["Parameter".to_string()]]);
    }

    #[test]
    fn test_row_per_run() {
        let mut ledger = RunLedger::new();
        ledger.record(InputParameters::default(), metrics(Some(0.125)));
        ledger.record(InputParameters::default(), metrics(None));

        let rows = parse(&ledger.export(ExportLayout::RowPerRun).unwrap());
        assert_eq!(rows.len(), 3);
        let header = &rows[0];
        let irr_col = header.iter().position(|h| h == "IRR (%)").unwrap();
        let rate_col = header.iter().position(|h| h == "Cost of capital (%)").unwrap();
        assert_eq!(rows[1][0], "Run_1");
        assert_eq!(rows[1][irr_col], "12.5");
        assert_eq!(rows[2][irr_col], "");
        assert_eq!(rows[1][rate_col].parse::<f64>().unwrap().round(), 8.0);
    }

    #[test]
    fn test_column_per_run() {
        let mut ledger = RunLedger::new();
        ledger.record(InputParameters::default(), metrics(Some(0.1)));
        ledger.record(InputParameters::default(), metrics(Some(0.2)));

        let rows = parse(&ledger.export(ExportLayout::ColumnPerRun).unwrap());
        assert_eq!(rows[0], vec!["Parameter", "Run_1", "Run_2"]);
        assert_eq!(rows.len(), headers().len() + 1);
        let npv_row = rows.iter().find(|r| r[0] == "NPV ($M)").unwrap();
        assert_eq!(npv_row[1], "10");
        let schedule_row = rows.iter().find(|r| r[0] == "Capex schedule").unwrap();
        assert_eq!(schedule_row[1], "even:3");
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let mut ledger = RunLedger::new();
        ledger.record(InputParameters::default(), metrics(None));
        let path = Path::new("/nonexistent-dir/for/sure/runs.csv");
        let err = ledger.export_to_path(path, ExportLayout::RowPerRun).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("rows".parse::<ExportLayout>().unwrap(), ExportLayout::RowPerRun);
        assert_eq!("columns".parse::<ExportLayout>().unwrap(), ExportLayout::ColumnPerRun);
        assert!("diagonal".parse::<ExportLayout>().is_err());
    }
}
