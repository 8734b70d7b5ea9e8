use approx::assert_relative_eq;
use dualwell_tea::core::fields::ValidationError;
use dualwell_tea::core::params::{CapexSchedule, InputParameters, OutputBasis};
use dualwell_tea::finance::engine::TeaEngine;
use dualwell_tea::finance::irr::npv;
use dualwell_tea::history::export::ExportLayout;
use dualwell_tea::history::ledger::RunLedger;
use dualwell_tea::session::Session;

/// Generic power project: $1M upfront, 1000 MWh/yr nameplate at 90%
/// availability sold at $50/MWh, $20k/yr fixed and $2/MWh variable O&M,
/// 20 years at 8%. Monetary inputs are in $M.
fn generic_project(power_price: f64) -> InputParameters {
    let mut params = InputParameters::default();
    params.co2.captured_and_stored_mtpa = 0.0;
    params.co2.co2_cost_per_tonne = 0.0;
    params.co2.carbon_price_above_45q = 0.0;
    params.co2.tax_credit_45q_per_tonne = 0.0;
    params.financial.discount_rate = 0.08;
    params.financial.operating_life_years = 20;
    params.financial.sco2_capex_musd = 1.0;
    params.financial.power_price_usd_mwh = power_price;
    params.financial.capex_schedule = CapexSchedule::Upfront;
    params.operations.capacity_factor = 0.9;
    params.operations.output_basis = OutputBasis::Nameplate {
        annual_output_mwh: 1000.0,
    };
    params.operations.annual_opex_musd = 0.02;
    params.operations.variable_opex_usd_mwh = 2.0;
    params
}

/// Full pipeline: parameters → engine → session ledger → export.
#[test]
fn generic_project_scenario() {
    let params = generic_project(50.0);
    let mut session = Session::new();

    let record = session.run(params.clone()).unwrap();
    assert_eq!(record.inputs(), &params);
    let metrics = record.metrics().clone();

    let lcoe = metrics.lcoe_usd_mwh.unwrap();
    let irr = metrics.irr.unwrap();
    assert!(lcoe.is_finite() && lcoe > 0.0);
    assert!(metrics.npv_musd.is_finite());
    assert!(irr.is_finite());
    assert_eq!(session.ledger().list().len(), 1);

    // Annual net: 0.045 revenue - 0.0218 O&M = 0.0232 $M for 20 years
    let annuity = (1.0 - 1.08f64.powi(-20)) / 0.08;
    assert_relative_eq!(metrics.npv_musd, -1.0 + 0.0232 * annuity, max_relative = 1e-9);

    // LCOE: (1.0 + 0.0218 * annuity) / (900 * annuity) in $/MWh
    let expected_lcoe = (1.0 + 0.0218 * annuity) * 1e6 / (900.0 * annuity);
    assert_relative_eq!(lcoe, expected_lcoe, max_relative = 1e-9);

    // Undiscounted inflows (0.464) never repay 1.0, so IRR is negative
    assert!(irr < 0.0);
    assert_eq!(metrics.payback_period_years, None);
}

#[test]
fn npv_increases_with_power_price() {
    let mut session = Session::new();
    session.run(generic_project(50.0)).unwrap();
    session.run(generic_project(80.0)).unwrap();

    let records = session.ledger().list();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].inputs().financial.power_price_usd_mwh, 50.0);
    assert_eq!(records[1].inputs().financial.power_price_usd_mwh, 80.0);
    assert!(records[0].sequence() < records[1].sequence());
    assert!(records[1].metrics().npv_musd > records[0].metrics().npv_musd);
}

#[test]
fn base_case_matches_reference_structure() {
    let result = TeaEngine::new().compute(&InputParameters::default()).unwrap();

    assert_eq!(result.sizing().total_wells, 14);
    assert_eq!(result.series().len(), 18);

    let m = result.metrics();
    let flows = result.series().net_flows();
    assert_relative_eq!(npv(0.08, &flows), m.npv_musd, max_relative = 1e-12);

    if let Some(irr) = m.irr {
        let scale: f64 = flows.iter().map(|f| f.abs()).sum();
        assert!(npv(irr, &flows).abs() < 1e-9 * scale);
    }
}

#[test]
fn validation_names_the_field() {
    let mut params = InputParameters::default();
    params.financial.operating_life_years = 0;
    let err = TeaEngine::new().compute(&params).unwrap_err();
    assert_eq!(err.field(), "operating_life_years");

    let mut params = InputParameters::default();
    params.co2.co2_water_ratio = f64::INFINITY;
    let err = TeaEngine::new().compute(&params).unwrap_err();
    assert!(matches!(err, ValidationError::NotFinite { .. }));
    assert_eq!(err.field(), "co2_water_ratio");
}

#[test]
fn clear_then_record_again() {
    let mut session = Session::new();
    for price in [40.0, 60.0, 80.0] {
        session.run(generic_project(price)).unwrap();
    }
    assert_eq!(session.ledger().len(), 3);

    session.clear();
    assert!(session.ledger().list().is_empty());
    session.clear();
    assert!(session.ledger().is_empty());

    let record = session.run(generic_project(100.0)).unwrap();
    assert_eq!(record.sequence(), 4);
}

#[test]
fn export_round_trips_through_csv_reader() {
    let mut session = Session::new();
    session.run(generic_project(50.0)).unwrap();
    session.run(InputParameters::default()).unwrap();

    let bytes = session.ledger().export(ExportLayout::RowPerRun).unwrap();
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let headers = reader.headers().unwrap().clone();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

    assert_eq!(rows.len(), 2);
    let price_col = headers.iter().position(|h| h == "Power price ($/MWh)").unwrap();
    assert_eq!(&rows[0][price_col], "50");
    assert_eq!(&rows[1][price_col], "95.4");
    let basis_col = headers.iter().position(|h| h == "Output basis").unwrap();
    assert_eq!(&rows[0][basis_col], "nameplate:1000");
    assert_eq!(&rows[1][basis_col], "dual_well");
}

#[test]
fn empty_ledger_exports_headers_only() {
    let ledger = RunLedger::new();
    let bytes = ledger.export(ExportLayout::RowPerRun).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("Run,Timestamp,"));
}

#[test]
fn export_to_file() {
    let mut session = Session::new();
    session.run(InputParameters::default()).unwrap();

    let path = std::env::temp_dir().join(format!("tea-runs-{}.csv", session.id()));
    session
        .ledger()
        .export_to_path(&path, ExportLayout::ColumnPerRun)
        .unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(text.starts_with("Parameter,Run_1"));
}

#[test]
fn metrics_serialize_to_json() {
    let result = TeaEngine::new().compute(&InputParameters::default()).unwrap();
    let json = serde_json::to_string(&result).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(parsed["metrics"].get("npv_musd").is_some());
    assert!(parsed["series"]["periods"].as_array().unwrap().len() == 18);
    assert_eq!(parsed["sizing"]["total_wells"], 14);
}

#[test]
fn ledger_json_round_trip() {
    let mut ledger = RunLedger::new();
    let params = InputParameters::default();
    let metrics = TeaEngine::new().compute_metrics(&params).unwrap();
    ledger.record(params, metrics);

    let json = serde_json::to_string(&ledger).unwrap();
    let restored: RunLedger = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored.list()[0].id(), ledger.list()[0].id());
    assert_eq!(restored.list()[0].created_at(), ledger.list()[0].created_at());
    assert_eq!(restored.next_sequence(), 2);
}
