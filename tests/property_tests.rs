use dualwell_tea::core::params::{CapexSchedule, InputParameters, OutputBasis};
use dualwell_tea::finance::engine::TeaEngine;
use dualwell_tea::finance::irr::npv;
use dualwell_tea::history::export::ExportLayout;
use dualwell_tea::session::Session;
use proptest::prelude::*;

/// A valid parameter set drawn from the interior of the documented ranges.
fn arb_params() -> impl Strategy<Value = InputParameters> {
    (
        (0.0..5.0f64, 0.005..1.0f64, 0.2..5.0f64, 0.0..300.0f64, 0.0..200.0f64, 0.0..200.0f64),
        (0.0..0.5f64, 0.0..1000.0f64, 0.0..50.0f64, 0.0..500.0f64, 1u32..40),
        (0.1..1.0f64, 0.05..0.5f64, 0.1..2.0f64, 0.0..100.0f64, 0.0..50.0f64, 0.0..0.1f64),
        0u32..40,
        prop::option::of(1u32..6),
    )
        .prop_map(|(co2, fin, ops, credit_years, phasing)| {
            let mut p = InputParameters::default();
            p.co2.captured_and_stored_mtpa = co2.0;
            p.co2.percent_sequestered = co2.1;
            p.co2.co2_water_ratio = co2.2;
            p.co2.co2_cost_per_tonne = co2.3;
            p.co2.carbon_price_above_45q = co2.4;
            p.co2.tax_credit_45q_per_tonne = co2.5;
            p.co2.tax_credit_duration_years = credit_years;
            p.financial.discount_rate = fin.0;
            p.financial.sco2_capex_musd = fin.1;
            p.financial.geo_capex_per_well_musd = fin.2;
            p.financial.power_price_usd_mwh = fin.3;
            p.financial.operating_life_years = fin.4;
            p.financial.capex_schedule = match phasing {
                Some(years) => CapexSchedule::EvenlyPhased { years },
                None => CapexSchedule::Upfront,
            };
            p.operations.capacity_factor = ops.0;
            p.operations.thermal_efficiency = ops.1;
            p.operations.thermal_extraction_mwt_per_kgs = ops.2;
            p.operations.annual_opex_musd = ops.3;
            p.operations.variable_opex_usd_mwh = ops.4;
            p.operations.degradation_rate = ops.5;
            p
        })
}

/// A project with no carbon credits, so every cost is a plain cost.
fn arb_cost_only_params() -> impl Strategy<Value = InputParameters> {
    (arb_params(), prop::option::of(1.0..1e6f64)).prop_map(|(mut p, nameplate)| {
        p.co2.tax_credit_45q_per_tonne = 0.0;
        p.co2.carbon_price_above_45q = 0.0;
        if let Some(annual_output_mwh) = nameplate {
            p.operations.output_basis = OutputBasis::Nameplate { annual_output_mwh };
        }
        p
    })
}

/// All capex at t = 0 and no operating costs, so every later net flow is
/// non-negative.
fn arb_conventional_params() -> impl Strategy<Value = InputParameters> {
    arb_params().prop_map(|mut p| {
        p.financial.capex_schedule = CapexSchedule::Upfront;
        p.co2.co2_cost_per_tonne = 0.0;
        p.operations.annual_opex_musd = 0.0;
        p.operations.variable_opex_usd_mwh = 0.0;
        p
    })
}

proptest! {
    // ===================================================================
    // The engine is a pure function: identical inputs, identical outputs.
    // ===================================================================
    #[test]
    fn compute_is_deterministic(params in arb_params()) {
        let engine = TeaEngine::new();
        let a = engine.compute(&params).unwrap();
        let b = engine.compute(&params).unwrap();
        prop_assert_eq!(a.metrics().npv_musd.to_bits(), b.metrics().npv_musd.to_bits());
        prop_assert_eq!(a.metrics().lcoe_usd_mwh.map(f64::to_bits), b.metrics().lcoe_usd_mwh.map(f64::to_bits));
        prop_assert_eq!(a.metrics().irr.map(f64::to_bits), b.metrics().irr.map(f64::to_bits));
    }

    // ===================================================================
    // NPV evaluated at the IRR is zero, relative to the size of the
    // discounted flows.
    // ===================================================================
    #[test]
    fn npv_at_irr_is_zero(params in arb_params()) {
        let result = TeaEngine::new().compute(&params).unwrap();
        if let Some(irr) = result.metrics().irr {
            let flows = result.series().net_flows();
            let scale: f64 = flows
                .iter()
                .enumerate()
                .map(|(t, f)| f.abs() / (1.0 + irr).powi(t as i32))
                .sum();
            let residual = npv(irr, &flows);
            prop_assert!(
                residual.abs() <= 1e-6 * scale.max(1e-12),
                "NPV at IRR {} is {} (scale {})", irr, residual, scale
            );
        }
    }

    // ===================================================================
    // LCOE is non-negative when all costs are non-negative and something
    // is generated.
    // ===================================================================
    #[test]
    fn lcoe_non_negative(params in arb_cost_only_params()) {
        let metrics = TeaEngine::new().compute_metrics(&params).unwrap();
        if let Some(lcoe) = metrics.lcoe_usd_mwh {
            prop_assert!(lcoe >= 0.0, "LCOE {} must be >= 0", lcoe);
        }
    }

    // ===================================================================
    // Series length is construction periods plus operating life.
    // ===================================================================
    #[test]
    fn series_length_matches_horizon(params in arb_params()) {
        let result = TeaEngine::new().compute(&params).unwrap();
        prop_assert_eq!(result.series().len() as u32, params.horizon_years());
    }

    // ===================================================================
    // More revenue per MWh never lowers NPV.
    // ===================================================================
    #[test]
    fn npv_monotonic_in_power_price(params in arb_params(), bump in 1.0..100.0f64) {
        let engine = TeaEngine::new();
        let low = engine.compute_metrics(&params).unwrap();
        let mut higher = params.clone();
        higher.financial.power_price_usd_mwh = (params.financial.power_price_usd_mwh + bump).min(1000.0);
        let high = engine.compute_metrics(&higher).unwrap();
        prop_assert!(high.npv_musd >= low.npv_musd);
    }

    // ===================================================================
    // For a conventional project (outlay first, inflows after) a higher
    // discount rate strictly lowers NPV.
    // ===================================================================
    #[test]
    fn npv_decreasing_in_discount_rate(params in arb_conventional_params(), delta in 0.01..0.4f64) {
        let engine = TeaEngine::new();
        let low = engine.compute(&params).unwrap();
        let flows = low.series().net_flows();
        let inflows: f64 = flows[1..].iter().sum();
        prop_assume!(flows[1..].iter().all(|f| *f >= 0.0));
        prop_assume!(inflows > 1e-3 * (1.0 + flows[0].abs()));

        let mut higher = params.clone();
        higher.financial.discount_rate = params.financial.discount_rate + delta;
        let high = engine.compute_metrics(&higher).unwrap();
        prop_assert!(
            high.npv_musd < low.metrics().npv_musd,
            "NPV {} at {} vs {} at {}",
            high.npv_musd, higher.financial.discount_rate,
            low.metrics().npv_musd, params.financial.discount_rate
        );
    }

    // ===================================================================
    // N runs give N records in call order; clear empties the ledger;
    // the export has one data row per record.
    // ===================================================================
    #[test]
    fn ledger_tracks_runs(batch in prop::collection::vec(arb_params(), 0..8)) {
        let mut session = Session::new();
        for params in &batch {
            session.run(params.clone()).unwrap();
        }
        prop_assert_eq!(session.ledger().len(), batch.len());
        for (record, params) in session.ledger().iter().zip(&batch) {
            prop_assert_eq!(record.inputs(), params);
        }

        let bytes = session.ledger().export(ExportLayout::RowPerRun).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        prop_assert_eq!(text.lines().count(), batch.len() + 1);

        session.clear();
        prop_assert!(session.ledger().list().is_empty());
    }
}
