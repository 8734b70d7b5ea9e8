//! Sensitivity of LCOE, NPV and IRR to the power price.

use dualwell_tea::prelude::*;
use dualwell_tea::simulation::sensitivity::{linspace, sweep};

fn main() {
    println!("━━━ Power Price Sensitivity ━━━\n");

    let points = match sweep(
        &TeaEngine::new(),
        &InputParameters::default(),
        "power_price_usd_mwh",
        &linspace(40.0, 200.0, 9),
    ) {
        Ok(points) => points,
        Err(e) => {
            eprintln!("sweep failed: {}", e);
            return;
        }
    };

    println!("{:>12} {:>12} {:>10}", "$/MWh", "NPV $M", "IRR %");
    for p in &points {
        let irr = p
            .metrics
            .irr_percent()
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "N/A".to_string());
        println!("{:>12.1} {:>12.2} {:>10}", p.value, p.metrics.npv_musd, irr);
    }

    // LCOE does not depend on the power price: it is the break-even price.
    if let Some(lcoe) = points.first().and_then(|p| p.metrics.lcoe_usd_mwh) {
        println!("\nBreak-even power price (LCOE): ${:.2}/MWh", lcoe);
    }
}
