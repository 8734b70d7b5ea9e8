//! Base-case run and a few what-if variations.
//!
//! Runs the DualWell base case, then a cheaper-capital and a
//! higher-price variant in the same session, prints the run history and
//! the CSV export.

use dualwell_tea::prelude::*;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  dualwell-tea: Base Case Example         ║");
    println!("╚══════════════════════════════════════════╝\n");

    let engine = TeaEngine::new();
    let base = InputParameters::default();

    // --- Base case in detail ---
    println!("━━━ Base Case ━━━\n");
    let result = match engine.compute(&base) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("base case rejected: {}", e);
            return;
        }
    };
    println!("{}", result);
    println!("{}", result.series());

    // --- Variations recorded in one session ---
    println!("━━━ Variations ━━━\n");
    let mut session = Session::with_engine(engine);

    let mut cheap_capital = base.clone();
    cheap_capital.financial.discount_rate = 0.05;

    let mut high_price = base.clone();
    high_price.financial.power_price_usd_mwh = 150.0;

    for params in [base, cheap_capital, high_price] {
        if let Err(e) = session.run(params) {
            eprintln!("run rejected: {}", e);
        }
    }
    println!("{}", session.ledger());

    // --- Export ---
    println!("━━━ CSV Export (one column per run) ━━━\n");
    match session.ledger().export(ExportLayout::ColumnPerRun) {
        Ok(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
        Err(e) => eprintln!("export failed: {}", e),
    }
}
