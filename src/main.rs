//! dualwell-tea CLI
//!
//! Run the technoeconomic model from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Base case
//! dualwell-tea run
//!
//! # Override individual fields, JSON output
//! dualwell-tea run --set power_price_usd_mwh=120 --set capex_schedule=upfront --format json
//!
//! # Run a file of scenarios and export the history
//! dualwell-tea batch --input scenarios.json --export TEA_Runs.csv --layout columns
//!
//! # Sensitivity to one field
//! dualwell-tea sweep --field discount_rate --from 0.04 --to 0.12 --steps 5
//! ```

use dualwell_tea::core::fields::FIELDS;
use dualwell_tea::core::params::{reinvestment_label, InputParameters};
use dualwell_tea::finance::engine::TeaEngine;
use dualwell_tea::history::export::ExportLayout;
use dualwell_tea::session::Session;
use dualwell_tea::simulation::scenarios::{generate_random_scenarios, ScenarioConfig};
use dualwell_tea::simulation::sensitivity::{linspace, sweep};
use std::fs;
use std::path::Path;
use std::process;

fn print_usage() {
    eprintln!(
        r#"dualwell-tea — technoeconomic analysis for geothermal / CO2 sequestration

USAGE:
    dualwell-tea <COMMAND> [OPTIONS]

COMMANDS:
    run         Compute LCOE, NPV, IRR for one parameter set
    batch       Run every scenario in a file and show the run history
    sweep       Vary one field and report the metrics at each value
    fields      List input fields with defaults and valid ranges
    generate    Generate random valid scenarios (for testing)
    help        Show this message

OPTIONS (run, sweep):
    --input <FILE>        JSON parameter file (missing fields use the base case)
    --set <NAME=VALUE>    Override one field; repeatable
    --format <FORMAT>     Output format: text (default) or json
    --series              Also print the yearly cash-flow series (run)

OPTIONS (batch):
    --input <FILE>        JSON file: {{ "scenarios": [ {{...}}, ... ] }}
    --export <FILE>       Write the run history as CSV
    --layout <LAYOUT>     CSV layout: rows (default) or columns

OPTIONS (sweep):
    --field <NAME>        Field to vary
    --from <X> --to <Y>   Sweep bounds
    --steps <N>           Number of points (default: 5)

OPTIONS (generate):
    --count <N>           Number of scenarios (default: 10)
    --seed <N>            Seed for reproducible output
    --output <FILE>       Write to file instead of stdout

Set RUST_LOG=info or RUST_LOG=debug for diagnostic logging."#
    );
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(format!("serializing output: {}", e)))
}

/// JSON schema for batch input.
#[derive(serde::Deserialize)]
struct ScenarioFile {
    scenarios: Vec<InputParameters>,
}

#[derive(serde::Serialize)]
struct ScenarioFileOut<'a> {
    scenarios: &'a [InputParameters],
}

fn load_parameters(path: &str) -> InputParameters {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));
    serde_json::from_str(&content).unwrap_or_else(|e| fail(format!("parsing '{}': {}", path, e)))
}

fn load_scenarios(path: &str) -> Vec<InputParameters> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));
    let file: ScenarioFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "scenarios": [
    {{ "financial": {{ "power_price_usd_mwh": 95.4 }} }},
    {{ "financial": {{ "power_price_usd_mwh": 120.0 }} }}
  ]
}}"#
        );
        process::exit(1);
    });
    file.scenarios
}

/// Parsed options shared by the subcommands.
#[derive(Default)]
struct Options {
    input: Option<String>,
    sets: Vec<(String, String)>,
    json: bool,
    series: bool,
    export: Option<String>,
    layout: ExportLayout,
    field: Option<String>,
    from: Option<f64>,
    to: Option<f64>,
    steps: usize,
    count: usize,
    seed: Option<u64>,
    output: Option<String>,
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    value
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| fail(format!("{} requires a number", flag)))
}

fn parse_options(args: &[String]) -> Options {
    let mut opts = Options {
        steps: 5,
        count: 10,
        ..Default::default()
    };
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        let value = args.get(i);
        let require = || {
            value
                .cloned()
                .unwrap_or_else(|| fail(format!("{} requires a value", flag)))
        };
        match flag {
            "--input" => opts.input = Some(require()),
            "--set" => {
                let pair = require();
                let (name, val) = pair
                    .split_once('=')
                    .unwrap_or_else(|| fail(format!("--set expects NAME=VALUE, got '{}'", pair)));
                opts.sets.push((name.trim().to_string(), val.trim().to_string()));
            }
            "--format" => match require().as_str() {
                "text" => opts.json = false,
                "json" => opts.json = true,
                other => fail(format!("--format requires 'text' or 'json', got '{}'", other)),
            },
            "--series" => {
                opts.series = true;
                continue;
            }
            "--export" => opts.export = Some(require()),
            "--layout" => opts.layout = require().parse().unwrap_or_else(|e: String| fail(e)),
            "--field" => opts.field = Some(require()),
            "--from" => opts.from = Some(parse_number(flag, value)),
            "--to" => opts.to = Some(parse_number(flag, value)),
            "--steps" => opts.steps = parse_number(flag, value),
            "--count" => opts.count = parse_number(flag, value),
            "--seed" => opts.seed = Some(parse_number(flag, value)),
            "--output" => opts.output = Some(require()),
            _ => fail(format!("unknown option: {}", flag)),
        }
        i += 1;
    }
    opts
}

/// Base case or `--input`, with `--set` overrides applied.
fn resolve_parameters(opts: &Options) -> InputParameters {
    let mut params = match &opts.input {
        Some(path) => load_parameters(path),
        None => InputParameters::default(),
    };
    for (name, value) in &opts.sets {
        params.set(name, value).unwrap_or_else(|e| fail(e));
    }
    params
}

fn cmd_run(args: &[String]) {
    let opts = parse_options(args);
    let params = resolve_parameters(&opts);
    let mut session = Session::new();
    let (_, result) = session.run_detailed(params).unwrap_or_else(|e| fail(e));

    if opts.json {
        println!("{}", to_json(&result));
    } else {
        println!("{}", result);
        if opts.series {
            println!("{}", result.series());
        }
    }
}

fn cmd_batch(args: &[String]) {
    let opts = parse_options(args);
    let path = opts
        .input
        .as_deref()
        .unwrap_or_else(|| fail("--input <FILE> is required"));

    let mut session = Session::new();
    for (i, params) in load_scenarios(path).into_iter().enumerate() {
        // A bad scenario is reported and skipped; the rest still run
        if let Err(e) = session.run(params) {
            eprintln!("Scenario {} rejected: {}", i + 1, e);
        }
    }

    if opts.json {
        println!("{}", to_json(&session.ledger().list()));
    } else {
        println!("{}", session.ledger());
    }

    if let Some(export_path) = &opts.export {
        session
            .ledger()
            .export_to_path(Path::new(export_path), opts.layout)
            .unwrap_or_else(|e| fail(e));
        eprintln!("Exported {} runs → {}", session.ledger().len(), export_path);
    }
}

fn cmd_sweep(args: &[String]) {
    let opts = parse_options(args);
    let field = opts
        .field
        .as_deref()
        .unwrap_or_else(|| fail("--field <NAME> is required"));
    let (from, to) = match (opts.from, opts.to) {
        (Some(from), Some(to)) => (from, to),
        _ => fail("--from and --to are required"),
    };
    let params = resolve_parameters(&opts);
    let points = sweep(&TeaEngine::new(), &params, field, &linspace(from, to, opts.steps))
        .unwrap_or_else(|e| fail(e));

    if opts.json {
        println!("{}", to_json(&points));
        return;
    }

    println!("Sensitivity of metrics to {}", field);
    println!(
        "{:>14} {:>14} {:>12} {:>10}",
        field, "LCOE $/MWh", "NPV $M", "IRR %"
    );
    for p in &points {
        println!(
            "{:>14.4} {:>14} {:>12.2} {:>10}",
            p.value,
            p.metrics
                .lcoe_usd_mwh
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "N/A".to_string()),
            p.metrics.npv_musd,
            p.metrics
                .irr_percent()
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "N/A".to_string()),
        );
    }
}

fn cmd_fields() {
    let defaults = InputParameters::default();
    let mut group = None;
    for field in FIELDS {
        if group != Some(field.group) {
            println!("\n{}", field.group);
            group = Some(field.group);
        }
        println!(
            "  {:<32} {:<40} default {:>10.4}  range {}",
            field.name,
            field.header(),
            field.get(&defaults),
            field.range
        );
    }
    println!("\nEnumerated");
    println!(
        "  {:<32} default {:<12} forms: upfront | even:<years> | custom:<a>/<b>/...",
        "capex_schedule",
        defaults.financial.capex_schedule.to_string()
    );
    println!(
        "  {:<32} default {:<12} forms: dual_well | nameplate:<mwh>",
        "output_basis",
        defaults.operations.output_basis.to_string()
    );
    println!(
        "  {:<32} default {:<12} forms: none | <every_years>:<capex_fraction>",
        "reinvestment",
        reinvestment_label(&defaults.financial.reinvestment)
    );
}

fn cmd_generate(args: &[String]) {
    let opts = parse_options(args);
    let config = ScenarioConfig {
        count: opts.count,
        seed: opts.seed,
        ..Default::default()
    };
    let scenarios = generate_random_scenarios(&config);
    let json = to_json(&ScenarioFileOut {
        scenarios: &scenarios,
    });

    if let Some(path) = opts.output {
        fs::write(&path, &json).unwrap_or_else(|e| fail(format!("writing to '{}': {}", path, e)));
        eprintln!("Generated {} scenarios → {}", scenarios.len(), path);
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "run" => cmd_run(rest),
        "batch" => cmd_batch(rest),
        "sweep" => cmd_sweep(rest),
        "fields" => cmd_fields(),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
