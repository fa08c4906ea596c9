//! adx-demand CLI
//!
//! Run demand experiments from the command line.
//!
//! # Usage
//!
//! ```bash
//! # One trial with the default market
//! adx-demand run --seed 42
//!
//! # 50 trials in parallel, JSON report
//! adx-demand run --config market.json --trials 50 --parallel --format json
//!
//! # Print a generated campaign schedule
//! adx-demand generate --seed 7
//! ```
//!
//! Set `RUST_LOG=debug` for per-network build and solve logs.

use adx_demand::analysis::stats::{CompetitivenessThresholds, ExperimentSummary, TrialStats};
use adx_demand::core::config::SimulationConfig;
use adx_demand::graph::flow_network::SolvedNetwork;
use adx_demand::graph::matrix::Capacity;
use adx_demand::simulation::experiment::{Experiment, ExperimentReport, TrialOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::process;

fn print_usage() {
    eprintln!(
        r#"adx-demand: campaign demand analysis for simulated ad-exchange markets

USAGE:
    adx-demand <COMMAND> [OPTIONS]

COMMANDS:
    run         Generate campaigns, solve the flow networks and report unmet demand
    generate    Print one generated campaign schedule as JSON
    config      Print the default configuration as JSON
    help        Show this message

OPTIONS (run, generate):
    --config <FILE>     JSON configuration (default: built-in market)
    --seed <N>          Master seed (default: from OS entropy)

OPTIONS (run):
    --trials <N>        Number of trials (overrides the configuration)
    --daily             Also solve every daily network
    --parallel          Run trials on all cores
    --format <FORMAT>   Output format: text (default) or json

EXAMPLES:
    adx-demand run --seed 42
    adx-demand run --trials 100 --parallel
    adx-demand run --config market.json --daily --format json
    adx-demand generate --seed 7
    adx-demand config > market.json"#
    );
}

/// JSON output schema for an experiment.
#[derive(Serialize)]
struct ReportOutput {
    started_at: DateTime<Utc>,
    master_seed: Option<u64>,
    competitive: bool,
    summary: ExperimentSummary,
    trials: Vec<TrialOutput>,
}

#[derive(Serialize)]
struct TrialOutput {
    index: usize,
    seed: u64,
    stats: TrialStats,
    multi_day: NetworkOutput,
    daily: Vec<NetworkOutput>,
}

#[derive(Serialize)]
struct NetworkOutput {
    labels: Vec<String>,
    capacity: Vec<Vec<Capacity>>,
    flow: Vec<Vec<Capacity>>,
    unused: Vec<Vec<Capacity>>,
    total_flow: Capacity,
    wasted_supply: Capacity,
    unmet_reach: Capacity,
}

impl NetworkOutput {
    fn new(solved: &SolvedNetwork, wasted_supply: Capacity, unmet_reach: Capacity) -> Self {
        let network = solved.network();
        Self {
            labels: network.labels().into_iter().map(String::from).collect(),
            capacity: network.capacity().to_rows(),
            flow: solved.flow().to_rows(),
            unused: solved.unused_flow().to_rows(),
            total_flow: solved.solution().total_flow(),
            wasted_supply,
            unmet_reach,
        }
    }
}

impl TrialOutput {
    fn new(trial: &TrialOutcome) -> Self {
        Self {
            index: trial.index,
            seed: trial.seed,
            stats: trial.stats.clone(),
            multi_day: NetworkOutput::new(
                &trial.multi_day,
                trial.analysis.wasted_supply(),
                trial.analysis.unmet_reach(),
            ),
            daily: trial
                .daily
                .iter()
                .map(|d| {
                    NetworkOutput::new(
                        &d.network,
                        d.analysis.wasted_supply(),
                        d.analysis.unmet_reach(),
                    )
                })
                .collect(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    args.get(i)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            eprintln!("{} requires a number", flag);
            process::exit(1);
        })
}

fn load_config(path: Option<&str>) -> SimulationConfig {
    match path {
        Some(path) => SimulationConfig::from_path(path).unwrap_or_else(|e| {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }),
        None => SimulationConfig::default(),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing output: {}", e);
        process::exit(1);
    })
}

fn cmd_run(args: &[String]) {
    let mut config_path: Option<String> = None;
    let mut trials: Option<usize> = None;
    let mut seed: Option<u64> = None;
    let mut daily = false;
    let mut parallel = false;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--config requires a file path");
                    process::exit(1);
                }));
            }
            "--trials" => {
                i += 1;
                trials = Some(parse_number(args, i, "--trials"));
            }
            "--seed" => {
                i += 1;
                seed = Some(parse_number(args, i, "--seed"));
            }
            "--daily" => daily = true,
            "--parallel" => parallel = true,
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = load_config(config_path.as_deref());
    if let Some(trials) = trials {
        config.trials = trials;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    config.daily_flows |= daily;

    let experiment = Experiment::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    let result = if parallel {
        experiment.run_parallel()
    } else {
        experiment.run()
    };
    let report = result.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    if format == "json" {
        println!("{}", to_json(&report_output(&report)));
    } else {
        print_text_report(&report);
    }
}

fn report_output(report: &ExperimentReport) -> ReportOutput {
    ReportOutput {
        started_at: report.started_at,
        master_seed: report.master_seed,
        competitive: report
            .summary
            .is_competitive(&CompetitivenessThresholds::default()),
        summary: report.summary.clone(),
        trials: report.trials.iter().map(TrialOutput::new).collect(),
    }
}

fn print_text_report(report: &ExperimentReport) {
    println!("Started: {}", report.started_at.to_rfc3339());
    if let Some(seed) = report.master_seed {
        println!("Seed:    {}", seed);
    }
    println!();

    // per-trial detail is only readable for a handful of trials
    if report.trials.len() == 1 {
        let trial = &report.trials[0];
        for day in &trial.daily {
            println!(
                "Day {:>3}: flow {:>6}, wasted {:>6}, unmet {:>6}",
                day.day,
                day.network.solution().total_flow(),
                day.analysis.wasted_supply(),
                day.analysis.unmet_reach()
            );
        }
        if !trial.daily.is_empty() {
            println!();
        }
        println!("{}", trial.analysis);
    }

    println!("{}", report.summary);
    let competitive = report
        .summary
        .is_competitive(&CompetitivenessThresholds::default());
    println!(
        "Competitive:             {}",
        if competitive { "yes" } else { "no" }
    );
}

fn cmd_generate(args: &[String]) {
    let mut config_path: Option<String> = None;
    let mut seed: Option<u64> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--config requires a file path");
                    process::exit(1);
                }));
            }
            "--seed" => {
                i += 1;
                seed = Some(parse_number(args, i, "--seed"));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = load_config(config_path.as_deref());
    if seed.is_some() {
        config.seed = seed;
    }
    config.trials = 1;

    let experiment = Experiment::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    let trial_seed = experiment.trial_seeds()[0];
    let schedule = experiment.generate_schedule(trial_seed);

    println!("{}", to_json(&schedule));
    eprintln!(
        "Generated {} campaigns over {} days ({:.2} active/day)",
        schedule.len(),
        schedule.num_days(),
        schedule.average_campaigns_per_day()
    );
}

fn cmd_config() {
    println!("{}", to_json(&SimulationConfig::default()));
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "run" => cmd_run(rest),
        "generate" => cmd_generate(rest),
        "config" => cmd_config(),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
