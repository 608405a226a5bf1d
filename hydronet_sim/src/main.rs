//! HydroNet sensor-field lifetime simulator CLI
//!
//! Runs the three clustering strategies over one seeded sensor layout and
//! reports lifetime and reconstruction-error comparisons.

use clap::Parser;
use hydronet_core::{round_statistics, SimulationConfig, SimulationRunner, StrategyKind};
use hydronet_sim::{Preset, RunExport};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// HydroNet sensor field lifetime simulator
#[derive(Parser, Debug)]
#[command(name = "hydronet-sim")]
#[command(about = "Compare clustering strategies over a simulated sensor field", long_about = None)]
struct Args {
    /// Master seed for the sensor layout (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Named preset (reference, small, dense, sparse, long_haul)
    #[arg(short, long, default_value = "reference")]
    preset: String,

    /// Override: number of sensors
    #[arg(long)]
    sensors: Option<usize>,

    /// Override: round budget
    #[arg(long)]
    rounds: Option<usize>,

    /// Override: desired cluster count
    #[arg(long)]
    clusters: Option<usize>,

    /// Override: reclustering interval in rounds
    #[arg(long)]
    interval: Option<usize>,

    /// Strategy to report on (kmeans, leach, info_kmeans, all)
    #[arg(short = 'S', long, default_value = "all")]
    strategy: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON summary output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export full run data to a JSON file for visualization
    #[arg(long)]
    export: Option<String>,

    /// Keep every Nth frame in the export
    #[arg(long, default_value = "1")]
    export_stride: usize,
}

fn build_config(args: &Args) -> Result<SimulationConfig, String> {
    let preset: Preset = args.preset.parse()?;
    let mut config = preset.config();
    if let Some(sensors) = args.sensors {
        config.sensor_count = sensors;
    }
    if let Some(rounds) = args.rounds {
        config.max_rounds = rounds;
    }
    if let Some(clusters) = args.clusters {
        config.cluster_count = clusters;
    }
    if let Some(interval) = args.interval {
        config.recluster_interval = interval;
    }
    Ok(config)
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    // Parse the reporting filter up front so typos fail fast.
    let report_kinds: Vec<StrategyKind> = if args.strategy == "all" {
        StrategyKind::all()
    } else {
        match args.strategy.parse() {
            Ok(kind) => vec![kind],
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Available strategies: kmeans, leach, info_kmeans, all");
                std::process::exit(1);
            }
        }
    };

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    let runner = match SimulationRunner::new(config.clone()) {
        Ok(runner) => runner.with_seed(seed),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if !args.json {
        info!("HydroNet field simulator v0.1.0");
        info!(
            "preset={} seed={} sensors={} rounds={} clusters={}",
            args.preset, seed, config.sensor_count, config.max_rounds, config.cluster_count
        );
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let run = runner.run();

    if !args.json {
        for kind in &report_kinds {
            let Some(strategy) = run.strategy(*kind) else {
                continue;
            };
            let final_alive = strategy
                .total_rounds
                .checked_sub(1)
                .and_then(|last| round_statistics(strategy, last))
                .map_or(0, |s| s.alive);
            info!(
                "{:<12} lifetime={:<4} rounds={:<4} final_alive={:<3} mean_error={:.4}",
                kind.name(),
                strategy.lifetime,
                strategy.total_rounds,
                final_alive,
                strategy.mean_error()
            );
            if let Some(stats) = strategy.sleep_stats {
                info!(
                    "{:<12} avg_active={:.1} energy_saved={:.1}",
                    "", stats.avg_active, stats.energy_saved
                );
            }
        }

        let best = run
            .strategies
            .iter()
            .max_by_key(|s| s.lifetime)
            .map(|s| s.kind.name())
            .unwrap_or("none");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("longest-lived strategy: {}", best);
    } else {
        let summary = serde_json::json!({
            "seed": seed,
            "preset": args.preset,
            "strategies": report_kinds.iter().filter_map(|kind| {
                run.strategy(*kind).map(|s| serde_json::json!({
                    "strategy": kind.name(),
                    "lifetime": s.lifetime,
                    "total_rounds": s.total_rounds,
                    "mean_error": s.mean_error(),
                    "error_horizon": s.error_series.len(),
                }))
            }).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_default()
        );
    }

    if let Some(path) = &args.export {
        let export = RunExport::from_run(&run, &config, args.export_stride);
        match export.write_to_file(path) {
            Ok(()) => info!("exported {} strategies to {}", export.strategies.len(), path),
            Err(e) => {
                error!("failed to write export: {}", e);
                std::process::exit(1);
            }
        }
    }
}
