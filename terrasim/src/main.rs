use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use terrasim::loader;
use terrasim_core::{ConsoleObserver, EventLogObserver, ObserverRegistry};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file (JSON)
    #[arg(long)]
    scenario: PathBuf,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 10)]
    ticks: u32,

    /// Random seed; overrides the scenario's rng_seed
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,

    /// Print a ledger summary every N ticks (0 disables)
    #[arg(long, default_value_t = 1)]
    summary_every: u32,

    /// Write scheduler events as JSONL to this path ("-" for stdout)
    #[arg(long)]
    event_log: Option<PathBuf>,

    /// Write the final state snapshot as JSON to this path ("-" for stdout)
    #[arg(long)]
    dump_state: Option<PathBuf>,

    /// Activate these events before the first tick (repeatable)
    #[arg(long = "trigger")]
    triggers: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp(None)
        .init();

    #[cfg(feature = "tracy")]
    terrasim_core::profiling::init_tracy(terrasim_core::profiling::TraceLevel::Info);

    log::info!("Starting terrasim...");

    let mut economy = loader::load_economy(&args.scenario, args.seed)?;
    log::info!("Initial date: {}", economy.date());

    for key in &args.triggers {
        let instance = economy
            .trigger_event(key)
            .with_context(|| format!("Failed to trigger event {key}"))?;
        log::info!("Triggered {}", instance);
    }

    let mut observers = ObserverRegistry::new();
    if args.summary_every > 0 {
        observers.register(Box::new(
            ConsoleObserver::new().with_frequency(args.summary_every),
        ));
    }
    if let Some(path) = &args.event_log {
        let observer = if path.as_os_str() == "-" {
            EventLogObserver::stdout()
        } else {
            EventLogObserver::file(path)
                .with_context(|| format!("Failed to create event log {}", path.display()))?
        };
        observers.register(Box::new(observer));
    }

    for _ in 0..args.ticks {
        let report = economy.advance();
        observers.notify(&economy, &report);
    }
    observers.shutdown();

    log::info!(
        "Simulation finished at {} after {} ticks",
        economy.date(),
        economy.tick()
    );

    if let Some(path) = &args.dump_state {
        let json = economy
            .snapshot()
            .to_json()
            .context("Failed to serialize state")?;
        if path.as_os_str() == "-" {
            println!("{json}");
        } else {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write state to {}", path.display()))?;
        }
    }

    Ok(())
}
