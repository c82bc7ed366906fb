//! Liftbank simulator binary.
//!
//! # Usage
//!
//! ```bash
//! # Two cars, ten floors, twenty riders
//! liftbank-sim --elevators 2 --floors 10 --riders 20 --seed 7
//!
//! # Log every scene update
//! liftbank-sim --render --log-level debug
//! ```

use clap::Parser;
use liftbank_core::{BankConfig, DEFAULT_CAPACITY, DEFAULT_TICKS_PER_FLOOR};
use liftbank_harness::Scenario;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Elevator bank simulator
#[derive(Parser, Debug)]
#[command(name = "liftbank-sim")]
#[command(about = "Run a seeded elevator bank scenario")]
#[command(version)]
struct Args {
    /// Number of elevators
    #[arg(short, long, default_value = "2")]
    elevators: usize,

    /// Number of floors
    #[arg(short, long, default_value = "8")]
    floors: usize,

    /// Number of riders
    #[arg(short, long, default_value = "10")]
    riders: usize,

    /// Maximum stops per rider
    #[arg(long, default_value = "3")]
    stops: usize,

    /// Scenario seed
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Riders an elevator holds
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Virtual ticks to travel one floor
    #[arg(long, default_value_t = DEFAULT_TICKS_PER_FLOOR)]
    ticks_per_floor: u64,

    /// Record and log every scene update
    #[arg(long)]
    render: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = BankConfig::default()
        .with_capacity(args.capacity)
        .with_ticks_per_floor(args.ticks_per_floor)
        .with_renderer_allowed(args.render);
    let scenario =
        Scenario::random(args.seed, args.elevators, args.floors, args.riders, args.stops)
            .with_config(config);

    tracing::info!(
        seed = args.seed,
        elevators = args.elevators,
        floors = args.floors,
        riders = scenario.riders.len(),
        "starting scenario"
    );
    for (rider, plan) in scenario.riders.iter().enumerate() {
        tracing::debug!(rider, floor = plan.floor, stops = ?plan.stops, "rider plan");
    }

    let outcome = scenario.run()?;

    for update in &outcome.transcript {
        tracing::info!(?update, "scene");
    }
    tracing::info!(
        final_tick = outcome.report.final_tick,
        wakeups = outcome.report.wakeups,
        rider_events = outcome.report.rider_events,
        controller_events = outcome.report.controller_events,
        checks = outcome.checks,
        "scenario complete"
    );

    if !outcome.violations.is_empty() {
        for (tick, violation) in &outcome.violations {
            tracing::error!(tick, %violation, "invariant violated");
        }
        return Err(format!("{} invariant violations", outcome.violations.len()).into());
    }

    Ok(())
}
