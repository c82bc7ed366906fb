//! Fuzz target for whole runs
//!
//! Build a small building from fuzzer input and run it with the reference
//! strategies.
//!
//! # Invariants
//!
//! - Every run completes; no stall, no violation
//! - Each rider leaves elevators exactly at its stops
//! - Standard invariants hold at every quiescent point

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use liftbank_core::BankConfig;
use liftbank_harness::Scenario;

#[derive(Debug, Arbitrary)]
struct Building {
    seed: u64,
    elevators: u8,
    floors: u8,
    riders: u8,
    stops: u8,
    capacity: u8,
}

fuzz_target!(|building: Building| {
    let config = BankConfig::default()
        .with_ticks_per_floor(25)
        .with_capacity(usize::from(building.capacity % 4) + 1);
    let scenario = Scenario::random(
        building.seed,
        usize::from(building.elevators % 3) + 1,
        usize::from(building.floors % 10) + 1,
        usize::from(building.riders % 12),
        usize::from(building.stops % 4),
    )
    .with_config(config);

    let outcome = match scenario.run() {
        Ok(outcome) => outcome,
        Err(error) => panic!("scenario {building:?} failed: {error}"),
    };
    assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);

    let expected: Vec<_> = scenario.riders.iter().map(|plan| plan.stops.clone()).collect();
    assert_eq!(outcome.rider_floors, expected);
});
