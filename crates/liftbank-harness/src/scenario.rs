//! Seeded scenarios.
//!
//! A scenario is a building plus a list of rider plans, generated from a
//! seed. Running it wires the reference strategies, the standard invariant
//! probe and a transcript into a fresh bank.

use liftbank_core::{
    BankConfig, BankError, ElevatorBank, Floor, RiderHandle, RunReport, SceneUpdate, Tick,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::{
    invariants::{InvariantProbe, InvariantViolation},
    strategies::{ScriptedRider, SweepController},
    transcript::Transcript,
};

/// Where one rider starts and where it must get off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiderPlan {
    /// Starting floor.
    pub floor: Floor,
    /// Floors to leave elevators at, in order.
    pub stops: Vec<Floor>,
}

/// A building and its riders.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Seed the plans were drawn from.
    pub seed: u64,
    /// Number of elevators.
    pub num_elevators: usize,
    /// Number of floors.
    pub num_floors: usize,
    /// One plan per rider.
    pub riders: Vec<RiderPlan>,
    /// Bank configuration.
    pub config: BankConfig,
}

/// What a scenario run produced.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    /// Engine summary.
    pub report: RunReport,
    /// Every scene update, in order.
    pub transcript: Vec<SceneUpdate>,
    /// Invariant violations with the tick they were seen at.
    pub violations: Vec<(Tick, InvariantViolation)>,
    /// Quiescent points checked.
    pub checks: u64,
    /// Floors each rider left elevators at.
    pub rider_floors: Vec<Vec<Floor>>,
}

impl Scenario {
    /// Scenario with explicit plans and the default configuration.
    pub fn new(num_elevators: usize, num_floors: usize, riders: Vec<RiderPlan>) -> Self {
        Self { seed: 0, num_elevators, num_floors, riders, config: BankConfig::default() }
    }

    /// Draw `num_riders` plans of up to `max_stops` stops each.
    ///
    /// Every stop differs from the floor before it. A single-floor building
    /// has nowhere to go, so its riders get no stops.
    pub fn random(
        seed: u64,
        num_elevators: usize,
        num_floors: usize,
        num_riders: usize,
        max_stops: usize,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let floors = num_floors.max(1);

        let riders = (0..num_riders)
            .map(|_| {
                let floor = rng.gen_range(0..floors);
                let count =
                    if floors < 2 || max_stops == 0 { 0 } else { rng.gen_range(1..=max_stops) };

                let mut previous = floor;
                let stops = (0..count)
                    .map(|_| {
                        let mut next = rng.gen_range(0..floors - 1);
                        if next >= previous {
                            next += 1;
                        }
                        previous = next;
                        next
                    })
                    .collect();
                RiderPlan { floor, stops }
            })
            .collect();

        Self { seed, num_elevators, num_floors, riders, config: BankConfig::default() }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: BankConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the scenario with the reference strategies.
    ///
    /// # Errors
    ///
    /// Whatever [`ElevatorBank`] reports for setup or the run itself.
    pub fn run(&self) -> Result<ScenarioOutcome, BankError> {
        let mut bank = ElevatorBank::new(self.config.clone());
        bank.init(self.num_elevators, self.num_floors, SweepController::new())?;

        let handles = self
            .riders
            .iter()
            .map(|plan| bank.add_rider(ScriptedRider::new(), plan.floor, plan.stops.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let probe = InvariantProbe::standard();
        bank.set_inspector(probe.clone().into_inspector())?;

        let transcript = Transcript::new();
        if self.config.allow_renderer {
            bank.enable_renderer(transcript.clone())?;
        }

        let report = bank.run()?;
        let violations = probe.violations();
        info!(
            seed = self.seed,
            final_tick = report.final_tick,
            checks = probe.checks(),
            violations = violations.len(),
            "scenario finished"
        );

        Ok(ScenarioOutcome {
            report,
            transcript: transcript.updates(),
            violations,
            checks: probe.checks(),
            rider_floors: handles.iter().map(RiderHandle::floors).collect(),
        })
    }
}
