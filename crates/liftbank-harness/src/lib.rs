//! Deterministic simulation harness for liftbank testing.
//!
//! Reference strategies, seeded scenarios and behavioural checks for the
//! engine in `liftbank-core`. Everything here is deterministic: a scenario
//! seed fully determines the run.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation of the elevator
//! state machine. Operations are applied to both the model and the real
//! [`liftbank_core::Elevator`], and their observable states are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold at every
//! quiescent point of a run. Use [`InvariantRegistry::standard()`] for the
//! physical and locus invariants, and [`InvariantProbe`] to check them while
//! a bank runs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod model;
pub mod scenario;
pub mod strategies;
pub mod transcript;

pub use invariants::{
    BankSnapshot, DoorsClosedWhileMoving, ElevatorSnapshot, FloorsInRange, Invariant,
    InvariantProbe, InvariantRegistry, InvariantResult, InvariantViolation,
    OccupancyWithinCapacity, OccupantsFollowElevator, RiderSnapshot, SingleLocus,
};
pub use model::{
    ElevatorOp, ElevatorUnderTest, MODEL_CAPACITY, MODEL_FLOORS, MODEL_TICKS_PER_FLOOR,
    ModelDirection, ModelElevator, ObservableElevator, OpOutcome,
};
pub use scenario::{RiderPlan, Scenario, ScenarioOutcome};
pub use strategies::{DEFAULT_DWELL, ScriptedRider, SweepController};
pub use transcript::Transcript;
