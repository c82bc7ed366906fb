//! Error types for the elevator bank.
//!
//! Two tiers, kept apart in the type system:
//!
//! - [`Refusal`]: predictable outcomes a strategy must handle (pressing a
//!   button that is already being served, moving to the current floor,
//!   redirecting past a committed direction). Ordinary control flow.
//! - [`Violation`]: calls that are impossible if the caller respects the
//!   facade contract. The first violation poisons the run; the engine never
//!   absorbs one silently.
//!
//! Facade operations return [`ControlError`], which carries either tier.
//! Setup and run operations return [`BankError`].

use thiserror::Error;

use crate::{
    bank::BankState,
    types::{Direction, ElevatorId, Floor, RiderId, Tick},
};

/// Predictable refusal of a facade operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Stationary elevator asked to move to the floor it is on
    #[error("elevator is already at floor {floor}")]
    AlreadyAtFloor {
        /// Current floor
        floor: Floor,
    },

    /// Moving elevator asked to reverse past its current position
    #[error("cannot redirect to floor {target}: heading {heading} from floor {floor}")]
    WouldReverse {
        /// Last floor reached
        floor: Floor,
        /// Requested destination
        target: Floor,
        /// Committed direction of travel
        heading: Direction,
    },

    /// Doors must be open to board or leave
    #[error("doors are closed")]
    DoorsClosed,

    /// Elevator is between floors
    #[error("elevator is moving")]
    Moving,

    /// Elevator is at a different floor than the rider claims
    #[error("elevator is at floor {elevator_floor}, not floor {floor}")]
    WrongFloor {
        /// Floor the elevator is at
        elevator_floor: Floor,
        /// Floor given by the caller
        floor: Floor,
    },

    /// Elevator holds as many riders as it can
    #[error("elevator is full ({capacity} riders)")]
    Full {
        /// Configured capacity
        capacity: usize,
    },

    /// An elevator already serves this call with its doors open
    #[error("an elevator is already open at floor {floor}")]
    AlreadyServed {
        /// Floor of the redundant call
        floor: Floor,
    },
}

/// Invariant violation: a defect in a strategy or in the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// `open_doors` on open doors
    #[error("elevator {elevator}: doors already open")]
    DoorsAlreadyOpen {
        /// Elevator index
        elevator: ElevatorId,
    },

    /// `close_doors` on closed doors
    #[error("elevator {elevator}: doors already closed")]
    DoorsAlreadyClosed {
        /// Elevator index
        elevator: ElevatorId,
    },

    /// `open_doors` while travelling
    #[error("elevator {elevator}: cannot open doors while moving")]
    OpenWhileMoving {
        /// Elevator index
        elevator: ElevatorId,
    },

    /// `move_to` while the doors are open
    #[error("elevator {elevator}: cannot move with doors open")]
    MoveWithDoorsOpen {
        /// Elevator index
        elevator: ElevatorId,
    },

    /// Elevator index out of range
    #[error("no elevator {elevator} (bank has {count})")]
    NoSuchElevator {
        /// Requested index
        elevator: ElevatorId,
        /// Number of elevators
        count: usize,
    },

    /// Floor out of range
    #[error("no floor {floor} (building has {count})")]
    NoSuchFloor {
        /// Requested floor
        floor: Floor,
        /// Number of floors
        count: usize,
    },

    /// Rider boarding an elevator that already lists it
    #[error("rider {rider} is already aboard elevator {elevator}")]
    AlreadyAboard {
        /// Rider index
        rider: RiderId,
        /// Elevator index
        elevator: ElevatorId,
    },

    /// Rider leaving an elevator that does not list it
    #[error("rider {rider} is not aboard elevator {elevator}")]
    NotAboard {
        /// Rider index
        rider: RiderId,
        /// Elevator index
        elevator: ElevatorId,
    },

    /// Floor-side operation while riding
    #[error("rider {rider} is riding elevator {elevator}")]
    Riding {
        /// Rider index
        rider: RiderId,
        /// Elevator the rider is in
        elevator: ElevatorId,
    },

    /// Car-side operation while standing on a floor
    #[error("rider {rider} is not in an elevator")]
    NotRiding {
        /// Rider index
        rider: RiderId,
    },

    /// Up at the top floor or down at the ground floor
    #[error("no floor {direction} of floor {floor}")]
    NoFloorInDirection {
        /// Floor of the call
        floor: Floor,
        /// Requested direction
        direction: Direction,
    },

    /// Hall call without a direction
    #[error("hall calls need a direction")]
    NoDirection,

    /// Rider finished with an exit history that differs from its script
    #[error("rider {rider} stopped at {actual:?}, expected {expected:?}")]
    StopsMismatch {
        /// Rider index
        rider: RiderId,
        /// Expected stop sequence
        expected: Vec<Floor>,
        /// Recorded exit floors
        actual: Vec<Floor>,
    },

    /// The run was already poisoned by an earlier violation
    #[error("run aborted by an earlier violation")]
    RunAborted,
}

/// Error returned by facade operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Refused, simulation state unchanged
    #[error("refused: {0}")]
    Refused(#[from] Refusal),

    /// Invariant violated, run is poisoned
    #[error("invariant violation: {0}")]
    Violation(#[from] Violation),
}

impl ControlError {
    /// Returns true if this error terminates the run.
    ///
    /// Refusals leave state untouched and the strategy may carry on.
    /// Violations are never recoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Violation(_))
    }

    /// The refusal, if this is one.
    pub fn refusal(&self) -> Option<Refusal> {
        match self {
            Self::Refused(refusal) => Some(*refusal),
            Self::Violation(_) => None,
        }
    }
}

/// Result of a facade operation.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors from setting up or running a simulation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    /// Lifecycle operation attempted in the wrong state
    #[error("invalid state: cannot {operation} while {state:?}")]
    InvalidState {
        /// Current lifecycle state
        state: BankState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Bad arguments to a setup call
    #[error("invalid setup: {0}")]
    InvalidSetup(String),

    /// Rendering was requested but the configuration forbids it
    #[error("renderer not allowed by configuration")]
    RendererNotAllowed,

    /// A strategy (or the engine) violated an invariant
    #[error("run failed: {0}")]
    Violation(#[from] Violation),

    /// No actor can make progress and none is scheduled to
    #[error(
        "run stalled at tick {tick}: riders {unfinished_riders:?} unfinished, controller \
         finished: {controller_finished}"
    )]
    Stalled {
        /// Virtual time at which progress stopped
        tick: Tick,
        /// Riders that never called `finish`
        unfinished_riders: Vec<RiderId>,
        /// Whether the controller called `finish`
        controller_finished: bool,
    },

    /// The executor refused to start an actor
    #[error("executor error: {0}")]
    Executor(String),
}

impl From<futures::task::SpawnError> for BankError {
    fn from(err: futures::task::SpawnError) -> Self {
        Self::Executor(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusals_are_not_fatal() {
        let refusals = [
            Refusal::AlreadyAtFloor { floor: 0 },
            Refusal::WouldReverse { floor: 2, target: 1, heading: Direction::Up },
            Refusal::DoorsClosed,
            Refusal::Moving,
            Refusal::WrongFloor { elevator_floor: 1, floor: 2 },
            Refusal::Full { capacity: 4 },
            Refusal::AlreadyServed { floor: 3 },
        ];

        for refusal in refusals {
            let err = ControlError::from(refusal);
            assert!(!err.is_fatal());
            assert_eq!(err.refusal(), Some(refusal));
        }
    }

    #[test]
    fn violations_are_fatal() {
        let violations = [
            Violation::DoorsAlreadyOpen { elevator: 0 },
            Violation::NotAboard { rider: 1, elevator: 0 },
            Violation::StopsMismatch { rider: 0, expected: vec![1], actual: vec![] },
            Violation::RunAborted,
        ];

        for violation in violations {
            let err = ControlError::from(violation);
            assert!(err.is_fatal());
            assert_eq!(err.refusal(), None);
        }
    }

    #[test]
    fn messages_name_the_offender() {
        let err = ControlError::from(Violation::DoorsAlreadyOpen { elevator: 3 });
        assert_eq!(err.to_string(), "invariant violation: elevator 3: doors already open");

        let err = BankError::InvalidState { state: BankState::Running, operation: "add_rider" };
        assert_eq!(err.to_string(), "invalid state: cannot add_rider while Running");
    }
}
