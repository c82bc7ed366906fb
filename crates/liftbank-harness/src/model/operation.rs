//! Operations for model-based testing.
//!
//! Operations are everything a controller or rider can do to one elevator,
//! plus the passage of time. They are generated randomly by proptest (or by
//! the fuzzer through `Arbitrary`) and applied to both the model and the
//! real state machine.

use arbitrary::Arbitrary;
use liftbank_core::{ControlError, ControlResult, Direction};

/// Direction as generated by proptest and the fuzzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelDirection {
    /// Towards higher floors.
    Up,
    /// Towards lower floors.
    Down,
    /// No direction.
    Neither,
}

impl From<ModelDirection> for Direction {
    fn from(direction: ModelDirection) -> Self {
        match direction {
            ModelDirection::Up => Direction::Up,
            ModelDirection::Down => Direction::Down,
            ModelDirection::Neither => Direction::Neither,
        }
    }
}

/// Operations that can be applied to one elevator.
///
/// Floors and riders are kept small; floors wrap modulo the building height
/// so every generated value is meaningful.
#[derive(Debug, Clone, Arbitrary)]
pub enum ElevatorOp {
    /// Controller opens the doors.
    OpenDoors,

    /// Controller closes the doors.
    CloseDoors,

    /// Controller sends the elevator somewhere.
    MoveTo {
        /// Target floor (wrapped).
        floor: u8,
    },

    /// Virtual time passes; due steps are taken.
    Advance {
        /// Ticks to advance.
        ticks: u16,
    },

    /// A rider tries to board.
    Enter {
        /// Rider index.
        rider: u8,
        /// Floor the rider stands on (wrapped).
        floor: u8,
    },

    /// A rider tries to leave.
    Exit {
        /// Rider index.
        rider: u8,
        /// Floor the rider claims the elevator is at (wrapped).
        floor: u8,
    },

    /// Controller sets the direction display.
    SetDisplay {
        /// New display.
        direction: ModelDirection,
    },
}

/// Classified result of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    /// Accepted.
    Ok,
    /// Refused; state unchanged.
    Refused,
    /// Invariant violation; state unchanged.
    Violation,
}

impl OpOutcome {
    /// Classify a facade result.
    pub fn of<T>(result: &ControlResult<T>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(ControlError::Refused(_)) => Self::Refused,
            Err(ControlError::Violation(_)) => Self::Violation,
        }
    }
}
