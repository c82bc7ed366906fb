//! Identifiers and small value types shared by every component.

use std::fmt;

/// Floor number, `0` is the ground floor.
pub type Floor = usize;

/// Index of an elevator within the bank.
pub type ElevatorId = usize;

/// Index of a rider, assigned in the order riders are added.
pub type RiderId = usize;

/// Indivisible unit of virtual simulation time.
pub type Tick = u64;

/// Direction of travel, or the rider-visible direction display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Moving (or about to move) towards higher floors
    Up,
    /// Moving (or about to move) towards lower floors
    Down,
    /// No intent to move
    #[default]
    Neither,
}

impl Direction {
    /// Direction needed to get from `from` to `to`.
    pub fn between(from: Floor, to: Floor) -> Self {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Self::Up,
            std::cmp::Ordering::Less => Self::Down,
            std::cmp::Ordering::Equal => Self::Neither,
        }
    }

    /// The opposite direction. `Neither` is its own opposite.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Neither => Self::Neither,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
            Self::Neither => f.write_str("neither"),
        }
    }
}

/// Where a rider (or an event) is located.
///
/// The two cases are mutually exclusive: a rider riding an elevator is not
/// "on" any floor for the purpose of event delivery, even though it still
/// tracks the floor the elevator is at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locus {
    /// Standing on a floor
    OnFloor(Floor),
    /// Inside an elevator
    InElevator(ElevatorId),
}
