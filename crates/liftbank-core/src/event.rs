//! Events queued for actors.

use crate::types::{Direction, ElevatorId, Floor};

/// What a rider observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiderEventKind {
    /// Doors of an elevator opened
    DoorsOpened,
    /// Doors of an elevator closed
    DoorsClosed,
    /// Display of an open elevator changed
    DirectionChanged,
}

/// Event delivered to riders on a floor or inside an elevator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiderEvent {
    /// What happened
    pub kind: RiderEventKind,
    /// Floor it happened at
    pub floor: Floor,
    /// Elevator involved, if any
    pub elevator: Option<ElevatorId>,
    /// Display of that elevator when the event was posted
    pub direction: Direction,
}

/// What the controller observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEventKind {
    /// An elevator stopped at its destination
    ElevatorArrived,
    /// Up hall button pressed
    UpButtonPressed,
    /// Down hall button pressed
    DownButtonPressed,
    /// Floor button pressed inside an elevator
    FloorButtonPressed,
    /// Every rider has finished
    RidersDone,
}

/// Event delivered to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerEvent {
    /// What happened
    pub kind: ControllerEventKind,
    /// Floor it concerns
    pub floor: Floor,
    /// Elevator it concerns; `None` for hall calls and `RidersDone`
    pub elevator: Option<ElevatorId>,
}

impl ControllerEvent {
    /// Create an event.
    pub fn new(kind: ControllerEventKind, floor: Floor, elevator: Option<ElevatorId>) -> Self {
        Self { kind, floor, elevator }
    }

    pub(crate) fn hall_call(kind: ControllerEventKind, floor: Floor) -> Self {
        Self::new(kind, floor, None)
    }

    pub(crate) fn riders_done() -> Self {
        Self::new(ControllerEventKind::RidersDone, 0, None)
    }

    /// Direction of a hall call, `Neither` for every other kind.
    pub fn call_direction(&self) -> Direction {
        match self.kind {
            ControllerEventKind::UpButtonPressed => Direction::Up,
            ControllerEventKind::DownButtonPressed => Direction::Down,
            _ => Direction::Neither,
        }
    }
}
