//! Scene updates for an optional renderer.
//!
//! Renderers observe; they never feed back into the simulation. A run with
//! a renderer attached produces exactly the same outcome as one without.

use crate::types::{Direction, ElevatorId, Floor};

/// One visible change to the building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneUpdate {
    /// Scene set up at the start of a run
    Initialized {
        /// Number of floors
        num_floors: usize,
        /// Number of elevators
        num_elevators: usize,
        /// Riders waiting on each floor, indexed by floor
        riders_per_floor: Vec<usize>,
    },
    /// Up hall button lit
    UpButtonPressed {
        /// Floor of the button
        floor: Floor,
    },
    /// Down hall button lit
    DownButtonPressed {
        /// Floor of the button
        floor: Floor,
    },
    /// Up hall button cleared by an open elevator
    UpButtonCleared {
        /// Floor of the button
        floor: Floor,
    },
    /// Down hall button cleared by an open elevator
    DownButtonCleared {
        /// Floor of the button
        floor: Floor,
    },
    /// Floor button lit inside an elevator
    FloorButtonPressed {
        /// Elevator index
        elevator: ElevatorId,
        /// Requested floor
        floor: Floor,
    },
    /// Doors opened
    DoorsOpened {
        /// Elevator index
        elevator: ElevatorId,
    },
    /// Doors closed
    DoorsClosed {
        /// Elevator index
        elevator: ElevatorId,
    },
    /// Elevator reached a floor
    ElevatorMoved {
        /// Elevator index
        elevator: ElevatorId,
        /// Floor reached
        floor: Floor,
    },
    /// Direction display set
    DirectionDisplayChanged {
        /// Elevator index
        elevator: ElevatorId,
        /// New display
        direction: Direction,
    },
    /// A rider boarded
    RiderEntered {
        /// Elevator index
        elevator: ElevatorId,
        /// Floor boarded at
        floor: Floor,
    },
    /// A rider left
    RiderExited {
        /// Elevator index
        elevator: ElevatorId,
        /// Floor left at
        floor: Floor,
    },
}

impl SceneUpdate {
    /// Hall button cleared when an elevator stands open at `floor` showing
    /// `direction`.
    pub(crate) fn hall_cleared(floor: Floor, direction: Direction) -> Option<Self> {
        match direction {
            Direction::Up => Some(Self::UpButtonCleared { floor }),
            Direction::Down => Some(Self::DownButtonCleared { floor }),
            Direction::Neither => None,
        }
    }
}

/// Consumer of scene updates.
pub trait Renderer {
    /// Observe one update.
    fn render(&mut self, update: &SceneUpdate);
}

/// Renderer that logs every update at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRenderer;

impl Renderer for TracingRenderer {
    fn render(&mut self, update: &SceneUpdate) {
        tracing::debug!(?update, "scene");
    }
}
