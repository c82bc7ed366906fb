//! Reference elevator and the real one it is compared against.
//!
//! The model is deliberately naive: flat fields, no shared helpers with the
//! engine, travel computed by walking one floor at a time. It is the oracle
//! the real state machine is verified against.

use liftbank_core::{BankConfig, Direction, Elevator, Floor, RiderId, Tick};

use super::operation::{ElevatorOp, OpOutcome};

/// Ticks per floor used by both sides.
pub const MODEL_TICKS_PER_FLOOR: Tick = 10;

/// Floors in the modelled building.
pub const MODEL_FLOORS: usize = 6;

/// Capacity of the modelled elevator.
pub const MODEL_CAPACITY: usize = 3;

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableElevator {
    /// Last floor reached.
    pub floor: Floor,
    /// Floor travelled to.
    pub destination: Floor,
    /// Doors open.
    pub doors_open: bool,
    /// Travelling.
    pub moving: bool,
    /// Direction display.
    pub display: Direction,
    /// Riders aboard, in boarding order.
    pub occupants: Vec<RiderId>,
}

fn wrap(floor: u8) -> Floor {
    usize::from(floor) % MODEL_FLOORS
}

/// Model elevator - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelElevator {
    now: Tick,
    floor: Floor,
    destination: Floor,
    going_up: bool,
    moving: bool,
    doors_open: bool,
    display: Direction,
    arrival: Tick,
    occupants: Vec<RiderId>,
}

impl Default for ModelElevator {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelElevator {
    /// Stationary at floor 0 with closed doors.
    pub fn new() -> Self {
        Self {
            now: 0,
            floor: 0,
            destination: 0,
            going_up: false,
            moving: false,
            doors_open: false,
            display: Direction::Neither,
            arrival: 0,
            occupants: Vec::new(),
        }
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &ElevatorOp) -> OpOutcome {
        match op {
            ElevatorOp::OpenDoors => {
                if self.doors_open || self.moving {
                    return OpOutcome::Violation;
                }
                self.doors_open = true;
                OpOutcome::Ok
            },
            ElevatorOp::CloseDoors => {
                if !self.doors_open {
                    return OpOutcome::Violation;
                }
                self.doors_open = false;
                OpOutcome::Ok
            },
            ElevatorOp::MoveTo { floor } => self.move_to(wrap(*floor)),
            ElevatorOp::Advance { ticks } => {
                self.now += Tick::from(*ticks);
                while self.moving && self.arrival <= self.now {
                    if self.going_up {
                        self.floor += 1;
                    } else {
                        self.floor -= 1;
                    }
                    if self.floor == self.destination {
                        self.moving = false;
                    } else {
                        self.arrival += MODEL_TICKS_PER_FLOOR;
                    }
                }
                OpOutcome::Ok
            },
            ElevatorOp::Enter { rider, floor } => {
                let rider = RiderId::from(*rider);
                if self.occupants.contains(&rider) {
                    return OpOutcome::Violation;
                }
                if !self.can_board(wrap(*floor)) || self.occupants.len() >= MODEL_CAPACITY {
                    return OpOutcome::Refused;
                }
                self.occupants.push(rider);
                OpOutcome::Ok
            },
            ElevatorOp::Exit { rider, floor } => {
                let rider = RiderId::from(*rider);
                if !self.occupants.contains(&rider) {
                    return OpOutcome::Violation;
                }
                if !self.can_board(wrap(*floor)) {
                    return OpOutcome::Refused;
                }
                self.occupants.retain(|r| *r != rider);
                OpOutcome::Ok
            },
            ElevatorOp::SetDisplay { direction } => {
                self.display = (*direction).into();
                OpOutcome::Ok
            },
        }
    }

    fn move_to(&mut self, target: Floor) -> OpOutcome {
        if self.doors_open {
            return OpOutcome::Violation;
        }
        if self.moving {
            let ahead = if self.going_up { target > self.floor } else { target < self.floor };
            if !ahead {
                return OpOutcome::Refused;
            }
            self.destination = target;
            return OpOutcome::Ok;
        }
        if target == self.floor {
            return OpOutcome::Refused;
        }
        self.destination = target;
        self.going_up = target > self.floor;
        self.moving = true;
        self.arrival = self.now + MODEL_TICKS_PER_FLOOR;
        OpOutcome::Ok
    }

    fn can_board(&self, floor: Floor) -> bool {
        self.doors_open && !self.moving && floor == self.floor
    }

    /// Extract observable state.
    pub fn observable(&self) -> ObservableElevator {
        ObservableElevator {
            floor: self.floor,
            destination: self.destination,
            doors_open: self.doors_open,
            moving: self.moving,
            display: self.display,
            occupants: self.occupants.clone(),
        }
    }
}

/// The real [`Elevator`] driven through the same operations.
#[derive(Debug, Clone)]
pub struct ElevatorUnderTest {
    elevator: Elevator,
    config: BankConfig,
    now: Tick,
}

impl Default for ElevatorUnderTest {
    fn default() -> Self {
        Self::new()
    }
}

impl ElevatorUnderTest {
    /// Elevator 0 at floor 0, configured like the model.
    pub fn new() -> Self {
        let config = BankConfig::default()
            .with_ticks_per_floor(MODEL_TICKS_PER_FLOOR)
            .with_capacity(MODEL_CAPACITY);
        Self { elevator: Elevator::new(0, 0, MODEL_CAPACITY), config, now: 0 }
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &ElevatorOp) -> OpOutcome {
        match op {
            ElevatorOp::OpenDoors => {
                OpOutcome::of(&self.elevator.open_doors().map_err(Into::into))
            },
            ElevatorOp::CloseDoors => {
                OpOutcome::of(&self.elevator.close_doors().map_err(Into::into))
            },
            ElevatorOp::MoveTo { floor } => {
                OpOutcome::of(&self.elevator.move_to(wrap(*floor), self.now, &self.config))
            },
            ElevatorOp::Advance { ticks } => {
                self.now += Tick::from(*ticks);
                let ticks_per_floor = self.config.ticks_per_floor;
                while self.elevator.advance_if_due(self.now, ticks_per_floor).is_some() {}
                OpOutcome::Ok
            },
            ElevatorOp::Enter { rider, floor } => {
                OpOutcome::of(&self.elevator.enter(RiderId::from(*rider), wrap(*floor)))
            },
            ElevatorOp::Exit { rider, floor } => {
                OpOutcome::of(&self.elevator.exit(RiderId::from(*rider), wrap(*floor)))
            },
            ElevatorOp::SetDisplay { direction } => {
                self.elevator.set_direction_display((*direction).into());
                OpOutcome::Ok
            },
        }
    }

    /// Extract observable state.
    pub fn observable(&self) -> ObservableElevator {
        ObservableElevator {
            floor: self.elevator.floor(),
            destination: self.elevator.destination(),
            doors_open: self.elevator.doors_open(),
            moving: self.elevator.is_moving(),
            display: self.elevator.direction_display(),
            occupants: self.elevator.occupants().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both(ops: &[ElevatorOp]) -> (ModelElevator, ElevatorUnderTest) {
        let mut model = ModelElevator::new();
        let mut real = ElevatorUnderTest::new();
        for op in ops {
            assert_eq!(model.apply(op), real.apply(op), "diverged at {op:?}");
        }
        (model, real)
    }

    #[test]
    fn travel_takes_one_step_per_floor() {
        let (model, real) = both(&[
            ElevatorOp::MoveTo { floor: 3 },
            ElevatorOp::Advance { ticks: 25 },
        ]);
        assert_eq!(model.observable().floor, 2);
        assert!(model.observable().moving);
        assert_eq!(model.observable(), real.observable());
    }

    #[test]
    fn floors_wrap_to_building_height() {
        let (model, real) = both(&[
            ElevatorOp::MoveTo { floor: 7 },
            ElevatorOp::Advance { ticks: 10 },
        ]);
        assert_eq!(model.observable().destination, 1);
        assert!(!model.observable().moving);
        assert_eq!(model.observable(), real.observable());
    }

    #[test]
    fn redirect_behind_is_refused() {
        let mut model = ModelElevator::new();
        model.apply(&ElevatorOp::MoveTo { floor: 5 });
        model.apply(&ElevatorOp::Advance { ticks: 20 });
        assert_eq!(model.apply(&ElevatorOp::MoveTo { floor: 2 }), OpOutcome::Refused);
        assert_eq!(model.apply(&ElevatorOp::MoveTo { floor: 3 }), OpOutcome::Ok);
    }

    #[test]
    fn boarding_needs_open_doors_at_the_floor() {
        let (model, _) = both(&[
            ElevatorOp::Enter { rider: 0, floor: 0 },
            ElevatorOp::OpenDoors,
            ElevatorOp::Enter { rider: 0, floor: 1 },
            ElevatorOp::Enter { rider: 0, floor: 0 },
            ElevatorOp::Enter { rider: 0, floor: 0 },
        ]);
        assert_eq!(model.observable().occupants, vec![0]);
    }
}
