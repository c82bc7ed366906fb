//! Elevator state machine.
//!
//! Owns the physical state of one car: floor, destination, heading, doors,
//! occupants. Pure: time comes in as a parameter and the caller decides what
//! to schedule and whom to notify based on the returned values.
//!
//! # State Machine
//!
//! ```text
//!                 open_doors                       move_to
//! ┌──────────────┐ ────────> ┌────────────┐   ┌────────────────┐
//! │ Idle (closed)│           │ Doors open │   │ Moving         │
//! └──────────────┘ <──────── └────────────┘   │ (doors closed) │
//!        │  ▲      close_doors                └────────────────┘
//!        │  │                                     │   ▲    │
//!        │  └──────── advance_if_due: Arrived ────┘   │    │
//!        └──────────────── move_to ───────────────────┘    │
//!                                                          │
//!                      advance_if_due: Passed / redirect ──┘
//! ```
//!
//! Doors and motion are mutually exclusive: doors only open when stationary
//! and a move is only accepted with the doors closed.

use crate::{
    config::{BankConfig, RedirectBoundary},
    error::{ControlResult, Refusal, Violation},
    types::{Direction, ElevatorId, Floor, RiderId, Tick},
};

/// Outcome of an accepted `move_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Stationary elevator began moving; first step due at `arrival`
    Started {
        /// Tick at which the next floor is reached
        arrival: Tick,
    },
    /// Moving elevator got a new destination; no new step is needed
    Redirected,
}

/// Result of a due step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Reached an intermediate floor; next step due at `next_arrival`
    Passed {
        /// Floor now reached
        floor: Floor,
        /// Tick of the following step
        next_arrival: Tick,
    },
    /// Reached the destination and stopped
    Arrived {
        /// Destination floor
        floor: Floor,
    },
}

impl Step {
    /// Floor the elevator is at after this step.
    pub fn floor(&self) -> Floor {
        match self {
            Self::Passed { floor, .. } | Self::Arrived { floor } => *floor,
        }
    }
}

/// Physical state of one elevator.
#[derive(Debug, Clone)]
pub struct Elevator {
    id: ElevatorId,
    floor: Floor,
    destination: Floor,
    heading: Direction,
    display: Direction,
    doors_open: bool,
    moving: bool,
    next_arrival: Tick,
    occupants: Vec<RiderId>,
    capacity: usize,
}

impl Elevator {
    /// Create a stationary elevator with closed doors at `floor`.
    pub fn new(id: ElevatorId, floor: Floor, capacity: usize) -> Self {
        Self {
            id,
            floor,
            destination: floor,
            heading: Direction::Neither,
            display: Direction::Neither,
            doors_open: false,
            moving: false,
            next_arrival: 0,
            occupants: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Index within the bank.
    pub fn id(&self) -> ElevatorId {
        self.id
    }

    /// Last floor reached.
    pub fn floor(&self) -> Floor {
        self.floor
    }

    /// Floor the elevator is travelling to (equals `floor` when idle).
    pub fn destination(&self) -> Floor {
        self.destination
    }

    /// Committed direction of travel. `Neither` when stationary.
    pub fn heading(&self) -> Direction {
        self.heading
    }

    /// Rider-visible direction display.
    pub fn direction_display(&self) -> Direction {
        self.display
    }

    /// Whether the doors are open.
    pub fn doors_open(&self) -> bool {
        self.doors_open
    }

    /// Whether the elevator is travelling.
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Tick of the next step while moving.
    pub fn next_arrival(&self) -> Option<Tick> {
        self.moving.then_some(self.next_arrival)
    }

    /// Riders aboard, in boarding order.
    pub fn occupants(&self) -> &[RiderId] {
        &self.occupants
    }

    /// Maximum number of occupants.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether no more riders fit.
    pub fn is_full(&self) -> bool {
        self.occupants.len() >= self.capacity
    }

    /// Whether `rider` is aboard.
    pub fn carries(&self, rider: RiderId) -> bool {
        self.occupants.contains(&rider)
    }

    /// Open the doors. Returns the floor they opened at.
    ///
    /// # Errors
    ///
    /// - `Violation::DoorsAlreadyOpen` if the doors are open
    /// - `Violation::OpenWhileMoving` if travelling
    pub fn open_doors(&mut self) -> Result<Floor, Violation> {
        if self.doors_open {
            return Err(Violation::DoorsAlreadyOpen { elevator: self.id });
        }
        if self.moving {
            return Err(Violation::OpenWhileMoving { elevator: self.id });
        }

        self.doors_open = true;
        Ok(self.floor)
    }

    /// Close the doors. Returns the floor they closed at.
    ///
    /// # Errors
    ///
    /// - `Violation::DoorsAlreadyClosed` if the doors are closed
    pub fn close_doors(&mut self) -> Result<Floor, Violation> {
        if !self.doors_open {
            return Err(Violation::DoorsAlreadyClosed { elevator: self.id });
        }

        self.doors_open = false;
        Ok(self.floor)
    }

    /// Start moving towards `target`, or redirect a move in progress.
    ///
    /// A moving elevator only accepts destinations that keep it travelling
    /// in its committed heading; the floor it last reached is eligible only
    /// under [`RedirectBoundary::Inclusive`].
    ///
    /// # Errors
    ///
    /// - `Violation::MoveWithDoorsOpen` if the doors are open
    /// - `Refusal::AlreadyAtFloor` if stationary at `target`
    /// - `Refusal::WouldReverse` if moving and `target` lies behind
    pub fn move_to(
        &mut self,
        target: Floor,
        now: Tick,
        config: &BankConfig,
    ) -> ControlResult<MoveOutcome> {
        if self.doors_open {
            return Err(Violation::MoveWithDoorsOpen { elevator: self.id }.into());
        }

        if !self.moving {
            if target == self.floor {
                return Err(Refusal::AlreadyAtFloor { floor: self.floor }.into());
            }

            self.destination = target;
            self.heading = Direction::between(self.floor, target);
            self.next_arrival = now.saturating_add(config.ticks_per_floor);
            self.moving = true;
            return Ok(MoveOutcome::Started { arrival: self.next_arrival });
        }

        let ahead = match (self.heading, config.redirect_boundary) {
            (Direction::Up, RedirectBoundary::Exclusive) => target > self.floor,
            (Direction::Up, RedirectBoundary::Inclusive) => target >= self.floor,
            (Direction::Down, RedirectBoundary::Exclusive) => target < self.floor,
            (Direction::Down, RedirectBoundary::Inclusive) => target <= self.floor,
            (Direction::Neither, _) => false,
        };

        if !ahead {
            return Err(Refusal::WouldReverse {
                floor: self.floor,
                target,
                heading: self.heading,
            }
            .into());
        }

        self.destination = target;
        Ok(MoveOutcome::Redirected)
    }

    /// Take the next step if it is due.
    ///
    /// Moves one floor towards the destination (or none, if an inclusive
    /// redirect made the last floor reached the destination) and reports
    /// whether the elevator stopped there.
    pub fn advance_if_due(&mut self, now: Tick, ticks_per_floor: Tick) -> Option<Step> {
        if !self.moving || now < self.next_arrival {
            return None;
        }

        match Direction::between(self.floor, self.destination) {
            Direction::Up => self.floor += 1,
            Direction::Down => self.floor -= 1,
            Direction::Neither => {},
        }

        if self.floor == self.destination {
            self.moving = false;
            self.heading = Direction::Neither;
            Some(Step::Arrived { floor: self.floor })
        } else {
            self.next_arrival = self.next_arrival.saturating_add(ticks_per_floor);
            Some(Step::Passed { floor: self.floor, next_arrival: self.next_arrival })
        }
    }

    /// Board `rider`, who claims to stand at `floor`.
    ///
    /// # Errors
    ///
    /// - `Violation::AlreadyAboard` if the rider is listed
    /// - `Refusal::DoorsClosed`, `Refusal::Moving`, `Refusal::WrongFloor`,
    ///   `Refusal::Full`
    pub fn enter(&mut self, rider: RiderId, floor: Floor) -> ControlResult<()> {
        if self.carries(rider) {
            return Err(Violation::AlreadyAboard { rider, elevator: self.id }.into());
        }

        self.check_boarding(floor)?;

        if self.is_full() {
            return Err(Refusal::Full { capacity: self.capacity }.into());
        }

        self.occupants.push(rider);
        Ok(())
    }

    /// Let `rider` off at `floor`.
    ///
    /// # Errors
    ///
    /// - `Violation::NotAboard` if the rider is not listed
    /// - `Refusal::DoorsClosed`, `Refusal::Moving`, `Refusal::WrongFloor`
    pub fn exit(&mut self, rider: RiderId, floor: Floor) -> ControlResult<()> {
        let Some(position) = self.occupants.iter().position(|r| *r == rider) else {
            return Err(Violation::NotAboard { rider, elevator: self.id }.into());
        };

        self.check_boarding(floor)?;

        self.occupants.remove(position);
        Ok(())
    }

    /// Set the direction display. Returns true if the doors are open, in
    /// which case riders must be told about the change.
    pub fn set_direction_display(&mut self, direction: Direction) -> bool {
        self.display = direction;
        self.doors_open
    }

    fn check_boarding(&self, floor: Floor) -> Result<(), Refusal> {
        if !self.doors_open {
            return Err(Refusal::DoorsClosed);
        }
        if self.moving {
            return Err(Refusal::Moving);
        }
        if floor != self.floor {
            return Err(Refusal::WrongFloor { elevator_floor: self.floor, floor });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControlError;

    const TICKS: Tick = 10;

    fn config() -> BankConfig {
        BankConfig::default().with_ticks_per_floor(TICKS).with_capacity(2)
    }

    fn elevator_at(floor: Floor) -> Elevator {
        Elevator::new(0, floor, 2)
    }

    /// Drive the elevator until it stops, returning every floor reached.
    fn run_to_stop(elevator: &mut Elevator, mut now: Tick) -> (Vec<Floor>, Tick) {
        let mut floors = Vec::new();
        while let Some(at) = elevator.next_arrival() {
            now = at;
            match elevator.advance_if_due(now, TICKS) {
                Some(step) => floors.push(step.floor()),
                None => break,
            }
        }
        (floors, now)
    }

    #[test]
    fn doors_open_and_close() {
        let mut elevator = elevator_at(3);
        assert_eq!(elevator.open_doors(), Ok(3));
        assert!(elevator.doors_open());
        assert_eq!(elevator.close_doors(), Ok(3));
        assert!(!elevator.doors_open());
    }

    #[test]
    fn opening_open_doors_is_a_violation() {
        let mut elevator = elevator_at(0);
        elevator.open_doors().unwrap();
        assert_eq!(elevator.open_doors(), Err(Violation::DoorsAlreadyOpen { elevator: 0 }));
    }

    #[test]
    fn closing_closed_doors_is_a_violation() {
        let mut elevator = elevator_at(0);
        assert_eq!(elevator.close_doors(), Err(Violation::DoorsAlreadyClosed { elevator: 0 }));
    }

    #[test]
    fn opening_while_moving_is_a_violation() {
        let mut elevator = elevator_at(0);
        elevator.move_to(2, 0, &config()).unwrap();
        assert_eq!(elevator.open_doors(), Err(Violation::OpenWhileMoving { elevator: 0 }));
    }

    #[test]
    fn moving_with_doors_open_is_a_violation() {
        let mut elevator = elevator_at(0);
        elevator.open_doors().unwrap();
        let err = elevator.move_to(1, 0, &config()).unwrap_err();
        assert_eq!(err, ControlError::Violation(Violation::MoveWithDoorsOpen { elevator: 0 }));
    }

    #[test]
    fn move_to_current_floor_is_refused() {
        let mut elevator = elevator_at(4);
        let err = elevator.move_to(4, 0, &config()).unwrap_err();
        assert_eq!(err.refusal(), Some(Refusal::AlreadyAtFloor { floor: 4 }));
        assert!(!elevator.is_moving());
    }

    #[test]
    fn travels_one_floor_per_step() {
        let mut elevator = elevator_at(0);
        let outcome = elevator.move_to(3, 100, &config()).unwrap();
        assert_eq!(outcome, MoveOutcome::Started { arrival: 110 });
        assert_eq!(elevator.heading(), Direction::Up);

        // Not due yet
        assert_eq!(elevator.advance_if_due(105, TICKS), None);

        let (floors, now) = run_to_stop(&mut elevator, 100);
        assert_eq!(floors, vec![1, 2, 3]);
        assert_eq!(now, 130);
        assert!(!elevator.is_moving());
        assert_eq!(elevator.heading(), Direction::Neither);
        assert_eq!(elevator.floor(), 3);
    }

    #[test]
    fn travels_down() {
        let mut elevator = elevator_at(5);
        elevator.move_to(2, 0, &config()).unwrap();
        let (floors, _) = run_to_stop(&mut elevator, 0);
        assert_eq!(floors, vec![4, 3, 2]);
    }

    #[test]
    fn redirect_forward_is_accepted() {
        let mut elevator = elevator_at(0);
        elevator.move_to(5, 0, &config()).unwrap();
        elevator.advance_if_due(10, TICKS);
        assert_eq!(elevator.floor(), 1);

        // Shorten the trip
        assert_eq!(elevator.move_to(3, 10, &config()), Ok(MoveOutcome::Redirected));
        // And lengthen it again
        assert_eq!(elevator.move_to(4, 10, &config()), Ok(MoveOutcome::Redirected));

        let (floors, _) = run_to_stop(&mut elevator, 10);
        assert_eq!(floors, vec![2, 3, 4]);
    }

    #[test]
    fn redirect_backwards_is_refused() {
        let mut elevator = elevator_at(2);
        elevator.move_to(5, 0, &config()).unwrap();
        elevator.advance_if_due(10, TICKS);
        assert_eq!(elevator.floor(), 3);

        for target in [0, 2, 3] {
            let err = elevator.move_to(target, 10, &config()).unwrap_err();
            assert_eq!(
                err.refusal(),
                Some(Refusal::WouldReverse { floor: 3, target, heading: Direction::Up })
            );
        }
        assert_eq!(elevator.destination(), 5);
    }

    #[test]
    fn inclusive_boundary_halts_at_last_floor() {
        let config = config().with_redirect_boundary(RedirectBoundary::Inclusive);
        let mut elevator = elevator_at(4);
        elevator.move_to(0, 0, &config).unwrap();
        elevator.advance_if_due(10, TICKS);
        assert_eq!(elevator.floor(), 3);

        assert_eq!(elevator.move_to(3, 10, &config), Ok(MoveOutcome::Redirected));
        assert!(elevator.move_to(4, 10, &config).is_err());

        assert_eq!(elevator.advance_if_due(20, TICKS), Some(Step::Arrived { floor: 3 }));
        assert!(!elevator.is_moving());
    }

    #[test]
    fn boarding_requires_open_doors_at_floor() {
        let mut elevator = elevator_at(1);
        assert_eq!(elevator.enter(7, 1).unwrap_err().refusal(), Some(Refusal::DoorsClosed));

        elevator.open_doors().unwrap();
        assert_eq!(
            elevator.enter(7, 2).unwrap_err().refusal(),
            Some(Refusal::WrongFloor { elevator_floor: 1, floor: 2 })
        );

        elevator.enter(7, 1).unwrap();
        assert!(elevator.carries(7));
    }

    #[test]
    fn boarding_respects_capacity() {
        let mut elevator = elevator_at(0);
        elevator.open_doors().unwrap();
        elevator.enter(1, 0).unwrap();
        elevator.enter(2, 0).unwrap();
        assert!(elevator.is_full());
        assert_eq!(
            elevator.enter(3, 0).unwrap_err().refusal(),
            Some(Refusal::Full { capacity: 2 })
        );
        assert_eq!(elevator.occupants(), &[1, 2]);
    }

    #[test]
    fn double_boarding_is_a_violation() {
        let mut elevator = elevator_at(0);
        elevator.open_doors().unwrap();
        elevator.enter(1, 0).unwrap();
        let err = elevator.enter(1, 0).unwrap_err();
        assert_eq!(
            err,
            ControlError::Violation(Violation::AlreadyAboard { rider: 1, elevator: 0 })
        );
    }

    #[test]
    fn leaving_without_boarding_is_a_violation() {
        let mut elevator = elevator_at(0);
        elevator.open_doors().unwrap();
        let err = elevator.exit(9, 0).unwrap_err();
        assert_eq!(err, ControlError::Violation(Violation::NotAboard { rider: 9, elevator: 0 }));
    }

    #[test]
    fn exit_keeps_boarding_order() {
        let mut elevator = elevator_at(0);
        elevator.open_doors().unwrap();
        elevator.enter(1, 0).unwrap();
        elevator.enter(2, 0).unwrap();
        elevator.exit(1, 0).unwrap();
        assert_eq!(elevator.occupants(), &[2]);
    }

    #[test]
    fn display_change_reports_open_doors() {
        let mut elevator = elevator_at(0);
        assert!(!elevator.set_direction_display(Direction::Up));
        elevator.open_doors().unwrap();
        assert!(elevator.set_direction_display(Direction::Down));
        assert_eq!(elevator.direction_display(), Direction::Down);
        assert_eq!(elevator.heading(), Direction::Neither);
    }
}
