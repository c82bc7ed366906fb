//! Rider state machine.
//!
//! A rider is either standing on a floor or riding one elevator. Operations
//! validate against the rider's own state and the elevators it interacts
//! with, and return the controller event to emit (if any) rather than
//! delivering it; delivery is the caller's job.

use std::collections::VecDeque;

use crate::{
    elevator::Elevator,
    error::{ControlResult, Refusal, Violation},
    event::{ControllerEvent, ControllerEventKind, RiderEvent},
    types::{Direction, ElevatorId, Floor, Locus, RiderId},
};

/// State of one rider.
#[derive(Debug, Clone)]
pub struct RiderState {
    id: RiderId,
    floor: Floor,
    elevator: Option<ElevatorId>,
    exits: Vec<Floor>,
    stops: Vec<Floor>,
    events: VecDeque<RiderEvent>,
    finished: bool,
}

impl RiderState {
    /// Create a rider standing on `floor` that expects to leave elevators at
    /// `stops`, in order.
    pub fn new(id: RiderId, floor: Floor, stops: Vec<Floor>) -> Self {
        Self {
            id,
            floor,
            elevator: None,
            exits: Vec::new(),
            stops,
            events: VecDeque::new(),
            finished: false,
        }
    }

    /// Rider index.
    pub fn id(&self) -> RiderId {
        self.id
    }

    /// Current floor. While riding this follows the elevator.
    pub fn floor(&self) -> Floor {
        self.floor
    }

    /// Elevator the rider is in, if any.
    pub fn elevator(&self) -> Option<ElevatorId> {
        self.elevator
    }

    /// Where the rider is for event delivery.
    pub fn locus(&self) -> Locus {
        match self.elevator {
            Some(elevator) => Locus::InElevator(elevator),
            None => Locus::OnFloor(self.floor),
        }
    }

    /// Floors the rider has left an elevator at, in order.
    pub fn floors(&self) -> &[Floor] {
        &self.exits
    }

    /// Floors the rider is expected to leave an elevator at.
    pub fn stops(&self) -> &[Floor] {
        &self.stops
    }

    /// Whether `finish` succeeded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of queued, undelivered events.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn events_mut(&mut self) -> &mut VecDeque<RiderEvent> {
        &mut self.events
    }

    /// Follow the elevator to a new floor.
    pub(crate) fn ride_to(&mut self, floor: Floor) {
        debug_assert!(self.elevator.is_some());
        self.floor = floor;
    }

    /// Press the up or down hall button.
    ///
    /// Redundant if an elevator already stands open at this floor showing
    /// the same direction. Presses by different riders are never merged.
    ///
    /// # Errors
    ///
    /// - `Violation::Riding` if in an elevator
    /// - `Violation::NoDirection` for `Direction::Neither`
    /// - `Violation::NoFloorInDirection` for up at the top or down at the
    ///   ground floor
    /// - `Refusal::AlreadyServed` if a compatible elevator is open here
    pub(crate) fn press_direction_button(
        &self,
        direction: Direction,
        num_floors: usize,
        elevators: &[Elevator],
    ) -> ControlResult<ControllerEvent> {
        if let Some(elevator) = self.elevator {
            return Err(Violation::Riding { rider: self.id, elevator }.into());
        }

        let kind = match direction {
            Direction::Up if self.floor + 1 < num_floors => ControllerEventKind::UpButtonPressed,
            Direction::Down if self.floor > 0 => ControllerEventKind::DownButtonPressed,
            Direction::Neither => return Err(Violation::NoDirection.into()),
            _ => {
                return Err(Violation::NoFloorInDirection { floor: self.floor, direction }.into());
            },
        };

        let served = elevators.iter().any(|e| {
            e.doors_open() && e.direction_display() == direction && e.floor() == self.floor
        });
        if served {
            return Err(Refusal::AlreadyServed { floor: self.floor }.into());
        }

        Ok(ControllerEvent::hall_call(kind, self.floor))
    }

    /// Board `elevator`, which must be open at the rider's floor.
    ///
    /// # Errors
    ///
    /// - `Violation::Riding` if already in an elevator
    /// - anything [`Elevator::enter`] returns
    pub(crate) fn enter_elevator(&mut self, elevator: &mut Elevator) -> ControlResult<()> {
        if let Some(current) = self.elevator {
            return Err(Violation::Riding { rider: self.id, elevator: current }.into());
        }

        elevator.enter(self.id, self.floor)?;
        self.elevator = Some(elevator.id());
        Ok(())
    }

    /// Press a floor button inside the elevator.
    ///
    /// # Errors
    ///
    /// - `Violation::NotRiding` if not in an elevator
    /// - `Refusal::AlreadyServed` if the elevator is open at `floor`
    pub(crate) fn press_floor_button(
        &self,
        floor: Floor,
        elevators: &[Elevator],
    ) -> ControlResult<ControllerEvent> {
        let Some(index) = self.elevator else {
            return Err(Violation::NotRiding { rider: self.id }.into());
        };
        let elevator = &elevators[index];

        if elevator.doors_open() && elevator.floor() == floor {
            return Err(Refusal::AlreadyServed { floor }.into());
        }

        Ok(ControllerEvent::new(ControllerEventKind::FloorButtonPressed, floor, Some(index)))
    }

    /// Leave the elevator at `floor`, recording it in the exit history.
    ///
    /// Returns the elevator left.
    ///
    /// # Errors
    ///
    /// - `Violation::NotRiding` if not in an elevator
    /// - anything [`Elevator::exit`] returns
    pub(crate) fn exit_elevator(
        &mut self,
        floor: Floor,
        elevators: &mut [Elevator],
    ) -> ControlResult<ElevatorId> {
        let Some(index) = self.elevator else {
            return Err(Violation::NotRiding { rider: self.id }.into());
        };

        elevators[index].exit(self.id, floor)?;
        self.elevator = None;
        self.floor = floor;
        self.exits.push(floor);
        Ok(index)
    }

    /// Compare the exit history with the expected stops and mark finished.
    ///
    /// # Errors
    ///
    /// - `Violation::StopsMismatch` if they differ in any element or length
    pub(crate) fn finish(&mut self) -> Result<(), Violation> {
        self.finished = true;
        self.events.clear();

        if self.exits != self.stops {
            return Err(Violation::StopsMismatch {
                rider: self.id,
                expected: self.stops.clone(),
                actual: self.exits.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControlError;

    fn open_elevator(id: ElevatorId, floor: Floor, display: Direction) -> Elevator {
        let mut elevator = Elevator::new(id, floor, 4);
        elevator.set_direction_display(display);
        elevator.open_doors().unwrap();
        elevator
    }

    #[test]
    fn new_rider_stands_on_its_floor() {
        let rider = RiderState::new(0, 3, vec![5]);
        assert_eq!(rider.locus(), Locus::OnFloor(3));
        assert!(rider.floors().is_empty());
        assert!(!rider.is_finished());
    }

    #[test]
    fn hall_call_produces_event() {
        let rider = RiderState::new(0, 2, vec![]);
        let event = rider.press_direction_button(Direction::Up, 5, &[]).unwrap();
        assert_eq!(event.kind, ControllerEventKind::UpButtonPressed);
        assert_eq!(event.floor, 2);
        assert_eq!(event.elevator, None);
    }

    #[test]
    fn hall_call_past_the_building_is_a_violation() {
        let top = RiderState::new(0, 4, vec![]);
        assert_eq!(
            top.press_direction_button(Direction::Up, 5, &[]).unwrap_err(),
            ControlError::Violation(Violation::NoFloorInDirection {
                floor: 4,
                direction: Direction::Up
            })
        );

        let ground = RiderState::new(1, 0, vec![]);
        assert!(ground.press_direction_button(Direction::Down, 5, &[]).unwrap_err().is_fatal());
        assert!(ground.press_direction_button(Direction::Neither, 5, &[]).unwrap_err().is_fatal());
    }

    #[test]
    fn hall_call_is_redundant_only_with_compatible_open_elevator() {
        let rider = RiderState::new(0, 1, vec![]);

        let wrong_direction = [open_elevator(0, 1, Direction::Down)];
        assert!(rider.press_direction_button(Direction::Up, 4, &wrong_direction).is_ok());

        let wrong_floor = [open_elevator(0, 2, Direction::Up)];
        assert!(rider.press_direction_button(Direction::Up, 4, &wrong_floor).is_ok());

        let compatible = [open_elevator(0, 2, Direction::Up), open_elevator(1, 1, Direction::Up)];
        assert_eq!(
            rider.press_direction_button(Direction::Up, 4, &compatible).unwrap_err().refusal(),
            Some(Refusal::AlreadyServed { floor: 1 })
        );
    }

    #[test]
    fn boarding_and_leaving_update_locus_and_history() {
        let mut elevators = vec![open_elevator(0, 0, Direction::Up)];
        let mut rider = RiderState::new(3, 0, vec![0]);

        rider.enter_elevator(&mut elevators[0]).unwrap();
        assert_eq!(rider.locus(), Locus::InElevator(0));
        assert!(elevators[0].carries(3));

        assert_eq!(rider.exit_elevator(0, &mut elevators), Ok(0));
        assert_eq!(rider.locus(), Locus::OnFloor(0));
        assert_eq!(rider.floors(), &[0]);
        assert!(elevators[0].occupants().is_empty());
    }

    #[test]
    fn floor_button_requires_riding() {
        let rider = RiderState::new(0, 0, vec![]);
        let err = rider.press_floor_button(2, &[]).unwrap_err();
        assert_eq!(err, ControlError::Violation(Violation::NotRiding { rider: 0 }));
    }

    #[test]
    fn floor_button_is_redundant_when_open_there() {
        let mut elevators = vec![open_elevator(0, 1, Direction::Neither)];
        let mut rider = RiderState::new(0, 1, vec![]);
        rider.enter_elevator(&mut elevators[0]).unwrap();

        assert_eq!(
            rider.press_floor_button(1, &elevators).unwrap_err().refusal(),
            Some(Refusal::AlreadyServed { floor: 1 })
        );

        let event = rider.press_floor_button(3, &elevators).unwrap();
        assert_eq!(event.kind, ControllerEventKind::FloorButtonPressed);
        assert_eq!(event.elevator, Some(0));
    }

    #[test]
    fn riding_rider_cannot_call_or_board() {
        let mut elevators =
            vec![open_elevator(0, 0, Direction::Up), open_elevator(1, 0, Direction::Up)];
        let mut rider = RiderState::new(0, 0, vec![]);
        rider.enter_elevator(&mut elevators[0]).unwrap();

        assert!(rider.press_direction_button(Direction::Up, 3, &elevators).unwrap_err().is_fatal());
        assert!(rider.enter_elevator(&mut elevators[1]).unwrap_err().is_fatal());
    }

    #[test]
    fn finish_checks_stop_history() {
        let mut rider = RiderState::new(0, 0, vec![2]);
        assert_eq!(
            rider.finish(),
            Err(Violation::StopsMismatch { rider: 0, expected: vec![2], actual: vec![] })
        );
        assert!(rider.is_finished());

        let mut rider = RiderState::new(1, 0, vec![]);
        assert_eq!(rider.finish(), Ok(()));
    }
}
