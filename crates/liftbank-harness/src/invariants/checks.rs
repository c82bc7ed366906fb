//! Standard invariant checks.
//!
//! These invariants capture physical and bookkeeping properties of the bank
//! that must hold at every quiescent point, whatever the strategies do.

use liftbank_core::Locus;

use super::{BankSnapshot, Invariant, InvariantResult, InvariantViolation};

/// Doors are never open while the elevator travels.
pub struct DoorsClosedWhileMoving;

impl Invariant for DoorsClosedWhileMoving {
    fn name(&self) -> &'static str {
        "doors_closed_while_moving"
    }

    fn check(&self, state: &BankSnapshot) -> InvariantResult {
        match state.elevators.iter().find(|e| e.doors_open && e.moving) {
            Some(elevator) => Err(InvariantViolation {
                invariant: self.name(),
                message: format!(
                    "elevator {} moving towards {} with doors open at floor {}",
                    elevator.id, elevator.destination, elevator.floor
                ),
            }),
            None => Ok(()),
        }
    }
}

/// No elevator holds more riders than its capacity.
pub struct OccupancyWithinCapacity;

impl Invariant for OccupancyWithinCapacity {
    fn name(&self) -> &'static str {
        "occupancy_within_capacity"
    }

    fn check(&self, state: &BankSnapshot) -> InvariantResult {
        for elevator in &state.elevators {
            if elevator.occupants.len() > state.capacity {
                return Err(InvariantViolation {
                    invariant: self.name(),
                    message: format!(
                        "elevator {} holds {} riders, capacity {}",
                        elevator.id,
                        elevator.occupants.len(),
                        state.capacity
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Every floor in the snapshot exists in the building.
pub struct FloorsInRange;

impl Invariant for FloorsInRange {
    fn name(&self) -> &'static str {
        "floors_in_range"
    }

    fn check(&self, state: &BankSnapshot) -> InvariantResult {
        let limit = state.num_floors;
        for elevator in &state.elevators {
            if elevator.floor >= limit || elevator.destination >= limit {
                return Err(InvariantViolation {
                    invariant: self.name(),
                    message: format!(
                        "elevator {} at {} heading to {}, building has {limit} floors",
                        elevator.id, elevator.floor, elevator.destination
                    ),
                });
            }
        }
        for rider in &state.riders {
            if rider.floor >= limit {
                return Err(InvariantViolation {
                    invariant: self.name(),
                    message: format!(
                        "rider {} at floor {}, building has {limit} floors",
                        rider.id, rider.floor
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Each rider is in exactly one place.
///
/// A riding rider is listed by its elevator exactly once and by no other;
/// a rider on a floor is listed by no elevator.
pub struct SingleLocus;

impl Invariant for SingleLocus {
    fn name(&self) -> &'static str {
        "single_locus"
    }

    fn check(&self, state: &BankSnapshot) -> InvariantResult {
        for rider in &state.riders {
            let listed_by: Vec<_> = state
                .elevators
                .iter()
                .flat_map(|e| e.occupants.iter().filter(|r| **r == rider.id).map(|_| e.id))
                .collect();

            let expected = match rider.locus {
                Locus::InElevator(elevator) => vec![elevator],
                Locus::OnFloor(_) => Vec::new(),
            };

            if listed_by != expected {
                return Err(InvariantViolation {
                    invariant: self.name(),
                    message: format!(
                        "rider {} is {:?} but listed by elevators {listed_by:?}",
                        rider.id, rider.locus
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Riders inside an elevator are at that elevator's floor.
pub struct OccupantsFollowElevator;

impl Invariant for OccupantsFollowElevator {
    fn name(&self) -> &'static str {
        "occupants_follow_elevator"
    }

    fn check(&self, state: &BankSnapshot) -> InvariantResult {
        for rider in &state.riders {
            let Locus::InElevator(index) = rider.locus else {
                continue;
            };
            let Some(elevator) = state.elevators.get(index) else {
                return Err(InvariantViolation {
                    invariant: self.name(),
                    message: format!("rider {} inside missing elevator {index}", rider.id),
                });
            };
            if rider.floor != elevator.floor {
                return Err(InvariantViolation {
                    invariant: self.name(),
                    message: format!(
                        "rider {} at floor {} but elevator {index} at floor {}",
                        rider.id, rider.floor, elevator.floor
                    ),
                });
            }
        }
        Ok(())
    }
}
