//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the bank at a quiescent point.
//! Invariants operate on snapshots rather than live state so a check sees
//! one consistent moment.

use liftbank_core::{BankView, ElevatorId, Floor, Locus, RiderId, Tick};

/// Snapshot of the whole bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankSnapshot {
    /// Virtual time of the snapshot.
    pub now: Tick,
    /// Number of floors.
    pub num_floors: usize,
    /// Capacity of every elevator.
    pub capacity: usize,
    /// Per-elevator state, by index.
    pub elevators: Vec<ElevatorSnapshot>,
    /// Per-rider state, by index.
    pub riders: Vec<RiderSnapshot>,
}

impl BankSnapshot {
    /// Create an empty building with no elevators or riders.
    pub fn empty(num_floors: usize, capacity: usize) -> Self {
        Self { num_floors, capacity, ..Self::default() }
    }

    /// Capture a live view.
    pub fn capture(view: &BankView<'_>) -> Self {
        let elevators = view
            .elevators
            .iter()
            .map(|e| ElevatorSnapshot {
                id: e.id(),
                floor: e.floor(),
                destination: e.destination(),
                doors_open: e.doors_open(),
                moving: e.is_moving(),
                occupants: e.occupants().to_vec(),
            })
            .collect();

        let riders = view
            .riders
            .iter()
            .map(|r| RiderSnapshot {
                id: r.id(),
                floor: r.floor(),
                locus: r.locus(),
                finished: r.is_finished(),
            })
            .collect();

        Self {
            now: view.now,
            num_floors: view.num_floors,
            capacity: view.capacity,
            elevators,
            riders,
        }
    }

    /// Add an elevator snapshot.
    pub fn add_elevator(&mut self, elevator: ElevatorSnapshot) {
        self.elevators.push(elevator);
    }

    /// Add a rider snapshot.
    pub fn add_rider(&mut self, rider: RiderSnapshot) {
        self.riders.push(rider);
    }
}

/// Snapshot of one elevator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElevatorSnapshot {
    /// Elevator index.
    pub id: ElevatorId,
    /// Last floor reached.
    pub floor: Floor,
    /// Floor it travels to.
    pub destination: Floor,
    /// Whether the doors are open.
    pub doors_open: bool,
    /// Whether it is travelling.
    pub moving: bool,
    /// Riders aboard.
    pub occupants: Vec<RiderId>,
}

impl ElevatorSnapshot {
    /// Stationary elevator with closed doors at `floor`.
    pub fn at(id: ElevatorId, floor: Floor) -> Self {
        Self { id, floor, destination: floor, ..Self::default() }
    }

    /// Set occupants.
    #[must_use]
    pub fn with_occupants(mut self, occupants: impl IntoIterator<Item = RiderId>) -> Self {
        self.occupants = occupants.into_iter().collect();
        self
    }
}

/// Snapshot of one rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiderSnapshot {
    /// Rider index.
    pub id: RiderId,
    /// Floor the rider is at (follows its elevator while riding).
    pub floor: Floor,
    /// Floor or elevator the rider is in.
    pub locus: Locus,
    /// Whether the rider has finished.
    pub finished: bool,
}

impl RiderSnapshot {
    /// Rider standing on `floor`.
    pub fn on_floor(id: RiderId, floor: Floor) -> Self {
        Self { id, floor, locus: Locus::OnFloor(floor), finished: false }
    }

    /// Rider inside `elevator`, which is at `floor`.
    pub fn in_elevator(id: RiderId, elevator: ElevatorId, floor: Floor) -> Self {
        Self { id, floor, locus: Locus::InElevator(elevator), finished: false }
    }
}
