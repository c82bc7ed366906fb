//! Facades handed to the controller and to each rider.
//!
//! A facade is the only way an actor touches the simulation. Every call
//! borrows the shared world for its own duration and returns; nothing is
//! held across an `.await`. Events are pulled with `next_event` after
//! `wait_for_events` resolves.

use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use futures::{FutureExt, channel::oneshot};

use crate::{
    delivery::Notifications,
    error::ControlResult,
    event::{ControllerEvent, RiderEvent},
    rider::RiderState,
    types::{Direction, ElevatorId, Floor, RiderId, Tick},
    world::World,
};

/// Future returned by `sleep`; resolves once the virtual clock reaches the
/// wakeup tick.
#[derive(Debug)]
pub struct Sleep {
    receiver: oneshot::Receiver<()>,
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        // A cancelled timer means the run was torn down; wake up regardless
        self.receiver.poll_unpin(cx).map(|_| ())
    }
}

/// The controller's view of the bank.
pub struct ControllerControls {
    world: Rc<RefCell<World>>,
    notifications: Notifications,
}

impl ControllerControls {
    pub(crate) fn new(world: Rc<RefCell<World>>, notifications: Notifications) -> Self {
        Self { world, notifications }
    }

    /// Number of floors in the building.
    pub fn num_floors(&self) -> usize {
        self.world.borrow().num_floors()
    }

    /// Number of elevators in the bank.
    pub fn num_elevators(&self) -> usize {
        self.world.borrow().num_elevators()
    }

    /// Current virtual time.
    pub fn now(&self) -> Tick {
        self.world.borrow().now()
    }

    /// Open an elevator's doors. Returns the floor they opened at.
    ///
    /// Riders on that floor and inside the elevator are told.
    pub fn open_doors(&self, elevator: ElevatorId) -> ControlResult<Floor> {
        self.world.borrow_mut().open_doors(elevator)
    }

    /// Close an elevator's doors.
    pub fn close_doors(&self, elevator: ElevatorId) -> ControlResult<()> {
        self.world.borrow_mut().close_doors(elevator)
    }

    /// Send an elevator to `floor`, or redirect it while moving.
    ///
    /// The controller gets `ElevatorArrived` when it stops.
    pub fn move_to(&self, floor: Floor, elevator: ElevatorId) -> ControlResult<()> {
        self.world.borrow_mut().move_to(floor, elevator)
    }

    /// Last floor an elevator reached.
    pub fn floor(&self, elevator: ElevatorId) -> ControlResult<Floor> {
        self.world.borrow_mut().elevator_floor(elevator)
    }

    /// Set an elevator's direction display.
    pub fn set_direction_display(
        &self,
        elevator: ElevatorId,
        direction: Direction,
    ) -> ControlResult<()> {
        self.world.borrow_mut().set_direction_display(elevator, direction)
    }

    /// Take the oldest queued event.
    pub fn next_event(&self) -> Option<ControllerEvent> {
        self.world.borrow_mut().next_controller_event()
    }

    /// Resolve once the event queue is non-empty.
    ///
    /// Returns immediately if events are already queued.
    pub async fn wait_for_events(&mut self) {
        loop {
            if self.world.borrow().controller_has_events() {
                return;
            }
            if !self.notifications.wait().await {
                return;
            }
        }
    }

    /// Resolve `ticks` virtual ticks from now.
    pub fn sleep(&self, ticks: Tick) -> Sleep {
        Sleep { receiver: self.world.borrow_mut().schedule_timer(ticks) }
    }

    /// Report that the controller is done. No further events are delivered.
    pub fn finish(self) -> ControlResult<()> {
        self.world.borrow_mut().finish_controller()
    }
}

/// One rider's view of the bank.
pub struct RiderControls {
    world: Rc<RefCell<World>>,
    id: RiderId,
    notifications: Notifications,
}

impl RiderControls {
    pub(crate) fn new(
        world: Rc<RefCell<World>>,
        id: RiderId,
        notifications: Notifications,
    ) -> Self {
        Self { world, id, notifications }
    }

    /// This rider's index.
    pub fn id(&self) -> RiderId {
        self.id
    }

    /// Number of floors in the building.
    pub fn num_floors(&self) -> usize {
        self.world.borrow().num_floors()
    }

    /// Number of elevators in the bank.
    pub fn num_elevators(&self) -> usize {
        self.world.borrow().num_elevators()
    }

    /// Current virtual time.
    pub fn now(&self) -> Tick {
        self.world.borrow().now()
    }

    /// Floor the rider is on, or the floor its elevator last reached.
    pub fn floor(&self) -> Floor {
        self.world.borrow().rider(self.id).map_or(0, RiderState::floor)
    }

    /// Floors the rider has left elevators at so far.
    pub fn floors(&self) -> Vec<Floor> {
        self.world.borrow().rider(self.id).map(|r| r.floors().to_vec()).unwrap_or_default()
    }

    /// Elevator the rider is in, if any.
    pub fn elevator(&self) -> Option<ElevatorId> {
        self.world.borrow().rider(self.id).and_then(RiderState::elevator)
    }

    /// Direction display of an elevator.
    pub fn direction_display(&self, elevator: ElevatorId) -> ControlResult<Direction> {
        self.world.borrow_mut().direction_display(elevator)
    }

    /// Press the hall button for `direction` on the rider's floor.
    pub fn press_direction_button(&self, direction: Direction) -> ControlResult<()> {
        self.world.borrow_mut().press_direction_button(self.id, direction)
    }

    /// Press the up hall button.
    pub fn press_up_button(&self) -> ControlResult<()> {
        self.press_direction_button(Direction::Up)
    }

    /// Press the down hall button.
    pub fn press_down_button(&self) -> ControlResult<()> {
        self.press_direction_button(Direction::Down)
    }

    /// Board an elevator standing open at the rider's floor.
    pub fn enter_elevator(&self, elevator: ElevatorId) -> ControlResult<()> {
        self.world.borrow_mut().enter_elevator(self.id, elevator)
    }

    /// Press a floor button inside the rider's elevator.
    pub fn press_floor_button(&self, floor: Floor) -> ControlResult<()> {
        self.world.borrow_mut().press_floor_button(self.id, floor)
    }

    /// Leave the elevator at `floor`.
    pub fn exit_elevator(&self, floor: Floor) -> ControlResult<()> {
        self.world.borrow_mut().exit_elevator(self.id, floor)
    }

    /// Take the oldest queued event.
    pub fn next_event(&self) -> Option<RiderEvent> {
        self.world.borrow_mut().next_rider_event(self.id)
    }

    /// Resolve once the event queue is non-empty.
    ///
    /// Returns immediately if events are already queued.
    pub async fn wait_for_events(&mut self) {
        loop {
            if self.world.borrow().rider_has_events(self.id) {
                return;
            }
            if !self.notifications.wait().await {
                return;
            }
        }
    }

    /// Resolve `ticks` virtual ticks from now.
    pub fn sleep(&self, ticks: Tick) -> Sleep {
        Sleep { receiver: self.world.borrow_mut().schedule_timer(ticks) }
    }

    /// Report that the rider is done.
    ///
    /// The floors it left elevators at must equal its stops exactly, or the
    /// run is aborted with `Violation::StopsMismatch`.
    pub fn finish(self) -> ControlResult<()> {
        self.world.borrow_mut().finish_rider(self.id)
    }
}
