//! Shared simulation state and the command handlers behind the facades.
//!
//! One `World` per run, owned through `Rc<RefCell<_>>` by the orchestrator
//! and every facade. Each handler runs to completion inside a single borrow:
//! validate, mutate, render, post events, schedule wakeups. The first
//! violation any handler sees poisons the world and every later command is
//! rejected with [`Violation::RunAborted`].

use futures::channel::oneshot;

use crate::{
    clock::VirtualClock,
    config::BankConfig,
    delivery::{self, ControllerMailbox, Notifications, Notifier},
    elevator::{Elevator, MoveOutcome, Step},
    error::{ControlError, ControlResult, Violation},
    event::{ControllerEvent, ControllerEventKind, RiderEvent, RiderEventKind},
    render::{Renderer, SceneUpdate},
    rider::RiderState,
    types::{Direction, ElevatorId, Floor, RiderId, Tick},
};

/// Item on the bank clock.
#[derive(Debug)]
pub(crate) enum Wakeup {
    /// An elevator's next step is due
    ElevatorStep(ElevatorId),
    /// Tell a rider its queue is non-empty
    NotifyRider(RiderId),
    /// Tell the controller its queue is non-empty
    NotifyController,
    /// An actor's sleep expired
    Timer(oneshot::Sender<()>),
}

/// Activity counters for the run report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub(crate) wakeups: u64,
    pub(crate) rider_events: usize,
    pub(crate) controller_events: usize,
}

/// Read-only view of the bank at a quiescent point.
#[derive(Debug, Clone, Copy)]
pub struct BankView<'a> {
    /// Current virtual time
    pub now: Tick,
    /// Number of floors
    pub num_floors: usize,
    /// Capacity of every elevator
    pub capacity: usize,
    /// Elevators, by index
    pub elevators: &'a [Elevator],
    /// Riders, by index
    pub riders: &'a [RiderState],
    /// Controller events not yet drained
    pub controller_pending: usize,
}

pub(crate) struct World {
    config: BankConfig,
    num_floors: usize,
    elevators: Vec<Elevator>,
    riders: Vec<RiderState>,
    rider_notifiers: Vec<Option<Notifier>>,
    controller: ControllerMailbox,
    clock: VirtualClock<Wakeup>,
    renderer: Option<Box<dyn Renderer>>,
    fault: Option<Violation>,
    counters: Counters,
}

impl World {
    pub(crate) fn new(config: BankConfig, num_elevators: usize, num_floors: usize) -> Self {
        let elevators = (0..num_elevators).map(|e| Elevator::new(e, 0, config.capacity)).collect();
        Self {
            config,
            num_floors,
            elevators,
            riders: Vec::new(),
            rider_notifiers: Vec::new(),
            controller: ControllerMailbox::new(),
            clock: VirtualClock::new(),
            renderer: None,
            fault: None,
            counters: Counters::default(),
        }
    }

    pub(crate) fn num_floors(&self) -> usize {
        self.num_floors
    }

    pub(crate) fn num_elevators(&self) -> usize {
        self.elevators.len()
    }

    pub(crate) fn num_riders(&self) -> usize {
        self.riders.len()
    }

    pub(crate) fn now(&self) -> Tick {
        self.clock.now()
    }

    pub(crate) fn counters(&self) -> Counters {
        self.counters
    }

    pub(crate) fn fault(&self) -> Option<&Violation> {
        self.fault.as_ref()
    }

    pub(crate) fn rider(&self, rider: RiderId) -> Option<&RiderState> {
        self.riders.get(rider)
    }

    pub(crate) fn view(&self) -> BankView<'_> {
        BankView {
            now: self.clock.now(),
            num_floors: self.num_floors,
            capacity: self.config.capacity,
            elevators: &self.elevators,
            riders: &self.riders,
            controller_pending: self.controller.len(),
        }
    }

    // Setup

    pub(crate) fn add_rider(&mut self, floor: Floor, stops: Vec<Floor>) -> RiderId {
        let id = self.riders.len();
        self.riders.push(RiderState::new(id, floor, stops));
        self.rider_notifiers.push(None);
        id
    }

    pub(crate) fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = Some(renderer);
    }

    pub(crate) fn connect_rider(&mut self, rider: RiderId) -> Notifications {
        let (notifier, notifications) = delivery::channel();
        if let Some(slot) = self.rider_notifiers.get_mut(rider) {
            *slot = Some(notifier);
        }
        notifications
    }

    pub(crate) fn connect_controller(&mut self) -> Notifications {
        self.controller.connect()
    }

    /// Render the starting scene.
    pub(crate) fn render_initial(&mut self) {
        let mut riders_per_floor = vec![0; self.num_floors];
        for rider in &self.riders {
            if let Some(count) = riders_per_floor.get_mut(rider.floor()) {
                *count += 1;
            }
        }
        self.render(SceneUpdate::Initialized {
            num_floors: self.num_floors,
            num_elevators: self.elevators.len(),
            riders_per_floor,
        });
    }

    // Progress

    pub(crate) fn all_riders_finished(&self) -> bool {
        self.riders.iter().all(RiderState::is_finished)
    }

    pub(crate) fn unfinished_riders(&self) -> Vec<RiderId> {
        self.riders.iter().filter(|r| !r.is_finished()).map(RiderState::id).collect()
    }

    pub(crate) fn controller_finished(&self) -> bool {
        self.controller.is_finished()
    }

    pub(crate) fn post_riders_done(&mut self) {
        tracing::debug!(now = self.now(), "all riders finished");
        self.post_controller_event(ControllerEvent::riders_done(), true);
    }

    /// Advance the clock to the next due tick and fire everything due.
    ///
    /// Returns false if nothing was scheduled.
    pub(crate) fn fire_next_batch(&mut self) -> bool {
        let Some((_, batch)) = self.clock.next_batch() else {
            return false;
        };
        for wakeup in batch {
            self.fire(wakeup);
        }
        true
    }

    fn fire(&mut self, wakeup: Wakeup) {
        self.counters.wakeups += 1;
        match wakeup {
            Wakeup::ElevatorStep(elevator) => self.step_elevator(elevator),
            Wakeup::NotifyRider(rider) => self.notify_rider(rider),
            Wakeup::NotifyController => {
                self.controller.notify();
            },
            Wakeup::Timer(sender) => {
                if sender.send(()).is_err() {
                    tracing::trace!("timer fired for a dropped sleeper");
                }
            },
        }
    }

    fn step_elevator(&mut self, elevator: ElevatorId) {
        let now = self.clock.now();
        let ticks_per_floor = self.config.ticks_per_floor;
        let Some(car) = self.elevators.get_mut(elevator) else {
            return;
        };
        let previous = car.floor();
        let Some(step) = car.advance_if_due(now, ticks_per_floor) else {
            return;
        };

        let floor = step.floor();
        for &rider in self.elevators[elevator].occupants() {
            self.riders[rider].ride_to(floor);
        }
        if floor != previous {
            self.render(SceneUpdate::ElevatorMoved { elevator, floor });
        }

        match step {
            Step::Passed { next_arrival, .. } => {
                tracing::trace!(elevator, floor, next_arrival, "elevator passed floor");
                self.clock.schedule_at(next_arrival, Wakeup::ElevatorStep(elevator));
            },
            Step::Arrived { floor } => {
                tracing::debug!(elevator, floor, now, "elevator arrived");
                let kind = ControllerEventKind::ElevatorArrived;
                let event = ControllerEvent::new(kind, floor, Some(elevator));
                self.post_controller_event(event, false);
            },
        }
    }

    fn notify_rider(&mut self, rider: RiderId) {
        let Some(state) = self.riders.get(rider) else {
            return;
        };
        if state.is_finished() || state.pending_events() == 0 {
            return;
        }
        if let Some(Some(notifier)) = self.rider_notifiers.get(rider) {
            notifier.signal();
        }
    }

    // Delivery

    fn post_rider_event(
        &mut self,
        kind: RiderEventKind,
        floor: Floor,
        elevator: Option<ElevatorId>,
    ) {
        let direction = elevator
            .and_then(|e| self.elevators.get(e))
            .map_or(Direction::Neither, Elevator::direction_display);
        let event = RiderEvent { kind, floor, elevator, direction };

        let recipients = delivery::fan_out(&mut self.riders, event);
        let count = recipients.len();
        tracing::debug!(?kind, floor, ?elevator, %direction, recipients = count, "rider event");

        self.counters.rider_events += count;
        for rider in recipients {
            self.clock.schedule_in(self.config.notify_delay, Wakeup::NotifyRider(rider));
        }
    }

    /// Queue a controller event. Delayed posts signal after `notify_delay`,
    /// the rest signal now.
    fn post_controller_event(&mut self, event: ControllerEvent, delayed: bool) {
        if self.controller.is_finished() {
            return;
        }

        tracing::debug!(
            kind = ?event.kind,
            floor = event.floor,
            elevator = ?event.elevator,
            "controller event"
        );
        self.controller.push(event);
        self.counters.controller_events += 1;

        if delayed {
            self.clock.schedule_in(self.config.notify_delay, Wakeup::NotifyController);
        } else {
            self.controller.notify();
        }
    }

    fn render(&mut self, update: SceneUpdate) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render(&update);
        }
    }

    // Validation

    /// Run `op` unless the world is poisoned, and poison it if `op` reports
    /// a violation.
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> ControlResult<T>) -> ControlResult<T> {
        let result = match self.fault {
            Some(_) => Err(Violation::RunAborted.into()),
            None => op(self),
        };
        if let Err(ControlError::Violation(violation)) = &result {
            self.poison(violation);
        }
        result
    }

    fn poison(&mut self, violation: &Violation) {
        if self.fault.is_some() {
            return;
        }
        tracing::error!(now = self.clock.now(), %violation, "invariant violated, aborting run");
        self.fault = Some(violation.clone());
    }

    fn check_elevator(&self, elevator: ElevatorId) -> Result<(), Violation> {
        if elevator >= self.elevators.len() {
            return Err(Violation::NoSuchElevator { elevator, count: self.elevators.len() });
        }
        Ok(())
    }

    fn check_floor(&self, floor: Floor) -> Result<(), Violation> {
        if floor >= self.num_floors {
            return Err(Violation::NoSuchFloor { floor, count: self.num_floors });
        }
        Ok(())
    }

    // Controller commands

    pub(crate) fn open_doors(&mut self, elevator: ElevatorId) -> ControlResult<Floor> {
        self.guarded(|world| {
            world.check_elevator(elevator)?;
            let floor = world.elevators[elevator].open_doors()?;
            let shown = world.elevators[elevator].direction_display();
            tracing::debug!(elevator, floor, display = %shown, "doors opened");

            if let Some(cleared) = SceneUpdate::hall_cleared(floor, shown) {
                world.render(cleared);
            }
            world.render(SceneUpdate::DoorsOpened { elevator });
            world.post_rider_event(RiderEventKind::DoorsOpened, floor, Some(elevator));
            Ok(floor)
        })
    }

    pub(crate) fn close_doors(&mut self, elevator: ElevatorId) -> ControlResult<()> {
        self.guarded(|world| {
            world.check_elevator(elevator)?;
            let floor = world.elevators[elevator].close_doors()?;
            tracing::debug!(elevator, floor, "doors closed");

            world.render(SceneUpdate::DoorsClosed { elevator });
            world.post_rider_event(RiderEventKind::DoorsClosed, floor, Some(elevator));
            Ok(())
        })
    }

    pub(crate) fn move_to(&mut self, floor: Floor, elevator: ElevatorId) -> ControlResult<()> {
        self.guarded(|world| {
            world.check_elevator(elevator)?;
            world.check_floor(floor)?;

            let now = world.clock.now();
            let outcome = world.elevators[elevator].move_to(floor, now, &world.config)?;
            tracing::debug!(elevator, target = floor, ?outcome, "elevator dispatched");

            if let MoveOutcome::Started { arrival } = outcome {
                world.clock.schedule_at(arrival, Wakeup::ElevatorStep(elevator));
            }
            Ok(())
        })
    }

    pub(crate) fn elevator_floor(&mut self, elevator: ElevatorId) -> ControlResult<Floor> {
        self.guarded(|world| {
            world.check_elevator(elevator)?;
            Ok(world.elevators[elevator].floor())
        })
    }

    pub(crate) fn direction_display(&mut self, elevator: ElevatorId) -> ControlResult<Direction> {
        self.guarded(|world| {
            world.check_elevator(elevator)?;
            Ok(world.elevators[elevator].direction_display())
        })
    }

    pub(crate) fn set_direction_display(
        &mut self,
        elevator: ElevatorId,
        direction: Direction,
    ) -> ControlResult<()> {
        self.guarded(|world| {
            world.check_elevator(elevator)?;
            let open = world.elevators[elevator].set_direction_display(direction);
            let floor = world.elevators[elevator].floor();

            if open {
                world.post_rider_event(RiderEventKind::DirectionChanged, floor, Some(elevator));
                if let Some(cleared) = SceneUpdate::hall_cleared(floor, direction) {
                    world.render(cleared);
                }
            }
            world.render(SceneUpdate::DirectionDisplayChanged { elevator, direction });
            Ok(())
        })
    }

    pub(crate) fn next_controller_event(&mut self) -> Option<ControllerEvent> {
        self.controller.pop()
    }

    pub(crate) fn controller_has_events(&self) -> bool {
        !self.controller.is_empty()
    }

    pub(crate) fn finish_controller(&mut self) -> ControlResult<()> {
        self.guarded(|world| {
            tracing::info!(now = world.clock.now(), "controller finished");
            world.controller.finish();
            Ok(())
        })
    }

    // Rider commands

    pub(crate) fn press_direction_button(
        &mut self,
        rider: RiderId,
        direction: Direction,
    ) -> ControlResult<()> {
        self.guarded(|world| {
            let event = world.riders[rider].press_direction_button(
                direction,
                world.num_floors,
                &world.elevators,
            )?;
            tracing::debug!(rider, floor = event.floor, %direction, "hall call");

            let update = if direction == Direction::Down {
                SceneUpdate::DownButtonPressed { floor: event.floor }
            } else {
                SceneUpdate::UpButtonPressed { floor: event.floor }
            };
            world.render(update);
            world.post_controller_event(event, true);
            Ok(())
        })
    }

    pub(crate) fn enter_elevator(
        &mut self,
        rider: RiderId,
        elevator: ElevatorId,
    ) -> ControlResult<()> {
        self.guarded(|world| {
            world.check_elevator(elevator)?;
            world.riders[rider].enter_elevator(&mut world.elevators[elevator])?;
            let floor = world.riders[rider].floor();
            tracing::debug!(rider, elevator, floor, "rider entered");

            world.render(SceneUpdate::RiderEntered { elevator, floor });
            Ok(())
        })
    }

    pub(crate) fn press_floor_button(&mut self, rider: RiderId, floor: Floor) -> ControlResult<()> {
        self.guarded(|world| {
            world.check_floor(floor)?;
            let event = world.riders[rider].press_floor_button(floor, &world.elevators)?;
            tracing::debug!(rider, floor, elevator = ?event.elevator, "floor button");

            if let Some(elevator) = event.elevator {
                world.render(SceneUpdate::FloorButtonPressed { elevator, floor });
            }
            world.post_controller_event(event, true);
            Ok(())
        })
    }

    pub(crate) fn exit_elevator(&mut self, rider: RiderId, floor: Floor) -> ControlResult<()> {
        self.guarded(|world| {
            world.check_floor(floor)?;
            let elevator = world.riders[rider].exit_elevator(floor, &mut world.elevators)?;
            tracing::debug!(rider, elevator, floor, "rider exited");

            world.render(SceneUpdate::RiderExited { elevator, floor });
            Ok(())
        })
    }

    pub(crate) fn next_rider_event(&mut self, rider: RiderId) -> Option<RiderEvent> {
        self.riders.get_mut(rider).and_then(|r| r.events_mut().pop_front())
    }

    pub(crate) fn rider_has_events(&self, rider: RiderId) -> bool {
        self.riders.get(rider).is_some_and(|r| r.pending_events() > 0)
    }

    pub(crate) fn finish_rider(&mut self, rider: RiderId) -> ControlResult<()> {
        self.guarded(|world| {
            world.riders[rider].finish()?;
            let floors = world.riders[rider].floors();
            tracing::info!(rider, now = world.clock.now(), ?floors, "rider finished");
            Ok(())
        })
    }

    // Timers

    pub(crate) fn schedule_timer(&mut self, ticks: Tick) -> oneshot::Receiver<()> {
        let (sender, receiver) = oneshot::channel();
        self.clock.schedule_in(ticks, Wakeup::Timer(sender));
        receiver
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::error::Refusal;

    const TICKS: Tick = 10;

    fn new_world(elevators: usize, floors: usize) -> World {
        World::new(BankConfig::default().with_ticks_per_floor(TICKS), elevators, floors)
    }

    /// Fire batches until the clock is idle.
    fn settle(world: &mut World) {
        while world.fire_next_batch() {}
    }

    struct Recorder(Rc<RefCell<Vec<SceneUpdate>>>);

    impl Renderer for Recorder {
        fn render(&mut self, update: &SceneUpdate) {
            self.0.borrow_mut().push(update.clone());
        }
    }

    #[test]
    fn door_events_reach_floor_riders() {
        let mut world = new_world(1, 3);
        let here = world.add_rider(0, vec![]);
        let elsewhere = world.add_rider(2, vec![]);

        assert_eq!(world.open_doors(0), Ok(0));
        let event = world.next_rider_event(here).unwrap();
        assert_eq!(event.kind, RiderEventKind::DoorsOpened);
        assert_eq!(event.elevator, Some(0));
        assert!(!world.rider_has_events(elsewhere));
    }

    #[test]
    fn travel_carries_occupants_and_reports_arrival() {
        let mut world = new_world(1, 4);
        let rider = world.add_rider(0, vec![3]);
        world.open_doors(0).unwrap();
        world.enter_elevator(rider, 0).unwrap();
        world.close_doors(0).unwrap();
        world.move_to(3, 0).unwrap();

        settle(&mut world);
        assert_eq!(world.now(), 3 * TICKS);
        assert_eq!(world.rider(rider).unwrap().floor(), 3);

        let arrived = std::iter::from_fn(|| world.next_controller_event())
            .find(|e| e.kind == ControllerEventKind::ElevatorArrived)
            .unwrap();
        assert_eq!(arrived.floor, 3);
        assert_eq!(arrived.elevator, Some(0));
    }

    #[test]
    fn display_change_is_announced_only_when_open() {
        let mut world = new_world(1, 3);
        let rider = world.add_rider(0, vec![]);

        world.set_direction_display(0, Direction::Up).unwrap();
        assert!(!world.rider_has_events(rider));

        world.open_doors(0).unwrap();
        world.set_direction_display(0, Direction::Down).unwrap();
        world.next_rider_event(rider);
        let changed = world.next_rider_event(rider).unwrap();
        assert_eq!(changed.kind, RiderEventKind::DirectionChanged);
        assert_eq!(changed.direction, Direction::Down);
    }

    #[test]
    fn refusals_leave_the_world_running() {
        let mut world = new_world(1, 3);
        let err = world.move_to(0, 0).unwrap_err();
        assert_eq!(err.refusal(), Some(Refusal::AlreadyAtFloor { floor: 0 }));
        assert!(world.fault().is_none());
        assert!(world.open_doors(0).is_ok());
    }

    #[test]
    fn first_violation_poisons_the_world() {
        let mut world = new_world(1, 3);
        world.open_doors(0).unwrap();
        let err = world.open_doors(0).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(world.fault(), Some(&Violation::DoorsAlreadyOpen { elevator: 0 }));

        assert_eq!(world.close_doors(0), Err(Violation::RunAborted.into()));
        assert_eq!(world.fault(), Some(&Violation::DoorsAlreadyOpen { elevator: 0 }));
    }

    #[test]
    fn out_of_range_arguments_are_violations() {
        let mut world = new_world(2, 3);
        assert_eq!(
            world.open_doors(2),
            Err(Violation::NoSuchElevator { elevator: 2, count: 2 }.into())
        );

        let mut world = new_world(1, 3);
        assert_eq!(world.move_to(3, 0), Err(Violation::NoSuchFloor { floor: 3, count: 3 }.into()));
    }

    #[test]
    fn open_doors_clears_matching_hall_button() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = new_world(1, 3);
        world.set_renderer(Box::new(Recorder(Rc::clone(&log))));

        world.set_direction_display(0, Direction::Up).unwrap();
        world.open_doors(0).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                SceneUpdate::DirectionDisplayChanged { elevator: 0, direction: Direction::Up },
                SceneUpdate::UpButtonCleared { floor: 0 },
                SceneUpdate::DoorsOpened { elevator: 0 },
            ]
        );
    }

    #[test]
    fn halting_in_place_is_not_rendered_as_a_move() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let config = BankConfig::default()
            .with_ticks_per_floor(TICKS)
            .with_redirect_boundary(crate::config::RedirectBoundary::Inclusive);
        let mut world = World::new(config, 1, 6);
        world.move_to(2, 0).unwrap();
        settle(&mut world);
        world.set_renderer(Box::new(Recorder(Rc::clone(&log))));

        world.move_to(5, 0).unwrap();
        world.move_to(2, 0).unwrap();
        settle(&mut world);

        assert_eq!(world.now(), 3 * TICKS);
        assert!(log.borrow().is_empty(), "unexpected updates: {:?}", log.borrow());
        let arrived = std::iter::from_fn(|| world.next_controller_event())
            .filter(|e| e.kind == ControllerEventKind::ElevatorArrived)
            .last()
            .unwrap();
        assert_eq!(arrived.floor, 2);
    }

    #[test]
    fn timers_fire_at_their_tick() {
        let mut world = new_world(1, 2);
        let mut receiver = world.schedule_timer(25);
        assert_eq!(receiver.try_recv(), Ok(None));

        assert!(world.fire_next_batch());
        assert_eq!(world.now(), 25);
        assert_eq!(receiver.try_recv(), Ok(Some(())));
    }
}
