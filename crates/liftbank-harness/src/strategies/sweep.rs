//! Sweep dispatch: each car keeps travelling in its heading while it has
//! work there, and idle cars pick up the nearest unclaimed hall call.

use std::collections::BTreeSet;

use futures::future::{self, FutureExt, LocalBoxFuture};
use liftbank_core::{
    ControlError, ControlResult, Controller, ControllerControls, ControllerEventKind, Direction,
    ElevatorId, Floor, Refusal, Tick,
};
use tracing::{debug, trace, warn};

/// Ticks a car stands open before closing its doors.
pub const DEFAULT_DWELL: Tick = 20;

/// Reference controller used by scenarios and the simulator.
pub struct SweepController {
    controls: Option<ControllerControls>,
    dwell: Tick,
}

impl Default for SweepController {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepController {
    /// Controller with [`DEFAULT_DWELL`].
    pub fn new() -> Self {
        Self { controls: None, dwell: DEFAULT_DWELL }
    }

    /// Set how long doors stay open. Must exceed the bank's notify delay
    /// for riders to get in.
    #[must_use]
    pub fn with_dwell(mut self, dwell: Tick) -> Self {
        self.dwell = dwell.max(1);
        self
    }
}

impl Controller for SweepController {
    fn initialize(&mut self, controls: ControllerControls) {
        self.controls = Some(controls);
    }

    fn run(self: Box<Self>) -> LocalBoxFuture<'static, ()> {
        let Self { controls, dwell } = *self;
        let Some(controls) = controls else {
            warn!("sweep controller run without initialize");
            return future::ready(()).boxed_local();
        };
        let cars = (0..controls.num_elevators()).map(|_| Car::default()).collect();
        let dispatcher = Dispatcher {
            controls,
            dwell,
            cars,
            up_calls: BTreeSet::new(),
            down_calls: BTreeSet::new(),
        };
        dispatcher.run().boxed_local()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Moving { target: Floor },
    Dwelling { until: Tick },
}

#[derive(Debug)]
struct Car {
    phase: Phase,
    heading: Direction,
    /// Last floor the car stood at; stale while moving.
    floor: Floor,
    requests: BTreeSet<Floor>,
}

impl Default for Car {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            heading: Direction::Neither,
            floor: 0,
            requests: BTreeSet::new(),
        }
    }
}

impl Car {
    /// Request to head for next: the nearest one ahead, else the nearest.
    fn next_request(&self, floor: Floor) -> Option<Floor> {
        let ahead = self
            .requests
            .iter()
            .copied()
            .filter(|r| Direction::between(floor, *r) == self.heading)
            .min_by_key(|r| r.abs_diff(floor));
        ahead.or_else(|| self.requests.iter().copied().min_by_key(|r| (r.abs_diff(floor), *r)))
    }
}

struct Dispatcher {
    controls: ControllerControls,
    dwell: Tick,
    cars: Vec<Car>,
    up_calls: BTreeSet<Floor>,
    down_calls: BTreeSet<Floor>,
}

impl Dispatcher {
    async fn run(mut self) {
        loop {
            let mut arrivals = Vec::new();
            while let Some(event) = self.controls.next_event() {
                trace!(
                    kind = ?event.kind,
                    floor = event.floor,
                    elevator = ?event.elevator,
                    "controller event"
                );
                match event.kind {
                    ControllerEventKind::ElevatorArrived => {
                        if let Some(elevator) = event.elevator {
                            arrivals.push((elevator, event.floor));
                        }
                    },
                    ControllerEventKind::UpButtonPressed => {
                        self.up_calls.insert(event.floor);
                    },
                    ControllerEventKind::DownButtonPressed => {
                        self.down_calls.insert(event.floor);
                    },
                    ControllerEventKind::FloorButtonPressed => {
                        if let Some(car) = event.elevator.and_then(|e| self.cars.get_mut(e)) {
                            car.requests.insert(event.floor);
                        }
                    },
                    ControllerEventKind::RidersDone => {
                        if let Err(error) = self.controls.finish() {
                            warn!(%error, "controller could not finish");
                        }
                        return;
                    },
                }
            }

            if let Err(error) = self.step(arrivals) {
                warn!(%error, "controller stopped");
                return;
            }
            self.idle().await;
        }
    }

    /// React to everything learned in one wakeup. Arrivals are handled
    /// before any other decision so no car is mistaken for moving.
    fn step(&mut self, arrivals: Vec<(ElevatorId, Floor)>) -> ControlResult<()> {
        for (elevator, floor) in arrivals {
            self.serve(elevator, floor)?;
        }

        let now = self.controls.now();
        for elevator in 0..self.cars.len() {
            if let Phase::Dwelling { until } = self.cars[elevator].phase
                && now >= until
            {
                self.controls.close_doors(elevator)?;
                self.cars[elevator].phase = Phase::Idle;
            }
        }

        for elevator in 0..self.cars.len() {
            if let Phase::Moving { target } = self.cars[elevator].phase {
                self.redirect(elevator, target)?;
            }
        }

        for elevator in 0..self.cars.len() {
            if self.cars[elevator].phase == Phase::Idle {
                self.dispatch(elevator)?;
            }
        }
        Ok(())
    }

    /// Stop at `floor`: show where the car goes next and open up.
    fn serve(&mut self, elevator: ElevatorId, floor: Floor) -> ControlResult<()> {
        let shown = {
            let car = &mut self.cars[elevator];
            car.floor = floor;
            car.requests.remove(&floor);
            match car.next_request(floor) {
                Some(request) => Direction::between(floor, request),
                None => {
                    match (self.up_calls.contains(&floor), self.down_calls.contains(&floor)) {
                        (true, true) if car.heading == Direction::Down => Direction::Down,
                        (true, _) => Direction::Up,
                        (false, true) => Direction::Down,
                        (false, false) => Direction::Neither,
                    }
                },
            }
        };

        self.controls.set_direction_display(elevator, shown)?;
        self.controls.open_doors(elevator)?;
        match shown {
            Direction::Up => {
                self.up_calls.remove(&floor);
            },
            Direction::Down => {
                self.down_calls.remove(&floor);
            },
            Direction::Neither => {},
        }

        let until = self.controls.now().saturating_add(self.dwell);
        let car = &mut self.cars[elevator];
        if shown != Direction::Neither {
            car.heading = shown;
        }
        car.phase = Phase::Dwelling { until };
        debug!(elevator, floor, display = %shown, until, "serving floor");
        Ok(())
    }

    /// Pull a moving car in to a nearer stop on its way.
    fn redirect(&mut self, elevator: ElevatorId, target: Floor) -> ControlResult<()> {
        let floor = self.controls.floor(elevator)?;
        let car = &self.cars[elevator];
        let calls = match car.heading {
            Direction::Up => &self.up_calls,
            Direction::Down => &self.down_calls,
            Direction::Neither => return Ok(()),
        };
        let on_the_way = |f: &Floor| match car.heading {
            Direction::Up => *f > floor && *f < target,
            Direction::Down => *f < floor && *f > target,
            Direction::Neither => false,
        };
        let Some(stop) = car
            .requests
            .iter()
            .chain(calls.iter())
            .copied()
            .filter(on_the_way)
            .min_by_key(|f| f.abs_diff(floor))
        else {
            return Ok(());
        };

        match self.controls.move_to(stop, elevator) {
            Ok(()) => {
                debug!(elevator, from = target, to = stop, "redirected");
                self.cars[elevator].phase = Phase::Moving { target: stop };
                Ok(())
            },
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                trace!(elevator, stop, %error, "redirect refused");
                Ok(())
            },
        }
    }

    /// Give an idle car something to do, if there is anything.
    fn dispatch(&mut self, elevator: ElevatorId) -> ControlResult<()> {
        let floor = self.cars[elevator].floor;
        let target = match self.cars[elevator].next_request(floor) {
            Some(request) => Some(request),
            None if self.up_calls.contains(&floor) || self.down_calls.contains(&floor) => {
                Some(floor)
            },
            None => self.nearest_unclaimed_call(elevator, floor),
        };
        let Some(target) = target else {
            return Ok(());
        };
        if target == floor {
            return self.serve(elevator, floor);
        }

        match self.controls.move_to(target, elevator) {
            Ok(()) => {
                debug!(elevator, floor, target, "dispatched");
                let car = &mut self.cars[elevator];
                car.phase = Phase::Moving { target };
                car.heading = Direction::between(floor, target);
                Ok(())
            },
            Err(ControlError::Refused(Refusal::AlreadyAtFloor { .. })) => {
                self.serve(elevator, floor)
            },
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                trace!(elevator, target, %error, "dispatch refused");
                Ok(())
            },
        }
    }

    fn nearest_unclaimed_call(&self, elevator: ElevatorId, floor: Floor) -> Option<Floor> {
        let claimed: BTreeSet<Floor> = self
            .cars
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != elevator)
            .filter_map(|(_, car)| match car.phase {
                Phase::Moving { target } => Some(target),
                Phase::Dwelling { .. } => Some(car.floor),
                Phase::Idle => None,
            })
            .collect();

        self.up_calls
            .union(&self.down_calls)
            .copied()
            .filter(|f| !claimed.contains(f))
            .min_by_key(|f| (f.abs_diff(floor), *f))
    }

    async fn idle(&mut self) {
        let deadline = self
            .cars
            .iter()
            .filter_map(|car| match car.phase {
                Phase::Dwelling { until } => Some(until),
                _ => None,
            })
            .min();

        match deadline {
            Some(until) => {
                let sleep = self.controls.sleep(until.saturating_sub(self.controls.now()));
                let events = Box::pin(self.controls.wait_for_events());
                future::select(events, sleep).await;
            },
            None => self.controls.wait_for_events().await,
        }
    }
}
