//! Rider that rides to each of its stops in turn.

use std::collections::VecDeque;

use futures::future::{self, FutureExt, LocalBoxFuture};
use liftbank_core::{
    ControlResult, Direction, ElevatorId, Floor, Refusal, Rider, RiderControls, RiderEvent,
    RiderEventKind,
};
use tracing::{debug, trace, warn};

/// Reference rider script.
///
/// Calls an elevator in the direction of its next stop, boards any car
/// showing that direction (or no direction), presses the stop's button and
/// gets off when the doors open there. Consecutive stops must differ.
#[derive(Default)]
pub struct ScriptedRider {
    controls: Option<RiderControls>,
    stops: Vec<Floor>,
}

impl ScriptedRider {
    /// Uninitialized rider.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rider for ScriptedRider {
    fn initialize(&mut self, controls: RiderControls, stops: &[Floor]) {
        self.controls = Some(controls);
        self.stops = stops.to_vec();
    }

    fn run(self: Box<Self>) -> LocalBoxFuture<'static, ()> {
        let Self { controls, stops } = *self;
        let Some(controls) = controls else {
            warn!("scripted rider run without initialize");
            return future::ready(()).boxed_local();
        };
        Journey { controls, stops: stops.into(), leg: None }.run().boxed_local()
    }
}

#[derive(Debug, Clone, Copy)]
enum Leg {
    Waiting { target: Floor },
    Riding { target: Floor, elevator: ElevatorId },
}

struct Journey {
    controls: RiderControls,
    stops: VecDeque<Floor>,
    leg: Option<Leg>,
}

impl Journey {
    async fn run(mut self) {
        let rider = self.controls.id();
        if let Err(error) = self.next_leg() {
            warn!(rider, %error, "rider stopped");
            return;
        }

        while self.leg.is_some() {
            self.controls.wait_for_events().await;

            let mut handled = false;
            while let Some(event) = self.controls.next_event() {
                handled = true;
                if let Err(error) = self.handle(event) {
                    warn!(rider, %error, "rider stopped");
                    return;
                }
                if self.leg.is_none() {
                    break;
                }
            }
            if !handled {
                debug!(rider, "notifications closed");
                return;
            }
        }

        if let Err(error) = self.controls.finish() {
            warn!(rider, %error, "rider could not finish");
        }
    }

    /// Head for the next stop, or mark the journey complete.
    fn next_leg(&mut self) -> ControlResult<()> {
        match self.stops.pop_front() {
            Some(target) => {
                self.leg = Some(Leg::Waiting { target });
                self.call(target)
            },
            None => {
                self.leg = None;
                Ok(())
            },
        }
    }

    /// Get into a car heading for `target`: board one standing open here,
    /// or press the hall button and wait.
    fn call(&mut self, target: Floor) -> ControlResult<()> {
        let direction = Direction::between(self.controls.floor(), target);
        if self.board_any(direction, target)? {
            return Ok(());
        }

        match self.controls.press_direction_button(direction) {
            Ok(()) => Ok(()),
            // The car serving this call is full; its doors closing prompts
            // another call
            Err(error) if !error.is_fatal() => {
                trace!(rider = self.controls.id(), %error, "hall call refused");
                Ok(())
            },
            Err(error) => Err(error),
        }
    }

    fn board_any(&mut self, direction: Direction, target: Floor) -> ControlResult<bool> {
        for elevator in 0..self.controls.num_elevators() {
            let display = self.controls.direction_display(elevator)?;
            if (display == direction || display == Direction::Neither)
                && self.board(elevator, target)?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn board(&mut self, elevator: ElevatorId, target: Floor) -> ControlResult<bool> {
        match self.controls.enter_elevator(elevator) {
            Ok(()) => {
                debug!(rider = self.controls.id(), elevator, target, "boarded");
                self.leg = Some(Leg::Riding { target, elevator });
                self.request(target)?;
                Ok(true)
            },
            Err(error) if error.is_fatal() => Err(error),
            Err(_) => Ok(false),
        }
    }

    fn request(&mut self, target: Floor) -> ControlResult<()> {
        match self.controls.press_floor_button(target) {
            Ok(()) => Ok(()),
            Err(error) if error.refusal() == Some(Refusal::AlreadyServed { floor: target }) => {
                self.alight(target)
            },
            Err(error) if error.is_fatal() => Err(error),
            Err(_) => Ok(()),
        }
    }

    fn alight(&mut self, target: Floor) -> ControlResult<()> {
        match self.controls.exit_elevator(target) {
            Ok(()) => {
                debug!(rider = self.controls.id(), floor = target, "alighted");
                self.next_leg()
            },
            Err(error) if error.is_fatal() => Err(error),
            // Missed the stop; ask for it again
            Err(_) => self.request(target),
        }
    }

    fn handle(&mut self, event: RiderEvent) -> ControlResult<()> {
        let Some(leg) = self.leg else {
            return Ok(());
        };

        match leg {
            Leg::Waiting { target } => {
                if event.floor != self.controls.floor() {
                    return Ok(());
                }
                match event.kind {
                    RiderEventKind::DoorsOpened | RiderEventKind::DirectionChanged => {
                        let wanted = Direction::between(event.floor, target);
                        match event.elevator {
                            Some(elevator)
                                if event.direction == wanted
                                    || event.direction == Direction::Neither =>
                            {
                                self.board(elevator, target).map(|_| ())
                            },
                            _ => Ok(()),
                        }
                    },
                    RiderEventKind::DoorsClosed => self.call(target),
                }
            },
            Leg::Riding { target, elevator } => {
                let here = event.kind == RiderEventKind::DoorsOpened
                    && event.elevator == Some(elevator)
                    && event.floor == target;
                if here { self.alight(target) } else { Ok(()) }
            },
        }
    }
}
