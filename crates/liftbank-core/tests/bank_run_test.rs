//! End-to-end runs of the bank with small hand-written strategies.
//!
//! Each test scripts the controller and riders as closures reacting to
//! events, runs the bank, and checks the outcome and what the actors saw.

use std::{cell::RefCell, rc::Rc};

use futures::future::LocalBoxFuture;
use liftbank_core::{
    BankConfig, BankError, ControlError, Controller, ControllerControls, ControllerEvent,
    ControllerEventKind, Direction, ElevatorBank, Floor, Refusal, Renderer, Rider, RiderControls,
    RiderEvent, RiderEventKind, SceneUpdate, Violation,
};

const TICKS: u64 = 100;

type ControllerStart = Box<dyn FnOnce(&ControllerControls)>;
type ControllerReact = Box<dyn FnMut(&ControllerControls, ControllerEvent)>;

/// Controller driven by closures. Finishes on `RidersDone`.
struct TestController {
    controls: Option<ControllerControls>,
    start: ControllerStart,
    react: ControllerReact,
}

impl TestController {
    fn new(
        start: impl FnOnce(&ControllerControls) + 'static,
        react: impl FnMut(&ControllerControls, ControllerEvent) + 'static,
    ) -> Self {
        Self { controls: None, start: Box::new(start), react: Box::new(react) }
    }

    fn passive() -> Self {
        Self::new(|_| {}, |_, _| {})
    }
}

impl Controller for TestController {
    fn initialize(&mut self, controls: ControllerControls) {
        self.controls = Some(controls);
    }

    fn run(self: Box<Self>) -> LocalBoxFuture<'static, ()> {
        let Self { controls, start, mut react } = *self;
        Box::pin(async move {
            let Some(mut controls) = controls else {
                return;
            };
            start(&controls);
            loop {
                controls.wait_for_events().await;
                while let Some(event) = controls.next_event() {
                    if event.kind == ControllerEventKind::RidersDone {
                        let _ = controls.finish();
                        return;
                    }
                    react(&controls, event);
                }
            }
        })
    }
}

type RiderStart = Box<dyn FnOnce(&RiderControls) -> bool>;
type RiderReact = Box<dyn FnMut(&RiderControls, RiderEvent) -> bool>;

/// Rider driven by closures. Either closure returns true to finish.
struct TestRider {
    controls: Option<RiderControls>,
    start: RiderStart,
    react: RiderReact,
}

impl TestRider {
    fn new(
        start: impl FnOnce(&RiderControls) -> bool + 'static,
        react: impl FnMut(&RiderControls, RiderEvent) -> bool + 'static,
    ) -> Self {
        Self { controls: None, start: Box::new(start), react: Box::new(react) }
    }

    /// Finishes without doing anything.
    fn quitter() -> Self {
        Self::new(|_| true, |_, _| true)
    }

    /// Calls an elevator to its floor, rides it to `target`, leaves.
    fn commuter(target: Floor) -> Self {
        Self::new(
            move |controls| {
                let direction = Direction::between(controls.floor(), target);
                controls.press_direction_button(direction).is_err()
            },
            move |controls, event| {
                match (event.kind, controls.elevator(), event.elevator) {
                    (RiderEventKind::DoorsOpened, None, Some(elevator))
                        if controls.enter_elevator(elevator).is_ok() =>
                    {
                        let _ = controls.press_floor_button(target);
                    },
                    (RiderEventKind::DoorsOpened, Some(_), _) if event.floor == target => {
                        return controls.exit_elevator(target).is_ok();
                    },
                    _ => {},
                }
                false
            },
        )
    }
}

impl Rider for TestRider {
    fn initialize(&mut self, controls: RiderControls, _stops: &[Floor]) {
        self.controls = Some(controls);
    }

    fn run(self: Box<Self>) -> LocalBoxFuture<'static, ()> {
        let Self { controls, start, mut react } = *self;
        Box::pin(async move {
            let Some(mut controls) = controls else {
                return;
            };
            if !start(&controls) {
                'outer: loop {
                    controls.wait_for_events().await;
                    while let Some(event) = controls.next_event() {
                        if react(&controls, event) {
                            break 'outer;
                        }
                    }
                }
            }
            let _ = controls.finish();
        })
    }
}

/// Single-elevator controller: open on calls at its floor, travel on floor
/// buttons, open on arrival.
fn shuttle() -> TestController {
    TestController::new(
        |_| {},
        |controls, event| match event.kind {
            ControllerEventKind::UpButtonPressed | ControllerEventKind::DownButtonPressed
                if controls.floor(0) == Ok(event.floor) =>
            {
                let _ = controls.set_direction_display(0, event.call_direction());
                let _ = controls.open_doors(0);
            },
            ControllerEventKind::FloorButtonPressed => {
                let _ = controls.close_doors(0);
                let _ = controls.move_to(event.floor, 0);
            },
            ControllerEventKind::ElevatorArrived => {
                let _ = controls.open_doors(0);
            },
            _ => {},
        },
    )
}

fn bank() -> ElevatorBank {
    ElevatorBank::new(BankConfig::default().with_ticks_per_floor(TICKS))
}

struct Recorder(Rc<RefCell<Vec<SceneUpdate>>>);

impl Renderer for Recorder {
    fn render(&mut self, update: &SceneUpdate) {
        self.0.borrow_mut().push(update.clone());
    }
}

#[test]
fn single_rider_rides_one_floor_up() {
    let mut bank = bank();
    bank.init(1, 2, shuttle()).unwrap();
    let rider = bank.add_rider(TestRider::commuter(1), 0, vec![1]).unwrap();

    let report = bank.run().unwrap();

    assert!(rider.is_finished());
    assert_eq!(rider.floors(), vec![1]);
    assert_eq!(rider.floor(), 1);
    assert_eq!(rider.in_elevator(), None);
    assert_eq!(report.riders, 1);
    // Call, floor button and travel each wait for one notification
    assert!(report.final_tick > TICKS);
    assert!(report.final_tick < 2 * TICKS);
}

#[test]
fn moving_to_current_floor_is_refused() {
    let seen = Rc::new(RefCell::new(None));
    let record = Rc::clone(&seen);

    let mut bank = bank();
    let controller = TestController::new(
        move |controls| {
            *record.borrow_mut() = Some(controls.move_to(0, 0));
        },
        |_, _| {},
    );
    bank.init(1, 3, controller).unwrap();

    bank.run().unwrap();
    let result = seen.borrow_mut().take().unwrap();
    assert_eq!(result, Err(ControlError::Refused(Refusal::AlreadyAtFloor { floor: 0 })));
}

#[test]
fn opening_open_doors_aborts_the_run() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&seen);

    let mut bank = bank();
    let controller = TestController::new(
        move |controls| {
            let mut record = record.borrow_mut();
            record.push(controls.open_doors(0).map(|_| ()));
            record.push(controls.open_doors(0).map(|_| ()));
            record.push(controls.close_doors(0));
        },
        |_, _| {},
    );
    bank.init(1, 2, controller).unwrap();
    bank.add_rider(TestRider::quitter(), 1, vec![]).unwrap();

    let err = bank.run().unwrap_err();
    assert_eq!(err, BankError::Violation(Violation::DoorsAlreadyOpen { elevator: 0 }));
    assert_eq!(
        *seen.borrow(),
        vec![
            Ok(()),
            Err(ControlError::from(Violation::DoorsAlreadyOpen { elevator: 0 })),
            Err(ControlError::from(Violation::RunAborted)),
        ]
    );
}

#[test]
fn simultaneous_hall_calls_are_not_merged() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&seen);

    let mut bank = bank();
    let controller = TestController::new(|_| {}, move |_, event| record.borrow_mut().push(event));
    bank.init(1, 3, controller).unwrap();
    for _ in 0..2 {
        let rider = TestRider::new(|controls| controls.press_up_button().is_ok(), |_, _| true);
        bank.add_rider(rider, 0, vec![]).unwrap();
    }

    let report = bank.run().unwrap();

    let calls = seen.borrow();
    assert_eq!(calls.len(), 2);
    for call in calls.iter() {
        assert_eq!(call.kind, ControllerEventKind::UpButtonPressed);
        assert_eq!(call.floor, 0);
        assert_eq!(call.elevator, None);
    }
    // Two calls and RidersDone
    assert_eq!(report.controller_events, 3);
}

#[test]
fn finishing_off_script_aborts_the_run() {
    let mut bank = bank();
    bank.init(1, 3, TestController::passive()).unwrap();
    bank.add_rider(TestRider::quitter(), 0, vec![2]).unwrap();

    let err = bank.run().unwrap_err();
    assert_eq!(
        err,
        BankError::Violation(Violation::StopsMismatch {
            rider: 0,
            expected: vec![2],
            actual: vec![],
        })
    );
}

#[test]
fn rider_events_arrive_in_posting_order() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&seen);

    let mut bank = bank();
    let controller = TestController::new(
        |controls| {
            let _ = controls.open_doors(0);
            let _ = controls.close_doors(0);
            let _ = controls.set_direction_display(0, Direction::Up);
            let _ = controls.open_doors(0);
            let _ = controls.set_direction_display(0, Direction::Down);
            let _ = controls.close_doors(0);
        },
        |_, _| {},
    );
    bank.init(1, 2, controller).unwrap();
    let rider = TestRider::new(
        |_| false,
        move |_, event| {
            let mut record = record.borrow_mut();
            record.push((event.kind, event.direction));
            record.len() == 5
        },
    );
    bank.add_rider(rider, 0, vec![]).unwrap();

    bank.run().unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![
            (RiderEventKind::DoorsOpened, Direction::Neither),
            (RiderEventKind::DoorsClosed, Direction::Neither),
            (RiderEventKind::DoorsOpened, Direction::Up),
            (RiderEventKind::DirectionChanged, Direction::Down),
            (RiderEventKind::DoorsClosed, Direction::Down),
        ]
    );
}

#[test]
fn redundant_hall_call_is_refused() {
    let seen = Rc::new(RefCell::new(None));
    let record = Rc::clone(&seen);

    let mut bank = bank();
    let controller = TestController::new(
        |controls| {
            let _ = controls.set_direction_display(0, Direction::Up);
            let _ = controls.open_doors(0);
        },
        |_, _| {},
    );
    bank.init(1, 4, controller).unwrap();
    let rider = TestRider::new(
        |_| false,
        move |controls, _| {
            *record.borrow_mut() = Some(controls.press_up_button());
            true
        },
    );
    bank.add_rider(rider, 0, vec![]).unwrap();

    bank.run().unwrap();
    let result = seen.borrow_mut().take().unwrap();
    assert_eq!(result, Err(ControlError::Refused(Refusal::AlreadyServed { floor: 0 })));
}

#[test]
fn ignored_rider_stalls_instead_of_hanging() {
    let mut bank = bank();
    bank.init(1, 3, TestController::passive()).unwrap();
    bank.add_rider(TestRider::commuter(2), 0, vec![2]).unwrap();

    let err = bank.run().unwrap_err();
    assert!(
        matches!(
            &err,
            BankError::Stalled { unfinished_riders, controller_finished: false, .. }
                if unfinished_riders == &[0]
        ),
        "expected a stall, got {err:?}"
    );
}

#[test]
fn renderer_observes_without_changing_the_run() {
    let plain = {
        let mut bank = bank();
        bank.init(1, 3, shuttle()).unwrap();
        bank.add_rider(TestRider::commuter(2), 0, vec![2]).unwrap();
        bank.run().unwrap()
    };

    let log = Rc::new(RefCell::new(Vec::new()));
    let rendered = {
        let mut bank = bank();
        bank.init(1, 3, shuttle()).unwrap();
        bank.add_rider(TestRider::commuter(2), 0, vec![2]).unwrap();
        bank.enable_renderer(Recorder(Rc::clone(&log))).unwrap();
        bank.run().unwrap()
    };

    assert_eq!(plain, rendered);

    let log = log.borrow();
    assert_eq!(
        log.first(),
        Some(&SceneUpdate::Initialized {
            num_floors: 3,
            num_elevators: 1,
            riders_per_floor: vec![1, 0, 0],
        })
    );
    assert!(log.contains(&SceneUpdate::UpButtonPressed { floor: 0 }));
    assert!(log.contains(&SceneUpdate::UpButtonCleared { floor: 0 }));
    assert!(log.contains(&SceneUpdate::RiderEntered { elevator: 0, floor: 0 }));
    assert!(log.contains(&SceneUpdate::ElevatorMoved { elevator: 0, floor: 1 }));
    assert!(log.contains(&SceneUpdate::RiderExited { elevator: 0, floor: 2 }));
}

#[test]
fn riders_move_with_their_elevator() {
    let mut bank = bank();
    bank.init(1, 4, shuttle()).unwrap();
    bank.add_rider(TestRider::commuter(3), 0, vec![3]).unwrap();

    let checked = Rc::new(RefCell::new(0usize));
    let count = Rc::clone(&checked);
    bank.set_inspector(move |view| {
        for rider in view.riders {
            if let Some(elevator) = rider.elevator() {
                assert_eq!(rider.floor(), view.elevators[elevator].floor());
                *count.borrow_mut() += 1;
            }
        }
        for elevator in view.elevators {
            assert!(!(elevator.doors_open() && elevator.is_moving()));
        }
    })
    .unwrap();

    bank.run().unwrap();
    assert!(*checked.borrow() > 0);
}
