//! The elevator bank: lifecycle, setup and the run loop.
//!
//! # Lifecycle
//!
//! ```text
//! Unconfigured ──init──> Configured ──run──> Running ──> Completed
//!                          ▲   │ add_rider                  │
//!                          │   │ enable_renderer            │
//!                          │   │ set_inspector              │
//!                          └───┴──────────── init ──────────┘
//! ```
//!
//! # Run loop
//!
//! Every actor is a future on a single-threaded [`LocalPool`]. The loop runs
//! actors until none can make progress, checks for a violation or
//! completion, shows the inspector the quiescent state, then fires the next
//! batch of due wakeups. Time therefore only moves when every actor is
//! blocked, and a run where nothing is blocked on the clock either has
//! finished or has stalled.

use std::{cell::RefCell, rc::Rc};

use futures::{executor::LocalPool, task::LocalSpawnExt};

use crate::{
    config::BankConfig,
    controls::{ControllerControls, RiderControls},
    error::BankError,
    render::Renderer,
    rider::RiderState,
    strategy::{Controller, Rider},
    types::{ElevatorId, Floor, RiderId, Tick},
    world::{BankView, World},
};

/// Lifecycle state of an [`ElevatorBank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankState {
    /// Created, `init` not yet called
    Unconfigured,
    /// Ready to accept riders and run
    Configured,
    /// Inside `run`
    Running,
    /// A run ended, successfully or not
    Completed,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Virtual time when the controller finished
    pub final_tick: Tick,
    /// Wakeups fired by the clock
    pub wakeups: u64,
    /// Rider events queued, counted per recipient
    pub rider_events: usize,
    /// Controller events queued
    pub controller_events: usize,
    /// Riders that took part
    pub riders: usize,
}

/// Observation hook called at every quiescent point.
pub type Inspector = Box<dyn FnMut(&BankView<'_>)>;

/// Read access to one rider, valid during and after the run.
#[derive(Clone)]
pub struct RiderHandle {
    world: Rc<RefCell<World>>,
    id: RiderId,
}

impl RiderHandle {
    /// Rider index.
    pub fn id(&self) -> RiderId {
        self.id
    }

    /// Current floor.
    pub fn floor(&self) -> Floor {
        self.with(RiderState::floor).unwrap_or_default()
    }

    /// Floors the rider has left elevators at.
    pub fn floors(&self) -> Vec<Floor> {
        self.with(|r| r.floors().to_vec()).unwrap_or_default()
    }

    /// Elevator the rider is in, if any.
    pub fn in_elevator(&self) -> Option<ElevatorId> {
        self.with(RiderState::elevator).flatten()
    }

    /// Whether the rider called `finish` successfully.
    pub fn is_finished(&self) -> bool {
        self.with(RiderState::is_finished).unwrap_or(false)
    }

    fn with<T>(&self, f: impl FnOnce(&RiderState) -> T) -> Option<T> {
        self.world.borrow().rider(self.id).map(f)
    }
}

/// A bank of elevators serving one building.
pub struct ElevatorBank {
    config: BankConfig,
    state: BankState,
    world: Option<Rc<RefCell<World>>>,
    controller: Option<Box<dyn Controller>>,
    riders: Vec<Box<dyn Rider>>,
    inspector: Option<Inspector>,
}

impl Default for ElevatorBank {
    fn default() -> Self {
        Self::new(BankConfig::default())
    }
}

impl ElevatorBank {
    /// Create an unconfigured bank.
    pub fn new(config: BankConfig) -> Self {
        Self {
            config,
            state: BankState::Unconfigured,
            world: None,
            controller: None,
            riders: Vec::new(),
            inspector: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BankState {
        self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// Set up a building with `num_elevators` elevators, all at floor 0,
    /// serving `num_floors` floors.
    ///
    /// Discards any riders, renderer and inspector from a previous setup.
    ///
    /// # Errors
    ///
    /// - `BankError::InvalidState` while running
    /// - `BankError::InvalidSetup` for zero counts or a bad configuration
    pub fn init(
        &mut self,
        num_elevators: usize,
        num_floors: usize,
        controller: impl Controller + 'static,
    ) -> Result<(), BankError> {
        if self.state == BankState::Running {
            return Err(BankError::InvalidState { state: self.state, operation: "init" });
        }
        self.config.validate().map_err(BankError::InvalidSetup)?;
        if num_elevators == 0 {
            return Err(BankError::InvalidSetup("at least one elevator is required".to_string()));
        }
        if num_floors == 0 {
            return Err(BankError::InvalidSetup("at least one floor is required".to_string()));
        }

        self.world =
            Some(Rc::new(RefCell::new(World::new(self.config.clone(), num_elevators, num_floors))));
        self.controller = Some(Box::new(controller));
        self.riders.clear();
        self.inspector = None;
        self.state = BankState::Configured;

        tracing::debug!(num_elevators, num_floors, "bank configured");
        Ok(())
    }

    /// Add a rider starting at `floor` that must leave elevators at `stops`,
    /// in order.
    ///
    /// # Errors
    ///
    /// - `BankError::InvalidState` unless configured
    /// - `BankError::InvalidSetup` if `floor` or a stop is out of range
    pub fn add_rider(
        &mut self,
        rider: impl Rider + 'static,
        floor: Floor,
        stops: Vec<Floor>,
    ) -> Result<RiderHandle, BankError> {
        let world = self.configured("add_rider")?;

        let id = {
            let mut world = world.borrow_mut();
            let num_floors = world.num_floors();
            if floor >= num_floors {
                return Err(BankError::InvalidSetup(format!(
                    "rider floor {floor} outside 0..{num_floors}"
                )));
            }
            if let Some(stop) = stops.iter().find(|s| **s >= num_floors) {
                return Err(BankError::InvalidSetup(format!(
                    "rider stop {stop} outside 0..{num_floors}"
                )));
            }
            world.add_rider(floor, stops)
        };
        let handle = RiderHandle { world: Rc::clone(world), id };

        self.riders.push(Box::new(rider));
        Ok(handle)
    }

    /// Attach a renderer for the next run.
    ///
    /// # Errors
    ///
    /// - `BankError::InvalidState` unless configured
    /// - `BankError::RendererNotAllowed` if the configuration forbids it
    pub fn enable_renderer(&mut self, renderer: impl Renderer + 'static) -> Result<(), BankError> {
        let world = self.configured("enable_renderer")?;
        if !self.config.allow_renderer {
            return Err(BankError::RendererNotAllowed);
        }
        world.borrow_mut().set_renderer(Box::new(renderer));
        Ok(())
    }

    /// Install a hook that sees the bank whenever every actor is blocked.
    ///
    /// # Errors
    ///
    /// - `BankError::InvalidState` unless configured
    pub fn set_inspector(
        &mut self,
        inspector: impl FnMut(&BankView<'_>) + 'static,
    ) -> Result<(), BankError> {
        self.configured("set_inspector")?;
        self.inspector = Some(Box::new(inspector));
        Ok(())
    }

    /// Look at the bank's current state, if `init` has been called.
    pub fn inspect<T>(&self, f: impl FnOnce(&BankView<'_>) -> T) -> Option<T> {
        self.world.as_ref().map(|world| f(&world.borrow().view()))
    }

    /// Run the simulation to completion.
    ///
    /// Initializes every rider and then the controller, starts them all, and
    /// returns once every rider and the controller have finished.
    ///
    /// # Errors
    ///
    /// - `BankError::InvalidState` unless configured
    /// - `BankError::Violation` if any actor violated an invariant
    /// - `BankError::Stalled` if actors remain unfinished with nothing left
    ///   to wake them
    pub fn run(&mut self) -> Result<RunReport, BankError> {
        let world = Rc::clone(self.configured("run")?);
        let Some(controller) = self.controller.take() else {
            return Err(BankError::InvalidState { state: self.state, operation: "run" });
        };
        let riders = std::mem::take(&mut self.riders);

        self.state = BankState::Running;
        let result = self.execute(&world, controller, riders);
        self.state = BankState::Completed;

        match &result {
            Ok(report) => tracing::info!(
                final_tick = report.final_tick,
                wakeups = report.wakeups,
                riders = report.riders,
                "run completed"
            ),
            Err(error) => tracing::warn!(%error, "run failed"),
        }
        result
    }

    fn configured(&self, operation: &'static str) -> Result<&Rc<RefCell<World>>, BankError> {
        match (&self.world, self.state) {
            (Some(world), BankState::Configured) => Ok(world),
            _ => Err(BankError::InvalidState { state: self.state, operation }),
        }
    }

    fn execute(
        &mut self,
        world: &Rc<RefCell<World>>,
        mut controller: Box<dyn Controller>,
        mut riders: Vec<Box<dyn Rider>>,
    ) -> Result<RunReport, BankError> {
        {
            let mut world = world.borrow_mut();
            tracing::info!(
                elevators = world.num_elevators(),
                floors = world.num_floors(),
                riders = world.num_riders(),
                "run started"
            );
            world.render_initial();
        }

        for (id, rider) in riders.iter_mut().enumerate() {
            let (notifications, stops) = {
                let mut world = world.borrow_mut();
                let stops = world.rider(id).map(|r| r.stops().to_vec()).unwrap_or_default();
                (world.connect_rider(id), stops)
            };
            rider.initialize(RiderControls::new(Rc::clone(world), id, notifications), &stops);
        }
        let notifications = world.borrow_mut().connect_controller();
        controller.initialize(ControllerControls::new(Rc::clone(world), notifications));

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        for rider in riders {
            spawner.spawn_local(rider.run())?;
        }
        spawner.spawn_local(controller.run())?;

        self.drive(&mut pool, world, World::all_riders_finished)?;
        world.borrow_mut().post_riders_done();
        self.drive(&mut pool, world, World::controller_finished)?;

        let world = world.borrow();
        let counters = world.counters();
        Ok(RunReport {
            final_tick: world.now(),
            wakeups: counters.wakeups,
            rider_events: counters.rider_events,
            controller_events: counters.controller_events,
            riders: world.num_riders(),
        })
    }

    /// Alternate between running actors and firing wakeups until `done`.
    fn drive(
        &mut self,
        pool: &mut LocalPool,
        world: &Rc<RefCell<World>>,
        done: fn(&World) -> bool,
    ) -> Result<(), BankError> {
        loop {
            pool.run_until_stalled();

            if let Some(violation) = world.borrow().fault() {
                return Err(BankError::Violation(violation.clone()));
            }
            if let Some(inspector) = self.inspector.as_mut() {
                inspector(&world.borrow().view());
            }
            if done(&world.borrow()) {
                return Ok(());
            }

            if !world.borrow_mut().fire_next_batch() {
                let world = world.borrow();
                return Err(BankError::Stalled {
                    tick: world.now(),
                    unfinished_riders: world.unfinished_riders(),
                    controller_finished: world.controller_finished(),
                });
            }
        }
    }
}
