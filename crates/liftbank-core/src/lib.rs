//! Liftbank core
//!
//! Deterministic discrete-event simulation of a bank of elevators and the
//! riders who use them. The engine owns the physical state and a virtual
//! clock; the dispatch algorithm and the rider scripts are pluggable
//! strategies that act only through facades.
//!
//! # Architecture
//!
//! The elevator and rider state machines are pure: they validate, mutate and
//! report what happened. The world around them turns those reports into
//! scheduled wakeups, queued events and renderer updates. Actors are futures
//! on a single-threaded executor and only the engine advances time, so a
//! given setup always produces the same run.
//!
//! # Components
//!
//! - [`ElevatorBank`]: lifecycle, setup and the run loop
//! - [`Elevator`], [`RiderState`]: the state machines
//! - [`ControllerControls`], [`RiderControls`]: facades handed to actors
//! - [`Controller`], [`Rider`]: strategy traits
//! - [`VirtualClock`]: tick-ordered wakeup queue
//! - [`Renderer`], [`SceneUpdate`]: optional observation of the scene
//!
//! # Errors
//!
//! Facade calls return [`ControlError`]: a [`Refusal`] is ordinary control
//! flow, a [`Violation`] aborts the run.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bank;
mod clock;
mod config;
mod controls;
mod delivery;
mod elevator;
mod error;
mod event;
mod render;
mod rider;
mod strategy;
mod types;
mod world;

pub use bank::{BankState, ElevatorBank, Inspector, RiderHandle, RunReport};
pub use clock::VirtualClock;
pub use config::{
    BankConfig, DEFAULT_CAPACITY, DEFAULT_NOTIFY_DELAY, DEFAULT_TICKS_PER_FLOOR, RedirectBoundary,
};
pub use controls::{ControllerControls, RiderControls, Sleep};
pub use delivery::observes;
pub use elevator::{Elevator, MoveOutcome, Step};
pub use error::{BankError, ControlError, ControlResult, Refusal, Violation};
pub use event::{ControllerEvent, ControllerEventKind, RiderEvent, RiderEventKind};
pub use render::{Renderer, SceneUpdate, TracingRenderer};
pub use rider::RiderState;
pub use strategy::{Controller, Rider};
pub use types::{Direction, ElevatorId, Floor, Locus, RiderId, Tick};
pub use world::BankView;
