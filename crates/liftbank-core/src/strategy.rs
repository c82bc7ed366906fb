//! Pluggable actor behaviour.
//!
//! The bank owns no dispatch policy and no rider script. It calls
//! `initialize` on every actor before anything runs, then spawns each
//! actor's `run` future on the run's executor. A strategy talks to the bank
//! only through the facade it received in `initialize`.

use futures::future::LocalBoxFuture;

use crate::{
    controls::{ControllerControls, RiderControls},
    types::Floor,
};

/// Elevator dispatch algorithm.
pub trait Controller {
    /// Receive the facade. Called once, after every rider is initialized.
    fn initialize(&mut self, controls: ControllerControls);

    /// Drive the elevators until `RidersDone` arrives, then `finish`.
    fn run(self: Box<Self>) -> LocalBoxFuture<'static, ()>;
}

/// Rider script.
pub trait Rider {
    /// Receive the facade and the floors the rider must leave elevators at.
    fn initialize(&mut self, controls: RiderControls, stops: &[Floor]);

    /// Ride to every stop in order, then `finish`.
    fn run(self: Box<Self>) -> LocalBoxFuture<'static, ()>;
}
