//! Reference strategies.
//!
//! Simple, deterministic controller and rider implementations that always
//! complete a run. Scenarios, the simulator and the invariant tests use them
//! to exercise the engine end to end.

mod scripted;
mod sweep;

pub use scripted::ScriptedRider;
pub use sweep::{DEFAULT_DWELL, SweepController};
