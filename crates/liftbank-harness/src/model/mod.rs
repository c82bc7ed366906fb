//! Model-based testing of the elevator state machine.
//!
//! [`ModelElevator`] is a reference implementation kept independent of the
//! engine. [`ElevatorUnderTest`] drives the real [`liftbank_core::Elevator`]
//! through the same [`ElevatorOp`] sequence so their [`ObservableElevator`]
//! states and [`OpOutcome`]s can be compared step by step.

mod elevator;
mod operation;

pub use elevator::{
    ElevatorUnderTest, MODEL_CAPACITY, MODEL_FLOORS, MODEL_TICKS_PER_FLOOR, ModelElevator,
    ObservableElevator,
};
pub use operation::{ElevatorOp, ModelDirection, OpOutcome};
