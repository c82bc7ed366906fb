//! Fuzz target for the elevator state machine
//!
//! Drive the real elevator and the reference model through the same
//! operation sequence and compare them after every step.
//!
//! # Invariants
//!
//! - Same outcome (ok, refused, violation) for every operation
//! - Same observable state after every operation
//! - Doors never open while moving
//! - Occupancy never exceeds capacity

#![no_main]

use libfuzzer_sys::fuzz_target;
use liftbank_harness::{ElevatorOp, ElevatorUnderTest, MODEL_CAPACITY, ModelElevator};

fuzz_target!(|ops: Vec<ElevatorOp>| {
    let mut model = ModelElevator::new();
    let mut real = ElevatorUnderTest::new();

    for (i, op) in ops.iter().enumerate() {
        let expected = model.apply(op);
        let actual = real.apply(op);
        assert_eq!(expected, actual, "outcome divergence at {i}: {op:?}");

        let state = real.observable();
        assert_eq!(model.observable(), state, "state divergence at {i}: {op:?}");
        assert!(!(state.doors_open && state.moving), "doors open while moving at {i}");
        assert!(state.occupants.len() <= MODEL_CAPACITY, "over capacity at {i}");
    }
});
