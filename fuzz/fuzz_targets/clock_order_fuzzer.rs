//! Fuzz target for the virtual clock
//!
//! Interleave scheduling and firing and check the order items come back in.
//!
//! # Invariants
//!
//! - Time never runs backwards
//! - Every item fires at its (clamped) tick
//! - Items due at the same tick fire in insertion order
//! - Nothing is lost or duplicated

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use liftbank_core::{Tick, VirtualClock};

#[derive(Debug, Clone, Arbitrary)]
enum ClockOp {
    ScheduleAt { at: u16 },
    ScheduleIn { delay: u8 },
    Fire,
}

fuzz_target!(|ops: Vec<ClockOp>| {
    let mut clock: VirtualClock<(usize, Tick)> = VirtualClock::new();
    let mut scheduled = 0usize;
    let mut fired = 0usize;
    let mut last_fired: Option<(Tick, usize)> = None;

    let mut fire = |clock: &mut VirtualClock<(usize, Tick)>, fired: &mut usize| {
        let before = clock.now();
        let Some((at, batch)) = clock.next_batch() else {
            return;
        };
        assert!(at >= before, "time ran backwards: {before} -> {at}");
        assert!(!batch.is_empty());

        for (seq, due) in batch {
            assert_eq!(due, at, "item {seq} due at {due} fired at {at}");
            if let Some((last_at, last_seq)) = last_fired {
                if last_at == at {
                    assert!(seq > last_seq, "same-tick items out of order");
                }
            }
            last_fired = Some((at, seq));
            *fired += 1;
        }
    };

    for op in ops {
        match op {
            ClockOp::ScheduleAt { at } => {
                let due = Tick::from(at).max(clock.now());
                clock.schedule_at(Tick::from(at), (scheduled, due));
                scheduled += 1;
            },
            ClockOp::ScheduleIn { delay } => {
                let due = clock.now() + Tick::from(delay);
                clock.schedule_in(Tick::from(delay), (scheduled, due));
                scheduled += 1;
            },
            ClockOp::Fire => fire(&mut clock, &mut fired),
        }
    }

    while !clock.is_idle() {
        fire(&mut clock, &mut fired);
    }
    assert_eq!(scheduled, fired);
});
