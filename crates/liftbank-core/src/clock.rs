//! Virtual clock and wakeup queue.
//!
//! Time is a bare tick counter that only moves when the owner asks for the
//! next batch of due items. Items are ordered by tick, then by insertion
//! order, so two runs that schedule the same items produce the same firing
//! order.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use crate::types::Tick;

/// An item waiting on the clock.
#[derive(Debug)]
struct Scheduled<T> {
    at: Tick,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then(self.seq.cmp(&other.seq))
    }
}

/// Min-heap of `(tick, item)` pairs with a monotonic notion of "now".
#[derive(Debug)]
pub struct VirtualClock<T> {
    now: Tick,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Scheduled<T>>>,
}

impl<T> Default for VirtualClock<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VirtualClock<T> {
    /// Create a clock at tick 0 with nothing scheduled.
    pub fn new() -> Self {
        Self { now: 0, next_seq: 0, queue: BinaryHeap::new() }
    }

    /// Current virtual time.
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Schedule `item` at absolute tick `at`.
    ///
    /// Ticks in the past are clamped to `now` so time never runs backwards.
    pub fn schedule_at(&mut self, at: Tick, item: T) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq += 1;
        tracing::trace!(now = self.now, at, seq, "schedule wakeup");
        self.queue.push(Reverse(Scheduled { at, seq, item }));
    }

    /// Schedule `item` `delay` ticks from now.
    pub fn schedule_in(&mut self, delay: Tick, item: T) {
        self.schedule_at(self.now.saturating_add(delay), item);
    }

    /// Tick of the earliest pending item.
    pub fn next_tick(&self) -> Option<Tick> {
        self.queue.peek().map(|Reverse(s)| s.at)
    }

    /// Advance to the earliest pending tick and pop everything due then.
    ///
    /// Items come back in insertion order. Returns `None` if nothing is
    /// scheduled; time does not move in that case.
    pub fn next_batch(&mut self) -> Option<(Tick, Vec<T>)> {
        let at = self.next_tick()?;
        self.now = at;

        let mut batch = Vec::new();
        while let Some(Reverse(head)) = self.queue.peek() {
            if head.at != at {
                break;
            }
            if let Some(Reverse(scheduled)) = self.queue.pop() {
                batch.push(scheduled.item);
            }
        }

        let pending = self.queue.len();
        tracing::trace!(now = at, fired = batch.len(), pending, "clock advanced");
        Some((at, batch))
    }

    /// Number of pending items.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// True if nothing is scheduled.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}
