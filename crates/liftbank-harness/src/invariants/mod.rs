//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold while a bank runs.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify physical and bookkeeping properties across every run a seed can
//! produce.
//!
//! # Architecture
//!
//! The invariant system extracts observable state from a
//! [`liftbank_core::BankView`] into a [`BankSnapshot`], then runs registered
//! [`Invariant`] checks against it. [`InvariantProbe`] does this at every
//! quiescent point of a run and records what it finds.
//!
//! # Usage
//!
//! ```ignore
//! let probe = InvariantProbe::standard();
//! bank.set_inspector(probe.clone().into_inspector())?;
//! bank.run()?;
//! assert!(probe.violations().is_empty());
//! ```

mod checks;
mod snapshot;

use std::{cell::RefCell, rc::Rc};

pub use checks::{
    DoorsClosedWhileMoving, FloorsInRange, OccupancyWithinCapacity, OccupantsFollowElevator,
    SingleLocus,
};
use liftbank_core::BankView;
pub use snapshot::{BankSnapshot, ElevatorSnapshot, RiderSnapshot};
use tracing::error;

/// Invariant check result.
pub type InvariantResult = Result<(), InvariantViolation>;

/// Invariant violation with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// An invariant that can be checked against bank state.
///
/// Invariants capture WHAT must be true, not specific test scenarios.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    ///
    /// Returns `Ok(())` if the invariant holds, or an [`InvariantViolation`]
    /// describing what went wrong.
    fn check(&self, state: &BankSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
///
/// Use [`InvariantRegistry::standard()`] for the physical and locus
/// invariants every run must satisfy.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard invariants.
    ///
    /// Includes:
    /// - [`DoorsClosedWhileMoving`]: doors and motion exclude each other
    /// - [`OccupancyWithinCapacity`]: no car is overfull
    /// - [`FloorsInRange`]: every floor exists
    /// - [`SingleLocus`]: each rider is in exactly one place
    /// - [`OccupantsFollowElevator`]: riders travel with their car
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(DoorsClosedWhileMoving);
        registry.add(OccupancyWithinCapacity);
        registry.add(FloorsInRange);
        registry.add(SingleLocus);
        registry.add(OccupantsFollowElevator);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &BankSnapshot) -> Result<(), Vec<InvariantViolation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

/// Checks a registry at every quiescent point of a run.
///
/// Clones share the same record, so one clone can be installed as the
/// bank's inspector while another is read after the run.
#[derive(Clone)]
pub struct InvariantProbe {
    registry: Rc<InvariantRegistry>,
    record: Rc<RefCell<ProbeRecord>>,
}

#[derive(Default)]
struct ProbeRecord {
    checks: u64,
    violations: Vec<(u64, InvariantViolation)>,
}

impl InvariantProbe {
    /// Probe checking `registry`.
    pub fn new(registry: InvariantRegistry) -> Self {
        Self { registry: Rc::new(registry), record: Rc::default() }
    }

    /// Probe checking [`InvariantRegistry::standard()`].
    pub fn standard() -> Self {
        Self::new(InvariantRegistry::standard())
    }

    /// Snapshot `view` and check every invariant against it.
    pub fn observe(&self, view: &BankView<'_>) {
        let snapshot = BankSnapshot::capture(view);
        let mut record = self.record.borrow_mut();
        record.checks += 1;

        if let Err(violations) = self.registry.check_all(&snapshot) {
            for violation in violations {
                error!(tick = snapshot.now, %violation, "invariant violated");
                record.violations.push((snapshot.now, violation));
            }
        }
    }

    /// Closure suitable for `ElevatorBank::set_inspector`.
    pub fn into_inspector(self) -> impl FnMut(&BankView<'_>) + 'static {
        move |view| self.observe(view)
    }

    /// Violations found so far, with the tick they were seen at.
    pub fn violations(&self) -> Vec<(u64, InvariantViolation)> {
        self.record.borrow().violations.clone()
    }

    /// Number of quiescent points checked.
    pub fn checks(&self) -> u64 {
        self.record.borrow().checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        let registry = InvariantRegistry::standard();
        let snapshot = BankSnapshot::empty(3, 4);
        assert!(registry.check_all(&snapshot).is_ok());
    }

    #[test]
    fn all_violations_are_reported() {
        let registry = InvariantRegistry::standard();
        let mut snapshot = BankSnapshot::empty(3, 1);
        let mut elevator = ElevatorSnapshot::at(0, 1).with_occupants([0, 1]);
        elevator.doors_open = true;
        elevator.moving = true;
        snapshot.add_elevator(elevator);
        snapshot.add_rider(RiderSnapshot::in_elevator(0, 0, 1));
        snapshot.add_rider(RiderSnapshot::in_elevator(1, 0, 1));

        let violations = registry.check_all(&snapshot).unwrap_err();
        let names: Vec<_> = violations.iter().map(|v| v.invariant).collect();
        assert_eq!(names, vec!["doors_closed_while_moving", "occupancy_within_capacity"]);
    }
}
