//! Bank configuration.

use crate::types::Tick;

/// Virtual ticks an elevator needs to travel one floor.
pub const DEFAULT_TICKS_PER_FLOOR: Tick = 2000;

/// Riders an elevator holds at once.
pub const DEFAULT_CAPACITY: usize = 4;

/// Delay between queueing an event and signalling its actor.
pub const DEFAULT_NOTIFY_DELAY: Tick = 1;

/// Which floors a moving elevator may be redirected to.
///
/// While moving, the elevator has committed to a heading and has last
/// reached some floor. Floors beyond that floor in the heading are always
/// eligible, floors behind it never are. The floor itself is the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RedirectBoundary {
    /// The floor last reached is not eligible: the elevator has already left
    /// it.
    #[default]
    Exclusive,
    /// The floor last reached is eligible: the elevator halts there on its
    /// next step without travelling further.
    Inclusive,
}

/// Bank configuration
#[derive(Debug, Clone)]
pub struct BankConfig {
    /// Ticks to travel one floor
    pub ticks_per_floor: Tick,
    /// Maximum occupants per elevator
    pub capacity: usize,
    /// Ticks between queueing an event and notifying its actor (at least 1)
    pub notify_delay: Tick,
    /// Redirect eligibility of the floor last reached
    pub redirect_boundary: RedirectBoundary,
    /// Whether `enable_renderer` is permitted
    pub allow_renderer: bool,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            ticks_per_floor: DEFAULT_TICKS_PER_FLOOR,
            capacity: DEFAULT_CAPACITY,
            notify_delay: DEFAULT_NOTIFY_DELAY,
            redirect_boundary: RedirectBoundary::default(),
            allow_renderer: true,
        }
    }
}

impl BankConfig {
    /// Set travel time per floor.
    #[must_use]
    pub fn with_ticks_per_floor(mut self, ticks: Tick) -> Self {
        self.ticks_per_floor = ticks;
        self
    }

    /// Set elevator capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the redirect boundary.
    #[must_use]
    pub fn with_redirect_boundary(mut self, boundary: RedirectBoundary) -> Self {
        self.redirect_boundary = boundary;
        self
    }

    /// Allow or forbid rendering.
    #[must_use]
    pub fn with_renderer_allowed(mut self, allowed: bool) -> Self {
        self.allow_renderer = allowed;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.ticks_per_floor == 0 {
            return Err("ticks_per_floor must be at least 1".to_string());
        }
        if self.capacity == 0 {
            return Err("capacity must be at least 1".to_string());
        }
        if self.notify_delay == 0 {
            return Err("notify_delay must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BankConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.redirect_boundary, RedirectBoundary::Exclusive);
    }

    #[test]
    fn zero_values_are_rejected() {
        assert!(BankConfig::default().with_capacity(0).validate().is_err());
        assert!(BankConfig::default().with_ticks_per_floor(0).validate().is_err());
        let config = BankConfig { notify_delay: 0, ..BankConfig::default() };
        assert!(config.validate().is_err());
    }
}
