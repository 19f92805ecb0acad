//! Monotonic time sources.
//!
//! The engine only needs a microsecond counter that never goes backwards.
//! [`StdClock`] reads [`std::time::Instant`]; on targets without `std` the
//! integrator implements [`Clock`] over a hardware timer. [`ManualClock`] is
//! driven by hand, for replays and tests.

use core::cell::Cell;

/// A monotonic microsecond clock.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin.
    fn now_us(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Clock backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    /// Create a clock reading `start_us`.
    pub fn new(start_us: u64) -> Self {
        Self {
            now: Cell::new(start_us),
        }
    }

    /// Jump to an absolute time. Earlier times are ignored.
    pub fn set(&self, now_us: u64) {
        if now_us > self.now.get() {
            self.now.set(now_us);
        }
    }

    /// Move forward by `delta_us`.
    pub fn advance(&self, delta_us: u64) {
        self.now.set(self.now.get().saturating_add(delta_us));
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.now.get()
    }
}
