//! Break notification from interrupt context.
//!
//! The UART break interrupt is the only code that runs outside the main loop.
//! It may do exactly one thing: raise this flag (after draining the sentinel
//! `0x00` from the receiver, if the driver can). Everything else, including
//! what a break means for the frame in progress, is decided on the main loop
//! when it takes the flag.

use core::sync::atomic::{AtomicBool, Ordering};

/// Single-producer / single-consumer break flag.
#[derive(Debug, Default)]
pub struct BreakSignal {
    pending: AtomicBool,
}

impl BreakSignal {
    /// A lowered flag. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Raise the flag. Interrupt-safe.
    pub fn raise(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Read and clear the flag in one atomic access.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Check the flag without clearing it.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
