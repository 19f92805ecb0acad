//! Capture statistics.
//!
//! Counters observe every attempt, not only successful captures: frames seen
//! on the frame bus are counted even with no session running. All counters
//! are monotonic and only zeroed by an explicit start or reset.

use crate::error::Fault;
use crate::lin::{RecoveryEvent, RecoveryState};

/// Live counters owned by the capture session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistics {
    /// Frames drained from the frame-bus controller.
    pub frames_observed: u64,
    /// Bytes read from the serial tap.
    pub bytes_observed: u64,
    /// Frames recovered from the byte stream (valid or not).
    pub frames_recovered: u64,
    /// Entries appended to the capture buffer.
    pub captured: u64,
    /// Entries rejected because the buffer was full.
    pub dropped: u64,
    /// Recovered frames matching neither checksum convention.
    pub invalid_checksum: u64,
    /// Breaks followed by something other than the sync byte.
    pub malformed_sync: u64,
    /// Frames abandoned on the inter-byte timeout.
    pub stall_timeouts: u64,
    /// Frames abandoned because a new break arrived.
    pub break_aborts: u64,
    /// Hardware break notifications taken.
    pub breaks_detected: u64,
    /// Frame starts inferred from a silence gap.
    pub inferred_breaks: u64,
    /// Sync bytes accepted.
    pub sync_detected: u64,
    /// Protected identifiers whose parity bits did not check out.
    pub parity_mismatches: u64,
}

impl Statistics {
    /// Zero every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Count a fault raised by an acquisition path.
    pub fn record_fault(&mut self, fault: Fault) {
        match fault {
            Fault::BufferFull => self.dropped += 1,
            Fault::IntegrityFailure => self.invalid_checksum += 1,
            Fault::MalformedSync => self.malformed_sync += 1,
            Fault::StallTimeout => self.stall_timeouts += 1,
            Fault::BreakAbort => self.break_aborts += 1,
        }
    }

    /// Count an event reported by the frame recovery state machine.
    pub fn record_recovery(&mut self, event: &RecoveryEvent) {
        match event {
            RecoveryEvent::BreakDetected => self.breaks_detected += 1,
            RecoveryEvent::InferredBreak => self.inferred_breaks += 1,
            RecoveryEvent::SyncDetected => self.sync_detected += 1,
            RecoveryEvent::ParityMismatch(_) => self.parity_mismatches += 1,
            RecoveryEvent::Frame(frame) => {
                self.frames_recovered += 1;
                if !frame.is_valid() {
                    self.record_fault(Fault::IntegrityFailure);
                }
            }
            RecoveryEvent::Fault(fault) => self.record_fault(*fault),
        }
    }

    /// Total protocol units observed on both buses.
    pub fn total_observed(&self) -> u64 {
        self.frames_observed + self.frames_recovered
    }

    /// Check if every counter is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// A point-in-time copy of the statistics plus session diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatisticsSnapshot {
    /// Counter values.
    pub counters: Statistics,
    /// Entries currently held by the capture buffer.
    pub buffered: usize,
    /// Capture buffer capacity.
    pub capacity: usize,
    /// Microseconds since the session started (frozen once stopped).
    pub elapsed_us: u64,
    /// Where the byte-stream decoder currently is.
    pub recovery_state: RecoveryState,
}
