//! Frame recovery from an undelimited LIN byte stream.
//!
//! [`FrameRecovery`] watches the receive line of a LIN bus one byte at a time
//! and reconstructs frames:
//!
//! ```text
//! break | sync (0x55) | protected id | data (0-8) | checksum
//! ```
//!
//! Nothing on the line is under our control, so frame starts are found two
//! ways at once:
//!
//! - **Hardware break**: the UART reports a break through a
//!   [`BreakSignal`](super::BreakSignal); the main loop passes it in with
//!   [`on_break`](FrameRecovery::on_break). The receiver also delivers a
//!   `0x00` for the break, which is swallowed.
//! - **Silence gap**: while idle, a sync byte arriving after more than
//!   [`LinTiming::gap_threshold_us`] of silence is taken as an inferred frame
//!   start. A `0x00` seen after the gap (the break itself, read as data) does
//!   not reset the silence measurement, and the frame is stamped at that zero
//!   if the sync follows within the gap threshold.
//!
//! Mid-frame, more than [`LinTiming::inter_byte_timeout_us`] without a byte
//! abandons the frame. Every frame reaching its checksum byte is emitted,
//! whatever the checksum outcome.
//!
//! # Example
//!
//! ```
//! use bus_sniffer::lin::{FrameRecovery, LengthTable, RecoveryEvent};
//! use bus_sniffer::LinTiming;
//!
//! let lengths = LengthTable::new().with_entry(0x31, 2).unwrap();
//! let mut recovery = FrameRecovery::new(lengths, LinTiming::for_bitrate(19_200));
//!
//! let mut frames = Vec::new();
//! let mut sink = |event: RecoveryEvent| {
//!     if let RecoveryEvent::Frame(frame) = event {
//!         frames.push(frame);
//!     }
//! };
//! recovery.on_break(1_000, &mut sink);
//! for (i, byte) in [0x00, 0x55, 0xB1, 0x0C, 0x00, 0x42].into_iter().enumerate() {
//!     recovery.on_byte(byte, 1_000 + 520 * i as u64, &mut sink);
//! }
//!
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].identifier(), 0x31);
//! assert!(frames[0].is_valid());
//! ```

use super::checksum::{self, MAX_LIN_ID, SYNC_BYTE};
use super::length::LengthTable;
use crate::config::LinTiming;
use crate::error::Fault;
use crate::record::{CaptureRecord, LinChecksum, Payload};

/// Where the decoder is within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecoveryState {
    /// Idle, between frames.
    #[default]
    AwaitingFrame,
    /// A break was seen; the sync byte comes next.
    SyncExpected,
    /// Sync accepted; the protected identifier comes next.
    IdentifierExpected,
    /// Collecting the data bytes given by the length table.
    CollectingData,
    /// All data collected; the checksum byte comes next.
    ChecksumExpected,
}

impl RecoveryState {
    /// Check if a frame is partially collected.
    pub fn is_mid_frame(self) -> bool {
        self != RecoveryState::AwaitingFrame
    }
}

/// How the current frame's start was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameStart {
    Break,
    Inferred,
}

/// A frame that reached its checksum byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredFrame {
    /// Clock time of the frame start (break or inferred start).
    pub start_us: u64,
    /// Data bytes, exactly as many as the length table gave.
    pub payload: Payload,
    /// Identifier and checksum detail.
    pub checksum: LinChecksum,
}

impl RecoveredFrame {
    /// The 6-bit frame identifier.
    pub fn identifier(&self) -> u8 {
        self.checksum.protected_id & MAX_LIN_ID
    }

    /// True if the checksum matched either convention.
    pub fn is_valid(&self) -> bool {
        self.checksum.classic_match || self.checksum.enhanced_match
    }

    /// Convert to a capture record timestamped relative to `origin_us`.
    pub fn into_record(self, origin_us: u64) -> CaptureRecord {
        CaptureRecord::lin(
            self.start_us.saturating_sub(origin_us),
            self.payload,
            self.checksum,
        )
    }
}

/// Something the decoder noticed. Passed to the caller's sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryEvent {
    /// A hardware break notification was taken.
    BreakDetected,
    /// A frame start was inferred from a silence gap.
    InferredBreak,
    /// A sync byte was accepted.
    SyncDetected,
    /// The protected identifier's parity bits did not check out.
    ParityMismatch(u8),
    /// A frame was completed.
    Frame(RecoveredFrame),
    /// A partial frame was discarded.
    Fault(Fault),
}

/// LIN frame recovery state machine.
#[derive(Debug, Clone)]
pub struct FrameRecovery {
    lengths: LengthTable,
    timing: LinTiming,
    state: RecoveryState,
    start: FrameStart,
    frame_start_us: u64,
    last_activity_us: Option<u64>,
    /// Idle `0x00` after a silence gap; holds its arrival time.
    break_candidate: Option<u64>,
    swallow_zero: bool,
    protected_id: u8,
    expected_len: usize,
    payload: Payload,
}

impl FrameRecovery {
    /// Create a decoder with the given length table and timing.
    pub fn new(lengths: LengthTable, timing: LinTiming) -> Self {
        Self {
            lengths,
            timing,
            state: RecoveryState::AwaitingFrame,
            start: FrameStart::Break,
            frame_start_us: 0,
            last_activity_us: None,
            break_candidate: None,
            swallow_zero: false,
            protected_id: 0,
            expected_len: 0,
            payload: Payload::empty(),
        }
    }

    /// Current state.
    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// The length table in use.
    pub fn lengths(&self) -> &LengthTable {
        &self.lengths
    }

    /// Replace the length table. Any partial frame is dropped.
    pub fn set_lengths(&mut self, lengths: LengthTable) {
        self.lengths = lengths;
        self.rearm();
    }

    /// The timing thresholds in use.
    pub fn timing(&self) -> LinTiming {
        self.timing
    }

    /// Forget everything, including line history.
    pub fn reset(&mut self) {
        self.rearm();
        self.last_activity_us = None;
    }

    /// Handle a hardware break notification taken at `now_us`.
    pub fn on_break<F>(&mut self, now_us: u64, sink: &mut F)
    where
        F: FnMut(RecoveryEvent),
    {
        self.check_stall(now_us, sink);
        sink(RecoveryEvent::BreakDetected);

        // The flag can be taken after the bytes it belongs to were already
        // read and the gap path started the same frame. Within one stall
        // window of that start, and before the checksum position, the break
        // confirms the frame instead of aborting it.
        let confirms_inferred = self.start == FrameStart::Inferred
            && matches!(
                self.state,
                RecoveryState::IdentifierExpected | RecoveryState::CollectingData
            )
            && now_us.saturating_sub(self.frame_start_us) <= self.timing.inter_byte_timeout_us;
        if confirms_inferred {
            self.start = FrameStart::Break;
            self.last_activity_us = Some(now_us);
            return;
        }

        if self.state.is_mid_frame() {
            log::debug!("break interrupted frame in state {:?}", self.state);
            sink(RecoveryEvent::Fault(Fault::BreakAbort));
        }

        self.rearm();
        self.state = RecoveryState::SyncExpected;
        self.start = FrameStart::Break;
        self.frame_start_us = now_us;
        self.swallow_zero = true;
        self.last_activity_us = Some(now_us);
    }

    /// Handle one byte read from the line at `now_us`.
    pub fn on_byte<F>(&mut self, byte: u8, now_us: u64, sink: &mut F)
    where
        F: FnMut(RecoveryEvent),
    {
        self.check_stall(now_us, sink);

        let after_gap = match self.last_activity_us {
            Some(last) => now_us.saturating_sub(last) > self.timing.gap_threshold_us,
            None => true,
        };

        match self.state {
            RecoveryState::AwaitingFrame => self.idle_byte(byte, now_us, after_gap, sink),
            RecoveryState::SyncExpected => {
                if byte == 0x00 && self.swallow_zero {
                    self.swallow_zero = false;
                } else if byte == SYNC_BYTE {
                    sink(RecoveryEvent::SyncDetected);
                    self.state = RecoveryState::IdentifierExpected;
                } else {
                    log::debug!("malformed sync {byte:#04x} after break");
                    sink(RecoveryEvent::Fault(Fault::MalformedSync));
                    self.rearm();
                }
            }
            RecoveryState::IdentifierExpected => {
                if !checksum::parity_ok(byte) {
                    sink(RecoveryEvent::ParityMismatch(byte));
                }
                self.protected_id = byte;
                self.expected_len = self.lengths.len_for(byte) as usize;
                self.state = if self.expected_len == 0 {
                    RecoveryState::ChecksumExpected
                } else {
                    RecoveryState::CollectingData
                };
            }
            RecoveryState::CollectingData => {
                self.payload.push(byte);
                if self.payload.len() >= self.expected_len {
                    self.state = RecoveryState::ChecksumExpected;
                }
            }
            RecoveryState::ChecksumExpected => {
                let frame = RecoveredFrame {
                    start_us: self.frame_start_us,
                    payload: self.payload,
                    checksum: checksum::verify(self.protected_id, self.payload.as_slice(), byte),
                };
                log::trace!(
                    "recovered frame {:#04x} {:?} valid={}",
                    frame.identifier(),
                    frame.payload,
                    frame.is_valid()
                );
                sink(RecoveryEvent::Frame(frame));
                self.rearm();
            }
        }

        self.last_activity_us = Some(now_us);
    }

    /// Abandon a stalled frame. Call on every scheduling tick.
    pub fn poll<F>(&mut self, now_us: u64, sink: &mut F)
    where
        F: FnMut(RecoveryEvent),
    {
        self.check_stall(now_us, sink);
    }

    fn check_stall<F>(&mut self, now_us: u64, sink: &mut F)
    where
        F: FnMut(RecoveryEvent),
    {
        if !self.state.is_mid_frame() {
            return;
        }
        let Some(last) = self.last_activity_us else {
            return;
        };
        if now_us.saturating_sub(last) > self.timing.inter_byte_timeout_us {
            log::debug!("frame stalled in state {:?}", self.state);
            sink(RecoveryEvent::Fault(Fault::StallTimeout));
            self.rearm();
        }
    }

    fn idle_byte<F>(&mut self, byte: u8, now_us: u64, after_gap: bool, sink: &mut F)
    where
        F: FnMut(RecoveryEvent),
    {
        if byte == 0x00 && (after_gap || self.break_candidate.is_some()) {
            self.break_candidate = Some(now_us);
            return;
        }

        if byte == SYNC_BYTE {
            // A zero only stands in for the break if the sync follows it
            // directly; an older one says nothing about this frame.
            let gap_threshold_us = self.timing.gap_threshold_us;
            let zero_us = self
                .break_candidate
                .take()
                .filter(|&zero_us| now_us.saturating_sub(zero_us) <= gap_threshold_us);
            if after_gap || zero_us.is_some() {
                self.rearm();
                self.frame_start_us = zero_us.unwrap_or(now_us);
                self.start = FrameStart::Inferred;
                self.state = RecoveryState::IdentifierExpected;
                sink(RecoveryEvent::InferredBreak);
                sink(RecoveryEvent::SyncDetected);
                return;
            }
        }

        self.break_candidate = None;
    }

    fn rearm(&mut self) {
        self.state = RecoveryState::AwaitingFrame;
        self.break_candidate = None;
        self.swallow_zero = false;
        self.protected_id = 0;
        self.expected_len = 0;
        self.payload = Payload::empty();
    }
}
