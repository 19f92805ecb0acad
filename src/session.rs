//! Capture session lifecycle.
//!
//! A [`CaptureSession`] owns the capture buffer and the statistics. Its state
//! moves as follows:
//!
//! ```text
//! Idle --start--> Running --stop--> Stopped
//!                    |
//!                    +--buffer reaches capacity--> BufferFull
//! ```
//!
//! `start` is accepted from any state and begins a fresh session: the buffer
//! and counters are cleared and a new origin timestamp is taken. `BufferFull`
//! is terminal until the next `start` or `reset`; nothing is evicted, so the
//! oldest data survives and every later capture attempt counts as dropped.

use crate::buffer::CaptureBuffer;
use crate::error::{Error, Fault, Result};
use crate::lin::{RecoveryEvent, RecoveryState};
use crate::record::{CaptureEntry, CaptureRecord, RawByte};
use crate::stats::{Statistics, StatisticsSnapshot};

/// Lifecycle state of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    /// Created, never started (or reset).
    #[default]
    Idle,
    /// Capturing.
    Running,
    /// Stopped by command.
    Stopped,
    /// Capacity exhausted. Terminal until the next start or reset.
    BufferFull,
}

/// Capture buffer, statistics and session timing.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    state: SessionState,
    buffer: CaptureBuffer<CaptureEntry>,
    stats: Statistics,
    started_at_us: u64,
    ended_at_us: Option<u64>,
}

impl CaptureSession {
    /// Create an idle session with a buffer of `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: SessionState::Idle,
            buffer: CaptureBuffer::with_capacity(capacity),
            stats: Statistics::default(),
            started_at_us: 0,
            ended_at_us: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the session is capturing.
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Check if the session ended on a full buffer.
    pub fn is_buffer_full(&self) -> bool {
        self.state == SessionState::BufferFull
    }

    /// Begin a new session at clock time `now_us`.
    ///
    /// Clears the buffer and every counter.
    pub fn start(&mut self, now_us: u64) {
        self.buffer.reset();
        self.stats.reset();
        self.started_at_us = now_us;
        self.ended_at_us = None;
        self.state = SessionState::Running;
        log::info!(
            "capture session started (capacity {})",
            self.buffer.capacity()
        );
    }

    /// Stop a running session at clock time `now_us`.
    ///
    /// Has no effect in any other state; in particular a full session stays
    /// `BufferFull`.
    pub fn stop(&mut self, now_us: u64) {
        if self.state != SessionState::Running {
            return;
        }
        self.state = SessionState::Stopped;
        self.ended_at_us = Some(now_us);
        log::info!(
            "capture session stopped: {} entries, {} dropped",
            self.buffer.len(),
            self.stats.dropped
        );
    }

    /// Discard every entry and zero the counters. Back to `Idle`.
    ///
    /// Fails with [`Error::SessionRunning`] while capturing.
    pub fn reset(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(Error::SessionRunning);
        }
        self.buffer.reset();
        self.stats.reset();
        self.started_at_us = 0;
        self.ended_at_us = None;
        self.state = SessionState::Idle;
        log::info!("capture session reset");
        Ok(())
    }

    /// Clock time the session started at.
    pub fn origin_us(&self) -> u64 {
        self.started_at_us
    }

    /// Session duration so far; frozen once the session has ended.
    pub fn elapsed_us(&self, now_us: u64) -> u64 {
        match self.state {
            SessionState::Idle => 0,
            SessionState::Running => now_us.saturating_sub(self.started_at_us),
            SessionState::Stopped | SessionState::BufferFull => self
                .ended_at_us
                .unwrap_or(now_us)
                .saturating_sub(self.started_at_us),
        }
    }

    /// Live counters.
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Copy of the counters with buffer and decoder diagnostics.
    pub fn snapshot(&self, now_us: u64, recovery_state: RecoveryState) -> StatisticsSnapshot {
        StatisticsSnapshot {
            counters: self.stats.clone(),
            buffered: self.buffer.len(),
            capacity: self.buffer.capacity(),
            elapsed_us: self.elapsed_us(now_us),
            recovery_state,
        }
    }

    /// Committed entries in capture order.
    ///
    /// Fails with [`Error::SessionRunning`] while capturing.
    pub fn entries(&self) -> Result<core::slice::Iter<'_, CaptureEntry>> {
        if self.is_running() {
            return Err(Error::SessionRunning);
        }
        Ok(self.buffer.iter())
    }

    /// Committed frame records in capture order, skipping raw bytes.
    ///
    /// Fails with [`Error::SessionRunning`] while capturing.
    pub fn records(&self) -> Result<impl Iterator<Item = &CaptureRecord> + '_> {
        Ok(self.entries()?.filter_map(CaptureEntry::as_record))
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Capture buffer capacity.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Offer an entry to the buffer.
    ///
    /// Outside a session nothing is stored. After the buffer fills, every
    /// attempt is rejected and counted as dropped. Returns `true` if the
    /// entry was stored.
    pub fn capture(&mut self, entry: CaptureEntry) -> bool {
        if !matches!(self.state, SessionState::Running | SessionState::BufferFull) {
            return false;
        }
        match self.buffer.try_append(entry) {
            Ok(()) => {
                self.stats.captured += 1;
                if self.buffer.is_full() {
                    self.enter_buffer_full(entry_time_hint(&self.buffer, self.started_at_us));
                }
                true
            }
            Err(_) => {
                self.stats.record_fault(Fault::BufferFull);
                if self.state != SessionState::BufferFull {
                    self.enter_buffer_full(self.started_at_us);
                }
                false
            }
        }
    }

    /// Count a frame drained from the frame bus and capture it.
    ///
    /// The frame is counted whether or not a session is running.
    pub fn on_bus_frame(&mut self, record: CaptureRecord) -> bool {
        self.stats.frames_observed += 1;
        self.capture(CaptureEntry::Frame(record))
    }

    /// Count bytes read from the serial tap.
    pub fn on_tap_bytes(&mut self, count: u64) {
        self.stats.bytes_observed += count;
    }

    /// Store a byte in raw tap mode, stamped at clock time `now_us`.
    pub fn on_raw_byte(&mut self, value: u8, now_us: u64) -> bool {
        let byte = RawByte::new(now_us.saturating_sub(self.started_at_us), value);
        self.capture(CaptureEntry::Byte(byte))
    }

    /// Count a frame recovery event and capture completed frames.
    pub fn on_recovery_event(&mut self, event: RecoveryEvent) {
        self.stats.record_recovery(&event);
        if let RecoveryEvent::Frame(frame) = event {
            let record = frame.into_record(self.started_at_us);
            self.capture(CaptureEntry::Frame(record));
        }
    }

    /// Count a hardware break that no decoder consumed (raw tap mode).
    pub fn on_break(&mut self) {
        self.stats.breaks_detected += 1;
    }

    fn enter_buffer_full(&mut self, ended_at_us: u64) {
        self.state = SessionState::BufferFull;
        self.ended_at_us = Some(ended_at_us);
        log::warn!(
            "capture buffer full after {} entries; capture halted",
            self.buffer.len()
        );
    }
}

/// Clock time of the newest entry, used to freeze the session duration.
fn entry_time_hint(buffer: &CaptureBuffer<CaptureEntry>, origin_us: u64) -> u64 {
    buffer
        .as_slice()
        .last()
        .map_or(origin_us, |e| origin_us + e.timestamp_us())
}
