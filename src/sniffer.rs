//! The acquisition loop.
//!
//! [`Sniffer`] owns both bus taps, the LIN frame recovery and the capture
//! session. The integrator calls [`Sniffer::poll`] from its scheduling loop;
//! each call services the buses selected by [`MonitorTarget`]:
//!
//! 1. Take a pending break notification from the [`BreakSignal`]
//! 2. Drain every byte from the serial tap
//! 3. Abandon a LIN frame whose bytes stopped arriving
//! 4. Drain every frame from the CAN controller
//!
//! Nothing in `poll` blocks. Control commands (start, stop, reset, query)
//! arrive through [`Sniffer::apply`] or the matching methods.

use crate::can::{FrameAcquisition, FrameSource};
use crate::config::{ByteMode, MonitorTarget, SnifferConfig};
use crate::error::{Error, Result};
use crate::lin::{BreakSignal, FrameRecovery, LengthTable, RecoveryEvent, SerialTap};
use crate::session::CaptureSession;
use crate::stats::StatisticsSnapshot;
use crate::time::Clock;

/// Control command from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Begin a fresh capture session.
    Start,
    /// End the running session.
    Stop,
    /// Discard captured data and zero the counters.
    Reset,
    /// Report counters and diagnostics.
    Statistics,
}

/// Reply to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Response {
    /// Command carried out.
    Ok,
    /// Statistics report.
    Statistics(StatisticsSnapshot),
}

/// Passive dual-bus sniffer.
///
/// - `T`: receive-only serial tap on the LIN wire
/// - `S`: listen-only CAN controller
/// - `K`: microsecond clock
///
/// The break signal is shared with the UART interrupt handler, hence the
/// borrowed reference.
pub struct Sniffer<'a, T, S, K> {
    config: SnifferConfig,
    break_signal: &'a BreakSignal,
    tap: T,
    acquisition: FrameAcquisition<S>,
    recovery: FrameRecovery,
    session: CaptureSession,
    clock: K,
}

impl<'a, T, S, K> Sniffer<'a, T, S, K>
where
    T: SerialTap,
    S: FrameSource,
    K: Clock,
{
    /// Build a sniffer and put both taps into their passive modes.
    ///
    /// Fails with [`Error::InvalidConfig`] if the configuration is unusable.
    pub fn new(
        config: SnifferConfig,
        break_signal: &'a BreakSignal,
        mut tap: T,
        source: S,
        clock: K,
    ) -> Result<Self> {
        config.validate()?;

        tap.enable_receive_only();
        let acquisition = FrameAcquisition::new(source, config.can_bitrate);
        let recovery = FrameRecovery::new(config.lengths.clone(), config.lin_timing());
        let session = CaptureSession::new(config.capacity);

        log::info!(
            "sniffer ready: monitor {:?}, CAN {} bit/s, LIN {} bit/s, capacity {}",
            config.monitor,
            config.can_bitrate,
            config.lin_bitrate,
            config.capacity
        );

        Ok(Self {
            config,
            break_signal,
            tap,
            acquisition,
            recovery,
            session,
            clock,
        })
    }

    /// Service every monitored bus once.
    pub fn poll(&mut self) {
        if self.config.monitor.byte_stream() {
            match self.config.byte_mode {
                ByteMode::Recover => self.service_recovery(),
                ByteMode::RawTap => self.service_raw_tap(),
            }
        }
        if self.config.monitor.frame_bus() {
            self.service_frame_bus();
        }
    }

    fn service_recovery(&mut self) {
        let Self {
            break_signal,
            tap,
            recovery,
            session,
            clock,
            ..
        } = self;

        let mut bytes = 0u64;
        {
            let mut sink = |event: RecoveryEvent| session.on_recovery_event(event);

            if break_signal.take() {
                recovery.on_break(clock.now_us(), &mut sink);
            }
            while let Some(byte) = tap.read_byte() {
                bytes += 1;
                recovery.on_byte(byte, clock.now_us(), &mut sink);
            }
            recovery.poll(clock.now_us(), &mut sink);
        }
        session.on_tap_bytes(bytes);
    }

    fn service_raw_tap(&mut self) {
        if self.break_signal.take() {
            self.session.on_break();
        }
        while let Some(byte) = self.tap.read_byte() {
            self.session.on_tap_bytes(1);
            self.session.on_raw_byte(byte, self.clock.now_us());
        }
    }

    fn service_frame_bus(&mut self) {
        let timestamp_us = self
            .clock
            .now_us()
            .saturating_sub(self.session.origin_us());
        let session = &mut self.session;
        self.acquisition.drain(timestamp_us, |record| {
            session.on_bus_frame(record);
        });
    }

    /// Begin a fresh capture session.
    ///
    /// Clears the buffer and every counter, and drops any partial LIN frame.
    pub fn start(&mut self) {
        self.recovery.reset();
        self.session.start(self.clock.now_us());
    }

    /// End the running session. Captured data becomes readable.
    pub fn stop(&mut self) {
        self.session.stop(self.clock.now_us());
    }

    /// Discard captured data and zero the counters.
    ///
    /// Fails with [`Error::SessionRunning`] while capturing.
    pub fn reset(&mut self) -> Result<()> {
        self.session.reset()?;
        self.recovery.reset();
        Ok(())
    }

    /// Counters and diagnostics as of now.
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.session
            .snapshot(self.clock.now_us(), self.recovery.state())
    }

    /// Carry out a host command.
    pub fn apply(&mut self, command: Command) -> Result<Response> {
        log::debug!("command {command:?}");
        match command {
            Command::Start => self.start(),
            Command::Stop => self.stop(),
            Command::Reset => self.reset()?,
            Command::Statistics => return Ok(Response::Statistics(self.statistics())),
        }
        Ok(Response::Ok)
    }

    /// The capture session.
    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// The LIN frame recovery.
    pub fn recovery(&self) -> &FrameRecovery {
        &self.recovery
    }

    /// The configuration in effect.
    pub fn config(&self) -> &SnifferConfig {
        &self.config
    }

    /// Which buses are serviced.
    pub fn monitor(&self) -> MonitorTarget {
        self.config.monitor
    }

    /// Switch the byte stream between recovery and raw tap.
    ///
    /// Fails with [`Error::SessionRunning`] while capturing.
    pub fn set_byte_mode(&mut self, mode: ByteMode) -> Result<()> {
        if self.session.is_running() {
            return Err(Error::SessionRunning);
        }
        self.config.byte_mode = mode;
        self.recovery.reset();
        Ok(())
    }

    /// Replace the LIN length table.
    ///
    /// Fails with [`Error::SessionRunning`] while capturing.
    pub fn set_lengths(&mut self, lengths: LengthTable) -> Result<()> {
        if self.session.is_running() {
            return Err(Error::SessionRunning);
        }
        self.config.lengths = lengths.clone();
        self.recovery.set_lengths(lengths);
        Ok(())
    }

    /// The serial tap.
    pub fn tap(&self) -> &T {
        &self.tap
    }

    /// The CAN controller.
    pub fn source(&self) -> &S {
        self.acquisition.source()
    }
}
