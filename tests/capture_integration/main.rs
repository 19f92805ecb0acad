//! Capture integration test module
//!
//! End-to-end tests driving a [`Sniffer`] through simulated bus traffic:
//! - `lin_recovery`: LIN frame recovery from a scripted serial line
//! - `session_lifecycle`: capacity, reset and statistics behavior
//! - `raw_tap`: raw byte capture and offline recovery

mod lin_recovery;
mod session_lifecycle;

// Shared test utilities
use std::cell::RefCell;
use std::collections::VecDeque;

use bus_sniffer::can::FrameSource;
use bus_sniffer::lin::{SerialTap, checksum};
use bus_sniffer::{BreakSignal, CanFrame, Clock, ManualClock, Sniffer, SnifferConfig};

/// Microseconds per byte at 19200 bit/s (10 bits per byte).
pub const BYTE_US: u64 = 520;

/// Idle time a master leaves between frames.
pub const INTER_FRAME_US: u64 = 5_000;

/// The simulated wiring: clock, break interrupt flag and both bus lines.
pub struct Line {
    pub clock: ManualClock,
    pub signal: BreakSignal,
    wire: RefCell<VecDeque<u8>>,
    can: RefCell<VecDeque<CanFrame>>,
}

impl Line {
    pub fn new() -> Self {
        Self {
            clock: ManualClock::new(0),
            signal: BreakSignal::new(),
            wire: RefCell::new(VecDeque::new()),
            can: RefCell::new(VecDeque::new()),
        }
    }

    pub fn tap(&self) -> ScriptedTap<'_> {
        ScriptedTap { line: self }
    }

    pub fn controller(&self) -> MockCanController<'_> {
        MockCanController {
            line: self,
            listen_only: None,
        }
    }

    pub fn put_can(&self, frame: CanFrame) {
        self.can.borrow_mut().push_back(frame);
    }
}

/// Receive-only UART reading the simulated LIN wire.
pub struct ScriptedTap<'a> {
    line: &'a Line,
}

impl SerialTap for ScriptedTap<'_> {
    fn read_byte(&mut self) -> Option<u8> {
        self.line.wire.borrow_mut().pop_front()
    }
}

/// Listen-only CAN controller reading the simulated CAN bus.
pub struct MockCanController<'a> {
    line: &'a Line,
    pub listen_only: Option<u32>,
}

impl FrameSource for MockCanController<'_> {
    type Frame = CanFrame;

    fn try_receive(&mut self) -> Option<CanFrame> {
        self.line.can.borrow_mut().pop_front()
    }

    fn enable_listen_only(&mut self, bitrate: u32) {
        self.listen_only = Some(bitrate);
    }
}

pub type TestSniffer<'a> = Sniffer<'a, ScriptedTap<'a>, MockCanController<'a>, &'a ManualClock>;

pub fn sniffer(line: &Line, config: SnifferConfig) -> TestSniffer<'_> {
    Sniffer::new(config, &line.signal, line.tap(), line.controller(), &line.clock)
        .expect("valid test configuration")
}

/// Something that happens on the LIN wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    /// The UART break interrupt fires.
    Break,
    /// A byte lands in the receive FIFO.
    Byte(u8),
}

/// Generates timed LIN traffic the way a bus master would put it on the wire.
pub struct FakeLinMaster {
    now_us: u64,
    script: Vec<(u64, LineEvent)>,
}

impl FakeLinMaster {
    pub fn starting_at(now_us: u64) -> Self {
        Self {
            now_us,
            script: Vec::new(),
        }
    }

    /// A complete frame with a hardware break: break, sentinel zero, sync,
    /// protected identifier, data, checksum.
    pub fn frame(&mut self, protected_id: u8, data: &[u8], checksum: u8) -> &mut Self {
        self.script.push((self.now_us, LineEvent::Break));
        self.now_us += BYTE_US;
        self.bytes(&[0x00, 0x55, protected_id]);
        self.bytes(data);
        self.bytes(&[checksum]);
        self.idle(INTER_FRAME_US)
    }

    /// A frame carrying the enhanced checksum.
    pub fn enhanced_frame(&mut self, id: u8, data: &[u8]) -> &mut Self {
        let pid = checksum::protected_id(id);
        self.frame(pid, data, checksum::enhanced_checksum(pid, data))
    }

    /// A frame carrying the classic checksum.
    pub fn classic_frame(&mut self, id: u8, data: &[u8]) -> &mut Self {
        let pid = checksum::protected_id(id);
        self.frame(pid, data, checksum::classic_checksum(data))
    }

    /// Raw bytes at line speed.
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        for &b in bytes {
            self.script.push((self.now_us, LineEvent::Byte(b)));
            self.now_us += BYTE_US;
        }
        self
    }

    /// A hardware break on its own.
    pub fn break_field(&mut self) -> &mut Self {
        self.script.push((self.now_us, LineEvent::Break));
        self.now_us += BYTE_US;
        self
    }

    /// Silence on the wire.
    pub fn idle(&mut self, us: u64) -> &mut Self {
        self.now_us += us;
        self
    }

    pub fn now_us(&self) -> u64 {
        self.now_us
    }

    pub fn script(&self) -> &[(u64, LineEvent)] {
        &self.script
    }
}

/// Put every scripted event on the line, polling the sniffer after each one,
/// then let the line settle until the master's current time.
pub fn play(sniffer: &mut TestSniffer<'_>, line: &Line, master: &FakeLinMaster) {
    for &(at_us, event) in master.script() {
        // Polls in between, like a scheduling loop would.
        while line.clock.now_us() + 1_000 < at_us {
            line.clock.advance(1_000);
            sniffer.poll();
        }
        line.clock.set(at_us);
        match event {
            LineEvent::Break => line.signal.raise(),
            LineEvent::Byte(b) => line.wire.borrow_mut().push_back(b),
        }
        sniffer.poll();
    }
    line.clock.set(master.now_us());
    sniffer.poll();
}
