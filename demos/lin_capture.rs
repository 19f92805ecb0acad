//! Example: Capturing LIN and CAN traffic with a simulated wire
//!
//! This example demonstrates how to:
//! 1. Load a sniffer configuration from JSON
//! 2. Drive the acquisition loop against a serial tap and a CAN controller
//! 3. Read back the capture and the statistics report
//! 4. Replay a raw tap capture through frame recovery
//!
//! Run with: cargo run --example lin_capture

use std::cell::RefCell;
use std::collections::VecDeque;

use bus_sniffer::can::FrameSource;
use bus_sniffer::lin::{SerialTap, checksum, replay};
use bus_sniffer::{
    BreakSignal, ByteMode, CanFrame, CaptureEntry, Command, ManualClock, Response, Sniffer,
    SnifferConfig,
};

const BYTE_US: u64 = 520;

static BREAK: BreakSignal = BreakSignal::new();

/// A UART reading the simulated LIN wire.
struct SimulatedUart<'a> {
    wire: &'a RefCell<VecDeque<u8>>,
}

impl SerialTap for SimulatedUart<'_> {
    fn read_byte(&mut self) -> Option<u8> {
        self.wire.borrow_mut().pop_front()
    }
}

/// A CAN controller reading the simulated CAN bus.
struct SimulatedCan<'a> {
    bus: &'a RefCell<VecDeque<CanFrame>>,
}

impl FrameSource for SimulatedCan<'_> {
    type Frame = CanFrame;

    fn try_receive(&mut self) -> Option<CanFrame> {
        self.bus.borrow_mut().pop_front()
    }
}

fn main() -> bus_sniffer::Result<()> {
    println!("=== Bus Sniffer Example ===\n");

    // Step 1: Configuration
    println!("1. Loading configuration...");
    let config = SnifferConfig::from_json(
        r#"{
            "can_bitrate": 500000,
            "lin_bitrate": 19200,
            "capacity": 64,
            "lengths": { "49": 2, "16": 4 }
        }"#,
    )?;
    println!("   {}", config.to_json()?.replace('\n', "\n   "));

    // Step 2: Capture
    println!("\n2. Capturing...");
    let clock = ManualClock::new(0);
    let lin_wire = RefCell::new(VecDeque::new());
    let can_bus = RefCell::new(VecDeque::new());
    let uart = SimulatedUart { wire: &lin_wire };
    let can = SimulatedCan { bus: &can_bus };
    let mut sniffer = Sniffer::new(config.clone(), &BREAK, uart, can, &clock)?;
    sniffer.apply(Command::Start)?;

    let frames: [(u8, &[u8]); 3] = [
        (0x31, &[0x0C, 0x00]),
        (0x10, &[1, 2, 3, 4]),
        (0x31, &[0x0D, 0x00]),
    ];
    for (id, data) in frames {
        let pid = checksum::protected_id(id);
        let mut wire = vec![0x00, 0x55, pid];
        wire.extend_from_slice(data);
        wire.push(checksum::enhanced_checksum(pid, data));

        // The UART break interrupt fires first.
        BREAK.raise();
        sniffer.poll();
        for byte in wire {
            clock.advance(BYTE_US);
            lin_wire.borrow_mut().push_back(byte);
            sniffer.poll();
        }

        // A CAN frame arrives between LIN slots.
        clock.advance(2_000);
        can_bus
            .borrow_mut()
            .extend(CanFrame::standard(0x100, &[id, 0xFF]));
        sniffer.poll();
        clock.advance(3_000);
    }
    sniffer.apply(Command::Stop)?;

    // Step 3: Read back
    println!("\n3. Captured entries:");
    for entry in sniffer.session().entries()? {
        if let CaptureEntry::Frame(record) = entry {
            println!(
                "   {:>8} us  {:?}  id {:#x}  {:02X?}  valid={}",
                record.timestamp_us,
                record.bus,
                record.identifier,
                record.payload.as_slice(),
                record.integrity_valid
            );
        }
    }
    if let Response::Statistics(snapshot) = sniffer.apply(Command::Statistics)? {
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| bus_sniffer::Error::ConfigParse(e.to_string()))?;
        println!("\n   Statistics:\n   {}", json.replace('\n', "\n   "));
    }

    // Step 4: Raw tap and replay
    println!("\n4. Raw tap and replay...");
    sniffer.reset()?;
    sniffer.set_byte_mode(ByteMode::RawTap)?;
    sniffer.start();
    for byte in [0x00, 0x55, 0xB1, 0x0C, 0x00, 0x42] {
        clock.advance(BYTE_US);
        lin_wire.borrow_mut().push_back(byte);
        sniffer.poll();
    }
    sniffer.stop();

    let result = replay::recover_entries(
        sniffer.session().entries()?,
        config.lengths.clone(),
        config.lin_timing(),
    );
    println!(
        "   {} raw bytes -> {} frames",
        result.stats.bytes_observed,
        result.records.len()
    );

    println!("\nDone.");
    Ok(())
}
