#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # bus-sniffer
//!
//! A passive capture engine for automotive serial buses.
//!
//! The engine sits on two buses without ever taking part in them: a
//! frame-oriented bus (CAN) whose controller runs in listen-only mode and
//! delivers already-delimited frames, and a master/slave single-wire bus (LIN)
//! tapped on the receive line only, where frame boundaries have to be
//! reconstructed from raw bytes and timing.
//!
//! ## Features
//!
//! - **Frame recovery**: break/sync/identifier/data/checksum reconstruction of
//!   LIN frames from an undelimited byte stream, with a hardware break flag and
//!   a silence-gap fallback running side by side
//! - **Dual checksum**: classic and enhanced checksums are both computed, a
//!   frame is valid if either matches
//! - **Injectable length table**: per-identifier data lengths observed on the
//!   real bus, with the generic length tiers as fallback
//! - **Raw tap**: bypass mode storing every byte with its timestamp
//! - **Bounded capture**: fixed-capacity, non-circular buffer; the oldest data
//!   is kept and the session ends in a terminal `BufferFull` state
//! - **Statistics**: observed, captured, dropped and invalid counters plus
//!   recovery diagnostics
//!
//! ## Quick Start
//!
//! ```ignore
//! use bus_sniffer::{BreakSignal, SnifferConfig, Sniffer, StdClock};
//!
//! static BREAK: BreakSignal = BreakSignal::new();
//!
//! // The UART driver calls `BREAK.raise()` from its break interrupt.
//! let config = SnifferConfig::default().with_capacity(4096);
//! let mut sniffer = Sniffer::new(config, &BREAK, uart, can_controller, StdClock::new())?;
//!
//! sniffer.start();
//! loop {
//!     sniffer.poll();
//!     if sniffer.session().is_buffer_full() {
//!         break;
//!     }
//! }
//! sniffer.stop();
//!
//! for entry in sniffer.session().entries()? {
//!     println!("{entry:?}");
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`lin`] | Byte-stream frame recovery, checksums, length table, raw tap |
//! | [`can`] | Frame-bus acquisition over [`embedded_can::Frame`] |
//! | [`buffer`] | Bounded append-only capture buffer |
//! | [`record`] | Capture records, raw bytes and payloads |
//! | [`session`] | Capture session lifecycle and statistics ownership |
//! | [`stats`] | Counters and statistics snapshots |
//! | [`sniffer`] | The cooperative scheduling loop and host commands |
//! | [`config`] | Static configuration surface |
//! | [`time`] | Microsecond clock abstraction |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! Capture faults (full buffer, bad checksum, malformed sync, stalled frame)
//! are never errors: they are resolved locally and show up in the statistics.
//! [`Result<T>`] is only returned for misuse of the API, such as resetting a
//! running session, and for configuration problems.

extern crate alloc;

pub mod buffer;
pub mod can;
pub mod config;
pub mod error;
pub mod lin;
pub mod record;
pub mod session;
pub mod sniffer;
pub mod stats;
pub mod time;

// Re-export commonly used types at the crate root
pub use buffer::{BufferFull, CaptureBuffer};
pub use can::{CanFrame, FrameAcquisition, FrameSource};
pub use config::{ByteMode, LinTiming, MonitorTarget, SnifferConfig};
pub use error::{Error, Fault, Result};
pub use lin::{BreakSignal, FrameRecovery, LengthTable, RecoveryState, SerialTap};
pub use record::{Bus, CaptureEntry, CaptureRecord, LinChecksum, Payload, RawByte, RecordFlags};
pub use session::{CaptureSession, SessionState};
pub use sniffer::{Command, Response, Sniffer};
pub use stats::{Statistics, StatisticsSnapshot};
#[cfg(feature = "std")]
pub use time::StdClock;
pub use time::{Clock, ManualClock};
