//! CAN frame-bus capture.
//!
//! This module connects the sniffer to a CAN controller through the
//! [`embedded-can`](https://crates.io/crates/embedded-can) frame trait, so any
//! driver exposing `embedded_can::Frame` values can be used.
//!
//! # Features
//!
//! - Listen-only controller setup through [`FrameSource`]
//! - Non-blocking drain of all pending frames per tick
//! - Standard (11-bit) and Extended (29-bit) identifiers, remote frames
//!
//! # Example
//!
//! ```
//! use bus_sniffer::can::{CanFrame, FrameAcquisition, FrameSource};
//!
//! struct OneShot(Option<CanFrame>);
//!
//! impl FrameSource for OneShot {
//!     type Frame = CanFrame;
//!     fn try_receive(&mut self) -> Option<CanFrame> {
//!         self.0.take()
//!     }
//! }
//!
//! let frame = CanFrame::standard(0x123, &[0xDE, 0xAD]).unwrap();
//! let mut acquisition = FrameAcquisition::new(OneShot(Some(frame)), 500_000);
//!
//! let mut records = Vec::new();
//! acquisition.drain(1_000, |record| records.push(record));
//! assert_eq!(records[0].identifier, 0x123);
//! assert!(records[0].integrity_valid);
//! ```

mod acquisition;
mod frame;

pub use acquisition::{FrameAcquisition, FrameSource, NullFrameSource, record_from_frame};
pub use frame::{CanFrame, raw_id};
