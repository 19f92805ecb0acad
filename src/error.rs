//! Error types for capture operations.
//!
//! This module defines two things:
//!
//! - [`Error`], returned from API calls that can be misused (resetting a running
//!   session, reading records mid-capture) or from configuration loading.
//! - [`Fault`], the non-fatal faults the capture paths resolve on their own.
//!   Faults are counted and reported, never propagated as `Err`.
//!
//! # Example
//!
//! ```
//! use bus_sniffer::{CaptureSession, Error};
//!
//! let mut session = CaptureSession::new(16);
//! session.start(0);
//! match session.reset() {
//!     Err(Error::SessionRunning) => session.stop(10),
//!     other => panic!("unexpected {other:?}"),
//! }
//! assert!(session.reset().is_ok());
//! ```

use core::fmt;

use alloc::string::String;

/// Errors that can occur when driving a capture session.
#[derive(Debug)]
pub enum Error {
    /// The operation is only allowed while no session is running.
    ///
    /// Returned by `reset()`, by record iteration, and by mode changes.
    SessionRunning,

    /// A length table entry exceeds the 8-byte LIN data limit.
    InvalidDataLength {
        /// Frame identifier the entry was for
        id: u8,
        /// Rejected length
        len: u8,
    },

    /// A frame identifier does not fit in 6 bits.
    InvalidIdentifier(u8),

    /// A deserialized payload claims more than 8 data bytes.
    InvalidPayloadLength(u8),

    /// A configuration value is out of range.
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    ///
    /// Only available with the `std` feature.
    #[cfg(feature = "std")]
    ConfigParse(String),

    /// An I/O error occurred while reading a configuration file.
    ///
    /// Only available with the `std` feature.
    #[cfg(feature = "std")]
    IOError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SessionRunning => write!(f, "Operation not allowed while a session is running"),
            Error::InvalidDataLength { id, len } => {
                write!(f, "Invalid data length {len} for frame {id:#04x}: at most 8 bytes")
            }
            Error::InvalidIdentifier(id) => {
                write!(f, "Invalid frame identifier {id:#04x}: must fit in 6 bits")
            }
            Error::InvalidPayloadLength(len) => {
                write!(f, "Invalid payload length {len}: at most 8 bytes")
            }
            Error::InvalidConfig(s) => write!(f, "Invalid configuration: {s}"),
            #[cfg(feature = "std")]
            Error::ConfigParse(s) => write!(f, "Configuration parse error: {s}"),
            #[cfg(feature = "std")]
            Error::IOError(e) => write!(f, "I/O error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}

/// A specialized Result type for capture operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Non-fatal faults raised by the acquisition paths.
///
/// None of these stop the capture loop. The worst outcome is a lost frame or
/// a halted capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fault {
    /// The capture buffer is exhausted; the session is now terminal.
    BufferFull,
    /// The trailing byte matched neither checksum convention.
    ///
    /// The record is still captured, tagged as invalid.
    IntegrityFailure,
    /// The byte following a break was not the sync value. No record.
    MalformedSync,
    /// No byte arrived within the inter-byte timeout mid-frame. No record.
    StallTimeout,
    /// A new break arrived before the current frame completed. No record.
    BreakAbort,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Fault::BufferFull => "capture buffer full",
            Fault::IntegrityFailure => "checksum mismatch",
            Fault::MalformedSync => "malformed sync byte",
            Fault::StallTimeout => "inter-byte timeout",
            Fault::BreakAbort => "frame interrupted by break",
        };
        f.write_str(s)
    }
}
