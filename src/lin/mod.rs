//! LIN byte-stream capture.
//!
//! LIN is a low-cost, single-wire master/slave bus. The sniffer taps its
//! receive line with a UART whose transmitter is disabled, so all it ever sees
//! is a stream of bytes, each frame laid out as:
//!
//! - Break field (read as `0x00`, reported separately by the UART)
//! - Sync byte `0x55`
//! - Protected identifier: 6-bit ID plus 2 parity bits
//! - 0-8 data bytes, count given by a [`LengthTable`]
//! - Checksum, classic or enhanced
//!
//! [`FrameRecovery`] turns the stream back into frames. In raw tap mode the
//! bytes bypass recovery and are stored as-is; [`replay`] runs recovery over
//! such a capture afterwards.

pub mod checksum;
mod length;
mod recovery;
pub mod replay;
mod signal;
mod tap;

pub use checksum::{ChecksumType, MAX_LIN_ID, SYNC_BYTE};
pub use length::{LengthTable, default_length};
pub use recovery::{FrameRecovery, RecoveredFrame, RecoveryEvent, RecoveryState};
pub use signal::BreakSignal;
pub use tap::{NullTap, SerialTap};
