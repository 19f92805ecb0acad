//! Capture record types.
//!
//! A [`CaptureRecord`] is one observed protocol unit from either bus. In raw
//! tap mode the byte-stream side produces [`RawByte`]s instead. Both are stored
//! in the capture buffer as a [`CaptureEntry`].

use core::fmt;

#[cfg(feature = "serde")]
use crate::error::{Error, Result};

/// Maximum payload size (8 bytes) on both buses.
pub const MAX_PAYLOAD_LEN: usize = 8;

/// Which bus a record was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bus {
    /// Frame-oriented bus (CAN), delimited and checked by the controller.
    Can,
    /// Master/slave byte-stream bus (LIN), recovered from raw bytes.
    Lin,
}

/// Bus-specific record flags.
///
/// Only the frame bus sets any; byte-stream records always carry empty flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordFlags(u8);

impl RecordFlags {
    /// Bit 0: 29-bit extended identifier.
    pub const EXTENDED: u8 = 0x01;
    /// Bit 1: Remote transmission request.
    pub const REMOTE: u8 = 0x02;

    /// Create flags from raw byte.
    pub fn from_byte(value: u8) -> Self {
        Self(value)
    }

    /// Get raw byte value.
    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// No flags set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Check if the identifier is a 29-bit extended identifier.
    pub fn is_extended(self) -> bool {
        self.0 & Self::EXTENDED != 0
    }

    /// Check if this is a remote transmission request.
    pub fn is_remote(self) -> bool {
        self.0 & Self::REMOTE != 0
    }

    /// Set the extended identifier flag.
    pub fn with_extended(self, extended: bool) -> Self {
        if extended {
            Self(self.0 | Self::EXTENDED)
        } else {
            Self(self.0 & !Self::EXTENDED)
        }
    }

    /// Set the remote request flag.
    pub fn with_remote(self, remote: bool) -> Self {
        if remote {
            Self(self.0 | Self::REMOTE)
        } else {
            Self(self.0 & !Self::REMOTE)
        }
    }
}

/// Frame payload of 0-8 bytes.
///
/// Stored inline and zero-padded; the length can never exceed
/// [`MAX_PAYLOAD_LEN`].
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PayloadFields"))]
pub struct Payload {
    data: [u8; MAX_PAYLOAD_LEN],
    len: u8,
}

impl Payload {
    /// Empty payload.
    pub const fn empty() -> Self {
        Self {
            data: [0; MAX_PAYLOAD_LEN],
            len: 0,
        }
    }

    /// Build a payload from a slice.
    ///
    /// Returns `None` if the slice is longer than 8 bytes.
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        if data.len() > MAX_PAYLOAD_LEN {
            return None;
        }
        let mut payload = Self::empty();
        payload.data[..data.len()].copy_from_slice(data);
        payload.len = data.len() as u8;
        Some(payload)
    }

    /// Append one byte. Returns `false` if the payload is already full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.data[self.len as usize] = byte;
        self.len += 1;
        true
    }

    /// Number of data bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Check if the payload holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if the payload holds 8 bytes.
    pub fn is_full(&self) -> bool {
        self.len as usize == MAX_PAYLOAD_LEN
    }

    /// Get the data slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

/// Unchecked wire form of [`Payload`], validated on the way in.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct PayloadFields {
    data: [u8; MAX_PAYLOAD_LEN],
    len: u8,
}

#[cfg(feature = "serde")]
impl TryFrom<PayloadFields> for Payload {
    type Error = Error;

    fn try_from(fields: PayloadFields) -> Result<Self> {
        fields
            .data
            .get(..usize::from(fields.len))
            .and_then(Self::from_slice)
            .ok_or(Error::InvalidPayloadLength(fields.len))
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Checksum detail for a frame recovered from the byte stream.
///
/// `integrity_valid` on the record is `classic_match || enhanced_match`; the
/// individual outcomes are kept so analysis can tell the conventions apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinChecksum {
    /// Protected identifier byte as observed on the line (parity included).
    pub protected_id: u8,
    /// Trailing checksum byte as observed.
    pub observed: u8,
    /// Observed byte equals the data-only checksum.
    pub classic_match: bool,
    /// Observed byte equals the checksum including the protected identifier.
    pub enhanced_match: bool,
}

/// One observed protocol unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CaptureRecord {
    /// Microseconds since session start.
    ///
    /// For recovered LIN frames this is the start of the frame (break or
    /// inferred sync), not the arrival of the checksum byte.
    pub timestamp_us: u64,
    /// Bus the record came from.
    pub bus: Bus,
    /// 6-bit LIN identifier, or 11/29-bit CAN identifier.
    pub identifier: u32,
    /// Data bytes.
    pub payload: Payload,
    /// Always true on the frame bus; checksum outcome on the byte stream.
    pub integrity_valid: bool,
    /// Extended / remote flags (frame bus only).
    pub flags: RecordFlags,
    /// Checksum detail (byte stream only).
    pub checksum: Option<LinChecksum>,
}

impl CaptureRecord {
    /// Create a frame-bus record. Integrity is always valid.
    pub fn can(timestamp_us: u64, identifier: u32, payload: Payload, flags: RecordFlags) -> Self {
        Self {
            timestamp_us,
            bus: Bus::Can,
            identifier,
            payload,
            integrity_valid: true,
            flags,
            checksum: None,
        }
    }

    /// Create a byte-stream record from a recovered frame.
    pub fn lin(timestamp_us: u64, payload: Payload, checksum: LinChecksum) -> Self {
        Self {
            timestamp_us,
            bus: Bus::Lin,
            identifier: u32::from(checksum.protected_id & 0x3F),
            payload,
            integrity_valid: checksum.classic_match || checksum.enhanced_match,
            flags: RecordFlags::empty(),
            checksum: Some(checksum),
        }
    }
}

/// A single byte stored by the raw tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawByte {
    /// Microseconds since session start.
    pub timestamp_us: u64,
    /// Byte value as read from the line.
    pub value: u8,
}

impl RawByte {
    /// Create a new raw byte entry.
    pub fn new(timestamp_us: u64, value: u8) -> Self {
        Self {
            timestamp_us,
            value,
        }
    }
}

/// An entry in the capture buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CaptureEntry {
    /// A complete frame from either bus.
    Frame(CaptureRecord),
    /// A byte from the raw tap.
    Byte(RawByte),
}

impl CaptureEntry {
    /// Timestamp of the entry in microseconds since session start.
    pub fn timestamp_us(&self) -> u64 {
        match self {
            CaptureEntry::Frame(r) => r.timestamp_us,
            CaptureEntry::Byte(b) => b.timestamp_us,
        }
    }

    /// The frame record, if this entry is one.
    pub fn as_record(&self) -> Option<&CaptureRecord> {
        match self {
            CaptureEntry::Frame(r) => Some(r),
            CaptureEntry::Byte(_) => None,
        }
    }

    /// The raw byte, if this entry is one.
    pub fn as_raw_byte(&self) -> Option<&RawByte> {
        match self {
            CaptureEntry::Byte(b) => Some(b),
            CaptureEntry::Frame(_) => None,
        }
    }
}

impl From<CaptureRecord> for CaptureEntry {
    fn from(record: CaptureRecord) -> Self {
        CaptureEntry::Frame(record)
    }
}

impl From<RawByte> for CaptureEntry {
    fn from(byte: RawByte) -> Self {
        CaptureEntry::Byte(byte)
    }
}
