//! A plain classic CAN frame.

use embedded_can::{ExtendedId, Frame, Id, StandardId};

use crate::record::MAX_PAYLOAD_LEN;

/// Classic CAN frame (up to 8 data bytes) implementing [`embedded_can::Frame`].
///
/// Controller drivers can deliver their own frame type instead; this one is
/// for drivers that do not have one and for replaying stored traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    id: Id,
    data: [u8; MAX_PAYLOAD_LEN],
    dlc: usize,
    remote: bool,
}

impl CanFrame {
    /// Create a data frame with an 11-bit identifier.
    ///
    /// Returns `None` if the identifier or data length is out of range.
    pub fn standard(id: u16, data: &[u8]) -> Option<Self> {
        Self::new(StandardId::new(id)?, data)
    }

    /// Create a data frame with a 29-bit identifier.
    ///
    /// Returns `None` if the identifier or data length is out of range.
    pub fn extended(id: u32, data: &[u8]) -> Option<Self> {
        Self::new(ExtendedId::new(id)?, data)
    }

    /// Raw identifier value, without the standard/extended distinction.
    pub fn raw_id(&self) -> u32 {
        raw_id(self.id)
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_PAYLOAD_LEN {
            return None;
        }
        let mut frame_data = [0u8; MAX_PAYLOAD_LEN];
        frame_data[..data.len()].copy_from_slice(data);
        Some(Self {
            id: id.into(),
            data: frame_data,
            dlc: data.len(),
            remote: false,
        })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_PAYLOAD_LEN {
            return None;
        }
        Some(Self {
            id: id.into(),
            data: [0u8; MAX_PAYLOAD_LEN],
            dlc,
            remote: true,
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.dlc
    }

    fn data(&self) -> &[u8] {
        if self.remote {
            &[]
        } else {
            &self.data[..self.dlc]
        }
    }
}

/// Numeric value of an identifier.
pub fn raw_id(id: Id) -> u32 {
    match id {
        Id::Standard(id) => id.as_raw() as u32,
        Id::Extended(id) => id.as_raw(),
    }
}
