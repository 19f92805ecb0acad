//! Protected identifier parity and checksum computation.
//!
//! Both checksum conventions use 8-bit addition with end-around carry and a
//! final inversion. They differ only in whether the protected identifier byte
//! is folded into the sum.

use crate::record::LinChecksum;

/// LIN frame ID range (0-63, 6 bits).
pub const MAX_LIN_ID: u8 = 63;

/// Sync byte value following every break.
pub const SYNC_BYTE: u8 = 0x55;

/// LIN checksum convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChecksumType {
    /// Classic checksum (LIN 1.x) - sum of data bytes only.
    #[default]
    Classic,
    /// Enhanced checksum (LIN 2.x) - sum of protected ID and data bytes.
    Enhanced,
}

fn carry_sum(seed: u16, data: &[u8]) -> u8 {
    let mut sum = seed;
    for &byte in data {
        sum += byte as u16;
        if sum > 0xFF {
            sum = (sum & 0xFF) + 1;
        }
    }
    !sum as u8
}

/// Classic checksum (data bytes only).
pub fn classic_checksum(data: &[u8]) -> u8 {
    carry_sum(0, data)
}

/// Enhanced checksum (protected ID + data bytes).
pub fn enhanced_checksum(protected_id: u8, data: &[u8]) -> u8 {
    carry_sum(protected_id as u16, data)
}

/// Checksum under the given convention.
pub fn checksum(kind: ChecksumType, protected_id: u8, data: &[u8]) -> u8 {
    match kind {
        ChecksumType::Classic => classic_checksum(data),
        ChecksumType::Enhanced => enhanced_checksum(protected_id, data),
    }
}

/// Compare an observed checksum byte against both conventions.
pub fn verify(protected_id: u8, data: &[u8], observed: u8) -> LinChecksum {
    LinChecksum {
        protected_id,
        observed,
        classic_match: classic_checksum(data) == observed,
        enhanced_match: enhanced_checksum(protected_id, data) == observed,
    }
}

/// Get the protected ID (ID with parity bits) for a 6-bit identifier.
pub fn protected_id(id: u8) -> u8 {
    let id = id & MAX_LIN_ID;
    let p0 = (id ^ (id >> 1) ^ (id >> 2) ^ (id >> 4)) & 0x01;
    let p1 = !((id >> 1) ^ (id >> 3) ^ (id >> 4) ^ (id >> 5)) & 0x01;
    id | (p0 << 6) | (p1 << 7)
}

/// Check the two parity bits of an observed protected identifier.
///
/// Diagnostic only: frames are never rejected on parity.
pub fn parity_ok(observed: u8) -> bool {
    protected_id(observed & MAX_LIN_ID) == observed
}
