//! Per-identifier data length table.
//!
//! The bus under observation does not follow the nominal LIN length rules, so
//! lengths are supplied as configuration: one optional entry per 6-bit
//! identifier. Identifiers without an entry fall back to the generic LIN 1.x
//! tiers:
//!
//! | Identifier range | Data bytes |
//! |------------------|------------|
//! | `0x00..=0x1F`    | 2          |
//! | `0x20..=0x2F`    | 4          |
//! | `0x30..=0x3F`    | 8          |

use alloc::collections::BTreeMap;

use super::checksum::MAX_LIN_ID;
use crate::error::{Error, Result};
use crate::record::MAX_PAYLOAD_LEN;

const TABLE_SIZE: usize = MAX_LIN_ID as usize + 1;

/// Generic LIN 1.x data length for an identifier.
pub fn default_length(id: u8) -> u8 {
    match id & MAX_LIN_ID {
        0x00..=0x1F => 2,
        0x20..=0x2F => 4,
        _ => 8,
    }
}

/// Injectable identifier → data length mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "BTreeMap<u8, u8>", into = "BTreeMap<u8, u8>")
)]
pub struct LengthTable {
    entries: [Option<u8>; TABLE_SIZE],
}

impl LengthTable {
    /// A table with no entries: every identifier uses the generic tiers.
    pub fn new() -> Self {
        Self {
            entries: [None; TABLE_SIZE],
        }
    }

    /// Build a table from `(identifier, length)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u8, u8)>,
    {
        let mut table = Self::new();
        for (id, len) in pairs {
            table.set(id, len)?;
        }
        Ok(table)
    }

    /// Set the length for one identifier.
    pub fn set(&mut self, id: u8, len: u8) -> Result<()> {
        if id > MAX_LIN_ID {
            return Err(Error::InvalidIdentifier(id));
        }
        if len as usize > MAX_PAYLOAD_LEN {
            return Err(Error::InvalidDataLength { id, len });
        }
        self.entries[id as usize] = Some(len);
        Ok(())
    }

    /// Builder form of [`set`](Self::set).
    pub fn with_entry(mut self, id: u8, len: u8) -> Result<Self> {
        self.set(id, len)?;
        Ok(self)
    }

    /// Remove an entry so the identifier falls back to the generic tiers.
    pub fn clear(&mut self, id: u8) {
        if let Some(slot) = self.entries.get_mut(id as usize) {
            *slot = None;
        }
    }

    /// Configured length for an identifier, if any.
    pub fn entry(&self, id: u8) -> Option<u8> {
        self.entries.get(id as usize).copied().flatten()
    }

    /// Data length for an identifier's low 6 bits. Always defined.
    pub fn len_for(&self, id: u8) -> u8 {
        let id = id & MAX_LIN_ID;
        self.entry(id).unwrap_or_else(|| default_length(id))
    }

    /// Number of identifiers with an explicit entry.
    pub fn configured(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Explicit entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(id, len)| len.map(|len| (id as u8, len)))
    }
}

impl Default for LengthTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<BTreeMap<u8, u8>> for LengthTable {
    type Error = Error;

    fn try_from(map: BTreeMap<u8, u8>) -> Result<Self> {
        Self::from_pairs(map)
    }
}

impl From<LengthTable> for BTreeMap<u8, u8> {
    fn from(table: LengthTable) -> Self {
        table.iter().collect()
    }
}
