//! Static configuration, fixed when the sniffer is built.
//!
//! # Example
//!
//! ```
//! use bus_sniffer::{ByteMode, MonitorTarget, SnifferConfig};
//!
//! let config = SnifferConfig::from_json(
//!     r#"{
//!         "lin_bitrate": 10400,
//!         "capacity": 500,
//!         "monitor": "ByteStream",
//!         "lengths": { "49": 2, "2": 8 }
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.monitor, MonitorTarget::ByteStream);
//! assert_eq!(config.byte_mode, ByteMode::Recover);
//! assert_eq!(config.lengths.len_for(0x31), 2);
//! ```

use alloc::format;

use crate::error::{Error, Result};
use crate::lin::LengthTable;

/// Bits on the wire per LIN byte (start + 8 data + stop).
pub const BITS_PER_BYTE: u64 = 10;

/// Byte periods of silence that mark a frame boundary.
pub const GAP_BYTE_PERIODS: u64 = 2;

/// Default inter-byte timeout mid-frame.
pub const DEFAULT_INTER_BYTE_TIMEOUT_US: u64 = 20_000;

/// Which buses the acquisition loop services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MonitorTarget {
    /// CAN controller only.
    FrameBus,
    /// LIN serial tap only.
    ByteStream,
    /// Both buses.
    #[default]
    Both,
}

impl MonitorTarget {
    /// Check if the frame bus is serviced.
    pub fn frame_bus(self) -> bool {
        matches!(self, MonitorTarget::FrameBus | MonitorTarget::Both)
    }

    /// Check if the byte stream is serviced.
    pub fn byte_stream(self) -> bool {
        matches!(self, MonitorTarget::ByteStream | MonitorTarget::Both)
    }
}

/// What happens to bytes read from the serial tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteMode {
    /// Reconstruct frames.
    #[default]
    Recover,
    /// Store every byte with its timestamp, bypassing recovery.
    RawTap,
}

/// Timing thresholds for LIN frame recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinTiming {
    /// Idle silence before a sync byte counts as a frame start.
    pub gap_threshold_us: u64,
    /// Mid-frame silence after which the frame is abandoned.
    pub inter_byte_timeout_us: u64,
}

impl LinTiming {
    /// Thresholds for a bus running at `bitrate` bits per second.
    ///
    /// The gap threshold is two byte periods; the timeout is the default.
    pub fn for_bitrate(bitrate: u32) -> Self {
        let bitrate = u64::from(bitrate.max(1));
        Self {
            gap_threshold_us: GAP_BYTE_PERIODS * BITS_PER_BYTE * 1_000_000 / bitrate,
            inter_byte_timeout_us: DEFAULT_INTER_BYTE_TIMEOUT_US,
        }
    }

    /// Set the inter-byte timeout.
    pub fn with_inter_byte_timeout(mut self, timeout_us: u64) -> Self {
        self.inter_byte_timeout_us = timeout_us;
        self
    }

    /// Set the gap threshold.
    pub fn with_gap_threshold(mut self, gap_us: u64) -> Self {
        self.gap_threshold_us = gap_us;
        self
    }
}

impl Default for LinTiming {
    fn default() -> Self {
        Self::for_bitrate(SnifferConfig::DEFAULT_LIN_BITRATE)
    }
}

/// Sniffer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SnifferConfig {
    /// CAN bitrate in bits per second, applied to the controller at init.
    pub can_bitrate: u32,
    /// LIN bitrate in bits per second.
    pub lin_bitrate: u32,
    /// Capture buffer capacity in entries.
    pub capacity: usize,
    /// Buses to service.
    pub monitor: MonitorTarget,
    /// Recovery or raw tap for the byte stream.
    pub byte_mode: ByteMode,
    /// Recovery thresholds. Derived from `lin_bitrate` when absent.
    pub lin: Option<LinTiming>,
    /// Per-identifier LIN data lengths.
    pub lengths: LengthTable,
}

impl SnifferConfig {
    /// Default CAN bitrate.
    pub const DEFAULT_CAN_BITRATE: u32 = 500_000;
    /// Default LIN bitrate.
    pub const DEFAULT_LIN_BITRATE: u32 = 19_200;
    /// Default capture capacity.
    pub const DEFAULT_CAPACITY: usize = 2_000;

    /// Set the capture capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the CAN bitrate.
    pub fn with_can_bitrate(mut self, bitrate: u32) -> Self {
        self.can_bitrate = bitrate;
        self
    }

    /// Set the LIN bitrate.
    pub fn with_lin_bitrate(mut self, bitrate: u32) -> Self {
        self.lin_bitrate = bitrate;
        self
    }

    /// Set which buses are serviced.
    pub fn with_monitor(mut self, monitor: MonitorTarget) -> Self {
        self.monitor = monitor;
        self
    }

    /// Set the byte-stream mode.
    pub fn with_byte_mode(mut self, mode: ByteMode) -> Self {
        self.byte_mode = mode;
        self
    }

    /// Override the recovery thresholds.
    pub fn with_lin_timing(mut self, timing: LinTiming) -> Self {
        self.lin = Some(timing);
        self
    }

    /// Set the length table.
    pub fn with_lengths(mut self, lengths: LengthTable) -> Self {
        self.lengths = lengths;
        self
    }

    /// Recovery thresholds in effect.
    pub fn lin_timing(&self) -> LinTiming {
        self.lin
            .unwrap_or_else(|| LinTiming::for_bitrate(self.lin_bitrate))
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig("capacity must be non-zero".into()));
        }
        if self.monitor.frame_bus() && self.can_bitrate == 0 {
            return Err(Error::InvalidConfig("CAN bitrate must be non-zero".into()));
        }
        if self.monitor.byte_stream() && self.lin_bitrate == 0 {
            return Err(Error::InvalidConfig("LIN bitrate must be non-zero".into()));
        }
        let timing = self.lin_timing();
        if timing.inter_byte_timeout_us <= timing.gap_threshold_us {
            return Err(Error::InvalidConfig(format!(
                "inter-byte timeout ({} us) must exceed the gap threshold ({} us)",
                timing.inter_byte_timeout_us, timing.gap_threshold_us
            )));
        }
        Ok(())
    }

    /// Parse a JSON configuration. Missing fields take their defaults.
    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SnifferConfig =
            serde_json::from_str(json).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    #[cfg(feature = "std")]
    pub fn to_json(&self) -> Result<alloc::string::String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Load a JSON configuration file.
    #[cfg(feature = "std")]
    pub fn load_from_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self {
            can_bitrate: Self::DEFAULT_CAN_BITRATE,
            lin_bitrate: Self::DEFAULT_LIN_BITRATE,
            capacity: Self::DEFAULT_CAPACITY,
            monitor: MonitorTarget::default(),
            byte_mode: ByteMode::default(),
            lin: None,
            lengths: LengthTable::new(),
        }
    }
}
