//! Offline frame recovery over a raw tap capture.
//!
//! A raw tap session stores every byte with its timestamp and no
//! interpretation. Replaying those bytes through [`FrameRecovery`] shows what
//! the live decoder would have produced, and lets a length table or timing
//! thresholds be tuned against ground truth. Hardware break notifications are
//! not part of a raw capture, so replay relies on the silence-gap path alone.
//!
//! # Example
//!
//! ```
//! use bus_sniffer::lin::{replay, LengthTable};
//! use bus_sniffer::{LinTiming, RawByte};
//!
//! let bytes: Vec<RawByte> = [0x00, 0x55, 0xB1, 0x0C, 0x00, 0x42]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &b)| RawByte::new(5_000 + 520 * i as u64, b))
//!     .collect();
//!
//! let lengths = LengthTable::new().with_entry(0x31, 2).unwrap();
//! let result = replay::recover(&bytes, lengths, LinTiming::for_bitrate(19_200));
//! assert_eq!(result.records.len(), 1);
//! assert_eq!(result.records[0].timestamp_us, 5_000);
//! ```

use alloc::vec::Vec;

use super::length::LengthTable;
use super::recovery::{FrameRecovery, RecoveryEvent};
use crate::config::LinTiming;
use crate::record::{CaptureEntry, CaptureRecord, RawByte};
use crate::stats::Statistics;

/// Outcome of a replay.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    /// Recovered frames, timestamped as the input bytes are.
    pub records: Vec<CaptureRecord>,
    /// Recovery counters for the replayed bytes.
    pub stats: Statistics,
}

/// Run frame recovery over stored bytes.
///
/// Timestamps are taken from the bytes, so records keep the original
/// session-relative times.
pub fn recover(bytes: &[RawByte], lengths: LengthTable, timing: LinTiming) -> Replay {
    let mut recovery = FrameRecovery::new(lengths, timing);
    let mut replay = Replay::default();

    {
        let Replay { records, stats } = &mut replay;
        let mut sink = |event: RecoveryEvent| {
            stats.record_recovery(&event);
            if let RecoveryEvent::Frame(frame) = event {
                records.push(frame.into_record(0));
            }
        };

        for byte in bytes {
            recovery.on_byte(byte.value, byte.timestamp_us, &mut sink);
        }
        if let Some(last) = bytes.last() {
            // Anything still open at the end of the capture is a stall.
            let end_us = last
                .timestamp_us
                .saturating_add(timing.inter_byte_timeout_us.saturating_add(1));
            recovery.poll(end_us, &mut sink);
        }
    }

    replay.stats.bytes_observed = bytes.len() as u64;
    replay
}

/// Run frame recovery over the raw bytes held in capture entries.
///
/// Frame entries are skipped.
pub fn recover_entries<'a, I>(entries: I, lengths: LengthTable, timing: LinTiming) -> Replay
where
    I: IntoIterator<Item = &'a CaptureEntry>,
{
    let bytes: Vec<RawByte> = entries
        .into_iter()
        .filter_map(|e| e.as_raw_byte().copied())
        .collect();
    recover(&bytes, lengths, timing)
}
