//! Frame-bus acquisition.
//!
//! The CAN controller does the hard work: it delimits frames and checks their
//! CRC. Acquisition only has to drain whatever the controller holds on each
//! tick and turn every frame into a [`CaptureRecord`].

use embedded_can::Frame;

use super::frame::{CanFrame, raw_id};
use crate::record::{CaptureRecord, Payload, RecordFlags};

/// A CAN controller running in listen-only mode.
pub trait FrameSource {
    /// Frame type delivered by the controller.
    type Frame: Frame;

    /// Next received frame, or `None` if none is pending. Never blocks.
    fn try_receive(&mut self) -> Option<Self::Frame>;

    /// Configure listen-only (no acknowledge, no transmit) operation.
    ///
    /// Called once at initialization.
    fn enable_listen_only(&mut self, _bitrate: u32) {}
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    type Frame = S::Frame;

    fn try_receive(&mut self) -> Option<Self::Frame> {
        (**self).try_receive()
    }

    fn enable_listen_only(&mut self, bitrate: u32) {
        (**self).enable_listen_only(bitrate)
    }
}

/// Source for setups without a CAN connection. Never yields a frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFrameSource;

impl FrameSource for NullFrameSource {
    type Frame = CanFrame;

    fn try_receive(&mut self) -> Option<CanFrame> {
        None
    }
}

/// Build a capture record from any [`embedded_can::Frame`].
///
/// The controller has already verified the frame, so integrity is valid.
pub fn record_from_frame<F: Frame>(timestamp_us: u64, frame: &F) -> CaptureRecord {
    let flags = RecordFlags::empty()
        .with_extended(frame.is_extended())
        .with_remote(frame.is_remote_frame());
    let data = frame.data();
    // Classic CAN never carries more than 8 bytes.
    let payload = Payload::from_slice(&data[..data.len().min(8)]).unwrap_or_default();
    CaptureRecord::can(timestamp_us, raw_id(frame.id()), payload, flags)
}

/// Drains a [`FrameSource`] into capture records.
#[derive(Debug)]
pub struct FrameAcquisition<S> {
    source: S,
}

impl<S: FrameSource> FrameAcquisition<S> {
    /// Wrap a controller and switch it to listen-only at `bitrate`.
    pub fn new(mut source: S, bitrate: u32) -> Self {
        source.enable_listen_only(bitrate);
        Self { source }
    }

    /// Drain every pending frame.
    ///
    /// Each frame becomes a record stamped `timestamp_us` and is handed to
    /// `sink`. Returns the number of frames drained.
    pub fn drain<F>(&mut self, timestamp_us: u64, mut sink: F) -> usize
    where
        F: FnMut(CaptureRecord),
    {
        let mut drained = 0;
        while let Some(frame) = self.source.try_receive() {
            sink(record_from_frame(timestamp_us, &frame));
            drained += 1;
        }
        if drained > 0 {
            log::trace!("drained {drained} CAN frames");
        }
        drained
    }

    /// The wrapped controller.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The wrapped controller, mutably.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Unwrap the controller.
    pub fn into_inner(self) -> S {
        self.source
    }
}
