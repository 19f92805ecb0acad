//! The receive-only serial tap on the LIN wire.
//!
//! The UART driver behind [`SerialTap`] must have its transmitter disabled;
//! the sniffer never drives the bus. Break detection is reported separately
//! through a [`BreakSignal`](super::BreakSignal) raised from the driver's
//! interrupt handler.

/// Non-blocking byte source.
pub trait SerialTap {
    /// Next received byte, or `None` if the receive FIFO is empty.
    fn read_byte(&mut self) -> Option<u8>;

    /// Put the UART into receive-only mode. Called once at initialization.
    fn enable_receive_only(&mut self) {}
}

impl<T: SerialTap + ?Sized> SerialTap for &mut T {
    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn enable_receive_only(&mut self) {
        (**self).enable_receive_only()
    }
}

/// Tap for setups without a LIN connection. Never yields a byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTap;

impl SerialTap for NullTap {
    fn read_byte(&mut self) -> Option<u8> {
        None
    }
}
