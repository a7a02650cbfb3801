// src/common/hal_traits.rs

use core::fmt::Debug;
use core::time::Duration;

/// Parity setting of the serial line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StopBits {
    One,
    Two,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

/// Which buffers a purge discards.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    Input,
    Output,
    All,
}

/// Line settings applied by [`IoStream::configure`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
}

impl SerialSettings {
    /// 115200 baud, 8N1, no flow control.
    pub const GOA: SerialSettings = SerialSettings {
        baud_rate: 115_200,
        data_bits: 8,
        parity: Parity::None,
        stop_bits: StopBits::One,
        flow_control: FlowControl::None,
    };
}

/// Abstraction for the blocking byte stream the driver talks over.
///
/// `read` and `write` block until the full buffer is transferred or the
/// timeout set with [`set_timeout`](IoStream::set_timeout) expires; on
/// timeout they return the number of bytes actually transferred (possibly 0)
/// and the driver reports a [`GoaError::Timeout`](super::GoaError::Timeout).
pub trait IoStream {
    /// Associated error type for transport failures.
    type Error: Debug;

    /// Applies baud rate, framing and flow control.
    fn configure(&mut self, settings: SerialSettings) -> Result<(), Self::Error>;

    /// Sets the timeout for subsequent reads.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error>;

    /// Drives the RTS line.
    fn set_rts(&mut self, level: bool) -> Result<(), Self::Error>;

    /// Drives the DTR line.
    fn set_dtr(&mut self, level: bool) -> Result<(), Self::Error>;

    /// Blocks for at least `duration`.
    fn sleep(&mut self, duration: Duration);

    /// Discards pending bytes in the given direction.
    fn purge(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Reads up to `buf.len()` bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Writes up to `buf.len()` bytes, returning how many were written.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
}

impl<T: IoStream + ?Sized> IoStream for &mut T {
    type Error = T::Error;

    fn configure(&mut self, settings: SerialSettings) -> Result<(), Self::Error> {
        (**self).configure(settings)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error> {
        (**self).set_timeout(timeout)
    }

    fn set_rts(&mut self, level: bool) -> Result<(), Self::Error> {
        (**self).set_rts(level)
    }

    fn set_dtr(&mut self, level: bool) -> Result<(), Self::Error> {
        (**self).set_dtr(level)
    }

    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }

    fn purge(&mut self, direction: Direction) -> Result<(), Self::Error> {
        (**self).purge(direction)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        (**self).write(buf)
    }
}
