#[cfg(feature = "embedded-hal")]
pub(crate) mod embedded_hal;
pub(crate) mod std_io;

use crate::error::Result;

/// Byte stream towards a device: serial port, USB bulk endpoint pair or GPIB adapter.
///
/// Opening, configuring and closing the underlying port is left to the caller.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    fn write(&mut self, buf: &[u8]) -> Result<()>;
    /// Returns at most `max_len` bytes, an empty vector when nothing arrived
    fn read(&mut self, max_len: usize) -> Result<Vec<u8>>;
}

/// SPI register access split over two chip selects, one for commands and one for pixel data
#[cfg_attr(test, mockall::automock)]
pub trait RegisterBus {
    /// Sends `frame` on the command channel and returns `read_len` reply bytes
    fn exchange(&mut self, frame: &[u8], read_len: usize) -> Result<Vec<u8>>;
    /// Clocks `len` bytes out of the data channel
    fn read_data(&mut self, len: usize) -> Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write(buf)
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>> {
        (**self).read(max_len)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write(buf)
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>> {
        (**self).read(max_len)
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn exchange(&mut self, frame: &[u8], read_len: usize) -> Result<Vec<u8>> {
        (**self).exchange(frame, read_len)
    }

    fn read_data(&mut self, len: usize) -> Result<Vec<u8>> {
        (**self).read_data(len)
    }
}

/// Formats bytes the way wire traffic is logged throughout the crate
pub(crate) fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
