use super::RegisterBus;
use crate::error::{Error, Result};
use ::embedded_hal::spi::{Operation, SpiDevice};

/// Drives the Freedom register interface through two `embedded-hal` SPI devices.
///
/// Each device owns its chip select, so the command frame and its reply share one transaction.
pub struct EmbeddedHalSpiAdapter<CMD: SpiDevice, DATA: SpiDevice> {
    command: CMD,
    data: DATA,
}

impl<CMD: SpiDevice, DATA: SpiDevice> EmbeddedHalSpiAdapter<CMD, DATA> {
    pub fn new(command: CMD, data: DATA) -> Self {
        EmbeddedHalSpiAdapter { command, data }
    }

    pub fn release(self) -> (CMD, DATA) {
        (self.command, self.data)
    }
}

impl<CMD: SpiDevice, DATA: SpiDevice> RegisterBus for EmbeddedHalSpiAdapter<CMD, DATA> {
    fn exchange(&mut self, frame: &[u8], read_len: usize) -> Result<Vec<u8>> {
        let mut reply = vec![0u8; read_len];
        if read_len == 0 {
            self.command.write(frame).map_err(|_| Error::BusError)?;
        } else {
            self.command
                .transaction(&mut [Operation::Write(frame), Operation::Read(&mut reply)])
                .map_err(|_| Error::BusError)?;
        }
        Ok(reply)
    }

    fn read_data(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.data.read(&mut buf).map_err(|_| Error::BusError)?;
        Ok(buf)
    }
}
