use super::Transport;
use crate::error::Result;
use std::io::{ErrorKind, Read, Write};

/// Wraps anything implementing `std::io::{Read, Write}`, e.g. an opened serial port
pub struct StdIoAdapter<IO: Read + Write> {
    io: IO,
}

impl<IO: Read + Write> Transport for StdIoAdapter<IO> {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.io.write_all(buf)?;
        self.io.flush()?;
        Ok(())
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; max_len];
        let count = match self.io.read(&mut buf) {
            Ok(count) => count,
            // Serial ports report an expired read timeout as an error, treat it as no data
            Err(e) if e.kind() == ErrorKind::TimedOut => 0,
            Err(e) => return Err(e.into()),
        };
        buf.truncate(count);
        Ok(buf)
    }
}

impl<IO: Read + Write> StdIoAdapter<IO> {
    pub fn new(io: IO) -> Self {
        StdIoAdapter { io }
    }

    pub fn into_inner(self) -> IO {
        self.io
    }
}
