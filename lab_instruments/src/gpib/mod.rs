//! Prologix GPIB-USB adapter.
//!
//! Lines starting with `++` configure the adapter, everything else is forwarded to the addressed
//! instrument. The adapter implements [`Transport`] itself, so instrument drivers can sit on top
//! of it.

use crate::{
    error::{EncodingError, Result, ValidationError},
    io_adapter::Transport,
};
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest primary address on the bus
pub const MAX_ADDRESS: u8 = 30;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OpMode {
    Device = 0,
    Controller = 1,
}

/// Terminator appended to data sent to instruments
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Eos {
    CrLf = 0,
    Cr = 1,
    Lf = 2,
    None = 3,
}

pub struct Prologix<T: Transport> {
    port: T,
}

impl<T: Transport> Prologix<T> {
    pub fn new(port: T) -> Self {
        Prologix { port }
    }

    pub fn release(self) -> T {
        self.port
    }

    /// Sends one line; `data` itself must not contain unescaped CR, LF or `++`
    pub fn send(&mut self, data: &str) -> Result<()> {
        let mut line = String::with_capacity(data.len() + 1);
        line.push_str(data);
        line.push('\n');
        debug!(">: {:?}", line);
        self.port.write(line.as_bytes())
    }

    /// Asks the instrument to talk until EOI and returns the reply without its trailing newline
    pub fn read_response(&mut self, max_len: usize) -> Result<String> {
        self.read_raw(max_len).and_then(|raw| {
            if let Some(b) = raw.iter().find(|b| !b.is_ascii()) {
                return Err(EncodingError::NonAscii(*b).into());
            }
            Ok(raw.iter().map(|b| *b as char).collect())
        })
    }

    fn read_raw(&mut self, max_len: usize) -> Result<Vec<u8>> {
        self.send("++read eoi")?;
        let mut raw = self.port.read(max_len)?;
        debug!("<: {:?}", String::from_utf8_lossy(&raw));
        if raw.last() == Some(&b'\n') {
            raw.pop();
        }
        Ok(raw)
    }

    pub fn exchange(&mut self, data: &str, max_len: usize) -> Result<String> {
        self.send(data)?;
        self.read_response(max_len)
    }

    pub fn set_target_address(&mut self, address: u8) -> Result<()> {
        if address > MAX_ADDRESS {
            return Err(
                ValidationError::out_of_range("GPIB address", address, 0, MAX_ADDRESS).into(),
            );
        }
        self.send(&format!("++addr {}", address))
    }

    pub fn set_mode(&mut self, mode: OpMode) -> Result<()> {
        self.send(&format!("++mode {}", mode as u8))
    }

    /// Whether the adapter addresses the instrument to talk right after every write
    pub fn set_auto_get_response(&mut self, auto: bool) -> Result<()> {
        self.send(&format!("++auto {}", u8::from(auto)))
    }

    pub fn set_eoi_assert(&mut self, eoi: bool) -> Result<()> {
        self.send(&format!("++eoi {}", u8::from(eoi)))
    }

    pub fn set_eos(&mut self, eos: Eos) -> Result<()> {
        self.send(&format!("++eos {}", eos as u8))
    }

    /// Selected device clear
    pub fn clear(&mut self) -> Result<()> {
        self.send("++clr")
    }
}

impl<T: Transport> Transport for Prologix<T> {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let data = core::str::from_utf8(buf)
            .map_err(|e| EncodingError::NonAscii(buf[e.valid_up_to()]))?;
        self.send(data)
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>> {
        self.read_raw(max_len)
    }
}
