//! Ibsen Rock spectrometer and its TEC controller, both driven by `*COMMAND\r` text over a
//! serial port.

mod device;
pub mod parser;
mod tec;

pub use device::Rock;
pub use tec::{TecController, TecSensorType, TecType};

use num_derive::FromPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const ACK: u8 = 0x06;
pub const NAK: u8 = 0x15;
/// Sent once a capture has finished
pub const BELL: u8 = 0x07;

/// UART speeds, encoded by their leading digits
#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BaudRate {
    Baud38400 = 384,
    Baud115200 = 115,
    Baud921000 = 921,
}

#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutputFormat {
    HexBigEndian = 1,
    AsciiWithSpaces = 2,
    HexWithLenChecksum = 3,
    AsciiWithLines = 4,
    HexLittleEndian = 5,
    HexLittleEndianWithLenChecksum = 6,
    AsciiWithWavelengthLines = 7,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CaptureType {
    Dark,
    Light,
    /// Light with dark subtracted
    Subtracted,
    Transmission,
}

impl CaptureType {
    pub fn keyword(self) -> &'static str {
        match self {
            CaptureType::Dark => "DARK",
            CaptureType::Light => "LIGHT",
            CaptureType::Subtracted => "REFER",
            CaptureType::Transmission => "TRANS",
        }
    }
}
