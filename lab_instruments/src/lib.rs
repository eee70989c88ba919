//! Drivers for laboratory instruments: Broadcom Qred and Ibsen Freedom/Rock spectrometers, a
//! Prologix GPIB adapter and a Keithley 2000 multimeter.
//!
//! Drivers never open ports themselves. They are generic over [`Transport`] (byte streams) or
//! [`RegisterBus`] (SPI register access), so the caller picks the port implementation.

pub mod config;
pub mod conversion;
pub mod dmm;
pub mod error;
pub mod freedom;
pub mod gpib;
pub mod io_adapter;
pub mod qred;
pub mod rock;
pub mod spectrometer;

pub use config::{FreedomConfig, QredConfig, RetryPolicy, RockConfig};
pub use dmm::Keithley2000;
pub use error::{EncodingError, Error, ProtocolError, Result, ValidationError};
pub use freedom::Freedom;
pub use gpib::Prologix;
#[cfg(feature = "embedded-hal")]
pub use io_adapter::embedded_hal::EmbeddedHalSpiAdapter;
pub use io_adapter::{std_io::StdIoAdapter, RegisterBus, Transport};
pub use qred::Qred;
pub use rock::{Rock, TecController};
pub use spectrometer::Spectrometer;
