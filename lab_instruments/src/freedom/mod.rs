//! Ibsen Freedom spectrometer over SPI.

pub mod calibration;
mod device;
pub mod register;

pub use calibration::{
    parse_calibration_block, Calibration, LinearityCoefficients, WavelengthCoefficients,
};
pub use device::{Freedom, FreedomInfo, DATA_READY_THRESHOLD_MAX};
pub use register::Register;
