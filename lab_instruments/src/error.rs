use crate::qred::message::ReturnCode;
use core::result::Result as CoreResult;
use thiserror::Error;

pub type Result<T> = CoreResult<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Bus transfer failed")]
    BusError,
    #[error("{0}")]
    IOError(#[from] std::io::Error),
}

/// Failures of the request/response exchange itself
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ProtocolError {
    #[error("Response of {len} bytes carries no payload")]
    ShortResponse { len: usize },
    #[error("Device reported {0:?}")]
    DeviceStatus(ReturnCode),
    #[error("Status code {0:#x} is not known")]
    UnknownStatus(u32),
    #[error("Device replied with NAK")]
    Nak,
    #[error("Received an unexpected reply: {0:?}")]
    UnexpectedReply(String),
    #[error("Expected {expected} pixels, device reports {actual}")]
    UnexpectedPixelCount { expected: u32, actual: u32 },
}

/// Payload bytes that do not match the expected layout
#[derive(Debug, Error, PartialEq, Clone)]
pub enum EncodingError {
    #[error("Expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("Byte {0:#04x} is not ASCII")]
    NonAscii(u8),
    #[error("{field} has no variant for value {value}")]
    UnknownVariant { field: &'static str, value: u32 },
    #[error("Could not parse {0:?} as a number")]
    InvalidNumber(String),
    #[error("Calibration block holds {fields} coefficients, at least {required} are required")]
    InsufficientCalibration { fields: usize, required: usize },
}

/// Values rejected before they reach the wire, or readings with no physical meaning
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ValidationError {
    #[error("{quantity} of {value} is outside of accepted range {min}..={max}")]
    OutOfRange {
        quantity: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Sensor reading is pinned to the ADC rail")]
    SensorSaturated,
}

impl ValidationError {
    pub(crate) fn out_of_range(
        quantity: &'static str,
        value: impl Into<f64>,
        min: impl Into<f64>,
        max: impl Into<f64>,
    ) -> Self {
        ValidationError::OutOfRange {
            quantity,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }
    }
}
