//! Broadcom Qred spectrometer over USB bulk endpoints.
//!
//! Every exchange is a 32-bit little-endian request word, optionally followed by a value, answered
//! by a 32-bit status word and a payload whose layout depends on the request.

mod device;
pub mod message;
pub mod parser;
pub mod spectrum;

pub use device::Qred;
pub use message::{encode_request, RequestWord, ReturnCode, TecStatus};
pub use spectrum::{IntensityUnit, Spectrum, SpectrumHeader};
