use super::parser::{decode_f32_array, decode_spectrum_header};
use crate::error::EncodingError;
use num_derive::FromPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const SPECTRUM_HEADER_SIZE: usize = 48;

#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IntensityUnit {
    Unknown = 0,
    AdcValues = 1,
    AdcNormalized = 2,
    NanoWattPerNm = 3,
    NanoWattPerSqmNm = 4,
    WattPerSrSqmNm = 5,
    WattPerSrNm = 6,
}

/// Acquisition metadata preceding every spectrum
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpectrumHeader {
    /// Microseconds
    pub exposure_time: i32,
    pub averaging: i32,
    /// Milliseconds since device start
    pub timestamp: u32,
    pub load_level: f32,
    /// Degrees Celsius
    pub temperature: f32,
    pub pixel_count: u16,
    pub pixel_format: u16,
    pub processing_steps: u16,
    pub intensity_unit: IntensityUnit,
    pub reserved: i32,
    pub saturation_value: f32,
    pub offset_avg: f32,
    pub dark_avg: f32,
    pub readout_noise: f32,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spectrum {
    pub header: SpectrumHeader,
    pub amplitudes: Vec<f32>,
}

impl Spectrum {
    /// Header followed by `header.pixel_count` amplitudes, trailing bytes are ignored
    pub fn parse(payload: &[u8]) -> Result<Self, EncodingError> {
        let header = decode_spectrum_header(payload)?;
        let amplitudes = decode_f32_array(
            &payload[SPECTRUM_HEADER_SIZE..],
            header.pixel_count as usize,
        )
        .map_err(|_| EncodingError::Truncated {
            expected: SPECTRUM_HEADER_SIZE + header.pixel_count as usize * 4,
            actual: payload.len(),
        })?;
        Ok(Spectrum { header, amplitudes })
    }
}
