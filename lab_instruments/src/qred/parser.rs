use super::{
    message::{RequestWord, ReturnCode, TecStatus},
    spectrum::{IntensityUnit, SpectrumHeader, SPECTRUM_HEADER_SIZE},
};
use crate::error::{EncodingError, Error, ProtocolError};
use nom::{
    combinator::rest,
    multi::count,
    number::complete::{le_f32, le_i32, le_u16, le_u32},
    sequence::tuple,
    IResult,
};
use num_traits::FromPrimitive;

const STATUS_SIZE: usize = 4;

/// Reply split into its status word and the bytes that follow
#[derive(Debug, PartialEq, Clone)]
pub struct ResponseFrame<'a> {
    pub status: ReturnCode,
    pub payload: &'a [u8],
}

impl ResponseFrame<'_> {
    /// Device reported soft errors do not invalidate the payload, they are surfaced separately
    pub fn status_error(&self) -> Option<ProtocolError> {
        match self.status {
            ReturnCode::Ok => None,
            code => Some(ProtocolError::DeviceStatus(code)),
        }
    }
}

fn frame_parser(input: &[u8]) -> IResult<&[u8], (u32, &[u8])> {
    tuple((le_u32, rest))(input)
}

fn ensure_len(payload: &[u8], expected: usize) -> Result<(), EncodingError> {
    if payload.len() < expected {
        Err(EncodingError::Truncated {
            expected,
            actual: payload.len(),
        })
    } else {
        Ok(())
    }
}

/// Splits a raw reply to `request` into status and payload.
///
/// Everything but the init command must carry a payload, a bare status word means the device
/// was not ready and the exchange has to be repeated.
pub fn decode_response(raw: &[u8], request: RequestWord) -> Result<ResponseFrame<'_>, Error> {
    let short = ProtocolError::ShortResponse { len: raw.len() };
    let (_, (status, payload)) = frame_parser(raw).map_err(|_| short.clone())?;
    let status = ReturnCode::from_u32(status).ok_or(ProtocolError::UnknownStatus(status))?;
    if raw.len() <= STATUS_SIZE && !request.is_init() {
        return Err(short.into());
    }
    Ok(ResponseFrame { status, payload })
}

pub fn decode_return_code(payload: &[u8]) -> Result<ReturnCode, Error> {
    let code = decode_u32(payload)?;
    Ok(ReturnCode::from_u32(code).ok_or(ProtocolError::UnknownStatus(code))?)
}

pub fn decode_u32(payload: &[u8]) -> Result<u32, EncodingError> {
    ensure_len(payload, 4)?;
    Ok(u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]))
}

pub fn decode_i32(payload: &[u8]) -> Result<i32, EncodingError> {
    decode_u32(payload).map(|v| v as i32)
}

/// Booleans travel as 32-bit integers
pub fn decode_bool(payload: &[u8]) -> Result<bool, EncodingError> {
    decode_u32(payload).map(|v| v != 0)
}

pub fn decode_f32(payload: &[u8]) -> Result<f32, EncodingError> {
    decode_u32(payload).map(f32::from_bits)
}

pub fn decode_f32_array(payload: &[u8], n: usize) -> Result<Vec<f32>, EncodingError> {
    ensure_len(payload, n * 4)?;
    let (_, values) = count(le_f32::<_, nom::error::Error<_>>, n)(payload).map_err(|_| {
        EncodingError::Truncated {
            expected: n * 4,
            actual: payload.len(),
        }
    })?;
    Ok(values)
}

/// Text properties. Devices pad them with NUL bytes which are dropped.
pub fn decode_ascii_string(payload: &[u8]) -> Result<String, EncodingError> {
    if let Some(b) = payload.iter().find(|b| !b.is_ascii()) {
        return Err(EncodingError::NonAscii(*b));
    }
    let text: String = payload.iter().map(|b| *b as char).collect();
    Ok(text.trim_end_matches('\0').to_string())
}

/// Versions are packed one component per byte, most significant byte first in the text
pub fn decode_version(payload: &[u8]) -> Result<String, EncodingError> {
    ensure_len(payload, 4)?;
    Ok(format!(
        "{}.{}.{}.{}",
        payload[3], payload[2], payload[1], payload[0]
    ))
}

pub fn decode_tec_status(payload: &[u8]) -> Result<TecStatus, EncodingError> {
    let value = decode_u32(payload)?;
    TecStatus::from_u32(value).ok_or(EncodingError::UnknownVariant {
        field: "TEC status",
        value,
    })
}

pub fn decode_wavelength_coefficients(payload: &[u8]) -> Result<[f32; 4], EncodingError> {
    let values = decode_f32_array(payload, 4)?;
    Ok([values[0], values[1], values[2], values[3]])
}

/// Coefficient count followed by that many floats
pub fn decode_nonlinearity_coefficients(payload: &[u8]) -> Result<Vec<f32>, EncodingError> {
    let n = decode_u32(payload)? as usize;
    decode_f32_array(&payload[4..], n).map_err(|_| EncodingError::Truncated {
        expected: 4 + n * 4,
        actual: payload.len(),
    })
}

#[allow(clippy::type_complexity)]
fn header_parser(
    input: &[u8],
) -> IResult<
    &[u8],
    (
        i32,
        i32,
        u32,
        f32,
        f32,
        u16,
        u16,
        u16,
        u16,
        i32,
        f32,
        f32,
        f32,
        f32,
    ),
> {
    tuple((
        // Exposure time, us
        le_i32,
        // Averaging
        le_i32,
        // Timestamp of exposure start, ms
        le_u32,
        // Load level
        le_f32,
        // Temperature, degrees Celsius
        le_f32,
        // Pixel count
        le_u16,
        // Pixel format
        le_u16,
        // Applied processing steps
        le_u16,
        // Intensity unit
        le_u16,
        // Dropped spectra, not implemented by firmware
        le_i32,
        // Saturation value
        le_f32,
        // Offset average
        le_f32,
        // Dark average
        le_f32,
        // Readout noise
        le_f32,
    ))(input)
}

pub fn decode_spectrum_header(payload: &[u8]) -> Result<SpectrumHeader, EncodingError> {
    ensure_len(payload, SPECTRUM_HEADER_SIZE)?;
    let (
        _,
        (
            exposure_time,
            averaging,
            timestamp,
            load_level,
            temperature,
            pixel_count,
            pixel_format,
            processing_steps,
            unit,
            reserved,
            saturation_value,
            offset_avg,
            dark_avg,
            readout_noise,
        ),
    ) = header_parser(payload).map_err(|_| EncodingError::Truncated {
        expected: SPECTRUM_HEADER_SIZE,
        actual: payload.len(),
    })?;
    let intensity_unit =
        IntensityUnit::from_u16(unit).ok_or(EncodingError::UnknownVariant {
            field: "Intensity unit",
            value: unit as u32,
        })?;

    Ok(SpectrumHeader {
        exposure_time,
        averaging,
        timestamp,
        load_level,
        temperature,
        pixel_count,
        pixel_format,
        processing_steps,
        intensity_unit,
        reserved,
        saturation_value,
        offset_avg,
        dark_avg,
        readout_noise,
    })
}
