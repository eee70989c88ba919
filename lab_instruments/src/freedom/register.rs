use crate::error::EncodingError;

/// Register map of the Freedom SPI interface
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Register {
    SerialNumber = 1,
    HwVersion = 2,
    FwVersion = 3,
    DetectorType = 4,
    PixelsPerImage = 5,
    /// Reading it also rewinds the calibration data pointer
    CalibrationCharCount = 6,
    CalibrationData = 7,
    SensorControl = 8,
    ExposureLsb = 9,
    ExposureMsb = 10,
    Temperature = 11,
    PixelsReady = 12,
    TriggerDelayLsb = 13,
    TriggerDelayMsb = 14,
    AdcGain = 15,
    AdcOffset = 16,
    PermanentStorage = 17,
    Mpp = 18,
    DataReadyThreshold = 19,
    Error = 62,
    ProductionMode = 63,
}

const READ_FLAG: u8 = 0b10;

/// Every register is read as one 16-bit word
pub const REGISTER_WIDTH: usize = 2;

/// Sensor control bit that drops whatever is left in the pixel buffer
pub const SENSOR_CTRL_BUFFER_RESET: u8 = 1 << 4;
/// Sensor control bit that starts a single exposure
pub const SENSOR_CTRL_TRIGGER: u8 = 1;

pub fn encode_read(register: Register) -> u8 {
    (register as u8) << 2 | READ_FLAG
}

pub fn encode_write(register: Register, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 1);
    frame.push((register as u8) << 2);
    frame.extend_from_slice(payload);
    frame
}

/// Register words are sent most significant byte first
pub fn decode_u16_be(bytes: &[u8]) -> Result<u16, EncodingError> {
    match bytes {
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(EncodingError::Truncated {
            expected: REGISTER_WIDTH,
            actual: bytes.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::*;

    #[test]
    fn address_frames() {
        assert_eq!(encode_read(Register::PixelsPerImage), 0x16);
        assert_eq!(encode_read(Register::CalibrationData), 0x1E);
        assert_eq!(encode_read(Register::ProductionMode), 0xFE);
        assert_eq!(
            encode_write(Register::SensorControl, &[0x10]),
            vec![0x20, 0x10]
        );
        assert_eq!(
            encode_write(Register::ExposureLsb, &[0x13, 0x58]),
            vec![0x24, 0x13, 0x58]
        );
    }

    #[test]
    fn big_endian_words() {
        assert_ok_eq!(decode_u16_be(&[0x08, 0x00]), 2048);
        assert_ok_eq!(decode_u16_be(&[0x01, 0xFF, 0xAA]), 0x01FF);
        assert_err_eq!(
            decode_u16_be(&[0x08]),
            EncodingError::Truncated {
                expected: 2,
                actual: 1
            }
        );
    }
}
