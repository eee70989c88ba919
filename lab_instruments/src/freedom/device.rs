use super::{
    calibration::{parse_calibration_block, Calibration, FIELD_WIDTH, WAVELENGTH_FIELDS},
    register::{
        decode_u16_be, encode_read, encode_write, Register, REGISTER_WIDTH,
        SENSOR_CTRL_BUFFER_RESET, SENSOR_CTRL_TRIGGER,
    },
};
use crate::{
    config::FreedomConfig,
    conversion::{
        adc_offset_from_mv, adc_offset_to_mv, exposure_ns_to_ticks, exposure_ticks_to_ns,
        gain_from_register, merge_words, split_words, trigger_ns_to_ticks, trigger_ticks_to_ns,
        FREEDOM_THERMISTOR,
    },
    error::{EncodingError, ProtocolError, Result, ValidationError},
    io_adapter::{hex_dump, RegisterBus},
};
use core::fmt;
use log::{debug, warn};

/// Largest value of the 12-bit data-ready threshold register
pub const DATA_READY_THRESHOLD_MAX: u16 = 0xFFF;

/// Ibsen Freedom spectrometer on an SPI register interface.
///
/// Pixel data is clocked out of a separate chip select, see [`RegisterBus`].
pub struct Freedom<B: RegisterBus> {
    bus: B,
    config: FreedomConfig,
    pixel_count: Option<u16>,
    calibration: Option<Calibration>,
    wavelengths: Option<Vec<f64>>,
}

impl<B: RegisterBus> Freedom<B> {
    pub fn new(bus: B, config: FreedomConfig) -> Self {
        Freedom {
            bus,
            config,
            pixel_count: None,
            calibration: None,
            wavelengths: None,
        }
    }

    /// Uses the pixel count as a communication check, then loads the calibration
    pub fn open(bus: B, config: FreedomConfig) -> Result<Self> {
        let mut freedom = Self::new(bus, config);
        let pixel_count = freedom.get_pixels_per_image()?;
        if let Some(expected) = freedom.config.expected_pixel_count {
            if pixel_count != expected {
                return Err(ProtocolError::UnexpectedPixelCount {
                    expected: expected as u32,
                    actual: pixel_count as u32,
                }
                .into());
            }
        }
        freedom.load_calibration()?;
        Ok(freedom)
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn transfer(&mut self, frame: &[u8], read_len: usize) -> Result<Vec<u8>> {
        debug!("> {}", hex_dump(frame));
        let reply = self.bus.exchange(frame, read_len)?;
        debug!("< {}", hex_dump(&reply));
        Ok(reply)
    }

    fn read_register(&mut self, register: Register) -> Result<Vec<u8>> {
        debug!("Reading reg {:?}", register);
        self.transfer(&[encode_read(register)], REGISTER_WIDTH)
    }

    fn read_word(&mut self, register: Register) -> Result<u16> {
        let reply = self.read_register(register)?;
        Ok(decode_u16_be(&reply)?)
    }

    fn read_byte(&mut self, register: Register, index: usize) -> Result<u8> {
        let reply = self.read_register(register)?;
        reply.get(index).copied().ok_or_else(|| {
            EncodingError::Truncated {
                expected: REGISTER_WIDTH,
                actual: reply.len(),
            }
            .into()
        })
    }

    fn write_register(&mut self, register: Register, payload: &[u8]) -> Result<()> {
        debug!("Writing reg {:?} values {:02x?}", register, payload);
        self.transfer(&encode_write(register, payload), 0)?;
        Ok(())
    }

    fn read_split(&mut self, lsb: Register, msb: Register) -> Result<u32> {
        let lsb = self.read_word(lsb)?;
        let msb = self.read_word(msb)?;
        Ok(merge_words(msb, lsb))
    }

    /// Least significant half goes first
    fn write_split(&mut self, lsb: Register, msb: Register, value: u32) -> Result<()> {
        let (hi, lo) = split_words(value);
        self.write_register(lsb, &lo.to_be_bytes())?;
        self.write_register(msb, &hi.to_be_bytes())
    }

    pub fn get_serial_number(&mut self) -> Result<u16> {
        self.read_word(Register::SerialNumber)
    }

    /// Only the first byte of the register is meaningful
    pub fn get_hw_version(&mut self) -> Result<u8> {
        self.read_byte(Register::HwVersion, 0)
    }

    pub fn get_fw_version(&mut self) -> Result<u16> {
        self.read_word(Register::FwVersion)
    }

    pub fn get_detector_type(&mut self) -> Result<u16> {
        self.read_word(Register::DetectorType)
    }

    pub fn get_error_register(&mut self) -> Result<u16> {
        self.read_word(Register::Error)
    }

    pub fn get_pixels_per_image(&mut self) -> Result<u16> {
        if let Some(count) = self.pixel_count {
            return Ok(count);
        }
        let count = self.read_word(Register::PixelsPerImage)?;
        self.pixel_count = Some(count);
        Ok(count)
    }

    pub fn get_pixels_ready(&mut self) -> Result<u16> {
        self.read_word(Register::PixelsReady)
    }

    pub fn get_gain(&mut self) -> Result<f64> {
        Ok(gain_from_register(self.read_byte(Register::AdcGain, 1)?))
    }

    pub fn get_adc_offset_mv(&mut self) -> Result<f64> {
        Ok(adc_offset_to_mv(self.read_word(Register::AdcOffset)?))
    }

    pub fn set_adc_offset_mv(&mut self, mv: f64) -> Result<()> {
        let payload = adc_offset_from_mv(mv)?;
        self.write_register(Register::AdcOffset, &payload)
    }

    /// Degrees Celsius
    pub fn get_sensor_temp(&mut self) -> Result<f64> {
        let raw = self.read_word(Register::Temperature)?;
        Ok(FREEDOM_THERMISTOR.celsius(raw)?)
    }

    pub fn get_exposure_time_ns(&mut self) -> Result<u64> {
        let ticks = self.read_split(Register::ExposureLsb, Register::ExposureMsb)?;
        Ok(exposure_ticks_to_ns(ticks))
    }

    pub fn get_exposure_time_ms(&mut self) -> Result<f64> {
        Ok(self.get_exposure_time_ns()? as f64 / 1_000_000.0)
    }

    /// The sensor always adds 9600 ns on its own, shorter exposures are rejected
    pub fn set_exposure_time_ns(&mut self, ns: u64) -> Result<()> {
        let ticks = exposure_ns_to_ticks(ns)?;
        self.write_split(Register::ExposureLsb, Register::ExposureMsb, ticks)
    }

    pub fn set_exposure_time_ms(&mut self, ms: f64) -> Result<()> {
        let ns = (ms * 1_000_000.0).round_ties_even();
        if !(0.0..=u64::MAX as f64).contains(&ns) {
            return Err(ValidationError::out_of_range(
                "Exposure time (ns)",
                ns,
                exposure_ticks_to_ns(0) as f64,
                exposure_ticks_to_ns(u32::MAX) as f64,
            )
            .into());
        }
        self.set_exposure_time_ns(ns as u64)
    }

    pub fn get_trigger_delay_ns(&mut self) -> Result<u64> {
        let ticks = self.read_split(Register::TriggerDelayLsb, Register::TriggerDelayMsb)?;
        Ok(trigger_ticks_to_ns(ticks))
    }

    pub fn set_trigger_delay_ns(&mut self, ns: u64) -> Result<()> {
        let ticks = trigger_ns_to_ticks(ns)?;
        self.write_split(Register::TriggerDelayLsb, Register::TriggerDelayMsb, ticks)
    }

    /// Pixels buffered on the device before the data-ready line is raised
    pub fn get_data_ready_threshold(&mut self) -> Result<u16> {
        self.read_word(Register::DataReadyThreshold)
    }

    pub fn set_data_ready_threshold(&mut self, pixels: u16) -> Result<()> {
        if pixels > DATA_READY_THRESHOLD_MAX {
            return Err(ValidationError::out_of_range(
                "Data ready threshold",
                pixels,
                0,
                DATA_READY_THRESHOLD_MAX,
            )
            .into());
        }
        self.write_register(Register::DataReadyThreshold, &pixels.to_be_bytes())
    }

    pub fn soft_reset_buffer(&mut self) -> Result<()> {
        self.write_register(Register::SensorControl, &[SENSOR_CTRL_BUFFER_RESET])
    }

    /// Drops buffered pixels and starts a single exposure
    pub fn trigger_exposure(&mut self) -> Result<()> {
        self.soft_reset_buffer()?;
        self.write_register(Register::SensorControl, &[SENSOR_CTRL_TRIGGER])
    }

    /// Number of calibration characters, rewinds the calibration data pointer as a side effect
    pub fn get_calibration_char_count(&mut self) -> Result<u16> {
        self.read_word(Register::CalibrationCharCount)
    }

    /// Reads the calibration text character by character.
    ///
    /// The pointer only advances once chip select is released, so each character is a separate
    /// transaction.
    pub fn read_calibration_text(&mut self) -> Result<String> {
        let count = self.get_calibration_char_count()? as usize;
        if count <= WAVELENGTH_FIELDS * FIELD_WIDTH {
            warn!("No linearity calibration coefficients available");
        }
        let mut text = String::with_capacity(count);
        for _ in 0..count {
            let c = self.read_byte(Register::CalibrationData, 1)?;
            if !c.is_ascii() {
                return Err(EncodingError::NonAscii(c).into());
            }
            text.push(c as char);
        }
        Ok(text)
    }

    pub fn load_calibration(&mut self) -> Result<Calibration> {
        let text = self.read_calibration_text()?;
        let calibration = parse_calibration_block(&text)?;
        self.calibration = Some(calibration);
        self.wavelengths = None;
        Ok(calibration)
    }

    pub fn calibration(&mut self) -> Result<Calibration> {
        match self.calibration {
            Some(calibration) => Ok(calibration),
            None => self.load_calibration(),
        }
    }

    /// Wavelength of every pixel in nanometers
    pub fn get_wavelength_mapping(&mut self) -> Result<Vec<f64>> {
        if let Some(wavelengths) = &self.wavelengths {
            return Ok(wavelengths.clone());
        }
        let coefficients = self.calibration()?.wavelength;
        let pixel_count = self.get_pixels_per_image()? as usize;
        let wavelengths: Vec<f64> = (0..pixel_count)
            .map(|p| coefficients.wavelength(p))
            .collect();
        self.wavelengths = Some(wavelengths.clone());
        Ok(wavelengths)
    }

    /// Reads one full image out of the pixel buffer, optionally linearity corrected
    pub fn get_spectrum(&mut self, use_correction: bool) -> Result<Vec<f64>> {
        let pixel_count = self.get_pixels_per_image()? as usize;
        let linearity = if use_correction {
            Some(self.calibration()?.linearity)
        } else {
            None
        };
        let mut spectrum = Vec::with_capacity(pixel_count);
        while spectrum.len() < pixel_count {
            let word = decode_u16_be(&self.bus.read_data(REGISTER_WIDTH)?)? as f64;
            spectrum.push(match &linearity {
                Some(linearity) => linearity.correct(word),
                None => word,
            });
        }
        Ok(spectrum)
    }

    /// Collects the identification and acquisition registers.
    ///
    /// A zero serial number means the bus is not talking to a device.
    pub fn info(&mut self) -> Result<FreedomInfo> {
        let serial_number = self.get_serial_number()?;
        if serial_number == 0 {
            return Err(ProtocolError::UnexpectedReply("serial number 0".to_string()).into());
        }
        Ok(FreedomInfo {
            serial_number,
            hw_version: self.get_hw_version()?,
            fw_version: self.get_fw_version()?,
            gain: self.get_gain()?,
            adc_offset_mv: self.get_adc_offset_mv()?,
            detector_type: self.get_detector_type()?,
            pixels_per_image: self.get_pixels_per_image()?,
            calibration_chars: self.get_calibration_char_count()?,
            exposure_time_ns: self.get_exposure_time_ns()?,
            trigger_delay_ns: self.get_trigger_delay_ns()?,
            data_ready_threshold: self.get_data_ready_threshold()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FreedomInfo {
    pub serial_number: u16,
    pub hw_version: u8,
    pub fw_version: u16,
    pub gain: f64,
    pub adc_offset_mv: f64,
    pub detector_type: u16,
    pub pixels_per_image: u16,
    pub calibration_chars: u16,
    pub exposure_time_ns: u64,
    pub trigger_delay_ns: u64,
    pub data_ready_threshold: u16,
}

impl fmt::Display for FreedomInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Serial No: {}", self.serial_number)?;
        writeln!(f, "HW version: {}", self.hw_version)?;
        writeln!(f, "FW version: {}", self.fw_version)?;
        writeln!(f, "Gain setting: {:3.6}", self.gain)?;
        writeln!(f, "Offset: {:3.6} mV", self.adc_offset_mv)?;
        writeln!(f, "Detector type: {}", self.detector_type)?;
        writeln!(f, "Pixels per image: {}", self.pixels_per_image)?;
        writeln!(f, "Calibration character count: {}", self.calibration_chars)?;
        writeln!(f, "Exposure time: {} ns", self.exposure_time_ns)?;
        writeln!(f, "Trigger delay: {} ns", self.trigger_delay_ns)?;
        write!(
            f,
            "Data ready triggering threshold: {}",
            self.data_ready_threshold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, io_adapter::MockRegisterBus};
    use claims::*;

    fn bus_with(register: Register, reply: [u8; 2]) -> MockRegisterBus {
        let mut bus = MockRegisterBus::new();
        bus.expect_exchange()
            .withf(move |frame, len| frame.to_vec() == vec![encode_read(register)] && *len == 2)
            .returning(move |_, _| Ok(reply.to_vec()));
        bus
    }

    #[test]
    fn gain_uses_second_byte() {
        let mut freedom = Freedom::new(bus_with(Register::AdcGain, [0xFF, 63]), Default::default());
        assert_ok_eq!(freedom.get_gain(), 6.0);
    }

    #[test]
    fn hw_version_uses_first_byte() {
        let mut freedom =
            Freedom::new(bus_with(Register::HwVersion, [3, 0xAA]), Default::default());
        assert_ok_eq!(freedom.get_hw_version(), 3);
    }

    #[test]
    fn offset_sign() {
        let mut freedom =
            Freedom::new(bus_with(Register::AdcOffset, [0x00, 0xFF]), Default::default());
        assert_ok_eq!(freedom.get_adc_offset_mv(), -300.0);
    }

    #[test]
    fn saturated_thermistor() {
        let mut freedom =
            Freedom::new(bus_with(Register::Temperature, [0x0F, 0xFF]), Default::default());
        assert_matches!(
            freedom.get_sensor_temp(),
            Err(Error::Validation(ValidationError::SensorSaturated))
        );
    }

    #[test]
    fn rejected_exposure_is_not_written() {
        let mut bus = MockRegisterBus::new();
        bus.expect_exchange().times(0);
        let mut freedom = Freedom::new(bus, Default::default());
        assert_matches!(
            freedom.set_exposure_time_ns(9599),
            Err(Error::Validation(ValidationError::OutOfRange { .. }))
        );
        assert_matches!(
            freedom.set_exposure_time_ms(-1.0),
            Err(Error::Validation(ValidationError::OutOfRange { .. }))
        );
    }

    #[test]
    fn exposure_is_written_lsb_first() {
        let mut bus = MockRegisterBus::new();
        let mut seq = mockall::Sequence::new();
        // 1 ms = 4952 ticks = 0x1358
        bus.expect_exchange()
            .withf(|frame, len| frame.to_vec() == vec![0x24, 0x13, 0x58] && *len == 0)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![]));
        bus.expect_exchange()
            .withf(|frame, len| frame.to_vec() == vec![0x28, 0x00, 0x00] && *len == 0)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![]));
        let mut freedom = Freedom::new(bus, Default::default());
        assert_ok!(freedom.set_exposure_time_ms(1.0));
    }

    #[test]
    fn threshold_is_twelve_bits() {
        let mut bus = MockRegisterBus::new();
        bus.expect_exchange().times(0);
        let mut freedom = Freedom::new(bus, Default::default());
        assert_err!(freedom.set_data_ready_threshold(0x1000));
    }

    #[test]
    fn trigger_resets_buffer_first() {
        let mut bus = MockRegisterBus::new();
        let mut seq = mockall::Sequence::new();
        bus.expect_exchange()
            .withf(|frame, _| frame.to_vec() == vec![0x20, 0x10])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![]));
        bus.expect_exchange()
            .withf(|frame, _| frame.to_vec() == vec![0x20, 0x01])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![]));
        let mut freedom = Freedom::new(bus, Default::default());
        assert_ok!(freedom.trigger_exposure());
    }

    #[test]
    fn wrong_pixel_count_fails_open() {
        let bus = bus_with(Register::PixelsPerImage, [0x04, 0x00]);
        assert_matches!(
            Freedom::open(bus, Default::default()).err(),
            Some(Error::Protocol(ProtocolError::UnexpectedPixelCount {
                expected: 2048,
                actual: 1024
            }))
        );
    }

    #[test]
    fn zero_serial_number_is_not_a_device() {
        let mut freedom =
            Freedom::new(bus_with(Register::SerialNumber, [0, 0]), Default::default());
        assert_matches!(
            freedom.info(),
            Err(Error::Protocol(ProtocolError::UnexpectedReply(_)))
        );
    }
}
