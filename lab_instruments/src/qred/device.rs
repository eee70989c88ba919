use super::{
    message::{
        BulkData, Command, MeasurementValue, MsgKind, Parameter, Property, RequestWord, TecStatus,
    },
    parser::{
        decode_ascii_string, decode_f32, decode_f32_array, decode_i32,
        decode_nonlinearity_coefficients, decode_response, decode_tec_status, decode_u32,
        decode_version, decode_wavelength_coefficients,
    },
    spectrum::Spectrum,
};
use crate::{
    config::QredConfig,
    error::{Error, ProtocolError, Result, ValidationError},
    io_adapter::{hex_dump, Transport},
};
use bytes::{BufMut, BytesMut};
use log::{debug, error, info, warn};

/// Broadcom Qred USB spectrometer
pub struct Qred<T: Transport> {
    link: T,
    config: QredConfig,
    pixel_count: Option<u32>,
    wavelengths: Option<Vec<f32>>,
    exposure_min: Option<i32>,
    exposure_max: Option<i32>,
    averaging_min: Option<i32>,
    averaging_max: Option<i32>,
}

impl<T: Transport> Qred<T> {
    /// Wraps a transport without talking to the device
    pub fn new(link: T, config: QredConfig) -> Self {
        Qred {
            link,
            config,
            pixel_count: None,
            wavelengths: None,
            exposure_min: None,
            exposure_max: None,
            averaging_min: None,
            averaging_max: None,
        }
    }

    /// Initializes the device and fills every cache
    pub fn open(link: T, config: QredConfig) -> Result<Self> {
        let mut qred = Self::new(link, config);
        qred.query(RequestWord::get(Command::Init))?;
        qred.get_pixel_count()?;
        qred.get_wavelength_mapping()?;
        qred.get_exposure_time_min_us()?;
        qred.get_exposure_time_max_us()?;
        qred.get_averaging_min()?;
        qred.get_averaging_max()?;
        Ok(qred)
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        debug!(">: [{}]", hex_dump(frame));
        self.link.write(frame)
    }

    fn receive(&mut self) -> Result<Vec<u8>> {
        let raw = self.link.read(self.config.max_rx_len)?;
        debug!("<: [{}]", hex_dump(&raw));
        Ok(raw)
    }

    /// Sends `request` and returns the reply payload, repeating the request while the device
    /// answers with a bare status word
    fn query(&mut self, request: RequestWord) -> Result<Vec<u8>> {
        let mut retries = 0;
        loop {
            self.send(&request.encode())?;
            let raw = self.receive()?;
            match decode_response(&raw, request) {
                Ok(frame) => {
                    if let Some(status) = frame.status_error() {
                        error!("Response to request {:#06x} was {}", request.value(), status);
                    }
                    return Ok(frame.payload.to_vec());
                }
                Err(Error::Protocol(ProtocolError::ShortResponse { .. }))
                    if self.config.retry.allows(retries) =>
                {
                    warn!("Received too few bytes, retrying");
                    retries += 1;
                    std::thread::sleep(self.config.retry.backoff);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn write_i32(&mut self, request: RequestWord, value: i32) -> Result<()> {
        let mut frame = BytesMut::with_capacity(8);
        frame.put_u32_le(request.value());
        frame.put_i32_le(value);
        self.send(&frame)
    }

    fn write_f32(&mut self, request: RequestWord, value: f32) -> Result<()> {
        let mut frame = BytesMut::with_capacity(8);
        frame.put_u32_le(request.value());
        frame.put_f32_le(value);
        self.send(&frame)
    }

    fn get_u32(&mut self, request: RequestWord) -> Result<u32> {
        Ok(decode_u32(&self.query(request)?)?)
    }

    fn get_i32(&mut self, request: RequestWord) -> Result<i32> {
        Ok(decode_i32(&self.query(request)?)?)
    }

    fn get_f32(&mut self, request: RequestWord) -> Result<f32> {
        Ok(decode_f32(&self.query(request)?)?)
    }

    fn get_string(&mut self, property: Property) -> Result<String> {
        Ok(decode_ascii_string(&self.query(RequestWord::get(property))?)?)
    }

    fn get_bulk(&mut self, data: BulkData) -> Result<Vec<u8>> {
        self.query(RequestWord::get(data))
    }

    pub fn get_device_id(&mut self) -> Result<u32> {
        self.get_u32(RequestWord::get(Property::DeviceId))
    }

    pub fn get_serial_number(&mut self) -> Result<String> {
        self.get_string(Property::SerialNo)
    }

    pub fn get_manufacturer(&mut self) -> Result<String> {
        self.get_string(Property::Manufacturer)
    }

    pub fn get_model(&mut self) -> Result<String> {
        self.get_string(Property::Model)
    }

    pub fn get_hw_version(&mut self) -> Result<String> {
        Ok(decode_version(&self.query(RequestWord::get(Property::HwVersion))?)?)
    }

    pub fn get_sw_version(&mut self) -> Result<String> {
        Ok(decode_version(&self.query(RequestWord::get(Property::SwVersion))?)?)
    }

    pub fn get_sensor_type(&mut self) -> Result<u32> {
        self.get_u32(RequestWord::get(Property::SensorType))
    }

    pub fn get_pixel_count(&mut self) -> Result<u32> {
        if let Some(count) = self.pixel_count {
            return Ok(count);
        }
        let count = self.get_u32(RequestWord::get(Property::PixelCount))?;
        self.pixel_count = Some(count);
        Ok(count)
    }

    pub fn get_exposure_time_us(&mut self) -> Result<i32> {
        self.get_i32(RequestWord::get(Parameter::ExposureTime))
    }

    pub fn get_exposure_time_ms(&mut self) -> Result<f64> {
        Ok(self.get_exposure_time_us()? as f64 / 1000.0)
    }

    pub fn get_exposure_time_min_us(&mut self) -> Result<i32> {
        if let Some(min) = self.exposure_min {
            return Ok(min);
        }
        let min = self.get_i32(RequestWord::new(MsgKind::Min, Parameter::ExposureTime))?;
        self.exposure_min = Some(min);
        Ok(min)
    }

    pub fn get_exposure_time_max_us(&mut self) -> Result<i32> {
        if let Some(max) = self.exposure_max {
            return Ok(max);
        }
        let max = self.get_i32(RequestWord::new(MsgKind::Max, Parameter::ExposureTime))?;
        self.exposure_max = Some(max);
        Ok(max)
    }

    /// Fails without touching the device when `us` is outside of the reported bounds
    pub fn set_exposure_time_us(&mut self, us: i64) -> Result<()> {
        let min = self.get_exposure_time_min_us()?;
        let max = self.get_exposure_time_max_us()?;
        if us < min as i64 || us > max as i64 {
            return Err(
                ValidationError::out_of_range("Exposure time (us)", us as f64, min, max).into(),
            );
        }
        self.write_i32(RequestWord::set(Parameter::ExposureTime), us as i32)
    }

    pub fn set_exposure_time_ms(&mut self, ms: f64) -> Result<()> {
        let us = (ms * 1000.0).round_ties_even();
        if !us.is_finite() || us.abs() > i64::MAX as f64 {
            return Err(ValidationError::out_of_range(
                "Exposure time (us)",
                us,
                self.get_exposure_time_min_us()?,
                self.get_exposure_time_max_us()?,
            )
            .into());
        }
        self.set_exposure_time_us(us as i64)
    }

    pub fn get_averaging(&mut self) -> Result<i32> {
        self.get_i32(RequestWord::get(Parameter::Averaging))
    }

    pub fn get_averaging_min(&mut self) -> Result<i32> {
        if let Some(min) = self.averaging_min {
            return Ok(min);
        }
        let min = self.get_i32(RequestWord::new(MsgKind::Min, Parameter::Averaging))?;
        self.averaging_min = Some(min);
        Ok(min)
    }

    pub fn get_averaging_max(&mut self) -> Result<i32> {
        if let Some(max) = self.averaging_max {
            return Ok(max);
        }
        let max = self.get_i32(RequestWord::new(MsgKind::Max, Parameter::Averaging))?;
        self.averaging_max = Some(max);
        Ok(max)
    }

    pub fn set_averaging(&mut self, averaging: i32) -> Result<()> {
        let min = self.get_averaging_min()?;
        let max = self.get_averaging_max()?;
        if !(min..=max).contains(&averaging) {
            return Err(ValidationError::out_of_range("Averaging", averaging, min, max).into());
        }
        self.write_i32(RequestWord::set(Parameter::Averaging), averaging)
    }

    /// Degrees Celsius
    pub fn get_sensor_temp(&mut self) -> Result<f32> {
        self.get_f32(RequestWord::get(MeasurementValue::SensorTemp))
    }

    /// Degrees Celsius
    pub fn get_sink_temp(&mut self) -> Result<f32> {
        self.get_f32(RequestWord::get(MeasurementValue::SinkTemp))
    }

    pub fn get_wavelength_coefficients(&mut self) -> Result<[f32; 4]> {
        Ok(decode_wavelength_coefficients(
            &self.get_bulk(BulkData::WavelengthCoeffs)?,
        )?)
    }

    pub fn get_nonlinearity_coefficients(&mut self) -> Result<Vec<f32>> {
        Ok(decode_nonlinearity_coefficients(
            &self.get_bulk(BulkData::NonlinearityCoeffs)?,
        )?)
    }

    /// Wavelength of every pixel in nanometers, as stored on the device
    pub fn get_wavelength_mapping(&mut self) -> Result<Vec<f32>> {
        if let Some(wavelengths) = &self.wavelengths {
            return Ok(wavelengths.clone());
        }
        let pixel_count = self.get_pixel_count()? as usize;
        let raw = self.get_bulk(BulkData::Wavelengths)?;
        let wavelengths = decode_f32_array(&raw, pixel_count)?;
        self.wavelengths = Some(wavelengths.clone());
        Ok(wavelengths)
    }

    pub fn get_cooling_current(&mut self) -> Result<f32> {
        self.get_f32(RequestWord::get(MeasurementValue::CoolingCurrent))
    }

    pub fn get_supply_voltage(&mut self) -> Result<f32> {
        self.get_f32(RequestWord::get(MeasurementValue::VoltageSupply))
    }

    pub fn get_usb_voltage(&mut self) -> Result<f32> {
        self.get_f32(RequestWord::get(MeasurementValue::VoltageUsb))
    }

    // Device reports UnableToReach if the target is not reached within roughly 10 seconds
    pub fn get_tec_status(&mut self) -> Result<TecStatus> {
        let payload = self.query(RequestWord::get(MeasurementValue::TecStatus))?;
        Ok(decode_tec_status(&payload)?)
    }

    pub fn get_target_temp(&mut self) -> Result<f32> {
        self.get_f32(RequestWord::get(Parameter::TempTarget))
    }

    pub fn set_target_temp(&mut self, celsius: f32) -> Result<()> {
        info!("Setting temperature to {:3.6}", celsius);
        self.write_f32(RequestWord::set(Parameter::TempTarget), celsius)
    }

    /// Spectra waiting in the device buffer
    pub fn get_available_spectra_count(&mut self) -> Result<u32> {
        Ok(self.get_u32(RequestWord::get(MeasurementValue::Status))? >> 8)
    }

    /// Starts `count` exposures, or an endless series when `continuous` is set.
    ///
    /// A new series clears spectra left over from the previous one.
    pub fn start_exposure(&mut self, count: i32, continuous: bool) -> Result<()> {
        let count = if continuous { -1 } else { count };
        self.write_i32(RequestWord::get(Command::StartExposure), count)
    }

    pub fn stop_exposure(&mut self) -> Result<()> {
        self.send(&RequestWord::get(Command::StopExposure).encode())
    }

    pub fn get_spectrum(&mut self) -> Result<Spectrum> {
        Ok(Spectrum::parse(&self.get_bulk(BulkData::Spectrum)?)?)
    }

    /// Ends the session and hands the transport back
    pub fn terminate(mut self) -> Result<T> {
        self.send(&RequestWord::get(Command::Bye).encode())?;
        Ok(self.link)
    }
}
