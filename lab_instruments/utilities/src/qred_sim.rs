use lab_instruments::{
    qred::message::{
        BulkData, Command, MeasurementValue, MsgKind, Parameter, Property, RequestWord,
        ReturnCode,
    },
    Result, Transport,
};

/// Answers Qred requests from a handful of fields, enough to run the driver end to end
pub struct QredSim {
    pub serial_number: String,
    pub pixel_count: u32,
    pub wavelengths: Vec<f32>,
    pub exposure_us: i32,
    pub exposure_bounds: (i32, i32),
    pub averaging: i32,
    pub averaging_bounds: (i32, i32),
    pub tec_status: u32,
    pub spectrum_response: Vec<u8>,
    /// Number of upcoming reads answered with a bare status word
    pub short_replies: u32,
    /// Every frame written by the driver
    pub writes: Vec<Vec<u8>>,
    pending: Option<Vec<u8>>,
}

impl QredSim {
    pub fn new(pixel_count: u32) -> Self {
        QredSim {
            serial_number: "QRD-0042".to_string(),
            pixel_count,
            wavelengths: (0..pixel_count).map(|p| 400.0 + p as f32 * 0.5).collect(),
            exposure_us: 10_000,
            exposure_bounds: (10, 10_000_000),
            averaging: 1,
            averaging_bounds: (1, 1000),
            tec_status: 1,
            spectrum_response: Vec::new(),
            short_replies: 0,
            writes: Vec::new(),
            pending: None,
        }
    }

    fn ok(payload: &[u8]) -> Vec<u8> {
        let mut reply = (ReturnCode::Ok as u32).to_le_bytes().to_vec();
        reply.extend_from_slice(payload);
        reply
    }

    fn reply_to(&self, word: u32) -> Vec<u8> {
        let get = |request: RequestWord| request.value() == word;

        if get(RequestWord::get(Command::Init)) {
            Self::ok(&[])
        } else if get(RequestWord::get(Property::PixelCount)) {
            Self::ok(&self.pixel_count.to_le_bytes())
        } else if get(RequestWord::get(Property::SerialNo)) {
            let mut serial = self.serial_number.clone().into_bytes();
            serial.resize(16, 0);
            Self::ok(&serial)
        } else if get(RequestWord::get(Property::HwVersion)) {
            Self::ok(&[4, 3, 2, 1])
        } else if get(RequestWord::get(Parameter::ExposureTime)) {
            Self::ok(&self.exposure_us.to_le_bytes())
        } else if get(RequestWord::new(MsgKind::Min, Parameter::ExposureTime)) {
            Self::ok(&self.exposure_bounds.0.to_le_bytes())
        } else if get(RequestWord::new(MsgKind::Max, Parameter::ExposureTime)) {
            Self::ok(&self.exposure_bounds.1.to_le_bytes())
        } else if get(RequestWord::get(Parameter::Averaging)) {
            Self::ok(&self.averaging.to_le_bytes())
        } else if get(RequestWord::new(MsgKind::Min, Parameter::Averaging)) {
            Self::ok(&self.averaging_bounds.0.to_le_bytes())
        } else if get(RequestWord::new(MsgKind::Max, Parameter::Averaging)) {
            Self::ok(&self.averaging_bounds.1.to_le_bytes())
        } else if get(RequestWord::get(MeasurementValue::TecStatus)) {
            Self::ok(&self.tec_status.to_le_bytes())
        } else if get(RequestWord::get(BulkData::Wavelengths)) {
            let raw: Vec<u8> = self.wavelengths.iter().flat_map(|w| w.to_le_bytes()).collect();
            Self::ok(&raw)
        } else if get(RequestWord::get(BulkData::Spectrum)) {
            self.spectrum_response.clone()
        } else {
            let mut reply = (ReturnCode::UnknownCommand as u32).to_le_bytes().to_vec();
            reply.extend_from_slice(&[0; 4]);
            reply
        }
    }

    /// Writes that carry a value after the request word
    fn apply(&mut self, word: u32, value: [u8; 4]) {
        if word == RequestWord::set(Parameter::ExposureTime).value() {
            self.exposure_us = i32::from_le_bytes(value);
        } else if word == RequestWord::set(Parameter::Averaging).value() {
            self.averaging = i32::from_le_bytes(value);
        }
    }
}

impl Transport for QredSim {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.writes.push(buf.to_vec());
        if buf.len() < 4 {
            return Ok(());
        }
        let word = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if buf.len() >= 8 {
            self.apply(word, [buf[4], buf[5], buf[6], buf[7]]);
        } else {
            self.pending = Some(self.reply_to(word));
        }
        Ok(())
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>> {
        if self.short_replies > 0 {
            self.short_replies -= 1;
            return Ok(Self::ok(&[]));
        }
        let mut reply = self.pending.take().unwrap_or_default();
        reply.truncate(max_len);
        Ok(reply)
    }
}
