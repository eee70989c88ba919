//! Keithley 2000 digital multimeter, usually reached through a [`Prologix`](crate::gpib::Prologix)
//! adapter.

use crate::{
    error::{EncodingError, Result, ValidationError},
    io_adapter::Transport,
};
use log::debug;

/// Factory default GPIB address
pub const GPIB_ADDRESS: u8 = 16;

const REPLY_LEN: usize = 100;
const CHANNELS: core::ops::RangeInclusive<u8> = 1..=10;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MeasurementType {
    VoltageDc,
    Resistance,
}

impl MeasurementType {
    pub fn function(self) -> &'static str {
        match self {
            MeasurementType::VoltageDc => "VOLT:DC",
            MeasurementType::Resistance => "RES",
        }
    }
}

pub struct Keithley2000<T: Transport> {
    link: T,
}

impl<T: Transport> Keithley2000<T> {
    pub fn new(link: T) -> Self {
        Keithley2000 { link }
    }

    /// Resets the meter to its power-on state
    pub fn open(link: T) -> Result<Self> {
        let mut dmm = Self::new(link);
        dmm.reset()?;
        Ok(dmm)
    }

    pub fn release(self) -> T {
        self.link
    }

    fn send(&mut self, command: &str) -> Result<()> {
        debug!(">: {}", command);
        self.link.write(command.as_bytes())
    }

    fn exchange(&mut self, command: &str) -> Result<String> {
        self.send(command)?;
        let raw = self.link.read(REPLY_LEN)?;
        if let Some(b) = raw.iter().find(|b| !b.is_ascii()) {
            return Err(EncodingError::NonAscii(*b).into());
        }
        let reply: String = raw.iter().map(|b| *b as char).collect();
        debug!("<: {}", reply);
        Ok(reply.trim().to_string())
    }

    fn exchange_value(&mut self, command: &str) -> Result<f64> {
        let reply = self.exchange(command)?;
        reply
            .parse()
            .map_err(|_| EncodingError::InvalidNumber(reply).into())
    }

    pub fn get_device_id_string(&mut self) -> Result<String> {
        self.exchange("*IDN?")
    }

    pub fn reset(&mut self) -> Result<()> {
        self.send("*RST")
    }

    pub fn disable_beeper(&mut self) -> Result<()> {
        self.send(":SYSTEM:BEEP:STATE 0")
    }

    pub fn set_measurement_type(&mut self, measurement: MeasurementType) -> Result<()> {
        self.send(&format!(":SENS:FUNC '{}'", measurement.function()))
    }

    pub fn read_value(&mut self) -> Result<f64> {
        self.exchange_value(":read?")
    }

    /// Closes `channel` of the scanner card and reads it
    pub fn read_channel(&mut self, channel: u8) -> Result<f64> {
        if !CHANNELS.contains(&channel) {
            return Err(ValidationError::out_of_range(
                "Scanner channel",
                channel,
                *CHANNELS.start(),
                *CHANNELS.end(),
            )
            .into());
        }
        self.exchange_value(&format!(":route:close (@{}); :read?", channel))
    }
}
