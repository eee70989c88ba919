use super::{
    parser::{decode_reply, encode_command, nth_field, parse_number},
    ACK,
};
use crate::{
    error::{EncodingError, ProtocolError, Result},
    io_adapter::{hex_dump, Transport},
};
use log::debug;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

const REPLY_LEN: usize = 100;

#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
pub enum TecType {
    SensorsUnlimitedLdb1Stage = 0,
    SensorsUnlimitedLdb2Stage = 1,
    SensorsUnlimitedLdb3Stage = 2,
    HamamatsuS5930_512 = 3,
    HamamatsuS5930_256 = 4,
}

#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
pub enum TecSensorType {
    HamamatsuActive = 0,
    HamamatsuPassive = 1,
    SensorsUnlimitedActive = 2,
    SensorsUnlimitedPassive = 3,
}

/// Thermo-electric cooler controller that ships with the Rock. Every reply starts with ACK.
pub struct TecController<T: Transport> {
    link: T,
}

impl<T: Transport> TecController<T> {
    pub fn new(link: T) -> Self {
        TecController { link }
    }

    pub fn release(self) -> T {
        self.link
    }

    fn exchange(&mut self, command: &str) -> Result<String> {
        debug!(">: {:?}", command);
        self.link.write(&encode_command(command))?;
        let raw = self.link.read(REPLY_LEN)?;
        debug!("<: [{}]", hex_dump(&raw));
        match raw.split_first() {
            Some((&ACK, body)) => Ok(decode_reply(body)?),
            _ => Err(ProtocolError::Nak.into()),
        }
    }

    fn exchange_field(&mut self, command: &str) -> Result<String> {
        let reply = self.exchange(command)?;
        Ok(nth_field(&reply, "\t", 1)?.to_string())
    }

    /// Degrees Celsius
    pub fn read_temp(&mut self) -> Result<f64> {
        Ok(parse_number(&self.exchange_field("para:tectemp?")?)?)
    }

    // Factory configured units have been seen answering 6 here
    pub fn get_sensor_type(&mut self) -> Result<TecSensorType> {
        let code: u32 = parse_number(&self.exchange_field("para:tecsen?")?)?;
        Ok(TecSensorType::from_u32(code).ok_or(EncodingError::UnknownVariant {
            field: "TEC sensor type",
            value: code,
        })?)
    }

    pub fn get_tec_type(&mut self) -> Result<TecType> {
        let code: u32 = parse_number(&self.exchange_field("para:tectype?")?)?;
        Ok(TecType::from_u32(code).ok_or(EncodingError::UnknownVariant {
            field: "TEC type",
            value: code,
        })?)
    }

    pub fn turn_on(&mut self) -> Result<()> {
        self.exchange("para:teccon 2").map(|_| ())
    }

    pub fn turn_off(&mut self) -> Result<()> {
        self.exchange("para:teccon 0").map(|_| ())
    }
}
