use super::{
    parser::{decode_reply, encode_command, nth_field, parse_ascii_spectrum, parse_number},
    BaudRate, CaptureType, OutputFormat, ACK, BELL, NAK,
};
use crate::{
    config::RockConfig,
    conversion::polynomial,
    error::{EncodingError, ProtocolError, Result},
    io_adapter::{hex_dump, Transport},
};
use log::debug;
use num_traits::FromPrimitive;

const FIELD_SEPARATOR: &str = ":\t";

/// Ibsen Rock spectrometer on a serial port
pub struct Rock<T: Transport> {
    link: T,
    config: RockConfig,
    pixel_count: Option<u32>,
    /// A, B1..B4
    wavelength_coefficients: Option<[f64; 5]>,
}

impl<T: Transport> Rock<T> {
    pub fn new(link: T, config: RockConfig) -> Self {
        Rock {
            link,
            config,
            pixel_count: None,
            wavelength_coefficients: None,
        }
    }

    /// Resets the device and reads the wavelength calibration
    pub fn open(link: T, config: RockConfig) -> Result<Self> {
        let mut rock = Self::new(link, config);
        rock.reset()?;
        rock.get_wavelength_coefficients()?;
        Ok(rock)
    }

    pub fn release(self) -> T {
        self.link
    }

    fn send(&mut self, command: &str) -> Result<()> {
        debug!(">: {:?}", command);
        self.link.write(&encode_command(command))
    }

    fn receive(&mut self, len: usize) -> Result<Vec<u8>> {
        let raw = self.link.read(len)?;
        debug!("<: [{}]", hex_dump(&raw));
        Ok(raw)
    }

    fn exchange_sized(&mut self, command: &str, len: usize) -> Result<String> {
        self.send(command)?;
        let raw = self.receive(len)?;
        if raw.first() == Some(&NAK) {
            return Err(ProtocolError::Nak.into());
        }
        Ok(decode_reply(&raw)?)
    }

    fn exchange(&mut self, command: &str) -> Result<String> {
        self.exchange_sized(command, self.config.reply_len)
    }

    /// Value part of a `label:\tvalue` reply
    fn exchange_field(&mut self, command: &str) -> Result<String> {
        let reply = self.exchange(command)?;
        Ok(nth_field(&reply, FIELD_SEPARATOR, 1)?.to_string())
    }

    /// Single control byte that acknowledges a command
    fn expect_ack(&mut self, command: &str) -> Result<()> {
        self.send(command)?;
        match self.receive(1)?.first() {
            Some(&ACK) => Ok(()),
            Some(&NAK) => Err(ProtocolError::Nak.into()),
            other => Err(ProtocolError::UnexpectedReply(format!("{:02x?}", other)).into()),
        }
    }

    pub fn get_id(&mut self) -> Result<String> {
        self.exchange("IDN?")
    }

    pub fn get_version(&mut self) -> Result<String> {
        self.exchange("VERS?")
    }

    pub fn get_serial_number(&mut self) -> Result<u32> {
        Ok(parse_number(&self.exchange_field("PARA:SERN?")?)?)
    }

    pub fn get_pixel_count(&mut self) -> Result<u32> {
        if let Some(count) = self.pixel_count {
            return Ok(count);
        }
        let count = parse_number(&self.exchange_field("PARA:PIX?")?)?;
        self.pixel_count = Some(count);
        Ok(count)
    }

    pub fn get_baud_rate(&mut self) -> Result<BaudRate> {
        let code: u32 = parse_number(&self.exchange_field("PARA:BAUD?")?)?;
        Ok(BaudRate::from_u32(code).ok_or(EncodingError::UnknownVariant {
            field: "Baud rate",
            value: code,
        })?)
    }

    /// Milliseconds. The reply lists the previous and the configured value, the latter is kept.
    pub fn get_integration_time(&mut self) -> Result<u32> {
        let reply = self.exchange("CONF:TINT?")?;
        Ok(parse_number(nth_field(&reply, FIELD_SEPARATOR, 2)?)?)
    }

    pub fn set_integration_time_ms(&mut self, ms: u32) -> Result<()> {
        self.expect_ack(&format!("CONF:TINT {}", ms))
    }

    /// Coefficients A, B1..B4 of the wavelength polynomial
    pub fn get_wavelength_coefficients(&mut self) -> Result<[f64; 5]> {
        if let Some(coefficients) = self.wavelength_coefficients {
            return Ok(coefficients);
        }
        let mut coefficients = [0.0; 5];
        for (i, c) in coefficients.iter_mut().enumerate() {
            *c = parse_number(&self.exchange_field(&format!("PARA:FIT{}?", i))?)?;
        }
        self.wavelength_coefficients = Some(coefficients);
        Ok(coefficients)
    }

    /// Nanometers, `A + B1 p + B2 p² + B3 p³ + B4 p⁴` for every pixel
    pub fn get_wavelength_mapping(&mut self) -> Result<Vec<f64>> {
        let pixel_count = self.get_pixel_count()?;
        let coefficients = self.get_wavelength_coefficients()?;
        Ok((0..pixel_count)
            .map(|p| polynomial(&coefficients, p as f64))
            .collect())
    }

    pub fn reset(&mut self) -> Result<String> {
        self.exchange("RST")
    }

    /// Starts a measurement and blocks until the device rings the bell, then reads the spectrum.
    ///
    /// Only the ASCII output formats can be decoded.
    pub fn capture(
        &mut self,
        capture_type: CaptureType,
        integration_time_ms: u32,
        average_count: u32,
        format: OutputFormat,
    ) -> Result<Vec<i64>> {
        self.expect_ack(&format!(
            "MEAS:{} {} {} {}",
            capture_type.keyword(),
            integration_time_ms,
            average_count,
            format as u8
        ))?;
        self.wait_for_bell()?;
        let raw = self.receive(self.config.spectrum_len)?;
        Ok(parse_ascii_spectrum(&decode_reply(&raw)?)?)
    }

    fn wait_for_bell(&mut self) -> Result<()> {
        let mut idle = 0;
        while idle < self.config.bell_poll_limit {
            match self.receive(1)?.first() {
                Some(&BELL) => return Ok(()),
                Some(_) => idle = 0,
                None => idle += 1,
            }
        }
        Err(ProtocolError::ShortResponse { len: 0 }.into())
    }

    /// Spectrum of the most recent measurement of `capture_type`
    pub fn fetch_last(&mut self, capture_type: CaptureType, format: OutputFormat) -> Result<Vec<i64>> {
        let command = format!("FETCH:{} {}", capture_type.keyword(), format as u8);
        let reply = self.exchange_sized(&command, self.config.spectrum_len)?;
        Ok(parse_ascii_spectrum(&reply)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, io_adapter::MockTransport};
    use claims::*;
    use mockall::Sequence;

    fn scripted(replies: Vec<Vec<u8>>) -> MockTransport {
        let mut link = MockTransport::new();
        let mut seq = Sequence::new();
        link.expect_write().returning(|_| Ok(()));
        for reply in replies {
            link.expect_read()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(reply.clone()));
        }
        link
    }

    #[test]
    fn integration_time_takes_configured_value() {
        let link = scripted(vec![b"Previous tint:\t  500\rConfigured tint:\t  750\r".to_vec()]);
        let mut rock = Rock::new(link, Default::default());
        assert_ok_eq!(rock.get_integration_time(), 750);
    }

    #[test]
    fn nak_on_integration_time() {
        let link = scripted(vec![vec![NAK]]);
        let mut rock = Rock::new(link, Default::default());
        assert_matches!(
            rock.set_integration_time_ms(10),
            Err(Error::Protocol(ProtocolError::Nak))
        );
    }

    #[test]
    fn wavelength_mapping_is_polynomial() {
        let link = scripted(vec![
            b"PARA:PIX:\t3\r".to_vec(),
            b"FIT0:\t400\r".to_vec(),
            b"FIT1:\t1\r".to_vec(),
            b"FIT2:\t0.5\r".to_vec(),
            b"FIT3:\t0\r".to_vec(),
            b"FIT4:\t0\r".to_vec(),
        ]);
        let mut rock = Rock::new(link, Default::default());
        assert_ok_eq!(rock.get_wavelength_mapping(), vec![400.0, 401.5, 404.0]);
        // Both caches are filled
        assert_ok_eq!(rock.get_wavelength_mapping(), vec![400.0, 401.5, 404.0]);
    }

    #[test]
    fn unknown_baud_rate() {
        let link = scripted(vec![b"PARA:BAUD:\t96\r".to_vec()]);
        let mut rock = Rock::new(link, Default::default());
        assert_matches!(
            rock.get_baud_rate(),
            Err(Error::Encoding(EncodingError::UnknownVariant { value: 96, .. }))
        );
    }

    #[test]
    fn capture_waits_for_bell() {
        let link = scripted(vec![
            vec![ACK],
            vec![],
            vec![b'.'],
            vec![BELL],
            b"10 20 30\r\n".to_vec(),
        ]);
        let mut rock = Rock::new(link, Default::default());
        assert_ok_eq!(
            rock.capture(CaptureType::Light, 100, 1, OutputFormat::AsciiWithSpaces),
            vec![10, 20, 30]
        );
    }

    #[test]
    fn silent_device_ends_capture() {
        let config = RockConfig {
            bell_poll_limit: 2,
            ..Default::default()
        };
        let link = scripted(vec![vec![ACK], vec![], vec![]]);
        let mut rock = Rock::new(link, config);
        assert_matches!(
            rock.capture(CaptureType::Dark, 100, 1, OutputFormat::AsciiWithSpaces),
            Err(Error::Protocol(ProtocolError::ShortResponse { len: 0 }))
        );
    }
}
