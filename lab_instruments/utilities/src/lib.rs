mod freedom_sim;
mod qred_sim;

pub use freedom_sim::RegisterMap;
pub use qred_sim::QredSim;

use lab_instruments::{RegisterBus, Result, Transport};
use lazy_static::lazy_static;
use manifest_dir_macros::exist_relative_path;
use mockall::mock;
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::multispace0,
    combinator::{all_consuming, map_res},
    multi::many1,
    sequence::delimited,
    IResult,
};

/// Decodes a pair of chars formatted as hex into a byte. For example "FF" -> 255
fn hex_byte(input: &str) -> IResult<&str, u8> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
        |hex| u8::from_str_radix(hex, 16),
    )(input)
}

/// Hex dump with arbitrary whitespace, including line breaks, between bytes
pub fn parse_hex_str(input: &str) -> IResult<&str, Vec<u8>> {
    all_consuming(many1(delimited(multispace0, hex_byte, multispace0)))(input)
}

lazy_static! {
    /// Status word, 48-byte header and 16 amplitudes of a captured Qred spectrum reply
    pub static ref QRED_SPECTRUM_RESPONSE: Vec<u8> = {
        let hex_str = include_str!(exist_relative_path!(
            "resources/test/qred_spectrum_response.txt"
        ));
        let (_, data) = parse_hex_str(hex_str)
            .expect("Failed to parse resources/test/qred_spectrum_response.txt");
        data
    };
    /// Wavelength and linearity coefficients as stored in Freedom EEPROM
    pub static ref FREEDOM_CALIBRATION: String = include_str!(exist_relative_path!(
        "resources/test/freedom_calibration.txt"
    ))
    .trim_end()
    .to_string();
}

mock! {
    pub Link {}
    impl Transport for Link {
        fn write(&mut self, buf: &[u8]) -> Result<()>;
        fn read(&mut self, max_len: usize) -> Result<Vec<u8>>;
    }
}

mock! {
    pub Bus {}
    impl RegisterBus for Bus {
        fn exchange(&mut self, frame: &[u8], read_len: usize) -> Result<Vec<u8>>;
        fn read_data(&mut self, len: usize) -> Result<Vec<u8>>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::*;

    #[test]
    fn hex_byte_parser() {
        assert_ok_eq!(hex_byte("FF"), ("", 255));
        assert_ok_eq!(hex_byte("ff"), ("", 255));
        assert_err!(hex_byte("NH"));
    }

    #[test]
    fn hex_str_parser() {
        assert_ok_eq!(
            parse_hex_str("DEADBEEF"),
            ("", vec![0xDE, 0xAD, 0xBE, 0xEF])
        );
        assert_ok_eq!(
            parse_hex_str(" DE   AD\nBE\r\nEF    "),
            ("", vec![0xDE, 0xAD, 0xBE, 0xEF])
        );
        assert_err!(parse_hex_str("NOT HEX"));
        assert_err!(parse_hex_str("DE AD BE EF NO TH EX"));
    }

    #[test]
    fn fixtures_load() {
        assert_eq!(QRED_SPECTRUM_RESPONSE.len(), 4 + 48 + 16 * 4);
        assert_eq!(FREEDOM_CALIBRATION.len(), 14 * 14);
    }
}
