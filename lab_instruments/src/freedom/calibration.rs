use crate::{conversion::summed_linear, error::EncodingError};
use log::{debug, warn};
use nom::{
    bytes::complete::take, combinator::rest, multi::many0, sequence::tuple, IResult,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Every coefficient is stored as 14 ASCII characters, e.g. `+2.1234567E+05`
pub const FIELD_WIDTH: usize = 14;
pub const WAVELENGTH_FIELDS: usize = 6;
pub const LINEARITY_FIELDS: usize = 8;

/// B0..B5
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WavelengthCoefficients(pub [f64; WAVELENGTH_FIELDS]);

impl WavelengthCoefficients {
    /// Nanometers. Every term after B0 is multiplied by the pixel index itself, not its power.
    pub fn wavelength(&self, pixel: usize) -> f64 {
        summed_linear(&self.0, pixel as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearityCoefficients {
    pub a: f64,
    /// B1..B7
    pub b: [f64; 7],
}

impl Default for LinearityCoefficients {
    /// Leaves readings untouched
    fn default() -> Self {
        LinearityCoefficients { a: 1.0, b: [0.0; 7] }
    }
}

impl LinearityCoefficients {
    pub fn correct(&self, value: f64) -> f64 {
        let mut terms = [0.0; LINEARITY_FIELDS];
        terms[0] = self.a;
        terms[1..].copy_from_slice(&self.b);
        value / summed_linear(&terms, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    pub wavelength: WavelengthCoefficients,
    pub linearity: LinearityCoefficients,
}

fn fields(input: &str) -> IResult<&str, (Vec<&str>, &str)> {
    tuple((many0(take(FIELD_WIDTH)), rest))(input)
}

fn parse_field(field: &str) -> Result<f64, EncodingError> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| EncodingError::InvalidNumber(field.to_string()))
}

fn parse_linearity(fields: &[&str]) -> Result<LinearityCoefficients, EncodingError> {
    let a = parse_field(fields[0])?;
    let mut b = [0.0; 7];
    for (coeff, field) in b.iter_mut().zip(&fields[1..]) {
        *coeff = parse_field(field)?;
    }
    Ok(LinearityCoefficients { a, b })
}

/// Splits the calibration text into fixed-width fields: B0..B5 of the wavelength fit, then
/// A and B1..B7 of the optional linearity correction.
///
/// Missing or malformed linearity data is replaced by [`LinearityCoefficients::default`].
pub fn parse_calibration_block(text: &str) -> Result<Calibration, EncodingError> {
    let (_, (mut split, tail)) = fields(text).map_err(|_| EncodingError::InsufficientCalibration {
        fields: 0,
        required: WAVELENGTH_FIELDS,
    })?;
    if !tail.trim().is_empty() {
        split.push(tail);
    }
    if split.len() < WAVELENGTH_FIELDS {
        return Err(EncodingError::InsufficientCalibration {
            fields: split.len(),
            required: WAVELENGTH_FIELDS,
        });
    }

    let mut wavelength = [0.0; WAVELENGTH_FIELDS];
    for (coeff, field) in wavelength.iter_mut().zip(&split) {
        *coeff = parse_field(field)?;
    }

    let available = &split[WAVELENGTH_FIELDS..];
    let linearity = if available.len() < LINEARITY_FIELDS {
        warn!("No linearity calibration coefficients available");
        LinearityCoefficients::default()
    } else {
        if available.len() > LINEARITY_FIELDS {
            debug!(
                "Ignoring {} trailing calibration fields",
                available.len() - LINEARITY_FIELDS
            );
        }
        parse_linearity(&available[..LINEARITY_FIELDS]).unwrap_or_else(|e| {
            warn!("Linearity calibration is unusable ({}), not correcting", e);
            LinearityCoefficients::default()
        })
    };

    Ok(Calibration {
        wavelength: WavelengthCoefficients(wavelength),
        linearity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::*;

    fn block(values: &[f64]) -> String {
        values.iter().map(|v| format!("{:+.7E}", v)).map(|f| {
            // Rust omits the exponent sign and padding, the device does not
            let (mantissa, exp) = f.split_once('E').unwrap();
            let exp: i32 = exp.parse().unwrap();
            format!("{}E{:+03}", mantissa, exp)
        }).collect()
    }

    #[test]
    fn fixture_formatting_matches_device() {
        assert_eq!(block(&[212345.67]), "+2.1234567E+05");
        assert_eq!(block(&[-0.0125]), "-1.2500000E-02");
    }

    #[test]
    fn wavelength_only_block() {
        let text = block(&[400.0, 0.1, 0.05, 0.0, 0.0, 0.0]);
        assert_eq!(text.len(), 84);
        let calibration = parse_calibration_block(&text).unwrap();
        assert_eq!(
            calibration.wavelength.0,
            [400.0, 0.1, 0.05, 0.0, 0.0, 0.0]
        );
        assert_eq!(calibration.linearity, LinearityCoefficients::default());
        assert!((calibration.wavelength.wavelength(10) - 401.5).abs() < 1e-9);
    }

    #[test]
    fn full_block_with_linearity() {
        let text = block(&[
            400.0, 0.1, 0.0, 0.0, 0.0, 0.0, 1.0, 0.001, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ]);
        let calibration = parse_calibration_block(&text).unwrap();
        assert_eq!(calibration.linearity.a, 1.0);
        assert_eq!(calibration.linearity.b[0], 0.001);
        assert!((calibration.linearity.correct(1000.0) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn partial_linearity_falls_back_to_identity() {
        let text = block(&[400.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.9, 0.5]);
        let calibration = parse_calibration_block(&text).unwrap();
        assert_eq!(calibration.linearity, LinearityCoefficients::default());
    }

    #[test]
    fn malformed_linearity_falls_back_to_identity() {
        let mut text = block(&[400.0, 0.1, 0.0, 0.0, 0.0, 0.0]);
        text.push_str(&"#".repeat(FIELD_WIDTH * LINEARITY_FIELDS));
        let calibration = parse_calibration_block(&text).unwrap();
        assert_eq!(calibration.linearity, LinearityCoefficients::default());
    }

    #[test]
    fn short_block_is_rejected() {
        let text = block(&[400.0, 0.1, 0.0]);
        assert_err_eq!(
            parse_calibration_block(&text),
            EncodingError::InsufficientCalibration {
                fields: 3,
                required: 6
            }
        );
        assert_err!(parse_calibration_block(""));
    }

    #[test]
    fn malformed_wavelength_is_rejected() {
        let mut text = "+4.00000O0E+02".to_string();
        text.push_str(&block(&[0.1, 0.0, 0.0, 0.0, 0.0]));
        assert_err_eq!(
            parse_calibration_block(&text),
            EncodingError::InvalidNumber("+4.00000O0E+02".to_string())
        );
    }

    #[test]
    fn identity_correction_is_noop() {
        let identity = LinearityCoefficients::default();
        assert_eq!(identity.correct(1234.0), 1234.0);
    }
}
