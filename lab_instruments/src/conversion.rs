//! Raw register and payload values to physical units.
//!
//! Calibration formulas differ between device families and are kept apart on purpose:
//! [`polynomial`] evaluates true powers of the argument, [`summed_linear`] multiplies every term
//! after the first by the argument itself.

use crate::error::ValidationError;

/// Length of one exposure or trigger delay tick
pub const TICK_NS: u64 = 200;
/// Ticks the Freedom sensor always adds to the programmed exposure
pub const EXPOSURE_OFFSET_TICKS: u64 = 48;
const EXPOSURE_OFFSET_NS: u64 = EXPOSURE_OFFSET_TICKS * TICK_NS;

/// Full scale of the Freedom ADC offset, in millivolts
pub const ADC_OFFSET_FULL_SCALE_MV: f64 = 300.0;
const ADC_OFFSET_SIGN_BIT: u16 = 1 << 8;

/// Combines two 16-bit register halves into one 32-bit value
pub fn merge_words(msb: u16, lsb: u16) -> u32 {
    (msb as u32) << 16 | lsb as u32
}

/// Splits a 32-bit value into `(msb, lsb)` register halves
pub fn split_words(value: u32) -> (u16, u16) {
    ((value >> 16) as u16, (value & 0xFFFF) as u16)
}

pub fn exposure_ticks_to_ns(ticks: u32) -> u64 {
    (ticks as u64 + EXPOSURE_OFFSET_TICKS) * TICK_NS
}

pub fn exposure_ns_to_ticks(ns: u64) -> Result<u32, ValidationError> {
    let max_ns = exposure_ticks_to_ns(u32::MAX);
    if !(EXPOSURE_OFFSET_NS..=max_ns).contains(&ns) {
        return Err(ValidationError::out_of_range(
            "Exposure time (ns)",
            ns as f64,
            EXPOSURE_OFFSET_NS as f64,
            max_ns as f64,
        ));
    }
    let ticks = ((ns - EXPOSURE_OFFSET_NS) as f64 / TICK_NS as f64).round_ties_even();
    Ok(ticks as u32)
}

pub fn trigger_ticks_to_ns(ticks: u32) -> u64 {
    ticks as u64 * TICK_NS
}

pub fn trigger_ns_to_ticks(ns: u64) -> Result<u32, ValidationError> {
    let ticks = (ns as f64 / TICK_NS as f64).round_ties_even();
    if ticks > u32::MAX as f64 {
        return Err(ValidationError::out_of_range(
            "Trigger delay (ns)",
            ns as f64,
            0.0,
            trigger_ticks_to_ns(u32::MAX) as f64,
        ));
    }
    Ok(ticks as u32)
}

/// Gain of the Freedom ADC from its 6-bit register value
pub fn gain_from_register(value: u8) -> f64 {
    let v = (value & 0x3F) as f64;
    6.0 / (1.0 + 5.0 * ((63.0 - v) / 63.0))
}

/// ADC offset in millivolts: bit 8 set means positive, low byte is the magnitude
pub fn adc_offset_to_mv(register: u16) -> f64 {
    let sign = if register & ADC_OFFSET_SIGN_BIT != 0 {
        1.0
    } else {
        -1.0
    };
    sign * ADC_OFFSET_FULL_SCALE_MV * ((register & 0xFF) as f64 / 255.0)
}

/// Register payload `[sign, magnitude]` for an ADC offset in millivolts
pub fn adc_offset_from_mv(mv: f64) -> Result<[u8; 2], ValidationError> {
    if !(-ADC_OFFSET_FULL_SCALE_MV..=ADC_OFFSET_FULL_SCALE_MV).contains(&mv) {
        return Err(ValidationError::out_of_range(
            "ADC offset (mV)",
            mv,
            -ADC_OFFSET_FULL_SCALE_MV,
            ADC_OFFSET_FULL_SCALE_MV,
        ));
    }
    let sign = u8::from(mv >= 0.0);
    let magnitude = (mv.abs() / ADC_OFFSET_FULL_SCALE_MV * 255.0).round_ties_even() as u8;
    Ok([sign, magnitude])
}

/// NTC thermistor read through a pull-up divider, single beta model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thermistor {
    pub beta: f64,
    /// Resistance at `t0_kelvin`, same unit as `pullup`
    pub r0: f64,
    pub pullup: f64,
    pub t0_kelvin: f64,
    /// Raw reading that corresponds to the supply rail
    pub adc_full_scale: u16,
}

const KELVIN_OFFSET: f64 = 273.15;

/// Sensor thermistor of the Freedom spectrometer (kΩ)
pub const FREEDOM_THERMISTOR: Thermistor = Thermistor {
    beta: 3762.32,
    r0: 10.0,
    pullup: 10.0,
    t0_kelvin: 25.0 + KELVIN_OFFSET,
    adc_full_scale: 0xFFF,
};

impl Thermistor {
    pub fn resistance(&self, raw: u16) -> Result<f64, ValidationError> {
        // Either rail makes the divider equation blow up or lose meaning
        if raw == 0 || raw >= self.adc_full_scale {
            return Err(ValidationError::SensorSaturated);
        }
        let ratio = raw as f64 / self.adc_full_scale as f64;
        Ok(self.pullup * ratio / (1.0 - ratio))
    }

    pub fn celsius(&self, raw: u16) -> Result<f64, ValidationError> {
        let resistance = self.resistance(raw)?;
        let r_log = (resistance / self.r0).ln();
        let kelvin = 1.0 / ((1.0 / self.t0_kelvin) + (1.0 / self.beta) * r_log);
        Ok(kelvin - KELVIN_OFFSET)
    }
}

/// `c[0] + c[1]*x + c[2]*x^2 + ...`
pub fn polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// `c[0] + c[1]*x + c[2]*x + ...`, every term after the first is linear in `x`
pub fn summed_linear(coefficients: &[f64], x: f64) -> f64 {
    match coefficients.split_first() {
        Some((first, rest)) => first + rest.iter().map(|c| c * x).sum::<f64>(),
        None => 0.0,
    }
}
