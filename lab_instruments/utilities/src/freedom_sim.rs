use lab_instruments::{freedom::Register, RegisterBus, Result};
use std::collections::{HashMap, VecDeque};

/// In-memory Freedom register file with the calibration pointer and pixel buffer behaviour
/// of the real device
pub struct RegisterMap {
    pub registers: HashMap<u8, u16>,
    pub calibration: Vec<u8>,
    pub pixels: VecDeque<u16>,
    /// Every write frame, address byte included
    pub writes: Vec<Vec<u8>>,
    calibration_pointer: usize,
}

impl RegisterMap {
    pub fn new(pixel_count: u16, calibration: &str) -> Self {
        let mut registers = HashMap::new();
        registers.insert(Register::SerialNumber as u8, 4711);
        registers.insert(Register::HwVersion as u8, 0x0300);
        registers.insert(Register::FwVersion as u8, 0x0102);
        registers.insert(Register::DetectorType as u8, 7);
        registers.insert(Register::PixelsPerImage as u8, pixel_count);
        // Half scale, 25 degrees Celsius
        registers.insert(Register::Temperature as u8, 0x800);
        registers.insert(Register::AdcGain as u8, 63);
        registers.insert(Register::AdcOffset as u8, 0x0100);
        RegisterMap {
            registers,
            calibration: calibration.as_bytes().to_vec(),
            pixels: VecDeque::new(),
            writes: Vec::new(),
            calibration_pointer: 0,
        }
    }

    pub fn register(&self, register: Register) -> u16 {
        self.registers.get(&(register as u8)).copied().unwrap_or(0)
    }

    fn read(&mut self, address: u8) -> u16 {
        if address == Register::CalibrationCharCount as u8 {
            self.calibration_pointer = 0;
            self.calibration.len() as u16
        } else if address == Register::CalibrationData as u8 {
            let c = self
                .calibration
                .get(self.calibration_pointer)
                .copied()
                .unwrap_or(0);
            self.calibration_pointer += 1;
            c as u16
        } else {
            self.registers.get(&address).copied().unwrap_or(0)
        }
    }
}

impl RegisterBus for RegisterMap {
    fn exchange(&mut self, frame: &[u8], read_len: usize) -> Result<Vec<u8>> {
        let Some((&command, payload)) = frame.split_first() else {
            return Ok(vec![0; read_len]);
        };
        let address = command >> 2;
        if command & 0b10 != 0 {
            let mut reply = self.read(address).to_be_bytes().to_vec();
            reply.resize(read_len, 0);
            return Ok(reply);
        }
        self.writes.push(frame.to_vec());
        let value = match payload {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [byte] => *byte as u16,
            _ => return Ok(vec![0; read_len]),
        };
        self.registers.insert(address, value);
        Ok(vec![0; read_len])
    }

    fn read_data(&mut self, len: usize) -> Result<Vec<u8>> {
        let word = self.pixels.pop_front().unwrap_or(0);
        let mut data = word.to_be_bytes().to_vec();
        data.resize(len, 0);
        Ok(data)
    }
}
