/// INA219 current/power monitor driver
///
/// Mirrors the defaults of the common Raspberry Pi driver: 32 V bus range, 12-bit ADCs,
/// continuous shunt and bus conversion, and automatic gain. Sampling starts at the most
/// sensitive ±40 mV shunt range and steps the gain up whenever the chip flags a math
/// overflow. An overflow at ±320 mV is reported as [`ExporterError::RangeExceeded`].
use log::debug;
use std::thread::sleep;
use std::time::Duration;

use crate::error::ExporterError;
use crate::hardware::bus::RegisterBus;

const REG_CONFIG: u8 = 0x00;
const REG_BUS_VOLTAGE: u8 = 0x02;
const REG_POWER: u8 = 0x03;
const REG_CURRENT: u8 = 0x04;
const REG_CALIBRATION: u8 = 0x05;

const CONFIG_RANGE_32V: u16 = 1 << 13;
const CONFIG_GAIN_SHIFT: u16 = 11;
const CONFIG_BADC_12BIT: u16 = 0x3 << 7;
const CONFIG_SADC_12BIT: u16 = 0x3 << 3;
const CONFIG_MODE_CONTINUOUS: u16 = 0x7;

const BUS_OVERFLOW_FLAG: u16 = 0x0001;
const BUS_MILLIVOLTS_LSB: f64 = 4.0;
const CALIBRATION_FACTOR: f64 = 0.04096;
const CURRENT_LSB_FACTOR: f64 = 32800.0;
const MAX_CALIBRATION_VALUE: f64 = 65534.0;

// One 12-bit conversion takes 532 us
const CONVERSION_DELAY: Duration = Duration::from_millis(1);

/// Programmable shunt voltage range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Gain {
    Mv40 = 0,
    Mv80 = 1,
    Mv160 = 2,
    Mv320 = 3,
}

impl Gain {
    pub fn shunt_volts_max(self) -> f64 {
        match self {
            Gain::Mv40 => 0.04,
            Gain::Mv80 => 0.08,
            Gain::Mv160 => 0.16,
            Gain::Mv320 => 0.32,
        }
    }

    fn next(self) -> Option<Gain> {
        match self {
            Gain::Mv40 => Some(Gain::Mv80),
            Gain::Mv80 => Some(Gain::Mv160),
            Gain::Mv160 => Some(Gain::Mv320),
            Gain::Mv320 => None,
        }
    }
}

/// Calibration register value and LSB sizes for a shunt and gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub register: u16,
    pub current_lsb: f64, // A per bit
    pub power_lsb: f64,   // W per bit
}

impl Calibration {
    pub fn new(shunt_ohms: f64, gain: Gain) -> Self {
        let max_possible_amps = gain.shunt_volts_max() / shunt_ohms;
        // Never finer than the calibration register can express
        let min_current_lsb = CALIBRATION_FACTOR / (shunt_ohms * MAX_CALIBRATION_VALUE);
        let current_lsb = (max_possible_amps / CURRENT_LSB_FACTOR).max(min_current_lsb);
        let register = (CALIBRATION_FACTOR / (current_lsb * shunt_ohms)).trunc() as u16;
        Calibration {
            register,
            current_lsb,
            power_lsb: current_lsb * 20.0,
        }
    }
}

pub struct Ina219<'a, B: RegisterBus> {
    bus: &'a mut B,
    address: u8,
    shunt_ohms: f64,
    gain: Gain,
    calibration: Calibration,
}

impl<'a, B: RegisterBus> Ina219<'a, B> {
    pub fn new(bus: &'a mut B, address: u8, shunt_ohms: f64) -> Self {
        Ina219 {
            bus,
            address,
            shunt_ohms,
            gain: Gain::Mv40,
            calibration: Calibration::new(shunt_ohms, Gain::Mv40),
        }
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Program calibration and configuration for the most sensitive range
    pub fn configure(&mut self) -> Result<(), ExporterError> {
        self.apply_gain(Gain::Mv40)
    }

    fn apply_gain(&mut self, gain: Gain) -> Result<(), ExporterError> {
        let calibration = Calibration::new(self.shunt_ohms, gain);
        let config = CONFIG_RANGE_32V
            | ((gain as u16) << CONFIG_GAIN_SHIFT)
            | CONFIG_BADC_12BIT
            | CONFIG_SADC_12BIT
            | CONFIG_MODE_CONTINUOUS;

        self.bus
            .write_word(self.address, REG_CALIBRATION, calibration.register)?;
        self.bus.write_word(self.address, REG_CONFIG, config)?;

        debug!(
            "INA219 0x{:02X}: gain {:?}, calibration {}",
            self.address, gain, calibration.register
        );
        self.gain = gain;
        self.calibration = calibration;
        Ok(())
    }

    fn has_overflow(&mut self) -> Result<bool, ExporterError> {
        let raw = self.bus.read_word(self.address, REG_BUS_VOLTAGE)?;
        Ok(raw & BUS_OVERFLOW_FLAG != 0)
    }

    fn settle_gain(&mut self) -> Result<(), ExporterError> {
        while self.has_overflow()? {
            match self.gain.next() {
                Some(gain) => {
                    self.apply_gain(gain)?;
                    sleep(CONVERSION_DELAY);
                }
                None => {
                    return Err(ExporterError::RangeExceeded {
                        address: self.address,
                    })
                }
            }
        }
        Ok(())
    }

    /// Bus voltage in V
    pub fn voltage(&mut self) -> Result<f64, ExporterError> {
        let raw = self.bus.read_word(self.address, REG_BUS_VOLTAGE)?;
        Ok(f64::from(raw >> 3) * BUS_MILLIVOLTS_LSB / 1000.0)
    }

    /// Shunt current in mA, negative while discharging
    pub fn current(&mut self) -> Result<f64, ExporterError> {
        self.settle_gain()?;
        let raw = self.bus.read_word(self.address, REG_CURRENT)? as i16;
        Ok(f64::from(raw) * self.calibration.current_lsb * 1000.0)
    }

    /// Load power in mW
    pub fn power(&mut self) -> Result<f64, ExporterError> {
        self.settle_gain()?;
        let raw = self.bus.read_word(self.address, REG_POWER)?;
        Ok(f64::from(raw) * self.calibration.power_lsb * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Simulated INA219 that overflows until the gain reaches `min_gain`
    struct SimulatedIna {
        min_gain: Option<u16>,
        gain: u16,
        registers: HashMap<u8, u16>,
        calibrations: Vec<u16>,
    }

    impl SimulatedIna {
        fn new(min_gain: Option<u16>) -> Self {
            let mut registers = HashMap::new();
            // 5.1 V on the bus
            registers.insert(REG_BUS_VOLTAGE, (1275 << 3) | 0b10);
            registers.insert(REG_CURRENT, 1000);
            registers.insert(REG_POWER, 500);
            SimulatedIna {
                min_gain,
                gain: 0,
                registers,
                calibrations: Vec::new(),
            }
        }
    }

    impl RegisterBus for SimulatedIna {
        fn read_byte(&mut self, _address: u8, register: u8) -> Result<u8, ExporterError> {
            Ok(self.registers.get(&register).copied().unwrap_or(0) as u8)
        }

        fn read_word(&mut self, _address: u8, register: u8) -> Result<u16, ExporterError> {
            let mut value = self.registers.get(&register).copied().unwrap_or(0);
            if register == REG_BUS_VOLTAGE {
                let overflowing = match self.min_gain {
                    Some(min) => self.gain < min,
                    None => true,
                };
                if overflowing {
                    value |= BUS_OVERFLOW_FLAG;
                }
            }
            Ok(value)
        }

        fn write_word(
            &mut self,
            _address: u8,
            register: u8,
            value: u16,
        ) -> Result<(), ExporterError> {
            match register {
                REG_CONFIG => self.gain = (value >> CONFIG_GAIN_SHIFT) & 0x3,
                REG_CALIBRATION => self.calibrations.push(value),
                _ => {}
            }
            Ok(())
        }
    }

    #[test]
    fn test_calibration_for_supply_shunt() {
        let calibration = Calibration::new(0.00725, Gain::Mv40);
        assert_eq!(calibration.register, 33587);
        assert!((calibration.current_lsb - 0.04 / 0.00725 / 32800.0).abs() < 1e-12);
        assert!((calibration.power_lsb - calibration.current_lsb * 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_is_independent_of_shunt() {
        let battery = Calibration::new(0.005, Gain::Mv320);
        let supply = Calibration::new(0.00725, Gain::Mv320);
        assert_eq!(battery.register, 4198);
        assert_eq!(supply.register, battery.register);
    }

    #[test]
    fn test_configure_writes_expected_config_word() {
        let mut bus = crate::hardware::bus::fake::FakeBus::default();
        let mut ina = Ina219::new(&mut bus, 0x40, 0.00725);
        ina.configure().unwrap();
        assert_eq!(
            bus.writes,
            vec![(0x40, REG_CALIBRATION, 33587), (0x40, REG_CONFIG, 0x219F)]
        );
    }

    #[test]
    fn test_voltage_scaling() {
        let mut sim = SimulatedIna::new(Some(0));
        let mut ina = Ina219::new(&mut sim, 0x40, 0.00725);
        ina.configure().unwrap();
        assert!((ina.voltage().unwrap() - 5.1).abs() < 1e-9);
    }

    #[test]
    fn test_current_and_power_without_overflow() {
        let mut sim = SimulatedIna::new(Some(0));
        let mut ina = Ina219::new(&mut sim, 0x45, 0.005);
        ina.configure().unwrap();
        let lsb = 0.04 / 0.005 / 32800.0;
        assert!((ina.current().unwrap() - 1000.0 * lsb * 1000.0).abs() < 1e-9);
        assert!((ina.power().unwrap() - 500.0 * lsb * 20.0 * 1000.0).abs() < 1e-9);
        assert_eq!(ina.gain(), Gain::Mv40);
    }

    #[test]
    fn test_negative_current_while_discharging() {
        let mut sim = SimulatedIna::new(Some(0));
        sim.registers.insert(REG_CURRENT, (-250i16) as u16);
        let mut ina = Ina219::new(&mut sim, 0x45, 0.005);
        ina.configure().unwrap();
        assert!(ina.current().unwrap() < 0.0);
    }

    #[test]
    fn test_overflow_steps_gain_up() {
        let mut sim = SimulatedIna::new(Some(2));
        let current = {
            let mut ina = Ina219::new(&mut sim, 0x45, 0.005);
            ina.configure().unwrap();
            let current = ina.current().unwrap();
            assert_eq!(ina.gain(), Gain::Mv160);
            current
        };
        let lsb = 0.16 / 0.005 / 32800.0;
        assert!((current - 1000.0 * lsb * 1000.0).abs() < 1e-9);
        assert_eq!(sim.calibrations.len(), 3);
    }

    #[test]
    fn test_overflow_at_widest_range_is_range_exceeded() {
        let mut sim = SimulatedIna::new(None);
        let mut ina = Ina219::new(&mut sim, 0x45, 0.005);
        ina.configure().unwrap();
        let err = ina.current().unwrap_err();
        assert!(err.is_range_exceeded());
        assert_eq!(ina.gain(), Gain::Mv320);
    }
}
