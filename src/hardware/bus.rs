/// Register-level access to devices on the I2C bus
use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::ExporterError;

/// Register transactions needed by the UPS and power-monitor readers
///
/// Words are transferred most significant byte first, which is what the INA219 expects.
pub trait RegisterBus {
    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, ExporterError>;

    fn read_word(&mut self, address: u8, register: u8) -> Result<u16, ExporterError>;

    fn write_word(&mut self, address: u8, register: u8, value: u16) -> Result<(), ExporterError>;
}

/// Linux `/dev/i2c-N` bus with one SMBus handle per slave address
pub struct I2cBus {
    path: String,
    devices: HashMap<u8, LinuxI2CDevice>,
}

impl I2cBus {
    pub fn new(bus_number: u8) -> Self {
        I2cBus {
            path: format!("/dev/i2c-{}", bus_number),
            devices: HashMap::new(),
        }
    }

    fn device(&mut self, address: u8, register: u8) -> Result<&mut LinuxI2CDevice, ExporterError> {
        match self.devices.entry(address) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!("Opening {} for device 0x{:02X}", self.path, address);
                let device = LinuxI2CDevice::new(&self.path, u16::from(address)).map_err(|e| {
                    ExporterError::Bus {
                        address,
                        register,
                        reason: format!("cannot open {}: {}", self.path, e),
                    }
                })?;
                Ok(entry.insert(device))
            }
        }
    }
}

fn bus_error(address: u8, register: u8, e: impl std::fmt::Display) -> ExporterError {
    ExporterError::Bus {
        address,
        register,
        reason: e.to_string(),
    }
}

impl RegisterBus for I2cBus {
    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, ExporterError> {
        self.device(address, register)?
            .smbus_read_byte_data(register)
            .map_err(|e| bus_error(address, register, e))
    }

    fn read_word(&mut self, address: u8, register: u8) -> Result<u16, ExporterError> {
        // SMBus assembles words little-endian
        self.device(address, register)?
            .smbus_read_word_data(register)
            .map(u16::swap_bytes)
            .map_err(|e| bus_error(address, register, e))
    }

    fn write_word(&mut self, address: u8, register: u8, value: u16) -> Result<(), ExporterError> {
        self.device(address, register)?
            .smbus_write_word_data(register, value.swap_bytes())
            .map_err(|e| bus_error(address, register, e))
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    /// In-memory bus with fixed register contents
    #[derive(Debug, Default)]
    pub(crate) struct FakeBus {
        pub bytes: HashMap<(u8, u8), u8>,
        pub words: HashMap<(u8, u8), u16>,
        pub writes: Vec<(u8, u8, u16)>,
        pub byte_reads: usize,
        pub fail_at: Option<(u8, u8)>,
    }

    impl FakeBus {
        fn check(&self, address: u8, register: u8) -> Result<(), ExporterError> {
            if self.fail_at == Some((address, register)) {
                return Err(bus_error(address, register, "Remote I/O error"));
            }
            Ok(())
        }
    }

    impl RegisterBus for FakeBus {
        fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, ExporterError> {
            self.check(address, register)?;
            self.byte_reads += 1;
            Ok(self.bytes.get(&(address, register)).copied().unwrap_or(0))
        }

        fn read_word(&mut self, address: u8, register: u8) -> Result<u16, ExporterError> {
            self.check(address, register)?;
            Ok(self.words.get(&(address, register)).copied().unwrap_or(0))
        }

        fn write_word(
            &mut self,
            address: u8,
            register: u8,
            value: u16,
        ) -> Result<(), ExporterError> {
            self.check(address, register)?;
            self.writes.push((address, register, value));
            Ok(())
        }
    }
}
