/// Supply and battery rail sampling through the two INA219 monitors
use log::{debug, warn};

use crate::error::ExporterError;
use crate::hardware::bus::RegisterBus;
use crate::hardware::ina219::Ina219;
use crate::models::PowerReading;

/// One INA219 and the shunt it measures across
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerMonitor {
    pub name: &'static str,
    pub address: u8,
    pub shunt_ohms: f64,
}

/// Raspberry Pi power input
pub const SUPPLY_MONITOR: PowerMonitor = PowerMonitor {
    name: "supply",
    address: 0x40,
    shunt_ohms: 0.00725,
};

/// Battery pack
pub const BATTERY_MONITOR: PowerMonitor = PowerMonitor {
    name: "battery",
    address: 0x45,
    shunt_ohms: 0.005,
};

/// Configure the monitor and sample voltage, current and power
pub fn read_power<B: RegisterBus>(
    bus: &mut B,
    monitor: &PowerMonitor,
) -> Result<PowerReading, ExporterError> {
    let mut sensor = Ina219::new(bus, monitor.address, monitor.shunt_ohms);
    sensor.configure()?;

    let reading = PowerReading {
        voltage: sensor.voltage()?,
        current: sensor.current()?,
        power: sensor.power()?,
    };

    debug!(
        "{} rail: {:.3} V, {:.3} mA, {:.3} mW (gain {:?})",
        monitor.name,
        reading.voltage,
        reading.current,
        reading.power,
        sensor.gain()
    );
    Ok(reading)
}

pub fn read_supply<B: RegisterBus>(bus: &mut B) -> Result<PowerReading, ExporterError> {
    read_power(bus, &SUPPLY_MONITOR)
}

/// Sample the battery rail, downgrading an out-of-range current to a warning
///
/// High charge or discharge currents can exceed even the widest shunt range. That case
/// yields `Ok(None)` so the rest of the run still happens; every other failure propagates.
pub fn read_battery<B: RegisterBus>(bus: &mut B) -> Result<Option<PowerReading>, ExporterError> {
    match read_power(bus, &BATTERY_MONITOR) {
        Ok(reading) => Ok(Some(reading)),
        Err(e) if e.is_range_exceeded() => {
            warn!("Battery power is too high.");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
