/// UPS Plus register block layout and decoding
///
/// The UPS microcontroller exposes a flat block of byte registers at bus address 0x17.
/// Multi-byte values are stored little-endian: the least significant byte lives at the
/// lower register index. Register 0 is unused, so the block is indexed 1..=254 and a
/// placeholder byte keeps the indices aligned with the register numbers.
///
/// Every field is described once in the [`layout`] table and extracted by
/// [`Register::extract`], so adding a field never means writing shift arithmetic.
use crate::models::{
    BatteryData, DeviceData, DeviceIdentity, FieldValue, MetricFields, UpsRegisters,
    VoltageReadings,
};

/// Number of positions in a register block, including the unused index 0
pub const BLOCK_LEN: usize = 255;

/// Raw register contents, index-aligned with the register numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock([u8; BLOCK_LEN]);

impl RawBlock {
    pub fn new(bytes: [u8; BLOCK_LEN]) -> Self {
        RawBlock(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_LEN] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte,
    Word,
    DoubleWord,
}

impl Width {
    pub const fn byte_count(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Word => 2,
            Width::DoubleWord => 4,
        }
    }
}

/// One named, fixed-offset field of the register block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    /// Field key used when publishing metrics
    pub name: &'static str,
    /// Index of the least significant byte
    pub offset: usize,
    pub width: Width,
}

impl Register {
    const fn byte(name: &'static str, offset: usize) -> Self {
        Register { name, offset, width: Width::Byte }
    }

    const fn word(name: &'static str, offset: usize) -> Self {
        Register { name, offset, width: Width::Word }
    }

    const fn double_word(name: &'static str, offset: usize) -> Self {
        Register { name, offset, width: Width::DoubleWord }
    }

    /// Assemble the field little-endian from the block
    pub fn extract(&self, block: &RawBlock) -> u32 {
        block.as_bytes()[self.offset..self.offset + self.width.byte_count()]
            .iter()
            .rev()
            .fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte))
    }

    // Word and byte registers always fit their narrower types
    fn extract_u16(&self, block: &RawBlock) -> u16 {
        self.extract(block) as u16
    }

    fn extract_u8(&self, block: &RawBlock) -> u8 {
        self.extract(block) as u8
    }
}

pub mod layout {
    use super::Register;

    pub const PROCESSOR_MV: Register = Register::word("processor", 1);
    pub const RASPBERRY_PI_MV: Register = Register::word("Raspberry_Pi_reported", 3);
    pub const BATTERY_PORT_MV: Register = Register::word("Battery_port_reported", 5);
    pub const TYPE_C_MV: Register = Register::word("Charging_interface_(Type_C)", 7);
    pub const MICRO_USB_MV: Register = Register::word("Charging_interface_(Micro_USB)", 9);

    pub const TEMPERATURE: Register = Register::word("Temperature", 11);
    pub const FULL_VOLTAGE: Register = Register::word("Full_voltage", 13);
    pub const EMPTY_VOLTAGE: Register = Register::word("Empty_voltage", 15);
    pub const PROTECTION_VOLTAGE: Register = Register::word("Protection_voltage", 17);
    pub const REMAINING_CAPACITY: Register = Register::word("Remaining_capacity", 19);

    pub const SAMPLING_PERIOD: Register = Register::word("Sampling", 21);
    pub const POWER_STATE: Register = Register::byte("Power_state", 23);
    pub const SHUTDOWN_TIMER: Register = Register::byte("Shutdown_timer", 24);
    pub const TURN_ON_WITH_POWER: Register = Register::byte("Turn_on_with_power", 25);
    pub const RESTART_TIMER: Register = Register::byte("Restart_timer", 26);
    pub const RUNNING_TIME: Register = Register::double_word("Running_time", 28);
    pub const CHARGE_TIME: Register = Register::double_word("Charge_time", 32);
    pub const UPTIME: Register = Register::double_word("Uptime", 36);
    pub const FIRMWARE: Register = Register::word("Firmware", 40);

    pub const UID0: Register = Register::double_word("UID0", 240);
    pub const UID1: Register = Register::double_word("UID1", 244);
    pub const UID2: Register = Register::double_word("UID2", 248);
}

/// Decode every field group from a register block
pub fn decode(block: &RawBlock) -> UpsRegisters {
    use layout::*;

    UpsRegisters {
        voltages: VoltageReadings {
            processor: PROCESSOR_MV.extract_u16(block),
            raspberry_pi: RASPBERRY_PI_MV.extract_u16(block),
            battery_port: BATTERY_PORT_MV.extract_u16(block),
            type_c: TYPE_C_MV.extract_u16(block),
            micro_usb: MICRO_USB_MV.extract_u16(block),
        },
        battery: BatteryData {
            temperature: TEMPERATURE.extract_u16(block),
            full_voltage: FULL_VOLTAGE.extract_u16(block),
            empty_voltage: EMPTY_VOLTAGE.extract_u16(block),
            protection_voltage: PROTECTION_VOLTAGE.extract_u16(block),
            remaining_capacity: REMAINING_CAPACITY.extract_u16(block),
        },
        device: DeviceData {
            sampling_period: SAMPLING_PERIOD.extract_u16(block),
            power_state: POWER_STATE.extract_u8(block),
            shutdown_timer: SHUTDOWN_TIMER.extract_u8(block),
            turn_on_with_power: TURN_ON_WITH_POWER.extract_u8(block),
            restart_timer: RESTART_TIMER.extract_u8(block),
            running_time: RUNNING_TIME.extract(block),
            charge_time: CHARGE_TIME.extract(block),
            uptime: UPTIME.extract(block),
            firmware: FIRMWARE.extract_u16(block),
        },
        identity: DeviceIdentity {
            uid: [UID0.extract(block), UID1.extract(block), UID2.extract(block)],
        },
    }
}

fn to_fields(entries: &[(Register, u32)]) -> MetricFields {
    entries
        .iter()
        .map(|(register, value)| {
            (
                register.name.to_string(),
                FieldValue::Integer(i64::from(*value)),
            )
        })
        .collect()
}

impl VoltageReadings {
    pub fn to_fields(&self) -> MetricFields {
        use layout::*;
        to_fields(&[
            (PROCESSOR_MV, self.processor.into()),
            (RASPBERRY_PI_MV, self.raspberry_pi.into()),
            (BATTERY_PORT_MV, self.battery_port.into()),
            (TYPE_C_MV, self.type_c.into()),
            (MICRO_USB_MV, self.micro_usb.into()),
        ])
    }
}

impl BatteryData {
    pub fn to_fields(&self) -> MetricFields {
        use layout::*;
        to_fields(&[
            (TEMPERATURE, self.temperature.into()),
            (FULL_VOLTAGE, self.full_voltage.into()),
            (EMPTY_VOLTAGE, self.empty_voltage.into()),
            (PROTECTION_VOLTAGE, self.protection_voltage.into()),
            (REMAINING_CAPACITY, self.remaining_capacity.into()),
        ])
    }
}

impl DeviceData {
    pub fn to_fields(&self) -> MetricFields {
        use layout::*;
        to_fields(&[
            (SAMPLING_PERIOD, self.sampling_period.into()),
            (POWER_STATE, self.power_state.into()),
            (SHUTDOWN_TIMER, self.shutdown_timer.into()),
            (TURN_ON_WITH_POWER, self.turn_on_with_power.into()),
            (RESTART_TIMER, self.restart_timer.into()),
            (RUNNING_TIME, self.running_time),
            (CHARGE_TIME, self.charge_time),
            (UPTIME, self.uptime),
            (FIRMWARE, self.firmware.into()),
        ])
    }
}
