use std::collections::BTreeMap;
use std::fmt;

/// Numeric value of a single metric field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
}

pub type MetricFields = BTreeMap<String, FieldValue>;

/// Voltage, current and power sampled from one power monitor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerReading {
    pub voltage: f64, // V
    pub current: f64, // mA
    pub power: f64,   // mW
}

impl PowerReading {
    pub fn to_fields(&self) -> MetricFields {
        let mut fields = MetricFields::new();
        fields.insert("voltage".to_string(), FieldValue::Float(self.voltage));
        fields.insert("current".to_string(), FieldValue::Float(self.current));
        fields.insert("power".to_string(), FieldValue::Float(self.power));
        fields
    }
}

/// Voltages reported by the UPS microcontroller, all in mV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoltageReadings {
    pub processor: u16,
    pub raspberry_pi: u16,
    // Inaccurate while the battery is charging
    pub battery_port: u16,
    pub type_c: u16,
    pub micro_usb: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargingSource {
    TypeC,
    MicroUsb,
    NotCharging,
}

/// Input voltage above which a charging port counts as powered
pub const CHARGING_THRESHOLD_MV: u16 = 4000;

impl VoltageReadings {
    /// Type-C wins over Micro-USB when both ports are powered
    pub fn charging_source(&self) -> ChargingSource {
        if self.type_c > CHARGING_THRESHOLD_MV {
            ChargingSource::TypeC
        } else if self.micro_usb > CHARGING_THRESHOLD_MV {
            ChargingSource::MicroUsb
        } else {
            ChargingSource::NotCharging
        }
    }
}

impl fmt::Display for ChargingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChargingSource::TypeC => "Type-C",
            ChargingSource::MicroUsb => "Micro-USB",
            ChargingSource::NotCharging => "not charging",
        };
        f.write_str(label)
    }
}

/// Battery characteristics learned or configured on the UPS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryData {
    pub temperature: u16,        // degC, estimated
    pub full_voltage: u16,       // mV
    pub empty_voltage: u16,      // mV
    pub protection_voltage: u16, // mV
    // Only meaningful after one complete charge and discharge cycle
    pub remaining_capacity: u16, // %
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceData {
    pub sampling_period: u16, // minutes
    pub power_state: u8,
    pub shutdown_timer: u8, // seconds, 0 = disabled
    pub turn_on_with_power: u8,
    pub restart_timer: u8, // seconds, 0 = disabled
    pub running_time: u32, // seconds
    pub charge_time: u32,  // seconds
    pub uptime: u32,       // seconds
    pub firmware: u16,
}

impl DeviceData {
    pub fn power_state_label(&self) -> &'static str {
        if self.power_state == 1 {
            "normal"
        } else {
            "off"
        }
    }

    pub fn turns_on_with_power(&self) -> bool {
        self.turn_on_with_power == 1
    }
}

/// Human-readable label for a countdown timer register
pub fn timer_label(seconds: u8) -> String {
    if seconds == 0 {
        "no countdown".to_string()
    } else {
        format!("{} sec", seconds)
    }
}

/// Factory-programmed serial number of the UPS board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub uid: [u32; 3],
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08X}-{:08X}-{:08X}",
            self.uid[0], self.uid[1], self.uid[2]
        )
    }
}

/// Everything decoded from one register block read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsRegisters {
    pub voltages: VoltageReadings,
    pub battery: BatteryData,
    pub device: DeviceData,
    pub identity: DeviceIdentity,
}

/// One measurement ready to be written to the metrics store
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsEvent {
    pub name: String,
    pub timestamp: i64, // seconds since the Unix epoch
    pub fields: MetricFields,
}
