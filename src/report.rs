/// Human-readable console report of the sampled values
use crate::models::{timer_label, ChargingSource, DeviceIdentity, PowerReading, UpsRegisters};

pub fn supply_lines(supply: &PowerReading) -> Vec<String> {
    vec![
        format!("Raspberry Pi power supply voltage: {:.3} V", supply.voltage),
        format!("Current current consumption of Raspberry Pi: {:.3} mA", supply.current),
        format!("Current power consumption of Raspberry Pi: {:.3} mW", supply.power),
    ]
}

/// Positive battery current means the pack is being charged
pub fn battery_lines(battery: &PowerReading) -> Vec<String> {
    let mut lines = vec![format!("Batteries Voltage: {:.3} V", battery.voltage)];
    if battery.current > 0.0 {
        lines.push(format!("Battery current (charging), rate: {:.3} mA", battery.current));
        lines.push(format!("Current battery power supplement: {:.3} mW", battery.power));
    } else {
        lines.push(format!("Battery current (discharge), rate: {:.3} mA", battery.current));
        lines.push(format!("Current battery power consumption: {:.3} mW", battery.power));
    }
    lines
}

pub fn register_lines(registers: &UpsRegisters) -> Vec<String> {
    let voltages = &registers.voltages;
    let battery = &registers.battery;
    let device = &registers.device;

    let charging = match voltages.charging_source() {
        ChargingSource::TypeC => "Currently charging through Type C.".to_string(),
        ChargingSource::MicroUsb => "Currently charging via Micro USB.".to_string(),
        ChargingSource::NotCharging => "Currently not charging.".to_string(),
    };

    let auto_power_on = if device.turns_on_with_power() {
        "Automatically turn on when there is external power supply!"
    } else {
        "Does not automatically turn on when there is an external power supply!"
    };

    vec![
        format!("Current processor voltage: {} mV", voltages.processor),
        format!("Current Raspberry Pi report voltage: {} mV", voltages.raspberry_pi),
        format!(
            "Current battery port report voltage: {} mV (inaccurate while charging)",
            voltages.battery_port
        ),
        format!("Current charging interface report voltage (Type C): {} mV", voltages.type_c),
        format!("Current charging interface report voltage (Micro USB): {} mV", voltages.micro_usb),
        charging,
        format!("Current battery temperature (estimated): {} degC", battery.temperature),
        format!("Full battery voltage: {} mV", battery.full_voltage),
        format!("Battery empty voltage: {} mV", battery.empty_voltage),
        format!("Battery protection voltage: {} mV", battery.protection_voltage),
        format!("Battery remaining capacity: {} %", battery.remaining_capacity),
        format!("Sampling period: {} Min", device.sampling_period),
        format!("Current power state: {}", device.power_state_label()),
        format!("Shutdown countdown: {}", timer_label(device.shutdown_timer)),
        auto_power_on.to_string(),
        format!("Restart countdown: {}", timer_label(device.restart_timer)),
        format!("Accumulated running time: {} sec", device.running_time),
        format!("Accumulated charged time: {} sec", device.charge_time),
        format!("This running time: {} sec", device.uptime),
        format!("Version number: {}", device.firmware),
    ]
}

pub fn serial_line(identity: &DeviceIdentity) -> String {
    format!("Serial number: {}", identity)
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
