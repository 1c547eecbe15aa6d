mod config;
mod database;
mod error;
mod hardware;
mod models;
mod registers;
mod report;
mod utils;

use log::{debug, error, info};

use config::ExporterConfig;
use database::{InfluxClient, MetricsPublisher, MetricsSink};
use error::ExporterError;
use hardware::{read_battery, read_block, read_supply, I2cBus, RegisterBus};
use registers::decode;
use report::{battery_lines, print_lines, register_lines, serial_line, supply_lines};

/// Raspberry Pi I2C bus the UPS and both power monitors sit on
const DEVICE_BUS: u8 = 1;

/// Sample every source once, then print and/or publish each group
async fn run<B: RegisterBus, S: MetricsSink>(
    config: &ExporterConfig,
    bus: &mut B,
    publisher: Option<&MetricsPublisher<S>>,
) -> Result<(), ExporterError> {
    let supply = read_supply(bus)?;
    if config.raw {
        print_lines(&supply_lines(&supply));
    }
    if let Some(publisher) = publisher {
        publisher.publish("supply", supply.to_fields()).await;
    }

    match read_battery(bus)? {
        Some(battery) => {
            if config.raw {
                print_lines(&battery_lines(&battery));
            }
            if let Some(publisher) = publisher {
                publisher.publish("battery", battery.to_fields()).await;
            }
        }
        None => {
            if config.raw {
                println!("Battery power is too high.");
            }
        }
    }

    let block = read_block(bus)?;
    let registers = decode(&block);
    debug!(
        "UPS {} charging source: {}",
        registers.identity,
        registers.voltages.charging_source()
    );

    if let Some(publisher) = publisher {
        publisher
            .publish("current_voltage_data", registers.voltages.to_fields())
            .await;
        publisher
            .publish("battery_data", registers.battery.to_fields())
            .await;
        publisher
            .publish("device_data", registers.device.to_fields())
            .await;
    }

    if config.raw {
        print_lines(&register_lines(&registers));
        println!("{}", serial_line(&registers.identity));
    }

    Ok(())
}

/// Publisher for `--influxdb`, even when the endpoint is unusable
///
/// A bad host or port surfaces as a failed write for every group, with its payload logged.
fn build_publisher(config: &ExporterConfig) -> Option<MetricsPublisher<InfluxClient>> {
    config
        .influx
        .as_ref()
        .map(|influx| MetricsPublisher::new(InfluxClient::new(influx), config.verbose))
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = ExporterConfig::from_args();

    // Initialize logging
    let level = if config.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();

    let publisher = build_publisher(&config);

    let mut bus = I2cBus::new(DEVICE_BUS);

    // Failures are reported but never change the exit status
    match run(&config, &mut bus, publisher.as_ref()).await {
        Ok(()) => info!("UPS data collected"),
        Err(e) => error!("Failed to fetch data: {}", e),
    }
}
