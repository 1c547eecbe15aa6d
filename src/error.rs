/// Error kinds distinguished by the exporter
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    /// A single register transaction on the I2C bus failed
    #[error("bus transaction failed at 0x{address:02X} register 0x{register:02X}: {reason}")]
    Bus {
        address: u8,
        register: u8,
        reason: String,
    },

    /// The power monitor overflowed even at its widest shunt range
    #[error("current out of range for power monitor at 0x{address:02X}")]
    RangeExceeded { address: u8 },

    #[error("invalid InfluxDB endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("InfluxDB transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("InfluxDB rejected write with status {status}: {body}")]
    Status { status: u16, body: String },
}

impl ExporterError {
    pub fn is_range_exceeded(&self) -> bool {
        matches!(self, ExporterError::RangeExceeded { .. })
    }
}
