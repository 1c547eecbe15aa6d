pub mod bus;
pub mod ina219;
pub mod power;
pub mod ups;

pub use bus::{I2cBus, RegisterBus};
pub use power::{read_battery, read_supply};
pub use ups::read_block;
