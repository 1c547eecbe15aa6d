/// Raw register block read from the UPS microcontroller
use log::debug;

use crate::error::ExporterError;
use crate::hardware::bus::RegisterBus;
use crate::registers::{RawBlock, BLOCK_LEN};

/// Bus address of the UPS microcontroller
pub const UPS_ADDRESS: u8 = 0x17;

/// Read registers 1..=254 one byte at a time
///
/// Any failed transaction aborts the whole read; a partially filled block is never returned.
pub fn read_block<B: RegisterBus>(bus: &mut B) -> Result<RawBlock, ExporterError> {
    let mut bytes = [0u8; BLOCK_LEN];
    for register in 1..BLOCK_LEN {
        bytes[register] = bus.read_byte(UPS_ADDRESS, register as u8)?;
    }
    debug!("Read {} registers from 0x{:02X}", BLOCK_LEN - 1, UPS_ADDRESS);
    Ok(RawBlock::new(bytes))
}
