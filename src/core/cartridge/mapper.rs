use std::fmt::{Debug, Display};

use crate::core::cartridge::mappers::*;

/// The address decoding scheme of a cartridge.
///
/// A mapper only decides where in the cartridge's ROM or SRAM a CPU address lands. The bus turns
/// these answers into its page tables once, when the cartridge is inserted, so the mapper is not
/// consulted on every access.
#[typetag::serde(tag = "type")]
pub trait Mapper: Debug + Display + Send {
    /// The offset into ROM that a 24 bit CPU address reads from, if any.
    ///
    /// The offset may be larger than the ROM, the caller mirrors it.
    fn rom_offset(&self, addr: u32) -> Option<usize>;
    /// The offset into SRAM that a 24 bit CPU address accesses, if any.
    ///
    /// Takes priority over [Mapper::rom_offset] when the cartridge has SRAM.
    fn sram_offset(&self, addr: u32) -> Option<usize>;
}

/// Get a mapper from the name used in the game database and header.
///
/// LoROM cartridges of 2MB or more get the [BigLoRom] layout.
/// ```
/// use yase::core::get_mapper;
/// assert_eq!(get_mapper("LoROM", 0x8000).unwrap().to_string(), "LoROM");
/// assert_eq!(get_mapper("LoROM", 0x300000).unwrap().to_string(), "Big LoROM");
/// assert_eq!(get_mapper("Extended HiROM", 0x600000).unwrap().to_string(), "Extended HiROM");
/// assert!(get_mapper("SA-1", 0x8000).is_none());
/// ```
pub fn get_mapper(name: &str, rom_len: usize) -> Option<Box<dyn Mapper>> {
    // Check the longest name first, "Extended HiROM" contains "HiROM"
    if name.contains("Extended HiROM") {
        Some(Box::new(ExHiRom))
    } else if name.contains("HiROM") {
        Some(Box::new(HiRom))
    } else if name.contains("LoROM") {
        if rom_len >= 0x200000 {
            Some(Box::new(BigLoRom))
        } else {
            Some(Box::new(LoRom))
        }
    } else {
        None
    }
}

// Split an address into (bank without the FastROM mirror bit, offset)
pub(crate) fn split_address(addr: u32) -> (usize, usize) {
    (((addr >> 16) & 0x7F) as usize, (addr & 0xFFFF) as usize)
}
