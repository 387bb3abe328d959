use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::core::{cartridge::mapper::split_address, Mapper};

/// LoROM for cartridges of 2MB or more.
///
/// Banks 00-3F are laid out like [LoRom][super::LoRom] and cover the first 2MB. Banks 40-7D
/// are 64KB HiROM style banks holding everything after that.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BigLoRom;

#[typetag::serde]
impl Mapper for BigLoRom {
    fn rom_offset(&self, addr: u32) -> Option<usize> {
        let (bank, offset) = split_address(addr);
        if bank < 0x40 {
            (offset >= 0x8000).then(|| bank * 0x8000 + (offset - 0x8000))
        } else {
            Some(0x200000 + (bank - 0x40) * 0x10000 + offset)
        }
    }
    fn sram_offset(&self, addr: u32) -> Option<usize> {
        let (bank, offset) = split_address(addr);
        if (0x70..0x7E).contains(&bank) && offset < 0x8000 {
            Some((bank - 0x70) * 0x8000 + offset)
        } else {
            None
        }
    }
}

impl Display for BigLoRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Big LoROM")
    }
}
