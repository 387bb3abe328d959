use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::core::{cartridge::mapper::split_address, Mapper};

/// HiROM: 64KB ROM banks in banks 40-7D, mirrored into the upper halves of banks 00-3F.
/// SRAM is at 6000-7FFF in banks 20-3F.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HiRom;

#[typetag::serde]
impl Mapper for HiRom {
    fn rom_offset(&self, addr: u32) -> Option<usize> {
        let (bank, offset) = split_address(addr);
        if bank >= 0x40 || offset >= 0x8000 {
            Some((bank & 0x3F) * 0x10000 + offset)
        } else {
            None
        }
    }
    fn sram_offset(&self, addr: u32) -> Option<usize> {
        let (bank, offset) = split_address(addr);
        if (0x20..0x40).contains(&bank) && (0x6000..0x8000).contains(&offset) {
            Some((bank - 0x20) * 0x2000 + (offset - 0x6000))
        } else {
            None
        }
    }
}

impl Display for HiRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HiROM")
    }
}
