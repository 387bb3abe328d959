use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::core::{cartridge::mapper::split_address, Mapper};

/// LoROM: 32KB ROM banks in the upper half of every bank, SRAM in the lower half of banks 70-7D.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoRom;

#[typetag::serde]
impl Mapper for LoRom {
    fn rom_offset(&self, addr: u32) -> Option<usize> {
        let (bank, offset) = split_address(addr);
        if offset >= 0x8000 {
            Some(bank * 0x8000 + (offset - 0x8000))
        } else if (0x40..0x70).contains(&bank) {
            // The lower halves of banks 40-6F mirror the upper halves
            Some(bank * 0x8000 + offset)
        } else {
            None
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

impl Display for LoRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoROM")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rom_layout() {
        let m = LoRom;
        assert_eq!(m.rom_offset(0x008000), Some(0));
        assert_eq!(m.rom_offset(0x00FFFC), Some(0x7FFC));
        assert_eq!(m.rom_offset(0x018000), Some(0x8000));
        // FastROM mirror
        assert_eq!(m.rom_offset(0x818000), Some(0x8000));
        assert_eq!(m.rom_offset(0x000000), None);
        assert_eq!(m.rom_offset(0x400000), Some(0x200000));
    }

    #[test]
    fn test_sram_layout() {
        let m = LoRom;
        assert_eq!(m.sram_offset(0x700000), Some(0));
        assert_eq!(m.sram_offset(0x710010), Some(0x8010));
        assert_eq!(m.sram_offset(0xF00000), Some(0));
        assert_eq!(m.sram_offset(0x708000), None);
        assert_eq!(m.sram_offset(0x006000), None);
    }
}
