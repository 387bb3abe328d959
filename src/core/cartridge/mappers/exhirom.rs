use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::core::Mapper;

/// Extended HiROM: up to 8MB of ROM.
///
/// Banks C0-FF and the upper halves of banks 80-BF map the first 4MB. Banks 40-7D and the
/// upper halves of banks 00-3F map the rest, so the reset vector lives at ROM offset 0x40FFFC.
/// SRAM is at 6000-7FFF in banks 80-BF.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExHiRom;

#[typetag::serde]
impl Mapper for ExHiRom {
    fn rom_offset(&self, addr: u32) -> Option<usize> {
        let bank = ((addr >> 16) & 0xFF) as usize;
        let offset = (addr & 0xFFFF) as usize;
        let upper = if bank & 0x80 != 0 { 0 } else { 0x400000 };
        if bank & 0x40 != 0 || offset >= 0x8000 {
            Some(upper + (bank & 0x3F) * 0x10000 + offset)
        } else {
            None
        }
    }
    fn sram_offset(&self, addr: u32) -> Option<usize> {
        let bank = ((addr >> 16) & 0xFF) as usize;
        let offset = (addr & 0xFFFF) as usize;
        if (0x80..0xC0).contains(&bank) && (0x6000..0x8000).contains(&offset) {
            Some((bank & 0x1F) * 0x2000 + (offset - 0x6000))
        } else {
            None
        }
    }
}

impl Display for ExHiRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Extended HiROM")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let m = ExHiRom;
        assert_eq!(m.rom_offset(0xC00000), Some(0));
        assert_eq!(m.rom_offset(0x808000), Some(0x8000));
        assert_eq!(m.rom_offset(0x400000), Some(0x400000));
        assert_eq!(m.rom_offset(0x00FFFC), Some(0x40FFFC));
        assert_eq!(m.rom_offset(0x001000), None);
        assert_eq!(m.sram_offset(0x806000), Some(0));
        assert_eq!(m.sram_offset(0x206000), None);
    }
}
