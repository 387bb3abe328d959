use log::*;

use crate::core::Cartridge;

/// Size of a page in bytes
pub const PAGE_SIZE: usize = 0x800;
/// Number of pages covering the 24 bit address space
pub const PAGE_COUNT: usize = 0x1000000 / PAGE_SIZE;
/// Size of work RAM
pub const WRAM_SIZE: usize = 0x20000;

/// Where a page of the address space lives.
///
/// Every variant except [Page::Slow] holds the offset of the page's first byte in its memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    /// I/O registers, or nothing at all
    #[default]
    Slow,
    Wram(usize),
    Rom(usize),
    Sram(usize),
}

/// A lookup table from page number to [Page], built once per cartridge.
#[derive(Debug, Clone)]
pub struct PageTable {
    pages: Vec<Page>,
}

impl Default for PageTable {
    fn default() -> Self {
        PageTable {
            pages: vec![Page::Slow; PAGE_COUNT],
        }
    }
}

impl PageTable {
    /// Build the table for a cartridge.
    pub fn new(cartridge: &Cartridge) -> PageTable {
        let pages: Vec<Page> = (0..PAGE_COUNT)
            .map(|page| PageTable::page_for(cartridge, (page * PAGE_SIZE) as u32))
            .collect();
        debug!(
            "Built page table, {} slow pages",
            pages.iter().filter(|p| **p == Page::Slow).count()
        );
        PageTable { pages }
    }

    fn page_for(cartridge: &Cartridge, addr: u32) -> Page {
        let bank = (addr >> 16) as usize;
        let offset = (addr & 0xFFFF) as usize;
        let system_bank = bank & 0x7F < 0x40;
        if bank == 0x7E || bank == 0x7F {
            Page::Wram((bank - 0x7E) * 0x10000 + offset)
        } else if system_bank && offset < 0x2000 {
            // Low RAM mirror
            Page::Wram(offset)
        } else if system_bank && offset < 0x6000 {
            // I/O
            Page::Slow
        } else if let Some(o) = cartridge
            .mapper
            .sram_offset(addr)
            .filter(|_| !cartridge.sram.is_empty())
        {
            Page::Sram(o % cartridge.sram.len())
        } else if let Some(o) = cartridge.mapper.rom_offset(addr) {
            Page::Rom(o % cartridge.rom.len())
        } else {
            Page::Slow
        }
    }

    /// The page containing an address.
    #[inline]
    pub fn get(&self, addr: u32) -> Page {
        self.pages[(addr as usize & 0xFFFFFF) / PAGE_SIZE]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DbEntry, GameDb};
    use sha1::{Digest, Sha1};

    fn cartridge(mapper: &str, ram_kbit: u32) -> Cartridge {
        let rom = vec![0; 0x40000];
        let mut db = GameDb::new();
        db.insert(
            &hex::encode(Sha1::digest(&rom)),
            DbEntry {
                mapper: mapper.to_string(),
                rom_type: "ROM+RAM".to_string(),
                rom_size_mbit: 2,
                ram_size_kbit: ram_kbit,
            },
        );
        Cartridge::from_bytes(&rom, &db, None).unwrap()
    }

    #[test]
    fn test_lorom_pages() {
        let t = PageTable::new(&cartridge("LoROM", 64));
        assert_eq!(t.get(0x000123), Page::Wram(0));
        assert_eq!(t.get(0x801FFF), Page::Wram(0x1800));
        assert_eq!(t.get(0x7F8000), Page::Wram(0x18000));
        assert_eq!(t.get(0x002100), Page::Slow);
        assert_eq!(t.get(0x004200), Page::Slow);
        assert_eq!(t.get(0x008000), Page::Rom(0));
        assert_eq!(t.get(0x018800), Page::Rom(0x8800));
        // 256KB of ROM is mirrored
        assert_eq!(t.get(0x088000), Page::Rom(0));
        assert_eq!(t.get(0x700000), Page::Sram(0));
        // 8KB of SRAM is mirrored
        assert_eq!(t.get(0x702000), Page::Sram(0));
    }

    #[test]
    fn test_hirom_pages() {
        let t = PageTable::new(&cartridge("HiROM", 16));
        assert_eq!(t.get(0xC00000), Page::Rom(0));
        assert_eq!(t.get(0x40F800), Page::Rom(0xF800));
        assert_eq!(t.get(0x206000), Page::Sram(0));
        assert_eq!(t.get(0x006000), Page::Slow);
    }

    #[test]
    fn test_no_sram() {
        let t = PageTable::new(&cartridge("LoROM", 0));
        assert_eq!(t.get(0x700000), Page::Slow);
    }
}
