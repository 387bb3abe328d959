use log::*;

/// Offsets of the internal header for each layout
pub const LOROM_HEADER: usize = 0x7FC0;
pub const HIROM_HEADER: usize = 0xFFC0;
pub const EXHIROM_HEADER: usize = 0x40FFC0;

/// The internal header found in every cartridge ROM.
#[derive(Debug, PartialEq, Clone)]
pub struct Header {
    pub title: String,
    pub map_mode: u8,
    pub rom_type: u8,
    pub rom_size: u8,
    pub ram_size: u8,
    pub complement: u16,
    pub checksum: u16,
    pub reset_vector: u16,
}

fn word(rom: &[u8], addr: usize) -> u16 {
    u16::from_le_bytes([rom[addr], rom[addr + 1]])
}

impl Header {
    /// Read the header at `base`, if the ROM is large enough to contain one.
    pub fn parse(rom: &[u8], base: usize) -> Option<Header> {
        if rom.len() < base + 0x40 {
            return None;
        }
        let title = rom[base..(base + 21)]
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
            .collect::<String>()
            .trim_end()
            .to_string();
        Some(Header {
            title,
            map_mode: rom[base + 0x15],
            rom_type: rom[base + 0x16],
            rom_size: rom[base + 0x17],
            ram_size: rom[base + 0x18],
            complement: word(rom, base + 0x1C),
            checksum: word(rom, base + 0x1E),
            reset_vector: word(rom, base + 0x3C),
        })
    }
    /// Whether this looks like a real header for a cartridge using the layout at `base`.
    pub fn is_plausible(&self, base: usize) -> bool {
        let mode = self.map_mode & 0x0F;
        let mode_agrees = match base {
            LOROM_HEADER => matches!(mode, 0 | 2 | 3),
            HIROM_HEADER => mode == 1,
            EXHIROM_HEADER => mode == 5,
            _ => false,
        };
        self.checksum.wrapping_add(self.complement) == 0xFFFF
            && mode_agrees
            && self.reset_vector >= 0x8000
    }
}

/// Check whether a LoROM cartridge's entry point looks like typical boot code.
///
/// Nearly every game starts with `SEI` and switches to native mode with `CLC; XCE` shortly after.
pub fn lorom_entry_matches(rom: &[u8]) -> bool {
    if rom.len() < 0x8000 {
        return false;
    }
    let entry = word(rom, LOROM_HEADER + 0x3C) as usize;
    if entry < 0x8000 {
        return false;
    }
    let start = entry - 0x8000;
    if rom.get(start) != Some(&0x78) {
        return false;
    }
    let end = (start + 64).min(rom.len());
    rom[start..end].windows(2).any(|w| w == [0x18, 0xFB])
}

/// Guess the mapper name and find the header of a ROM missing from the database.
pub fn detect(rom: &[u8]) -> (&'static str, Option<Header>) {
    let candidates = [
        (EXHIROM_HEADER, "Extended HiROM"),
        (HIROM_HEADER, "HiROM"),
        (LOROM_HEADER, "LoROM"),
    ];
    for (base, name) in candidates {
        if let Some(h) = Header::parse(rom, base).filter(|h| h.is_plausible(base)) {
            debug!("Found a valid {} header at {:#X}", name, base);
            return (name, Some(h));
        }
    }
    let header = Header::parse(rom, LOROM_HEADER);
    if lorom_entry_matches(rom) {
        debug!("Entry point looks like LoROM boot code");
    } else {
        warn!("Unable to detect the cartridge layout, assuming LoROM");
    }
    ("LoROM", header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with_header(size: usize, base: usize, mode: u8, reset: u16) -> Vec<u8> {
        let mut rom = vec![0; size];
        rom[base..(base + 8)].copy_from_slice(b"TEST ROM");
        rom[base + 0x15] = mode;
        rom[base + 0x1C..base + 0x1E].copy_from_slice(&0x1234u16.to_le_bytes());
        rom[base + 0x1E..base + 0x20].copy_from_slice(&0xEDCBu16.to_le_bytes());
        rom[base + 0x3C..base + 0x3E].copy_from_slice(&reset.to_le_bytes());
        rom
    }

    #[test]
    fn test_detect_lorom() {
        let rom = rom_with_header(0x20000, LOROM_HEADER, 0x20, 0x8000);
        let (name, header) = detect(&rom);
        assert_eq!(name, "LoROM");
        assert_eq!(header.unwrap().title, "TEST ROM");
    }

    #[test]
    fn test_detect_hirom() {
        let rom = rom_with_header(0x20000, HIROM_HEADER, 0x21, 0x8000);
        assert_eq!(detect(&rom).0, "HiROM");
    }

    #[test]
    fn test_wrong_map_mode_is_rejected() {
        let rom = rom_with_header(0x20000, HIROM_HEADER, 0x20, 0x8000);
        let h = Header::parse(&rom, HIROM_HEADER).unwrap();
        assert!(!h.is_plausible(HIROM_HEADER));
    }

    #[test]
    fn test_entry_heuristic() {
        let mut rom = vec![0; 0x8000];
        rom[0x7FFC] = 0x00;
        rom[0x7FFD] = 0x80;
        rom[0] = 0x78;
        rom[0x10] = 0x18;
        rom[0x11] = 0xFB;
        assert!(lorom_entry_matches(&rom));
        rom[0] = 0xEA;
        assert!(!lorom_entry_matches(&rom));
    }
}
