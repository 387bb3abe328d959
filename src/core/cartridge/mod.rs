mod database;
pub use database::{Coprocessor, DbEntry, GameDb};
mod header;
pub use header::Header;
mod mapper;
pub use mapper::{get_mapper, Mapper};
pub mod mappers;
mod save_file;
pub use save_file::SaveFile;

use crate::core::{cartridge::mappers::LoRom, Error};
use log::*;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::{
    fmt::{Debug, Display},
    path::Path,
};

/// Size of the header some copier devices prepend to ROM dumps
pub const COPIER_HEADER_SIZE: usize = 0x200;
/// The ROM is padded to a multiple of this so every page of the bus maps a whole slice
pub const ROM_ALIGNMENT: usize = 0x800;

/// The exception vectors of a cartridge, read through its mapper from bank 00.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vectors {
    pub reset: u16,
    pub nmi: u16,
    pub irq: u16,
    pub brk: u16,
    pub cop: u16,
    pub emulation_nmi: u16,
    pub emulation_irq: u16,
    pub emulation_cop: u16,
}

/// A SNES cartridge.
///
/// Contains the ROM, the SRAM and the [Mapper] used to place them in the CPU's address space.
#[derive(Serialize, Deserialize)]
pub struct Cartridge {
    pub rom: Vec<u8>,
    pub sram: Vec<u8>,
    pub mapper: Box<dyn Mapper>,
    pub coprocessor: Coprocessor,
    /// Lowercase hex SHA-1 of the ROM
    pub hash: String,
    /// Title from the internal header
    pub title: String,
    pub vectors: Vectors,
    pub has_battery: bool,
    pub has_rtc: bool,
    #[serde(skip)]
    save_file: Option<SaveFile>,
}

impl Cartridge {
    /// Create a cartridge from the contents of a ROM file.
    ///
    /// * `bytes` The ROM file, with or without a copier header.
    /// * `db` The database to look the ROM up in. Unknown ROMs fall back to header heuristics and no SRAM.
    /// * `save_path` Where battery backed SRAM is persisted. Ignored if the cartridge has no battery.
    pub fn from_bytes(
        bytes: &[u8],
        db: &GameDb,
        save_path: Option<&Path>,
    ) -> Result<Cartridge, Error> {
        let bytes = if bytes.len() % 0x400 == COPIER_HEADER_SIZE {
            debug!("Stripping copier header");
            &bytes[COPIER_HEADER_SIZE..]
        } else {
            bytes
        };
        if bytes.len() < 0x8000 {
            return Err(Error::RomTooSmall {
                actual: bytes.len(),
            });
        }
        let hash = hex::encode(Sha1::digest(bytes));
        info!("ROM SHA-1 is {}", hash);
        let (detected, header) = header::detect(bytes);
        let (mapper_name, rom_type, ram_size) = match db.get(&hash) {
            Some(entry) => {
                debug!("Found database entry {:?}", entry);
                if entry.rom_size() != bytes.len() {
                    warn!(
                        "Database lists {:#X} bytes of ROM, file has {:#X}",
                        entry.rom_size(),
                        bytes.len()
                    );
                }
                (entry.mapper.clone(), entry.rom_type.clone(), entry.ram_size())
            }
            None => {
                warn!("ROM is not in the database, guessing {}", detected);
                (detected.to_string(), "Normal".to_string(), 0)
            }
        };
        let mapper = get_mapper(&mapper_name, bytes.len()).unwrap_or_else(|| {
            warn!("Unrecognized mapper {:?}, assuming LoROM", mapper_name);
            Box::new(LoRom)
        });
        let coprocessor = Coprocessor::from_rom_type(&rom_type);
        if coprocessor != Coprocessor::None {
            warn!("{:?} coprocessor is not emulated", coprocessor);
        }
        let has_battery = rom_type.contains("Battery");
        let has_rtc = rom_type.contains("RTC");

        let mut rom = bytes.to_vec();
        let padded = rom.len().div_ceil(ROM_ALIGNMENT) * ROM_ALIGNMENT;
        rom.resize(padded, 0);

        let (save_file, sram) = match save_path {
            Some(p) if has_battery && ram_size > 0 => {
                let (file, data) = SaveFile::open(p, ram_size)?;
                (Some(file), data)
            }
            _ => (None, vec![0; ram_size]),
        };

        let mut cartridge = Cartridge {
            rom,
            sram,
            mapper,
            coprocessor,
            hash,
            title: header.map(|h| h.title).unwrap_or_default(),
            vectors: Vectors::default(),
            has_battery,
            has_rtc,
            save_file,
        };
        cartridge.vectors = cartridge.read_vectors();
        info!(
            "Loaded \"{}\" using {}, {:#X} bytes SRAM, reset vector {:#06X}",
            cartridge.title,
            cartridge.mapper,
            cartridge.sram.len(),
            cartridge.vectors.reset
        );
        Ok(cartridge)
    }

    /// A 32KB LoROM cartridge filled with zeros, with no SRAM.
    ///
    /// Only useful for debugging, or for poking a program into memory by hand.
    pub fn blank() -> Cartridge {
        let rom = vec![0; 0x8000];
        Cartridge {
            hash: hex::encode(Sha1::digest(&rom)),
            rom,
            sram: Vec::new(),
            mapper: Box::new(LoRom),
            coprocessor: Coprocessor::None,
            title: String::new(),
            vectors: Vectors::default(),
            has_battery: false,
            has_rtc: false,
            save_file: None,
        }
    }

    fn read_vectors(&self) -> Vectors {
        let word = |addr: u32| {
            u16::from_le_bytes([
                self.read_rom(addr).unwrap_or(0),
                self.read_rom(addr + 1).unwrap_or(0),
            ])
        };
        Vectors {
            reset: word(0xFFFC),
            nmi: word(0xFFEA),
            irq: word(0xFFEE),
            brk: word(0xFFE6),
            cop: word(0xFFE4),
            emulation_nmi: word(0xFFFA),
            emulation_irq: word(0xFFFE),
            emulation_cop: word(0xFFF4),
        }
    }

    /// Read a byte of ROM given a 24 bit CPU address, mirroring past the end of the ROM.
    pub fn read_rom(&self, addr: u32) -> Option<u8> {
        self.mapper
            .rom_offset(addr)
            .map(|o| self.rom[o % self.rom.len()])
    }

    /// Write the SRAM back to the save file, if there is one.
    pub fn flush(&self) -> Result<(), Error> {
        match &self.save_file {
            Some(f) => f.write(&self.sram),
            None => Ok(()),
        }
    }

    /// Move the save file from another cartridge into this one.
    ///
    /// Used after loading a savestate, which does not carry the save file.
    pub fn take_save_file(&mut self, other: &mut Cartridge) {
        self.save_file = other.save_file.take();
    }

    pub fn save_file(&self) -> Option<&SaveFile> {
        self.save_file.as_ref()
    }
}

impl Drop for Cartridge {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            error!("Unable to write save file: {}", e);
        }
    }
}

impl Display for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.mapper)
    }
}
impl Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("title", &self.title)
            .field("mapper", &self.mapper)
            .field("hash", &self.hash)
            .field("rom_len", &self.rom.len())
            .field("sram_len", &self.sram.len())
            .field("vectors", &self.vectors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lorom(reset: u16) -> Vec<u8> {
        let mut rom = vec![0xEA; 0x8000];
        rom[0x7FFC..0x7FFE].copy_from_slice(&reset.to_le_bytes());
        rom[0x7FEA..0x7FEC].copy_from_slice(&0x8123u16.to_le_bytes());
        rom
    }

    #[test]
    fn test_unknown_rom_defaults() {
        let c = Cartridge::from_bytes(&lorom(0x8000), &GameDb::new(), None).unwrap();
        assert_eq!(c.mapper.to_string(), "LoROM");
        assert!(c.sram.is_empty());
        assert_eq!(c.vectors.reset, 0x8000);
        assert_eq!(c.vectors.nmi, 0x8123);
        assert_eq!(c.hash.len(), 40);
    }

    #[test]
    fn test_copier_header_is_stripped() {
        let rom = lorom(0x8010);
        let with_header = [vec![0xFF; COPIER_HEADER_SIZE], rom.clone()].concat();
        let a = Cartridge::from_bytes(&rom, &GameDb::new(), None).unwrap();
        let b = Cartridge::from_bytes(&with_header, &GameDb::new(), None).unwrap();
        assert_eq!(a.hash, b.hash);
        assert_eq!(b.vectors.reset, 0x8010);
    }

    #[test]
    fn test_database_entry_is_used() {
        let rom = lorom(0x8000);
        let hash = hex::encode(Sha1::digest(&rom));
        let mut db = GameDb::new();
        db.insert(
            &hash,
            DbEntry {
                mapper: "LoROM".to_string(),
                rom_type: "ROM+RAM".to_string(),
                rom_size_mbit: 0,
                ram_size_kbit: 16,
            },
        );
        let c = Cartridge::from_bytes(&rom, &db, None).unwrap();
        assert_eq!(c.sram.len(), 0x800);
        assert!(!c.has_battery);
    }

    #[test]
    fn test_too_small() {
        assert!(matches!(
            Cartridge::from_bytes(&[0; 0x100], &GameDb::new(), None),
            Err(Error::RomTooSmall { actual: 0x100 })
        ));
    }
}
