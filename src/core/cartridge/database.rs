use std::collections::HashMap;

use log::*;
use serde::{Deserialize, Serialize};

/// A coprocessor found on the cartridge board.
///
/// None of these are emulated, a cartridge with one will load and run until it touches the chip.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum Coprocessor {
    #[default]
    None,
    Dsp,
    SuperFx,
    SuperFx2,
    Sa1,
    C4,
}

impl Coprocessor {
    /// Decode the coprocessor from a database ROM type string.
    ///
    /// Unrecognized strings are logged and treated as a plain cartridge.
    /// ```
    /// use yase::core::Coprocessor;
    /// assert_eq!(Coprocessor::from_rom_type("ROM+RAM+Battery"), Coprocessor::None);
    /// assert_eq!(Coprocessor::from_rom_type("C4"), Coprocessor::C4);
    /// assert_eq!(Coprocessor::from_rom_type("Super FX2+RAM+Battery"), Coprocessor::SuperFx2);
    /// ```
    pub fn from_rom_type(rom_type: &str) -> Coprocessor {
        if rom_type.contains("Super FX2") {
            Coprocessor::SuperFx2
        } else if rom_type.contains("Super FX") {
            Coprocessor::SuperFx
        } else if rom_type.contains("SA-1") {
            Coprocessor::Sa1
        } else if rom_type.contains("C4") {
            Coprocessor::C4
        } else if rom_type.contains("DSP") {
            Coprocessor::Dsp
        } else if rom_type.contains("Normal") || rom_type.starts_with("ROM") {
            Coprocessor::None
        } else {
            warn!("Unrecognized ROM type {:?}, assuming no coprocessor", rom_type);
            Coprocessor::None
        }
    }
}

/// Metadata for a single game, keyed by the SHA-1 of its ROM in [GameDb].
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DbEntry {
    /// "LoROM", "HiROM" or "Extended HiROM"
    pub mapper: String,
    /// Board contents, i.e. "ROM+RAM+Battery"
    pub rom_type: String,
    pub rom_size_mbit: u32,
    pub ram_size_kbit: u32,
}

impl DbEntry {
    pub fn coprocessor(&self) -> Coprocessor {
        Coprocessor::from_rom_type(&self.rom_type)
    }
    pub fn has_battery(&self) -> bool {
        self.rom_type.contains("Battery")
    }
    pub fn has_rtc(&self) -> bool {
        self.rom_type.contains("RTC")
    }
    /// Size of the ROM in bytes
    pub fn rom_size(&self) -> usize {
        self.rom_size_mbit as usize * 128 * 1024
    }
    /// Size of the SRAM in bytes
    pub fn ram_size(&self) -> usize {
        self.ram_size_kbit as usize * 1024 / 8
    }
}

/// The game database.
///
/// Maps the lowercase hex SHA-1 of a ROM (without a copier header) to its [DbEntry].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GameDb {
    entries: HashMap<String, DbEntry>,
}

impl GameDb {
    pub fn new() -> GameDb {
        GameDb::default()
    }
    pub fn insert(&mut self, hash: &str, entry: DbEntry) {
        self.entries.insert(hash.to_lowercase(), entry);
    }
    pub fn get(&self, hash: &str) -> Option<&DbEntry> {
        self.entries.get(&hash.to_lowercase())
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_decoding() {
        let e = DbEntry {
            mapper: "HiROM".to_string(),
            rom_type: "ROM+RAM+Battery".to_string(),
            rom_size_mbit: 32,
            ram_size_kbit: 64,
        };
        assert!(e.has_battery());
        assert!(!e.has_rtc());
        assert_eq!(e.coprocessor(), Coprocessor::None);
        assert_eq!(e.rom_size(), 0x400000);
        assert_eq!(e.ram_size(), 0x2000);
    }

    #[test]
    fn test_lookup_ignores_case() {
        let mut db = GameDb::new();
        db.insert(
            "ABCDEF",
            DbEntry {
                mapper: "LoROM".to_string(),
                rom_type: "Normal".to_string(),
                rom_size_mbit: 4,
                ram_size_kbit: 0,
            },
        );
        assert!(db.get("abcdef").is_some());
        assert!(db.get("ABCDEF").is_some());
        assert!(db.get("012345").is_none());
        assert_eq!(db.len(), 1);
    }
}
