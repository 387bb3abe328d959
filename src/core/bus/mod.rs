mod io;
mod page_table;
pub use page_table::{Page, PageTable, PAGE_COUNT, PAGE_SIZE, WRAM_SIZE};

use log::*;
use serde::{Deserialize, Serialize};

use crate::core::{
    apu::master_to_spc_cycles, Apu, Cartridge, Controller, DmaChannel, Error, MathEngine, Ppu,
    Scheduler,
};

/// Everything the CPU can reach through its address space.
///
/// RAM, ROM and SRAM are found through a [PageTable]. Everything else goes through the slow path,
/// which dispatches on the register address to the PPU, APU, DMA channels and math engine.
#[derive(Serialize, Deserialize)]
pub struct Bus {
    pub wram: Vec<u8>,
    pub cartridge: Cartridge,
    pub ppu: Ppu,
    pub apu: Apu,
    pub dma: [DmaChannel; 8],
    pub math: MathEngine,
    pub scheduler: Scheduler,
    /// Current state of both controllers, read by the game through the joypad registers
    pub controllers: [Controller; 2],
    // Results of the last automatic joypad read
    joypad_auto: [u16; 2],
    // Shift registers for manually reading the joypads through 0x4016/0x4017
    joypad_shift: [u16; 2],
    joypad_strobe: bool,
    /// NMITIMEN, bit 7 enables the V-Blank NMI and bit 0 the automatic joypad read
    pub nmitimen: u8,
    /// RDNMI, bit 7 is set on entering V-Blank and cleared by reading
    pub rdnmi: u8,
    /// HVBJOY, bit 7 is V-Blank and bit 6 is H-Blank
    pub hvbjoy: u8,
    wram_addr: u32,
    #[serde(skip)]
    pages: PageTable,
    #[serde(skip)]
    fault: Option<Error>,
    #[serde(skip)]
    pub(crate) dma_cycles: u64,
}

impl Bus {
    pub fn new(cartridge: Cartridge) -> Bus {
        let pages = PageTable::new(&cartridge);
        Bus {
            wram: vec![0; WRAM_SIZE],
            cartridge,
            ppu: Ppu::new(),
            apu: Apu::new(),
            dma: [DmaChannel::default(); 8],
            math: MathEngine::default(),
            scheduler: Scheduler::new(),
            controllers: [Controller::new(); 2],
            joypad_auto: [0; 2],
            joypad_shift: [0; 2],
            joypad_strobe: false,
            nmitimen: 0,
            rdnmi: 0,
            hvbjoy: 0,
            wram_addr: 0,
            pages,
            fault: None,
            dma_cycles: 0,
        }
    }

    /// Swap in a new cartridge, rebuilding the page table. Returns the old cartridge.
    pub fn insert_cartridge(&mut self, cartridge: Cartridge) -> Cartridge {
        let old = std::mem::replace(&mut self.cartridge, cartridge);
        self.rebuild_page_table();
        old
    }

    /// Rebuild the page table from the current cartridge.
    ///
    /// The table is not part of a savestate, so this must be called after loading one.
    pub fn rebuild_page_table(&mut self) {
        self.pages = PageTable::new(&self.cartridge);
    }

    /// Read a byte given a 24 bit address.
    ///
    /// May have side effects when reading I/O registers.
    pub fn read8(&mut self, addr: u32) -> u8 {
        let offset = addr as usize % PAGE_SIZE;
        match self.pages.get(addr) {
            Page::Wram(s) => self.wram[s + offset],
            Page::Rom(s) => self.cartridge.rom[s + offset],
            Page::Sram(s) => {
                let len = self.cartridge.sram.len();
                self.cartridge.sram[(s + offset) % len]
            }
            Page::Slow => self.read_io(addr & 0xFFFFFF),
        }
    }

    /// Write a byte given a 24 bit address.
    pub fn write8(&mut self, addr: u32, value: u8) {
        let offset = addr as usize % PAGE_SIZE;
        match self.pages.get(addr) {
            Page::Wram(s) => self.wram[s + offset] = value,
            Page::Rom(_) => trace!("Ignoring write {:02X} to ROM at {:06X}", value, addr),
            Page::Sram(s) => {
                let len = self.cartridge.sram.len();
                self.cartridge.sram[(s + offset) % len] = value;
            }
            Page::Slow => self.write_io(addr & 0xFFFFFF, value),
        }
    }

    /// Read a little endian word, the high byte coming from the next 24 bit address.
    pub fn read16(&mut self, addr: u32) -> u16 {
        let low = self.read8(addr);
        let high = self.read8(addr.wrapping_add(1) & 0xFFFFFF);
        u16::from_le_bytes([low, high])
    }

    pub fn write16(&mut self, addr: u32, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.write8(addr, low);
        self.write8(addr.wrapping_add(1) & 0xFFFFFF, high);
    }

    /// Read a byte without side effects.
    ///
    /// Meant for debuggers. Anything outside of RAM, ROM and SRAM reads as 0xFF.
    pub fn peek(&self, addr: u32) -> u8 {
        let offset = addr as usize % PAGE_SIZE;
        match self.pages.get(addr) {
            Page::Wram(s) => self.wram[s + offset],
            Page::Rom(s) => self.cartridge.rom[s + offset],
            Page::Sram(s) => self.cartridge.sram[(s + offset) % self.cartridge.sram.len()],
            Page::Slow => 0xFF,
        }
    }

    /// Write a byte without side effects.
    ///
    /// Meant for debuggers. Unlike [Bus::write8] this can patch ROM. I/O registers are left alone.
    pub fn poke(&mut self, addr: u32, value: u8) {
        let offset = addr as usize % PAGE_SIZE;
        match self.pages.get(addr) {
            Page::Wram(s) => self.wram[s + offset] = value,
            Page::Rom(s) => self.cartridge.rom[s + offset] = value,
            Page::Sram(s) => {
                let len = self.cartridge.sram.len();
                self.cartridge.sram[(s + offset) % len] = value;
            }
            Page::Slow => debug!("Debug write to I/O address {:06X} ignored", addr),
        }
    }

    /// Record an emulation gap. Only the first fault before [Bus::take_fault] is kept.
    pub fn fault(&mut self, error: Error) {
        if self.fault.is_none() {
            self.fault = Some(error);
        }
    }

    pub fn take_fault(&mut self) -> Option<Error> {
        self.fault.take()
    }

    /// Master cycles spent in DMA since the last call.
    pub fn take_dma_cycles(&mut self) -> u64 {
        std::mem::take(&mut self.dma_cycles)
    }

    // Run the audio CPU up to the current point in time
    fn catch_up_apu(&mut self) {
        let target = master_to_spc_cycles(self.scheduler.timestamp);
        if let Err(e) = self.apu.run_until(target) {
            self.fault(e);
        }
    }

    /// Copy the controller states into JOY1 and JOY2, if automatic reading is enabled.
    pub fn auto_read_joypads(&mut self) {
        if self.nmitimen & 0x01 != 0 {
            self.joypad_auto = [self.controllers[0].to_bits(), self.controllers[1].to_bits()];
        }
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("cartridge", &self.cartridge)
            .field("nmitimen", &self.nmitimen)
            .field("rdnmi", &self.rdnmi)
            .field("hvbjoy", &self.hvbjoy)
            .field("timestamp", &self.scheduler.timestamp)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;

    fn bus() -> Bus {
        Bus::new(Cartridge::blank())
    }

    #[test]
    fn test_wram_mirrors() {
        let mut b = bus();
        b.write8(0x000123, 0x45);
        assert_eq_hex!(b.read8(0x7E0123), 0x45);
        assert_eq_hex!(b.read8(0x800123), 0x45);
        assert_eq_hex!(b.read8(0x3F0123), 0x45);
        b.write16(0x7EFFFF, 0xBEEF);
        assert_eq_hex!(b.read8(0x7F0000), 0xBE);
    }

    #[test]
    fn test_rom_is_read_only() {
        let mut b = bus();
        b.write8(0x008000, 0x12);
        assert_eq_hex!(b.read8(0x008000), 0x00);
        b.poke(0x008000, 0x12);
        assert_eq_hex!(b.read8(0x808000), 0x12);
        assert!(b.take_fault().is_none());
    }

    #[test]
    fn test_peek_has_no_side_effects() {
        let mut b = bus();
        b.rdnmi = 0x80;
        assert_eq_hex!(b.peek(0x004210), 0xFF);
        assert_eq_hex!(b.rdnmi, 0x80);
        assert_eq_hex!(b.read8(0x004210), 0x82);
        assert_eq_hex!(b.rdnmi, 0x00);
    }

    #[test]
    fn test_first_fault_wins() {
        let mut b = bus();
        b.read8(0x005000);
        b.write8(0x005001, 0x00);
        assert!(matches!(
            b.take_fault(),
            Some(Error::UnmappedRead { address: 0x005000 })
        ));
        assert!(b.take_fault().is_none());
    }
}
